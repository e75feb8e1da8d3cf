//! Parser layer for reading delimited text into a Table

mod csv;

use std::path::Path;

use crate::error::Result;
use crate::model::Table;

pub use self::csv::{align_record, CsvParser};

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table
    fn parse(&self, path: &Path) -> Result<Table>;
}

/// Read a comma-separated UTF-8 file with default options
pub fn read(path: impl AsRef<Path>) -> Result<Table> {
    CsvParser::new().parse(path.as_ref())
}
