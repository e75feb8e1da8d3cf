//! tabexport - convert tabular data between formats
//!
//! Reads a CSV file into an in-memory [`Table`] and writes it out as CSV,
//! JSON, XLSX, ODS or PDF.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;

pub use config::{ExportConfig, ExportFormat};
pub use dispatch::{export, export_with};
pub use error::ExportError;
pub use model::Table;
