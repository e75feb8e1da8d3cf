//! Configuration handling for tabexport

use std::path::PathBuf;

use crate::error::ExportError;

/// Output format of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
    Ods,
    Pdf,
}

impl ExportFormat {
    /// Every supported format, in the order they are listed to users
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Csv,
        ExportFormat::Json,
        ExportFormat::Xlsx,
        ExportFormat::Ods,
        ExportFormat::Pdf,
    ];

    /// Identifier used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Ods => "ods",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Canonical file extension, without the dot
    pub fn extension(&self) -> &'static str {
        // identifiers double as extensions
        self.as_str()
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "xlsx" => Ok(ExportFormat::Xlsx),
            "ods" => Ok(ExportFormat::Ods),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Options for reading delimited text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Field delimiter byte
    pub delimiter: u8,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Configuration for one conversion
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Path to the delimited-text input
    pub input: PathBuf,
    /// Target format
    pub format: ExportFormat,
    /// Destination name; the format's extension is appended when missing
    pub output: String,
    /// Input parsing options
    pub reader: ReaderOptions,
}

impl ExportConfig {
    /// Create a new ExportConfig with default reader options
    pub fn new(input: impl Into<PathBuf>, format: ExportFormat, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            format,
            output: output.into(),
            reader: ReaderOptions::default(),
        }
    }

    /// Set the input field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.reader.delimiter = delimiter;
        self
    }
}
