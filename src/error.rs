//! Error types for reading and exporting tables

use std::path::PathBuf;

/// Errors surfaced by the reader, the exporters and the dispatcher
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The input holds no records at all, not even a header.
    #[error("Input file is empty: {}", path.display())]
    EmptySource { path: PathBuf },

    /// The requested format does not match any exporter.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The exporter could not create or finish its artifact.
    #[error("Failed to write {}", destination.display())]
    WriteFailure {
        destination: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Tables without columns are refused by every exporter.
    #[error("Table has no columns, nothing to write to {}", destination.display())]
    NoColumns { destination: PathBuf },

    /// The input could not be opened.
    #[error("Failed to open file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not valid delimited text (bad quoting, invalid UTF-8).
    #[error("Failed to read CSV file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, ExportError>;
