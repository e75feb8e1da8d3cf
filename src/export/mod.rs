//! Exporters writing a Table to an output artifact

mod csv;
mod json;
mod ods;
mod pdf;
mod xlsx;

use std::path::{Path, PathBuf};

use log::info;

use crate::config::ExportFormat;
use crate::error::{ExportError, Result};
use crate::model::Table;

pub use self::csv::CsvExporter;
pub use self::json::JsonExporter;
pub use self::ods::OdsExporter;
pub use self::pdf::PdfExporter;
pub use self::xlsx::XlsxExporter;

/// Trait for output writers, one per format
pub trait Exporter: Send + Sync {
    /// Format produced by this exporter
    fn format(&self) -> ExportFormat;

    /// Write the table to `path`, creating or truncating the file
    fn write(&self, table: &Table, path: &Path) -> anyhow::Result<()>;

    /// Canonical extension, without the dot
    fn extension(&self) -> &'static str {
        self.format().extension()
    }

    /// Export the table under `destination`, appending the extension when the
    /// name does not already end with it. Returns the path written.
    fn export(&self, table: &Table, destination: &str) -> Result<PathBuf> {
        let path = normalize_destination(destination, self.extension());

        if table.column_count() == 0 {
            return Err(ExportError::NoColumns { destination: path });
        }

        self.write(table, &path)
            .map_err(|e| ExportError::WriteFailure {
                destination: path.clone(),
                source: e.into(),
            })?;

        info!(
            "Wrote {} rows to {} ({})",
            table.row_count(),
            path.display(),
            self.format()
        );
        Ok(path)
    }
}

/// Append `.{extension}` unless `destination` already ends with it.
///
/// The check is case-sensitive: `report.CSV` becomes `report.CSV.csv`.
pub fn normalize_destination(destination: &str, extension: &str) -> PathBuf {
    let suffix = format!(".{}", extension);
    if destination.ends_with(&suffix) {
        PathBuf::from(destination)
    } else {
        PathBuf::from(format!("{}{}", destination, suffix))
    }
}

/// Factory for creating exporters
pub struct ExporterFactory;

impl ExporterFactory {
    /// Create an exporter for the format
    pub fn create(format: ExportFormat) -> Box<dyn Exporter> {
        match format {
            ExportFormat::Csv => Box::new(CsvExporter::new()),
            ExportFormat::Json => Box::new(JsonExporter::new()),
            ExportFormat::Xlsx => Box::new(XlsxExporter::new()),
            ExportFormat::Ods => Box::new(OdsExporter::new()),
            ExportFormat::Pdf => Box::new(PdfExporter::new()),
        }
    }
}
