//! XLSX workbook output

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::config::ExportFormat;
use crate::model::Table;

use super::Exporter;

/// Name of the single worksheet
pub const SHEET_NAME: &str = "Sheet1";

/// XLSX workbook exporter
///
/// Writes one sheet: the header on the first line, then one line per row.
/// Every cell is written as a string.
pub struct XlsxExporter;

impl XlsxExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for XlsxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    fn write(&self, table: &Table, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(SHEET_NAME)
            .with_context(|| format!("Failed to set sheet name: {SHEET_NAME}"))?;

        write_line(worksheet, 0, &table.header())?;

        for (row_idx, record) in table.records().enumerate() {
            let excel_row = u32::try_from(row_idx + 1)
                .with_context(|| format!("Row {} is beyond the worksheet limit", row_idx + 1))?;
            write_line(worksheet, excel_row, &record)?;
        }

        workbook
            .save(path)
            .with_context(|| format!("Failed to save workbook to {}", path.display()))?;

        Ok(())
    }
}

/// Write one worksheet line. Empty strings are left as blank cells.
fn write_line(worksheet: &mut Worksheet, row: u32, values: &[&str]) -> Result<()> {
    for (col_idx, value) in values.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        let col = u16::try_from(col_idx)
            .with_context(|| format!("Column {} is beyond the worksheet limit", col_idx + 1))?;
        worksheet
            .write_string(row, col, *value)
            .with_context(|| format!("Failed to write string at ({row}, {col})"))?;
    }
    Ok(())
}
