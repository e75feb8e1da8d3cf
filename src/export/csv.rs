//! CSV output format

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ExportFormat;
use crate::model::Table;

use super::Exporter;

/// CSV exporter
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn write(&self, table: &Table, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writer
            .write_record(table.header())
            .context("Failed to write header record")?;

        for (idx, record) in table.records().enumerate() {
            writer
                .write_record(&record)
                .with_context(|| format!("Failed to write row {}", idx + 1))?;
        }

        writer.flush().context("Failed to flush CSV writer")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::people;
    use crate::model::{Column, Row};

    #[test]
    fn test_write_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        CsvExporter::new().write(&people(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "name,age\nAna,30\nLeo,\n");
    }

    #[test]
    fn test_fields_are_quoted_when_needed() {
        let table = Table::new(
            vec![Column::new("name"), Column::new("note")],
            vec![Row::from_iter([("name", "Smith, John"), ("note", "say \"hi\"")])],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        CsvExporter::new().write(&table, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "name,note\n\"Smith, John\",\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_export_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("report");
        let written = CsvExporter::new()
            .export(&people(), destination.to_str().unwrap())
            .unwrap();

        assert_eq!(written, dir.path().join("report.csv"));
        assert!(written.exists());
    }

    #[test]
    fn test_column_order_follows_table() {
        let table = Table::new(
            vec![Column::new("b"), Column::new("a"), Column::new("c")],
            vec![
                Row::from_iter([("a", "1"), ("b", "2"), ("c", "3")]),
                Row::from_iter([("c", "6"), ("a", "4")]),
            ],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        CsvExporter::new().write(&table, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "b,a,c\n2,1,3\n,4,6\n");
    }

    #[test]
    fn test_empty_row_is_a_line_of_empty_fields() {
        let table = Table::new(
            vec![Column::new("a"), Column::new("b")],
            vec![Row::new(), Row::from_iter([("a", "1"), ("b", "2")])],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        CsvExporter::new().write(&table, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "a,b\n,\n1,2\n");
    }
}
