//! JSON output format

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::ExportFormat;
use crate::model::Table;

use super::Exporter;

/// JSON document exporter
///
/// The document carries the full table: a `columns` array of `{name, type}`
/// records and a `rows` array of objects keyed by column name.
pub struct JsonExporter;

impl JsonExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn write(&self, table: &Table, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        table
            .serialize(&mut serializer)
            .context("Failed to serialize table")?;

        writer.flush().context("Failed to flush JSON output")?;
        Ok(())
    }
}
