//! Export dispatcher: read the source, route the table to an exporter

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::{ExportConfig, ExportFormat};
use crate::error::{ExportError, Result};
use crate::export::{normalize_destination, ExporterFactory};
use crate::parser::{CsvParser, Parser};

/// Convert `source_path` into `format_identifier`, writing `destination_name`
/// (with the format's extension appended when missing).
///
/// The format is checked before the source is read, so an unsupported format
/// touches no file.
pub fn export(
    source_path: impl AsRef<Path>,
    format_identifier: &str,
    destination_name: &str,
) -> Result<PathBuf> {
    let format: ExportFormat = format_identifier.parse()?;
    export_with(&ExportConfig::new(
        source_path.as_ref(),
        format,
        destination_name,
    ))
}

/// Run one conversion described by `config`. Returns the path written.
pub fn export_with(config: &ExportConfig) -> Result<PathBuf> {
    let table = CsvParser::with_options(config.reader).parse(&config.input)?;

    let exporter = ExporterFactory::create(config.format);
    let destination = normalize_destination(&config.output, exporter.extension());
    let existed = destination.exists();
    debug!(
        "Exporting {} as {} to {}",
        config.input.display(),
        config.format,
        destination.display()
    );

    match exporter.export(&table, &config.output) {
        Err(err @ ExportError::WriteFailure { .. }) => {
            if !existed {
                remove_partial(&destination);
            }
            Err(err)
        }
        result => result,
    }
}

/// Best-effort removal of an artifact left behind by a failed write
fn remove_partial(path: &Path) {
    if !path.is_file() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) => warn!("Could not remove partial output {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::model::Table;

    fn setup(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        fs::write(&input, contents).unwrap();
        (dir, input)
    }

    fn dest(dir: &tempfile::TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_csv_to_csv_scenario() {
        let (dir, input) = setup("name,age\nAna,30\nLeo,\n");
        let written = export(&input, "csv", &dest(&dir, "out")).unwrap();

        assert_eq!(written, dir.path().join("out.csv"));
        assert_eq!(fs::read_to_string(written).unwrap(), "name,age\nAna,30\nLeo,\n");
    }

    #[test]
    fn test_csv_to_json_scenario() {
        let (dir, input) = setup("name,age\nAna,30\nLeo,\n");
        let written = export(&input, "JSON", &dest(&dir, "out.json")).unwrap();

        assert_eq!(written, dir.path().join("out.json"));
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written).unwrap()).unwrap();
        assert_eq!(value["rows"][1]["age"], "");
        assert_eq!(value["rows"][1]["name"], "Leo");
        assert_eq!(value["columns"][0]["name"], "name");
    }

    #[test]
    fn test_json_round_trip_reconstructs_table() {
        let (dir, input) = setup("a,b,c\n1,2,3\n4,5,6\n");
        let written = export(&input, "json", &dest(&dir, "out")).unwrap();

        let original = crate::parser::read(&input).unwrap();
        let parsed: Table = serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_every_format_writes_one_artifact() {
        let (dir, input) = setup("name,age\nAna,30\nLeo,\n");
        for format in ExportFormat::ALL {
            let name = format!("out_{}", format);
            let written = export(&input, format.as_str(), &dest(&dir, &name)).unwrap();
            assert_eq!(written.extension().unwrap(), format.extension());
            assert!(fs::metadata(&written).unwrap().len() > 0);
        }
        // input plus five artifacts
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 6);
    }

    #[test]
    fn test_unsupported_format_is_checked_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        let err = export(&missing, "xml", &dest(&dir, "out")).unwrap_err();

        assert!(matches!(err, ExportError::UnsupportedFormat(ref id) if id == "xml"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_source_writes_nothing() {
        let (dir, input) = setup("");
        let err = export(&input, "csv", &dest(&dir, "out")).unwrap_err();

        assert!(matches!(err, ExportError::EmptySource { .. }));
        assert!(!dir.path().join("out.csv").exists());
    }

    #[test]
    fn test_blank_line_is_kept_as_empty_row() {
        let (dir, input) = setup("a,b\n1,2\n\n3,4\n");
        let written = export(&input, "csv", &dest(&dir, "out")).unwrap();
        assert_eq!(fs::read_to_string(written).unwrap(), "a,b\n1,2\n,\n3,4\n");
    }

    #[test]
    fn test_blank_header_line_has_no_columns() {
        let (dir, input) = setup("\n");
        for format in ExportFormat::ALL {
            let err = export(&input, format.as_str(), &dest(&dir, "out")).unwrap_err();
            assert!(matches!(err, ExportError::NoColumns { .. }));
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_export_with_delimiter() {
        let (dir, input) = setup("a;b\n1;2\n");
        let config = ExportConfig::new(&input, ExportFormat::Csv, dest(&dir, "out")).with_delimiter(b';');
        let written = export_with(&config).unwrap();
        assert_eq!(fs::read_to_string(written).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn test_remove_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.xlsx");
        fs::write(&path, b"PK").unwrap();
        remove_partial(&path);
        assert!(!path.exists());

        // directories are left alone
        remove_partial(dir.path());
        assert!(dir.path().exists());
    }
}
