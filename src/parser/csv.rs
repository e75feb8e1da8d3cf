//! CSV file parser

use std::path::Path;

use csv::StringRecord;
use log::debug;

use crate::config::ReaderOptions;
use crate::error::{ExportError, Result};
use crate::model::{Column, Row, Table};

use super::Parser;

/// Parser for CSV files
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    options: ReaderOptions,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReaderOptions) -> Self {
        Self { options }
    }

    /// Split `data` into records, blank lines included as empty records.
    ///
    /// The csv crate skips blank lines, so they are recovered from the bytes
    /// consumed by each read: whatever line breaks precede a record's first
    /// field are blank lines.
    fn records(&self, data: &[u8]) -> std::result::Result<Vec<StringRecord>, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.options.delimiter)
            .from_reader(data);

        let mut records = Vec::new();
        let mut record = StringRecord::new();
        let mut consumed = 0;
        loop {
            let more = reader.read_record(&mut record)?;
            let end = reader.position().byte() as usize;
            let pending_lf = consumed > 0 && data[consumed - 1] == b'\r';
            let blanks = blank_lines(&data[consumed..end], pending_lf);
            records.extend(std::iter::repeat_with(StringRecord::new).take(blanks));
            if !more {
                break;
            }
            records.push(record.clone());
            consumed = end;
        }
        Ok(records)
    }
}

/// Count the blank lines at the start of the bytes consumed by one read.
///
/// `pending_lf` is set when the previous record ended on `\r`; a `\n` right
/// after it completes that CRLF terminator instead of ending a blank line.
fn blank_lines(consumed: &[u8], pending_lf: bool) -> usize {
    let mut bytes = consumed
        .iter()
        .copied()
        .take_while(|&b| b == b'\r' || b == b'\n')
        .peekable();
    if pending_lf {
        bytes.next_if_eq(&b'\n');
    }

    let mut count = 0;
    while let Some(byte) = bytes.next() {
        if byte == b'\r' {
            bytes.next_if_eq(&b'\n');
        }
        count += 1;
    }
    count
}

impl Parser for CsvParser {
    fn parse(&self, path: &Path) -> Result<Table> {
        let data = std::fs::read(path).map_err(|source| ExportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let records = self.records(&data).map_err(|source| ExportError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        // A blank first line is a header without columns.
        let mut records = records.into_iter();
        let Some(header) = records.next() else {
            return Err(ExportError::EmptySource {
                path: path.to_path_buf(),
            });
        };

        let columns: Vec<Column> = header.iter().map(Column::new).collect();

        let mut rows = Vec::new();
        for record in records {
            if record.len() > columns.len() {
                debug!(
                    "Dropping {} extra field(s) on line {}",
                    record.len() - columns.len(),
                    record.position().map_or(0, |p| p.line())
                );
            }

            rows.push(align_record(&columns, &record));
        }

        debug!(
            "Parsed {} columns and {} rows from {}",
            columns.len(),
            rows.len(),
            path.display()
        );

        Ok(Table::new(columns, rows))
    }
}

/// Map a data record onto the header's columns by position.
///
/// The Nth field goes to the Nth column. Fields past the last column are
/// dropped; columns past the last field are left out of the row, so they
/// read as `""`.
pub fn align_record<'a>(columns: &[Column], fields: impl IntoIterator<Item = &'a str>) -> Row {
    columns
        .iter()
        .zip(fields)
        .map(|(column, value)| (column.name.as_str(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::model::ColumnType;

    fn source(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_header_and_rows() {
        let file = source("name,age\nAna,30\nLeo,\n");
        let table = CsvParser::new().parse(file.path()).unwrap();

        assert_eq!(table.header(), vec!["name", "age"]);
        assert!(table
            .columns()
            .iter()
            .all(|c| c.column_type == ColumnType::Str));
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0].get("name"), "Ana");
        assert_eq!(table.rows()[0].get("age"), "30");
        assert_eq!(table.rows()[1].get("age"), "");
        assert!(table.rows()[1].contains("age"));
    }

    #[test]
    fn test_short_record_leaves_columns_absent() {
        let file = source("a,b,c\n1\n");
        let table = CsvParser::new().parse(file.path()).unwrap();

        let row = &table.rows()[0];
        assert_eq!(row.len(), 1);
        assert!(!row.contains("b"));
        assert_eq!(row.get("c"), "");
    }

    #[test]
    fn test_long_record_drops_extra_fields() {
        let file = source("a,b\n1,2,3,4\n");
        let table = CsvParser::new().parse(file.path()).unwrap();

        let values: Vec<(&str, &str)> = table.rows()[0].iter().collect();
        assert_eq!(values, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_quoted_fields_are_kept_verbatim() {
        let file = source("name,note\n\"Smith, John\",\" padded \"\nx,\"say \"\"hi\"\"\"\n");
        let table = CsvParser::new().parse(file.path()).unwrap();

        assert_eq!(table.rows()[0].get("name"), "Smith, John");
        assert_eq!(table.rows()[0].get("note"), " padded ");
        assert_eq!(table.rows()[1].get("note"), "say \"hi\"");
    }

    #[test]
    fn test_header_only_gives_no_rows() {
        let file = source("a,b\n");
        let table = CsvParser::new().parse(file.path()).unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_blank_line_becomes_empty_row() {
        let file = source("a,b\n1,2\n\n3,4\n");
        let table = CsvParser::new().parse(file.path()).unwrap();

        assert_eq!(table.row_count(), 3);
        assert!(table.rows()[1].is_empty());
        assert_eq!(table.rows()[2].get("a"), "3");
    }

    #[test]
    fn test_trailing_blank_lines_become_empty_rows() {
        let file = source("a,b\n1,2\n\n\n");
        let table = CsvParser::new().parse(file.path()).unwrap();
        assert_eq!(table.row_count(), 3);
        assert!(table.rows()[2].is_empty());
    }

    #[test]
    fn test_crlf_blank_lines() {
        let file = source("a,b\r\n1,2\r\n\r\n3,4\r\n");
        let table = CsvParser::new().parse(file.path()).unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows()[0].get("b"), "2");
        assert!(table.rows()[1].is_empty());
        assert_eq!(table.rows()[2].get("b"), "4");
    }

    #[test]
    fn test_line_breaks_inside_quotes_are_not_blank_lines() {
        let file = source("a,b\n\"x\n\ny\",1\n2,3\n");
        let table = CsvParser::new().parse(file.path()).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0].get("a"), "x\n\ny");
        assert_eq!(table.rows()[1].get("a"), "2");
    }

    #[test]
    fn test_blank_first_line_gives_no_columns() {
        let file = source("\n");
        let table = CsvParser::new().parse(file.path()).unwrap();
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 0);

        let file = source("\n\n");
        let table = CsvParser::new().parse(file.path()).unwrap();
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(blank_lines(b"1,2\n", false), 0);
        assert_eq!(blank_lines(b"\n\n1,2\n", false), 2);
        assert_eq!(blank_lines(b"\r\n\r1", false), 2);
        assert_eq!(blank_lines(b"\n1", true), 0);
        assert_eq!(blank_lines(b"\n\n1", true), 1);
        assert_eq!(blank_lines(b"", true), 0);
    }

    #[test]
    fn test_empty_source_is_rejected() {
        let file = source("");
        let err = CsvParser::new().parse(file.path()).unwrap_err();
        assert!(matches!(err, ExportError::EmptySource { .. }));
    }

    #[test]
    fn test_missing_file_reports_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvParser::new()
            .parse(&dir.path().join("missing.csv"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Open { .. }));
    }

    #[test]
    fn test_invalid_utf8_reports_read_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a,b\n\xff\xfe,1\n").unwrap();
        let err = CsvParser::new().parse(file.path()).unwrap_err();
        assert!(matches!(err, ExportError::Read { .. }));
    }

    #[test]
    fn test_custom_delimiter() {
        let file = source("a;b\n1;2\n");
        let parser = CsvParser::with_options(ReaderOptions { delimiter: b';' });
        let table = parser.parse(file.path()).unwrap();
        assert_eq!(table.rows()[0].get("b"), "2");
    }

    #[test]
    fn test_align_record() {
        let columns = vec![Column::new("x"), Column::new("y")];
        assert_eq!(align_record(&columns, ["1", "2", "3"]).len(), 2);
        assert_eq!(align_record(&columns, ["1"]).get("y"), "");
        assert!(align_record(&columns, []).is_empty());
    }
}
