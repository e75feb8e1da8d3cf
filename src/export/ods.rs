//! OpenDocument spreadsheet output.
//!
//! Builds the ODF package directly with `zip`: an uncompressed `mimetype`
//! entry first, then the manifest, document metadata and `content.xml`
//! holding a single `table:table` named `Sheet1`. The layout matches the
//! XLSX exporter: header on the first line, one line per row.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::ExportFormat;
use crate::model::Table;

use super::xlsx::SHEET_NAME;
use super::Exporter;

const MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";
const ODF_VERSION: &str = "1.3";

const OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const TABLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
const TEXT_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
const META_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:meta:1.0";
const MANIFEST_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

/// ODS spreadsheet exporter
pub struct OdsExporter;

impl OdsExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OdsExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for OdsExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Ods
    }

    fn write(&self, table: &Table, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));

        // ODF requires the mimetype entry first and uncompressed
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("mimetype", stored)
            .context("Failed to create mimetype")?;
        zip.write_all(MIMETYPE.as_bytes())
            .context("Failed to write mimetype")?;

        zip.start_file("META-INF/manifest.xml", deflated)
            .context("Failed to create META-INF/manifest.xml")?;
        zip.write_all(manifest_xml().as_bytes())
            .context("Failed to write META-INF/manifest.xml")?;

        zip.start_file("meta.xml", deflated)
            .context("Failed to create meta.xml")?;
        zip.write_all(meta_xml().as_bytes())
            .context("Failed to write meta.xml")?;

        zip.start_file("content.xml", deflated)
            .context("Failed to create content.xml")?;
        write_content(&mut zip, table).context("Failed to write content.xml")?;

        let mut inner = zip.finish().context("Failed to finalize ODS package")?;
        inner.flush().context("Failed to flush ODS package")?;
        Ok(())
    }
}

fn manifest_xml() -> String {
    let entries = [
        ("/", MIMETYPE),
        ("meta.xml", "text/xml"),
        ("content.xml", "text/xml"),
    ];

    let mut manifest = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="{MANIFEST_NS}" manifest:version="{ODF_VERSION}">
"#
    );
    for (full_path, media_type) in entries {
        let version = if full_path == "/" {
            format!(r#" manifest:version="{ODF_VERSION}""#)
        } else {
            String::new()
        };
        manifest.push_str(&format!(
            r#"  <manifest:file-entry manifest:full-path="{full_path}"{version} manifest:media-type="{media_type}"/>
"#
        ));
    }
    manifest.push_str("</manifest:manifest>\n");
    manifest
}

fn meta_xml() -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S");
    let generator = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-meta xmlns:office="{OFFICE_NS}" xmlns:meta="{META_NS}" office:version="{ODF_VERSION}">
  <office:meta>
    <meta:generator>{generator}</meta:generator>
    <meta:creation-date>{now}</meta:creation-date>
  </office:meta>
</office:document-meta>
"#
    )
}

fn write_content<W: Write>(out: W, table: &Table) -> Result<()> {
    let mut writer = Writer::new(out);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("office:document-content").with_attributes([
            ("xmlns:office", OFFICE_NS),
            ("xmlns:table", TABLE_NS),
            ("xmlns:text", TEXT_NS),
            ("office:version", ODF_VERSION),
        ]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("office:body")))?;
    writer.write_event(Event::Start(BytesStart::new("office:spreadsheet")))?;
    writer.write_event(Event::Start(
        BytesStart::new("table:table").with_attributes([("table:name", SHEET_NAME)]),
    ))?;

    let column_count = table.column_count().to_string();
    writer.write_event(Event::Empty(
        BytesStart::new("table:table-column")
            .with_attributes([("table:number-columns-repeated", column_count.as_str())]),
    ))?;

    write_row(&mut writer, &table.header())?;
    for record in table.records() {
        write_row(&mut writer, &record)?;
    }

    writer.write_event(Event::End(BytesEnd::new("table:table")))?;
    writer.write_event(Event::End(BytesEnd::new("office:spreadsheet")))?;
    writer.write_event(Event::End(BytesEnd::new("office:body")))?;
    writer.write_event(Event::End(BytesEnd::new("office:document-content")))?;
    Ok(())
}

fn write_row<W: Write>(writer: &mut Writer<W>, values: &[&str]) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("table:table-row")))?;

    for value in values {
        if value.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("table:table-cell")))?;
            continue;
        }

        writer.write_event(Event::Start(
            BytesStart::new("table:table-cell").with_attributes([("office:value-type", "string")]),
        ))?;
        for line in value.split('\n') {
            write_paragraph(writer, line.strip_suffix('\r').unwrap_or(line))?;
        }
        writer.write_event(Event::End(BytesEnd::new("table:table-cell")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("table:table-row")))?;
    Ok(())
}

/// Write one `text:p`, keeping whitespace that ODF would otherwise collapse.
///
/// A space run between words keeps its first space as text and encodes the
/// rest as `text:s`; leading and trailing runs are encoded entirely. Tabs
/// become `text:tab`.
fn write_paragraph<W: Write>(writer: &mut Writer<W>, line: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("text:p")))?;

    let mut rest = line;
    let mut at_start = true;
    while !rest.is_empty() {
        let word_len = rest.find([' ', '\t']).unwrap_or(rest.len());
        if word_len > 0 {
            let word = xml_chars(&rest[..word_len]);
            writer.write_event(Event::Text(BytesText::new(&word)))?;
            rest = &rest[word_len..];
            at_start = false;
            continue;
        }

        if let Some(after) = rest.strip_prefix('\t') {
            writer.write_event(Event::Empty(BytesStart::new("text:tab")))?;
            rest = after;
            at_start = false;
            continue;
        }

        let spaces = rest.len() - rest.trim_start_matches(' ').len();
        rest = &rest[spaces..];
        let trailing = rest.is_empty() || rest.starts_with('\t');
        let mut encoded = spaces;
        if !at_start && !trailing {
            writer.write_event(Event::Text(BytesText::new(" ")))?;
            encoded -= 1;
        }
        if encoded > 0 {
            write_spaces(writer, encoded)?;
        }
        at_start = false;
    }

    writer.write_event(Event::End(BytesEnd::new("text:p")))?;
    Ok(())
}

/// Replace characters XML 1.0 does not allow in a document with U+FFFD.
fn xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return Cow::Borrowed(text);
    }
    text.chars()
        .map(|ch| if is_xml_char(ch) { ch } else { char::REPLACEMENT_CHARACTER })
        .collect()
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{d7ff}'
            | '\u{e000}'..='\u{fffd}'
            | '\u{10000}'..='\u{10ffff}'
    )
}

fn write_spaces<W: Write>(writer: &mut Writer<W>, count: usize) -> Result<()> {
    let element = if count == 1 {
        BytesStart::new("text:s")
    } else {
        let count = count.to_string();
        BytesStart::new("text:s").with_attributes([("text:c", count.as_str())])
    };
    writer.write_event(Event::Empty(element))?;
    Ok(())
}
