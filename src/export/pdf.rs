//! PDF table output.
//!
//! Generates PDF 1.4 files by hand using the built-in Helvetica fonts, so no
//! font files are needed. The table is centered in a US Letter frame with one
//! inch margins and flows over as many pages as the rows need; the header row
//! is repeated at the top of every page.
//!
//! Text is encoded with WinAnsiEncoding. Characters outside Latin-1 are
//! printed as `?`.

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ExportFormat;
use crate::model::Table;

use super::Exporter;

const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
const MARGIN: f64 = 72.0;
const FRAME_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;
const FRAME_HEIGHT: f64 = PAGE_HEIGHT - 2.0 * MARGIN;

const FONT_SIZE: f64 = 10.0;
const LEADING: f64 = 12.0;
const H_PADDING: f64 = 6.0;
const V_PADDING: f64 = 3.0;
const HEADER_BOTTOM_PADDING: f64 = 12.0;
const DESCENT: f64 = 2.0;
const ROW_HEIGHT: f64 = V_PADDING + LEADING + V_PADDING;
const HEADER_HEIGHT: f64 = V_PADDING + LEADING + HEADER_BOTTOM_PADDING;
const GRID_WIDTH: f64 = 1.0;

type Rgb = (f64, f64, f64);

const HEADER_BACKGROUND: Rgb = (0.502, 0.502, 0.502); // grey
const HEADER_TEXT: Rgb = (0.961, 0.961, 0.961); // white smoke
const BODY_BACKGROUND: Rgb = (0.961, 0.961, 0.863); // beige
const BODY_TEXT: Rgb = (0.0, 0.0, 0.0);
const GRID: Rgb = (0.0, 0.0, 0.0);

const ELLIPSIS: &str = "...";

/// PDF table exporter
pub struct PdfExporter;

impl PdfExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn write(&self, table: &Table, path: &Path) -> Result<()> {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = generate_pdf_table(&title, table);
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Render the whole table into PDF bytes
fn generate_pdf_table(title: &str, table: &Table) -> Vec<u8> {
    let header = table.header();
    let records: Vec<Vec<&str>> = table.records().collect();
    let layout = TableLayout::compute(&header, &records);

    let mut builder = PdfBuilder::new();
    if records.is_empty() {
        builder.add_page(render_page(&layout, &header, &[]));
    } else {
        for chunk in records.chunks(rows_per_page()) {
            builder.add_page(render_page(&layout, &header, chunk));
        }
    }
    builder.build(title)
}

/// Body rows fitting under the header on one page
fn rows_per_page() -> usize {
    (((FRAME_HEIGHT - HEADER_HEIGHT) / ROW_HEIGHT).floor() as usize).max(1)
}

/// Column widths and horizontal placement shared by every page
struct TableLayout {
    col_widths: Vec<f64>,
    left: f64,
}

impl TableLayout {
    /// Size each column to its widest cell, then shrink all columns evenly
    /// when the table is wider than the frame.
    fn compute(header: &[&str], records: &[Vec<&str>]) -> Self {
        let mut col_widths: Vec<f64> = header
            .iter()
            .map(|h| text_width(h, Font::Bold) + 2.0 * H_PADDING)
            .collect();

        for record in records {
            for (width, value) in col_widths.iter_mut().zip(record) {
                *width = width.max(text_width(value, Font::Regular) + 2.0 * H_PADDING);
            }
        }

        let total: f64 = col_widths.iter().sum();
        if total > FRAME_WIDTH {
            let scale = FRAME_WIDTH / total;
            for width in &mut col_widths {
                *width *= scale;
            }
        }

        let table_width: f64 = col_widths.iter().sum();
        Self {
            col_widths,
            left: MARGIN + (FRAME_WIDTH - table_width) / 2.0,
        }
    }

    fn width(&self) -> f64 {
        self.col_widths.iter().sum()
    }
}

/// Content stream for one page: the header plus `rows`
fn render_page(layout: &TableLayout, header: &[&str], rows: &[Vec<&str>]) -> String {
    let mut content = String::new();
    let width = layout.width();
    let top = PAGE_HEIGHT - MARGIN;
    let header_bottom = top - HEADER_HEIGHT;
    let bottom = header_bottom - rows.len() as f64 * ROW_HEIGHT;

    // Backgrounds
    set_fill(&mut content, HEADER_BACKGROUND);
    content.push_str(&format!(
        "{:.2} {header_bottom:.2} {width:.2} {HEADER_HEIGHT:.2} re f\n",
        layout.left
    ));
    if !rows.is_empty() {
        set_fill(&mut content, BODY_BACKGROUND);
        content.push_str(&format!(
            "{:.2} {bottom:.2} {width:.2} {:.2} re f\n",
            layout.left,
            header_bottom - bottom
        ));
    }

    // Text
    set_fill(&mut content, HEADER_TEXT);
    draw_row(&mut content, layout, header, header_bottom, HEADER_BOTTOM_PADDING, Font::Bold);

    set_fill(&mut content, BODY_TEXT);
    for (idx, row) in rows.iter().enumerate() {
        let row_bottom = header_bottom - (idx + 1) as f64 * ROW_HEIGHT;
        draw_row(&mut content, layout, row, row_bottom, V_PADDING, Font::Regular);
    }

    // Grid
    content.push_str(&format!("{:.3} {:.3} {:.3} RG\n", GRID.0, GRID.1, GRID.2));
    content.push_str(&format!("{GRID_WIDTH:.1} w\n"));
    let right = layout.left + width;
    let row_lines = (1..=rows.len()).map(|i| header_bottom - i as f64 * ROW_HEIGHT);
    for y in [top, header_bottom].into_iter().chain(row_lines) {
        content.push_str(&format!("{:.2} {y:.2} m {right:.2} {y:.2} l S\n", layout.left));
    }
    let mut x = layout.left;
    content.push_str(&format!("{x:.2} {top:.2} m {x:.2} {bottom:.2} l S\n"));
    for col_width in &layout.col_widths {
        x += col_width;
        content.push_str(&format!("{x:.2} {top:.2} m {x:.2} {bottom:.2} l S\n"));
    }

    content
}

/// Draw one line of centered cell text
fn draw_row(
    content: &mut String,
    layout: &TableLayout,
    values: &[&str],
    row_bottom: f64,
    bottom_padding: f64,
    font: Font,
) {
    let baseline = row_bottom + bottom_padding + DESCENT;
    let mut x = layout.left;

    for (value, col_width) in values.iter().zip(&layout.col_widths) {
        let text = fit_text(value, font, col_width - 2.0 * H_PADDING);
        if !text.is_empty() {
            let text_x = x + (col_width - text_width(&text, font)) / 2.0;
            content.push_str("BT\n");
            content.push_str(&format!("{} {FONT_SIZE:.0} Tf\n", font.resource()));
            content.push_str(&format!("{text_x:.2} {baseline:.2} Td\n"));
            content.push_str(&format!("({}) Tj\n", pdf_escape(&text)));
            content.push_str("ET\n");
        }
        x += col_width;
    }
}

fn set_fill(content: &mut String, (r, g, b): Rgb) {
    content.push_str(&format!("{r:.3} {g:.3} {b:.3} rg\n"));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Bold => "/F1",
            Font::Regular => "/F2",
        }
    }

    /// Advance widths of the printable ASCII range, in 1/1000 em
    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    fn char_width(self, ch: char) -> u16 {
        match ch {
            ' '..='~' => self.ascii_widths()[ch as usize - 32],
            _ => 556,
        }
    }
}

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Character as it will be printed: control characters become spaces and
/// anything WinAnsiEncoding cannot carry becomes `?`.
fn printable(ch: char) -> char {
    match ch {
        '\t' | '\n' | '\r' => ' ',
        ' '..='~' | '\u{a0}'..='\u{ff}' => ch,
        _ => '?',
    }
}

fn char_advance(ch: char, font: Font) -> f64 {
    font.char_width(printable(ch)) as f64 * FONT_SIZE / 1000.0
}

/// Width of `text` in points at the table font size
fn text_width(text: &str, font: Font) -> f64 {
    text.chars().map(|ch| char_advance(ch, font)).sum()
}

/// Clip `text` with an ellipsis so it fits in `max_width` points. A column
/// too narrow for the ellipsis itself gets no text at all.
fn fit_text(text: &str, font: Font, max_width: f64) -> Cow<'_, str> {
    if text_width(text, font) <= max_width {
        return Cow::Borrowed(text);
    }

    let budget = max_width - text_width(ELLIPSIS, font);
    if budget < 0.0 {
        return Cow::Borrowed("");
    }
    let mut clipped = String::new();
    let mut used = 0.0;
    for ch in text.chars() {
        let advance = char_advance(ch, font);
        if used + advance > budget {
            break;
        }
        used += advance;
        clipped.push(ch);
    }
    clipped.push_str(ELLIPSIS);
    Cow::Owned(clipped)
}

/// Escape text for a PDF string literal. Latin-1 characters are written as
/// octal escapes so the file stays ASCII.
fn pdf_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars().map(printable) {
        match ch {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ' '..='~' => escaped.push(ch),
            _ => escaped.push_str(&format!("\\{:03o}", ch as u32)),
        }
    }
    escaped
}

/// Minimal PDF file builder. Constructs valid PDF 1.4 files with one content
/// stream per page.
struct PdfBuilder {
    pages: Vec<String>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self { pages: Vec::new() }
    }

    fn add_page(&mut self, content: String) {
        self.pages.push(content);
    }

    /// Build the complete PDF file as bytes.
    ///
    /// Objects 1-5 are the catalog, page tree, fonts and info dictionary;
    /// each page then takes a page object followed by its content stream.
    fn build(&self, title: &str) -> Vec<u8> {
        const FIRST_PAGE_ID: usize = 6;

        let mut pdf = String::new();
        let mut offsets: Vec<usize> = Vec::new();

        pdf.push_str("%PDF-1.4\n");

        let kids = (0..self.pages.len())
            .map(|i| format!("{} 0 R", FIRST_PAGE_ID + 2 * i))
            .collect::<Vec<_>>()
            .join(" ");

        push_object(&mut pdf, &mut offsets, "<< /Type /Catalog /Pages 2 0 R >>");
        push_object(
            &mut pdf,
            &mut offsets,
            &format!(
                "<< /Type /Pages /Kids [{kids}] /Count {} >>",
                self.pages.len()
            ),
        );
        push_object(
            &mut pdf,
            &mut offsets,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
        );
        push_object(
            &mut pdf,
            &mut offsets,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        let created = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ");
        push_object(
            &mut pdf,
            &mut offsets,
            &format!(
                "<< /Title ({}) /Producer ({}) /CreationDate ({created}) >>",
                pdf_escape(title),
                env!("CARGO_PKG_NAME")
            ),
        );

        for (i, content) in self.pages.iter().enumerate() {
            let content_id = FIRST_PAGE_ID + 2 * i + 1;
            push_object(
                &mut pdf,
                &mut offsets,
                &format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                     /Contents {content_id} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>"
                ),
            );
            push_object(
                &mut pdf,
                &mut offsets,
                &format!(
                    "<< /Length {} >>\nstream\n{}\nendstream",
                    content.len(),
                    content
                ),
            );
        }

        // Cross-reference table
        let xref_offset = pdf.len();
        let num_objects = offsets.len() + 1; // +1 for free entry
        pdf.push_str(&format!("xref\n0 {num_objects}\n"));
        pdf.push_str("0000000000 65535 f \n");
        for offset in &offsets {
            pdf.push_str(&format!("{:010} 00000 n \n", offset));
        }

        pdf.push_str(&format!(
            "trailer\n<< /Size {num_objects} /Root 1 0 R /Info 5 0 R >>\n"
        ));
        pdf.push_str(&format!("startxref\n{xref_offset}\n%%EOF\n"));

        pdf.into_bytes()
    }
}

/// Append the next numbered object and record its byte offset
fn push_object(pdf: &mut String, offsets: &mut Vec<usize>, body: &str) {
    offsets.push(pdf.len());
    pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", offsets.len(), body));
}
