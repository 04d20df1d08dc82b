//! Flowing text layout on top of printpdf.
//!
//! printpdf places text at absolute coordinates; this module keeps a cursor,
//! wraps lines against an estimated glyph width and opens a new page whenever
//! the next line would cross the bottom margin.

use printpdf::{IndirectFontRef, Mm, PdfDocumentReference, PdfLayerIndex, PdfLayerReference, PdfPageIndex};

use super::text::sanitize;

/// A4 page width in millimetres.
pub(crate) const PAGE_WIDTH: f32 = 210.0;
/// A4 page height in millimetres.
pub(crate) const PAGE_HEIGHT: f32 = 297.0;
/// Margin on every side in millimetres.
pub(crate) const MARGIN: f32 = 15.0;

/// Width of the label column of [`PageWriter::field`] in millimetres.
const LABEL_WIDTH: f32 = 30.0;

const PT_TO_MM: f32 = 0.352_778;
const LINE_SPACING: f32 = 1.4;

/// Font weight of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    Regular,
    Bold,
}

/// The two faces embedded in a document.
pub(crate) struct Fonts {
    pub regular: IndirectFontRef,
    pub bold: IndirectFontRef,
}

/// Writes lines top to bottom, adding pages as needed.
pub(crate) struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    fonts: Fonts,
    layer: PdfLayerReference,
    /// Distance of the next line's top from the bottom edge, in millimetres.
    cursor: f32,
    pages: usize,
}

impl<'a> PageWriter<'a> {
    pub fn new(
        doc: &'a PdfDocumentReference,
        page: PdfPageIndex,
        layer: PdfLayerIndex,
        fonts: Fonts,
    ) -> Self {
        let layer = doc.get_page(page).get_layer(layer);
        Self {
            doc,
            fonts,
            layer,
            cursor: PAGE_HEIGHT - MARGIN,
            pages: 1,
        }
    }

    /// Number of pages written so far.
    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Write wrapped text. Embedded newlines start new lines; blank lines are kept.
    pub fn paragraph(&mut self, text: &str, style: Style, size: f32, indent: f32) {
        let width = content_width() - indent;
        for line in sanitize(text).split('\n') {
            if line.trim().is_empty() {
                self.advance(line_height(size));
                continue;
            }
            for wrapped in wrap_line(line, width, size) {
                self.write_line(&wrapped, style, size, indent);
            }
        }
    }

    /// Write a `label: value` row, wrapping the value in its own column.
    pub fn field(&mut self, label: &str, value: &str, size: f32) {
        let lines = wrap_line(&sanitize(value).replace('\n', " "), content_width() - LABEL_WIDTH, size);

        for (i, line) in lines.iter().enumerate() {
            let baseline = self.next_baseline(size);
            if i == 0 {
                self.layer
                    .use_text(format!("{}:", label), size, Mm(MARGIN), Mm(baseline), &self.fonts.bold);
            }
            self.layer
                .use_text(line.as_str(), size, Mm(MARGIN + LABEL_WIDTH), Mm(baseline), &self.fonts.regular);
        }
    }

    /// Leave vertical space. Never starts a page by itself.
    pub fn gap(&mut self, mm: f32) {
        self.advance(mm);
    }

    fn write_line(&mut self, text: &str, style: Style, size: f32, indent: f32) {
        let baseline = self.next_baseline(size);
        let font = match style {
            Style::Regular => &self.fonts.regular,
            Style::Bold => &self.fonts.bold,
        };
        self.layer
            .use_text(text, size, Mm(MARGIN + indent), Mm(baseline), font);
    }

    /// Reserve one line, breaking the page if it does not fit, and return its baseline.
    fn next_baseline(&mut self, size: f32) -> f32 {
        let height = line_height(size);
        if self.cursor - height < MARGIN {
            self.new_page();
        }
        let baseline = self.cursor - size * PT_TO_MM;
        self.cursor -= height;
        baseline
    }

    fn advance(&mut self, mm: f32) {
        self.cursor = (self.cursor - mm).max(MARGIN);
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Page {}", self.pages + 1));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }
}

fn content_width() -> f32 {
    PAGE_WIDTH - 2.0 * MARGIN
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

/// Estimated advance of a character as a fraction of the font size.
///
/// Errs on the wide side for DejaVu Sans so wrapped lines stay inside the
/// margins.
fn char_em(c: char) -> f32 {
    match c {
        ' ' => 0.32,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' | '`' => 0.32,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '{' | '}' | '-' | '"' => 0.45,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 1.0,
        'A'..='Z' => 0.78,
        '0'..='9' | 'a'..='z' => 0.64,
        c if is_wide(c) => 1.0,
        _ => 0.72,
    }
}

/// East Asian wide and fullwidth ranges, plus pictographs.
fn is_wide(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1FAFF
            | 0x20000..=0x3FFFD
    )
}

/// Estimated rendered width of `text` in millimetres.
pub(crate) fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(char_em).sum::<f32>() * size * PT_TO_MM
}

/// Greedy word wrap of a single line. Words wider than `max_width` are split.
pub(crate) fn wrap_line(line: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        // A word that does not fit on an empty line is cut into chunks.
        for c in word.chars() {
            current.push(c);
            if text_width(&current, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}
