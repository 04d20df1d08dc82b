//! PDF rendering of a single issue.
//!
//! Each issue becomes one A4 document: a header with key and summary, a
//! metadata block, the description, then every comment in API order. Text
//! flows onto as many pages as it needs. Missing values print as `(none)`;
//! a rich-text field with an unexpected shape fails the render with
//! [`RenderError::MalformedField`] so the issue can be reported and skipped.

mod fonts;
mod layout;
mod text;

use printpdf::{Mm, PdfDocument};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::api::Issue;
use layout::{Fonts, PageWriter, Style, PAGE_HEIGHT, PAGE_WIDTH};
use text::rich_text;

/// Printed in place of a missing value.
pub const PLACEHOLDER: &str = "(none)";

const TITLE_SIZE: f32 = 14.0;
const HEADING_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const COMMENT_INDENT: f32 = 4.0;

/// Errors that can occur while rendering an issue.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A field of the issue payload has a shape the renderer cannot print.
    #[error("malformed {field}: {reason}")]
    MalformedField {
        /// The offending field, e.g. "description" or "comment 3".
        field: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The PDF library failed.
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] printpdf::Error),
}

impl RenderError {
    fn malformed(field: &str, reason: impl Into<String>) -> Self {
        RenderError::MalformedField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// A comment reduced to printable text.
struct CommentBlock {
    heading: String,
    body: String,
}

/// Renders issues to PDF using the bundled Unicode fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// Create a renderer.
    pub fn new() -> Self {
        Self
    }

    /// Render an issue to PDF bytes.
    ///
    /// # Errors
    ///
    /// `RenderError::MalformedField` if the description or a comment body is
    /// neither text nor a document; `RenderError::Pdf` if the PDF library
    /// fails.
    #[instrument(skip(self, issue), fields(issue_key = %issue.key))]
    pub fn render(&self, issue: &Issue) -> Result<Vec<u8>, RenderError> {
        // Interpret every rich-text field before drawing anything.
        let description = rich_text("description", issue.fields.description.as_ref())?
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let comments = issue
            .comments()
            .iter()
            .enumerate()
            .map(|(i, comment)| {
                let body = rich_text(&format!("comment {}", i + 1), comment.body.as_ref())?
                    .unwrap_or_else(|| PLACEHOLDER.to_string());
                let author = comment
                    .author
                    .as_ref()
                    .map(|a| a.display_name.as_str())
                    .filter(|name| !name.is_empty())
                    .unwrap_or("(unknown)");
                Ok(CommentBlock {
                    heading: format!("{} ({})", author, or_placeholder(comment.created.as_deref())),
                    body,
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        let summary = or_placeholder(Some(issue.summary()));
        let title = format!("{} - {}", issue.key, summary);

        let (doc, page, layer) = PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
        let faces = Fonts {
            regular: doc.add_external_font(fonts::REGULAR)?,
            bold: doc.add_external_font(fonts::BOLD)?,
        };

        let pages = {
            let mut writer = PageWriter::new(&doc, page, layer, faces);

            writer.paragraph(&title, Style::Bold, TITLE_SIZE, 0.0);
            writer.gap(3.0);

            for (label, value) in metadata(issue) {
                writer.field(label, value, BODY_SIZE);
            }

            writer.gap(4.0);
            writer.paragraph("Description", Style::Bold, HEADING_SIZE, 0.0);
            writer.paragraph(&description, Style::Regular, BODY_SIZE, 0.0);

            writer.gap(4.0);
            writer.paragraph("Comments", Style::Bold, HEADING_SIZE, 0.0);
            if comments.is_empty() {
                writer.paragraph("(no comments)", Style::Regular, BODY_SIZE, 0.0);
            }
            for comment in &comments {
                writer.paragraph(&comment.heading, Style::Bold, BODY_SIZE, 0.0);
                writer.paragraph(&comment.body, Style::Regular, BODY_SIZE, COMMENT_INDENT);
                writer.gap(2.0);
            }

            writer.page_count()
        };

        let bytes = doc.save_to_bytes()?;
        debug!(pages, bytes = bytes.len(), comments = comments.len(), "Rendered issue");
        Ok(bytes)
    }
}

/// The metadata rows, in print order.
fn metadata(issue: &Issue) -> [(&'static str, &str); 8] {
    [
        ("Project", or_placeholder(issue.project_name())),
        ("Type", or_placeholder(issue.issue_type())),
        ("Status", or_placeholder(issue.status())),
        ("Priority", or_placeholder(issue.priority())),
        ("Assignee", or_placeholder(issue.assignee())),
        ("Reporter", or_placeholder(issue.reporter())),
        ("Created", or_placeholder(issue.fields.created.as_deref())),
        ("Updated", or_placeholder(issue.fields.updated.as_deref())),
    ]
}

fn or_placeholder(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(PLACEHOLDER)
}
