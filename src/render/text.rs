//! Rich-text fields to printable plain text.

use serde_json::Value;

use super::RenderError;
use crate::api::AtlassianDoc;

/// Interpret a rich-text field (description or comment body).
///
/// `null` or absent fields and blank text yield `Ok(None)` so the caller can
/// print a placeholder. Plain strings and ADF documents are converted to
/// text. Any other shape is reported as malformed.
pub(crate) fn rich_text(field: &str, value: Option<&Value>) -> Result<Option<String>, RenderError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(non_blank(text)),
        Some(value @ Value::Object(_)) => {
            let doc: AtlassianDoc = serde_json::from_value(value.clone())
                .map_err(|e| RenderError::malformed(field, format!("not a document: {}", e)))?;
            if !doc.is_document() {
                return Err(RenderError::malformed(
                    field,
                    format!("expected a document node, found '{}'", doc.doc_type),
                ));
            }
            Ok(non_blank(&doc.to_plain_text()))
        }
        Some(other) => Err(RenderError::malformed(
            field,
            format!("expected text or a document, found {}", json_kind(other)),
        )),
    }
}

/// Normalize text for the PDF writer: tabs become spaces, line endings
/// become `\n` and remaining control characters are dropped.
pub(crate) fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\t' => out.push_str("    "),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    out.push('\n');
                }
            }
            '\n' => out.push('\n'),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
