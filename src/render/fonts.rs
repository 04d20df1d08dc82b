//! Fonts embedded into every exported PDF.
//!
//! DejaVu Sans covers Latin, Greek, Cyrillic and a large share of other
//! scripts, so issue text in most languages renders without substitution.
//! Characters missing from the font are dropped by the PDF writer.
//! Licence: `assets/fonts/LICENSE`.

/// DejaVu Sans, regular weight.
pub(crate) const REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// DejaVu Sans, bold weight.
pub(crate) const BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");
