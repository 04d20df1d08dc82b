//! File and folder names inside the export folder.

use std::collections::HashSet;

/// Characters that are not allowed in a file name on at least one platform.
const RESERVED: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest name handed out, in bytes. Common file systems stop at 255.
const MAX_NAME_BYTES: usize = 200;

/// Longer suffixes are not treated as an extension when shortening a name.
const MAX_EXTENSION_BYTES: usize = 32;

/// Make `name` usable as a single path component.
///
/// Reserved and control characters become `_`. A name that is blank or only
/// dots would not name a file, so `fallback` is used instead. Long names are
/// cut to [`MAX_NAME_BYTES`] at a character boundary, keeping the extension.
pub(crate) fn sanitize_component(name: &str, fallback: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c.is_control() || RESERVED.contains(&c) { '_' } else { c })
        .collect();

    if safe.trim().is_empty() || safe.chars().all(|c| c == '.') {
        return fallback.to_string();
    }
    if safe.len() <= MAX_NAME_BYTES {
        return safe;
    }

    match split_extension(&safe) {
        (stem, ext) if !ext.is_empty() && ext.len() <= MAX_EXTENSION_BYTES => fit_name(stem, "", ext),
        _ => fit_name(&safe, "", ""),
    }
}

/// `stem + suffix + ext`, with the stem shortened so the whole fits the budget.
fn fit_name(stem: &str, suffix: &str, ext: &str) -> String {
    let budget = MAX_NAME_BYTES.saturating_sub(suffix.len() + ext.len());
    format!("{}{}{}", truncate_at_char(stem, budget), suffix, ext)
}

/// Longest prefix of `s` of at most `max` bytes that ends on a character boundary.
fn truncate_at_char(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Hands out distinct file names within one issue folder.
///
/// Names are compared case-insensitively. A taken `stem.ext` is retried as
/// `stem_1.ext`, `stem_2.ext` and so on; the first free one wins.
#[derive(Debug, Default)]
pub(crate) struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as used. Returns `false` if it already was.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(name.to_lowercase())
    }

    /// Sanitize `raw` and return a name no earlier call has produced.
    pub fn allocate(&mut self, raw: &str) -> String {
        let name = sanitize_component(raw, "attachment");
        if self.reserve(&name) {
            return name;
        }

        let (stem, ext) = split_extension(&name);
        let mut index = 1u32;
        loop {
            let candidate = fit_name(stem, &format!("_{}", index), ext);
            if self.reserve(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }
}

/// Split `report.final.pdf` into `("report.final", ".pdf")`. Leading dots do
/// not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    }
}
