//! Citation Rendering

use crate::response::SourceRecord;

/// Header placed above the rendered citation lines
pub const SOURCES_HEADER: &str = "Sources:";

/// Render sources as numbered reference lines, 1-indexed in input order.
///
/// Each line is `[n] title — url`, followed by ` (date)` when a date is known.
/// `last_updated` is intentionally not shown.
pub fn render(sources: &[SourceRecord]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| render_line(i + 1, source))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The `Sources:` block appended to an answer, or `""` when there are no sources
pub fn sources_block(sources: &[SourceRecord]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    format!("{SOURCES_HEADER}\n{}", render(sources))
}

fn render_line(n: usize, source: &SourceRecord) -> String {
    match source.date.as_deref().filter(|d| !d.is_empty()) {
        Some(date) => format!("[{n}] {} — {} ({date})", source.title, source.url),
        None => format!("[{n}] {} — {}", source.title, source.url),
    }
}
