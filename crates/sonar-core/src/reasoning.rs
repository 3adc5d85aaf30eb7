//! Reasoning Block Stripping
//!
//! Reasoning models prefix their answer with a `<think>...</think>`
//! transcript. Everything from the first opening marker to the last closing
//! marker is treated as one opaque block and removed.
//!
//! The cut is index based: markers are never counted or balanced, so separate
//! blocks, nested blocks and stray inner markers all collapse into a single
//! span. Input without a usable closing marker is returned untouched.

/// Opening marker of a reasoning block
pub const THINK_START: &str = "<think>";

/// Closing marker of a reasoning block
pub const THINK_END: &str = "</think>";

/// Remove the reasoning span from model output.
///
/// ```
/// use sonar_core::strip_reasoning;
///
/// assert_eq!(strip_reasoning("<think>plan</think>Answer"), "Answer");
/// assert_eq!(strip_reasoning("no markers"), "no markers");
/// ```
pub fn strip_reasoning(input: &str) -> String {
    match reasoning_span(input) {
        Some((start, end)) => {
            let mut out = String::with_capacity(input.len() - (end - start));
            out.push_str(&input[..start]);
            out.push_str(&input[end..]);
            out
        }
        None => input.to_string(),
    }
}

/// Byte range `[start, end)` covering the first `<think>` through the last `</think>`
fn reasoning_span(input: &str) -> Option<(usize, usize)> {
    let start = input.find(THINK_START)?;
    let close = input.rfind(THINK_END)?;

    // A closing marker before the first opening one cannot terminate it.
    if close < start {
        return None;
    }

    Some((start, close + THINK_END.len()))
}
