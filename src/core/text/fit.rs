//! Truncation and padding to a fixed column budget.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{escape_len, RESET};
use super::width::{grapheme_width, visible_width};

/// Cuts `text` to at most `max_width` cells, appending `ellipsis` when cut.
///
/// Escape sequences are kept in place. If any were emitted before the cut, a
/// reset is inserted ahead of the ellipsis so styling does not bleed into it.
#[must_use]
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str) -> String {
    if max_width == 0 {
        return String::new();
    }
    if visible_width(text) <= max_width {
        return text.to_string();
    }

    let ellipsis_width = visible_width(ellipsis);
    if ellipsis_width >= max_width {
        return take_columns(ellipsis, max_width);
    }
    let budget = max_width - ellipsis_width;

    let mut out = String::with_capacity(text.len());
    let mut used = 0;
    let mut styled = false;
    let mut idx = 0;
    'scan: while idx < text.len() {
        if let Some(len) = escape_len(text, idx) {
            out.push_str(&text[idx..idx + len]);
            styled = true;
            idx += len;
            continue;
        }

        let run_end = next_escape(text, idx);
        for grapheme in text[idx..run_end].graphemes(true) {
            let width = grapheme_width(grapheme);
            if used + width > budget {
                break 'scan;
            }
            out.push_str(grapheme);
            used += width;
        }
        idx = run_end;
    }

    if styled {
        out.push_str(RESET);
    }
    out.push_str(ellipsis);
    out
}

/// Right-pads `text` with spaces to exactly `width` cells (truncating first).
#[must_use]
pub fn fit_to_width(text: &str, width: usize) -> String {
    let fitted = truncate_to_width(text, width, "");
    let used = visible_width(&fitted);
    if used >= width {
        return fitted;
    }
    let mut padded = fitted;
    padded.push_str(&" ".repeat(width - used));
    padded
}

fn take_columns(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let width = grapheme_width(grapheme);
        if used + width > max_width {
            break;
        }
        out.push_str(grapheme);
        used += width;
    }
    out
}

fn next_escape(text: &str, mut idx: usize) -> usize {
    while idx < text.len() {
        if escape_len(text, idx).is_some() {
            break;
        }
        match text[idx..].chars().next() {
            Some(ch) => idx += ch.len_utf8(),
            None => break,
        }
    }
    idx
}
