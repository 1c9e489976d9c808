//! Column width of terminal text.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::ansi::strip_ansi;

const TAB_WIDTH: usize = 3;

#[must_use]
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme == "\t" {
        return TAB_WIDTH;
    }
    // Emoji presentation sequences render two cells wide in practice.
    if grapheme.contains('\u{fe0f}') {
        return 2;
    }
    UnicodeWidthStr::width(grapheme)
}

/// Width in terminal cells, ignoring escape sequences.
#[must_use]
pub fn visible_width(input: &str) -> usize {
    if input.is_empty() {
        return 0;
    }
    strip_ansi(input).graphemes(true).map(grapheme_width).sum()
}
