//! Full-screen line diff renderer.
//!
//! The screen is treated as a fixed grid of `height` rows. Every frame is
//! normalized to exactly that many rows of exactly `width` cells, so a row
//! either matches the previous frame byte for byte or is rewritten in place.

use crate::core::text::ansi::RESET;
use crate::core::text::fit::fit_to_width;

const SYNC_START: &str = "\x1b[?2026h";
const SYNC_END: &str = "\x1b[?2026l";
const CLEAR_ALL: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Default)]
pub struct ScreenRenderer {
    previous_rows: Vec<String>,
    previous_size: (usize, usize),
    force_full_redraw_next: bool,
}

impl ScreenRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_full_redraw_next(&mut self) {
        self.force_full_redraw_next = true;
    }

    /// Rows as last written, after normalization.
    pub fn previous_rows(&self) -> &[String] {
        &self.previous_rows
    }

    /// Returns the bytes that bring the screen from the last frame to `lines`.
    ///
    /// Empty when nothing changed.
    pub fn render(&mut self, lines: &[String], width: usize, height: usize) -> String {
        let rows = normalize(lines, width, height);
        let full = std::mem::take(&mut self.force_full_redraw_next)
            || self.previous_size != (width, height)
            || self.previous_rows.len() != rows.len();

        let mut buffer = String::new();
        if full {
            buffer.push_str(SYNC_START);
            buffer.push_str(CLEAR_ALL);
            for (index, row) in rows.iter().enumerate() {
                push_row(&mut buffer, index, row);
            }
            buffer.push_str(SYNC_END);
        } else {
            let changed: Vec<usize> = rows
                .iter()
                .zip(&self.previous_rows)
                .enumerate()
                .filter(|(_, (new, old))| new != old)
                .map(|(index, _)| index)
                .collect();
            if !changed.is_empty() {
                buffer.push_str(SYNC_START);
                for index in changed {
                    push_row(&mut buffer, index, &rows[index]);
                }
                buffer.push_str(SYNC_END);
            }
        }

        self.previous_rows = rows;
        self.previous_size = (width, height);
        buffer
    }
}

fn normalize(lines: &[String], width: usize, height: usize) -> Vec<String> {
    let blank = " ".repeat(width);
    let mut rows: Vec<String> = lines
        .iter()
        .take(height)
        .map(|line| fit_to_width(&line.replace(['\r', '\n'], " "), width))
        .collect();
    rows.resize(height, blank);
    rows
}

fn push_row(buffer: &mut String, index: usize, row: &str) {
    buffer.push_str(&format!("\x1b[{};1H", index + 1));
    buffer.push_str(row);
    buffer.push_str(RESET);
}
