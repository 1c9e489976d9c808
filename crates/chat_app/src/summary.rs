//! One-line message summaries and the per-room recent-lines cache.

use std::collections::{HashMap, VecDeque};

use chat_client::{MessageContent, FALLBACK_SUMMARY};
use chatterm::truncate_to_width;
use time::macros::format_description;
use time::OffsetDateTime;

/// Lines kept per room; older lines are evicted first.
pub const SUMMARY_CACHE_LIMIT: usize = 50;
/// Column budget for a room preview in the list.
pub const PREVIEW_WIDTH: usize = 48;

/// Short human-readable summary of a message; never the raw payload.
pub fn summarize(content: Option<&MessageContent>, message_type: &str) -> String {
    if let Some(summary) = content
        .map(MessageContent::summary)
        .filter(|summary| !summary.trim().is_empty())
    {
        return summary;
    }

    let message_type = message_type.trim();
    if content.is_none() && !message_type.is_empty() {
        format!("{message_type} message")
    } else {
        FALLBACK_SUMMARY.to_string()
    }
}

/// `02 Jan 15:04` in UTC.
pub fn format_stamp(time: OffsetDateTime) -> String {
    time.format(format_description!("[day] [month repr:short] [hour]:[minute]"))
        .unwrap_or_else(|_| time.unix_timestamp().to_string())
}

/// `[02 Jan 15:04] sender: body`
pub fn format_message_line(time: Option<OffsetDateTime>, sender: &str, body: &str) -> String {
    let stamp = time.map(format_stamp).unwrap_or_else(|| "--".to_string());
    format!("[{stamp}] {sender}: {}", single_line(body))
}

/// Single-line preview cut to [`PREVIEW_WIDTH`] columns.
pub fn preview_text(text: &str) -> String {
    truncate_to_width(&single_line(text), PREVIEW_WIDTH, "…")
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryCache {
    rooms: HashMap<String, VecDeque<String>>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, room_id: &str, line: String) {
        let lines = self.rooms.entry(room_id.to_string()).or_default();
        lines.push_back(line);
        while lines.len() > SUMMARY_CACHE_LIMIT {
            lines.pop_front();
        }
    }

    /// Drops any cached lines for `room_id` and keeps the newest of `lines`.
    pub fn replace(&mut self, room_id: &str, lines: Vec<String>) {
        let skip = lines.len().saturating_sub(SUMMARY_CACHE_LIMIT);
        self.rooms
            .insert(room_id.to_string(), lines.into_iter().skip(skip).collect());
    }

    /// Adds `line` only when the room has nothing cached yet.
    pub fn seed(&mut self, room_id: &str, line: String) {
        if self.len(room_id) == 0 {
            self.push(room_id, line);
        }
    }

    pub fn lines(&self, room_id: &str) -> impl Iterator<Item = &str> {
        self.rooms
            .get(room_id)
            .into_iter()
            .flat_map(|lines| lines.iter().map(String::as_str))
    }

    pub fn len(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, VecDeque::len)
    }
}
