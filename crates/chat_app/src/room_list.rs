//! Ordered room list with id-stable cursor and opened selection.
//!
//! Indices are never trusted across a mutation: every structural change
//! captures the selected ids first, re-sorts, and then looks the ids up again.

use std::collections::HashMap;
use std::ops::Range;

use chat_store::{sort_rooms, Room};

/// Terminal rows used by one room entry in the list view.
pub const ROWS_PER_ROOM: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomList {
    rooms: Vec<Room>,
    cursor: Option<usize>,
    opened: Option<usize>,
}

struct Selection {
    cursor: Option<(usize, String)>,
    opened: Option<String>,
}

impl RoomList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn opened_index(&self) -> Option<usize> {
        self.opened
    }

    pub fn get(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    /// Installs a full room set. Duplicate ids keep the last occurrence.
    pub fn replace_all(&mut self, rooms: Vec<Room>) {
        let selection = self.selection();
        let mut by_id: HashMap<String, Room> = HashMap::with_capacity(rooms.len());
        for room in rooms {
            by_id.insert(room.id.clone(), room);
        }
        self.rooms = by_id.into_values().collect();
        self.restore(selection);
    }

    /// Inserts or overwrites by id, keeping the total order.
    pub fn upsert(&mut self, room: Room) {
        let selection = self.selection();
        match self.rooms.iter_mut().find(|existing| existing.id == room.id) {
            Some(existing) => *existing = room,
            None => self.rooms.push(room),
        }
        self.restore(selection);
    }

    /// Applies `change` to the room with `id` and returns the updated copy.
    pub fn update(&mut self, id: &str, change: impl FnOnce(&mut Room)) -> Option<Room> {
        let selection = self.selection();
        let room = self.rooms.iter_mut().find(|room| room.id == id)?;
        change(room);
        let updated = room.clone();
        self.restore(selection);
        Some(updated)
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        let Some(cursor) = self.cursor else {
            return;
        };
        self.cursor = Some(match direction {
            Direction::Up => cursor.saturating_sub(1),
            Direction::Down => (cursor + 1).min(self.rooms.len() - 1),
        });
    }

    pub fn cursor_to_top(&mut self) {
        if !self.rooms.is_empty() {
            self.cursor = Some(0);
        }
    }

    pub fn cursor_to_bottom(&mut self) {
        if !self.rooms.is_empty() {
            self.cursor = Some(self.rooms.len() - 1);
        }
    }

    pub fn open(&mut self) {
        self.opened = self.cursor;
    }

    pub fn close(&mut self) {
        self.opened = None;
    }

    pub fn opened_room(&self) -> Option<&Room> {
        self.opened.and_then(|index| self.rooms.get(index))
    }

    pub fn cursor_room(&self) -> Option<&Room> {
        self.cursor.and_then(|index| self.rooms.get(index))
    }

    /// Rooms that fit in `height` rows, scrolled so the cursor stays visible.
    pub fn visible_range(&self, height: usize) -> Range<usize> {
        let capacity = (height / ROWS_PER_ROOM).max(1);
        let cursor = self.cursor.unwrap_or(0);
        let start = (cursor + 1).saturating_sub(capacity);
        let end = (start + capacity).min(self.rooms.len());
        start.min(end)..end
    }

    fn selection(&self) -> Selection {
        Selection {
            cursor: self
                .cursor_room()
                .zip(self.cursor)
                .map(|(room, index)| (index, room.id.clone())),
            opened: self.opened_room().map(|room| room.id.clone()),
        }
    }

    fn restore(&mut self, selection: Selection) {
        sort_rooms(&mut self.rooms);

        self.opened = selection.opened.and_then(|id| self.position(&id));
        self.cursor = if self.rooms.is_empty() {
            None
        } else {
            let last = self.rooms.len() - 1;
            match selection.cursor {
                Some((index, id)) => Some(self.position(&id).unwrap_or(index.min(last))),
                None => Some(0),
            }
        };
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.rooms.iter().position(|room| room.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, time: i64) -> Room {
        Room::new(id, id.to_uppercase()).at_unix(time)
    }

    fn ids(list: &RoomList) -> Vec<&str> {
        list.rooms().iter().map(|room| room.id.as_str()).collect()
    }

    #[test]
    fn empty_list_has_no_selection() {
        let mut list = RoomList::new();
        list.move_cursor(Direction::Down);
        list.open();
        assert_eq!(list.cursor(), None);
        assert!(list.cursor_room().is_none());
        assert!(list.opened_room().is_none());
        assert_eq!(list.visible_range(30), 0..0);
    }

    #[test]
    fn first_insert_places_cursor_on_it() {
        let mut list = RoomList::new();
        list.upsert(room("a", 10));
        assert_eq!(list.cursor_room().map(|room| room.id.as_str()), Some("a"));
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut list = RoomList::new();
        list.replace_all(vec![room("a", 30), room("b", 20), room("c", 10)]);

        list.move_cursor(Direction::Up);
        assert_eq!(list.cursor(), Some(0));
        for _ in 0..5 {
            list.move_cursor(Direction::Down);
        }
        assert_eq!(list.cursor(), Some(2));

        list.cursor_to_top();
        assert_eq!(list.cursor(), Some(0));
        list.cursor_to_bottom();
        assert_eq!(list.cursor(), Some(2));
    }

    #[test]
    fn replace_all_dedupes_by_id_keeping_last() {
        let mut list = RoomList::new();
        list.replace_all(vec![room("a", 10), room("b", 20), room("a", 30)]);
        assert_eq!(ids(&list), vec!["a", "b"]);
        assert_eq!(list.get("a").map(Room::unix_time), Some(30));
    }

    #[test]
    fn removed_cursor_room_clamps_to_previous_index() {
        let mut list = RoomList::new();
        list.replace_all(vec![room("a", 30), room("b", 20), room("c", 10)]);
        list.cursor_to_bottom();

        list.replace_all(vec![room("a", 30), room("b", 20)]);
        assert_eq!(list.cursor(), Some(1));
        assert_eq!(list.cursor_room().map(|room| room.id.as_str()), Some("b"));

        list.replace_all(Vec::new());
        assert_eq!(list.cursor(), None);
    }

    #[test]
    fn update_keeps_selection_on_the_same_room() {
        let mut list = RoomList::new();
        list.replace_all(vec![room("a", 30), room("b", 20)]);
        list.move_cursor(Direction::Down);
        list.open();

        let updated = list.update("b", |room| *room = room.clone().at_unix(120));
        assert_eq!(updated.map(|room| room.unix_time()), Some(120));
        assert_eq!(ids(&list), vec!["b", "a"]);
        assert_eq!(list.cursor(), Some(0));
        assert_eq!(list.opened_room().map(|room| room.id.as_str()), Some("b"));
        assert!(list.update("missing", |_| {}).is_none());
    }

    #[test]
    fn visible_range_scrolls_to_keep_cursor_in_view() {
        let mut list = RoomList::new();
        list.replace_all(
            (0..10)
                .map(|index| room(&format!("r{index}"), 100 - index))
                .collect(),
        );

        assert_eq!(list.visible_range(9), 0..3);
        for _ in 0..4 {
            list.move_cursor(Direction::Down);
        }
        assert_eq!(list.visible_range(9), 2..5);
        list.cursor_to_bottom();
        assert_eq!(list.visible_range(9), 7..10);
        assert_eq!(list.visible_range(2), 9..10);
    }
}
