use std::cmp::Ordering;

use time::OffsetDateTime;

/// Progress value at which a history sync is considered complete.
pub const SYNC_COMPLETE: u8 = 100;

/// One conversation summary as shown in the room list and persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Room {
    pub id: String,
    pub title: String,
    pub last_message: String,
    /// Last activity; `None` means unknown and sorts after every known time.
    pub time: Option<OffsetDateTime>,
    pub unread_count: u32,
}

impl Room {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_last_message(mut self, last_message: impl Into<String>) -> Self {
        self.last_message = last_message.into();
        self
    }

    #[must_use]
    pub fn at_unix(mut self, seconds: i64) -> Self {
        self.time = time_from_unix(seconds);
        self
    }

    #[must_use]
    pub fn with_unread(mut self, unread_count: u32) -> Self {
        self.unread_count = unread_count;
        self
    }

    /// Last activity as unix seconds, `0` when unknown.
    #[must_use]
    pub fn unix_time(&self) -> i64 {
        self.time.map(OffsetDateTime::unix_timestamp).unwrap_or(0)
    }
}

/// Room list total order: newest activity first, ties broken by ascending id.
#[must_use]
pub fn compare_rooms(a: &Room, b: &Room) -> Ordering {
    b.time.cmp(&a.time).then_with(|| a.id.cmp(&b.id))
}

pub fn sort_rooms(rooms: &mut [Room]) {
    rooms.sort_by(compare_rooms);
}

/// Converts unix seconds into a timestamp; non-positive values mean "unknown".
#[must_use]
pub fn time_from_unix(seconds: i64) -> Option<OffsetDateTime> {
    if seconds <= 0 {
        return None;
    }
    OffsetDateTime::from_unix_timestamp(seconds).ok()
}

/// Singleton history-sync checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncState {
    pub progress: u8,
    pub chunk_order: u32,
    pub sync_type: String,
    pub in_progress: bool,
    /// Stamped by the store on every write.
    pub updated_at: Option<OffsetDateTime>,
}

impl SyncState {
    #[must_use]
    pub fn new(progress: u32, chunk_order: u32, sync_type: impl Into<String>) -> Self {
        let progress = clamp_progress(progress);
        Self {
            progress,
            chunk_order,
            sync_type: sync_type.into(),
            in_progress: progress < SYNC_COMPLETE,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= SYNC_COMPLETE
    }

    /// Whether local history can be shown without waiting for a sync to catch up.
    #[must_use]
    pub fn history_ready(&self) -> bool {
        self.is_complete() || !self.in_progress
    }
}

#[must_use]
pub fn clamp_progress(progress: u32) -> u8 {
    progress.min(u32::from(SYNC_COMPLETE)) as u8
}
