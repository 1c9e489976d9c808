use serde::{Deserialize, Serialize};

use crate::room::{time_from_unix, Room, SyncState, SYNC_COMPLETE};

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHeader {
    pub version: u32,
    pub created_at: String,
}

impl StoreHeader {
    #[must_use]
    pub fn v1(created_at: impl Into<String>) -> Self {
        Self {
            version: STORE_VERSION,
            created_at: created_at.into(),
        }
    }
}

/// One row of the room table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: String,
    pub title: String,
    pub last_message: String,
    /// Unix seconds, `0` when unknown.
    pub last_ts: i64,
    pub unread_count: u32,
    pub updated_at: String,
}

impl RoomRecord {
    #[must_use]
    pub fn from_room(room: &Room, updated_at: &str) -> Self {
        Self {
            id: room.id.clone(),
            title: room.title.clone(),
            last_message: room.last_message.clone(),
            last_ts: room.unix_time(),
            unread_count: room.unread_count,
            updated_at: updated_at.to_string(),
        }
    }

    #[must_use]
    pub fn into_room(self) -> Room {
        Room {
            id: self.id,
            title: self.title,
            last_message: self.last_message,
            time: time_from_unix(self.last_ts),
            unread_count: self.unread_count,
        }
    }
}

/// The singleton sync checkpoint row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub progress: u32,
    pub chunk_order: u32,
    pub sync_type: String,
    pub in_progress: bool,
    pub updated_at: String,
}

impl SyncRecord {
    /// Builds the row to write; `in_progress` is always derived from `progress`.
    #[must_use]
    pub fn from_state(state: &SyncState, updated_at: &str) -> Self {
        let progress = u32::from(state.progress.min(SYNC_COMPLETE));
        Self {
            progress,
            chunk_order: state.chunk_order,
            sync_type: state.sync_type.clone(),
            in_progress: progress < u32::from(SYNC_COMPLETE),
            updated_at: updated_at.to_string(),
        }
    }
}

/// A bulk history write: every room and the checkpoint land in one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub rooms: Vec<RoomRecord>,
    pub sync: SyncRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum JsonLine {
    Store(StoreHeader),
    Room(RoomRecord),
    History(HistoryRecord),
}
