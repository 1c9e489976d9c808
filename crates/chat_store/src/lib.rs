//! Durable room table and history-sync checkpoint.
//!
//! The store is a single append-only JSON-lines file. Line 1 is a versioned
//! header; every following line is either a single-room upsert or a bulk
//! history record carrying many rooms plus the sync checkpoint. Replay applies
//! records in file order (last writer wins per room id), so each record is one
//! atomic write: a torn trailing line left by a crash is discarded on load and
//! truncated away on the next open.

mod error;
mod paths;
mod replay;
mod room;
mod schema;
mod store;

pub use error::StorageError;
pub use paths::{default_store_path, store_root, STORE_DIR, STORE_FILE_NAME};
pub use room::{
    clamp_progress, compare_rooms, sort_rooms, time_from_unix, Room, SyncState, SYNC_COMPLETE,
};
pub use schema::{HistoryRecord, RoomRecord, StoreHeader, SyncRecord, STORE_VERSION};
pub use store::{ChatStore, COMPACT_THRESHOLD};
