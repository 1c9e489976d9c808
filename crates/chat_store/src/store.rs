use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::paths::compaction_path;
use crate::replay::{replay_bytes, Replay};
use crate::room::{Room, SyncState};
use crate::schema::{HistoryRecord, JsonLine, RoomRecord, StoreHeader, SyncRecord};

/// Record count above which `open` rewrites the file as a single snapshot.
pub const COMPACT_THRESHOLD: usize = 1024;

/// Durable room table plus the singleton sync checkpoint.
///
/// All writes go through one append handle guarded by a mutex, so a bulk history
/// write and a single-room upsert issued from different threads never interleave
/// within a line. Rooms are keyed by id and the last appended record wins.
#[derive(Debug)]
pub struct ChatStore {
    path: PathBuf,
    file: Mutex<File>,
    header: StoreHeader,
}

impl ChatStore {
    /// Opens (or creates) the store file at `path`.
    ///
    /// A torn trailing record is truncated away, and the file is compacted when
    /// it has accumulated more than [`COMPACT_THRESHOLD`] records.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let path = path.to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| StorageError::io("creating store directory", parent, source))?;
        }

        let is_empty = match fs::metadata(&path) {
            Ok(metadata) => metadata.len() == 0,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => true,
            Err(source) => {
                return Err(StorageError::io("reading store metadata", &path, source));
            }
        };
        if is_empty {
            write_fresh_file(&path)?;
        }

        let replay = read_replay(&path)?;
        let file = open_append(&path)?;
        if replay.torn_tail {
            file.set_len(replay.valid_len)
                .map_err(|source| StorageError::io("truncating torn store record", &path, source))?;
        }

        let store = Self {
            path,
            file: Mutex::new(file),
            header: replay.header.clone(),
        };

        if replay.records > COMPACT_THRESHOLD {
            store.compact()?;
        }

        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &StoreHeader {
        &self.header
    }

    /// Returns every stored room ordered by (time desc, id asc) and the sync
    /// checkpoint, or a zero-value checkpoint when none was ever written.
    pub fn load_all(&self) -> Result<(Vec<Room>, SyncState), StorageError> {
        let _file = lock_unpoisoned(&self.file);
        let replay = read_replay(&self.path)?;
        Ok((replay.rooms(), replay.sync_state()))
    }

    /// Upserts all `rooms` and the checkpoint as one record.
    ///
    /// `in_progress` is recomputed from `progress` and both timestamps are
    /// stamped here, whatever the caller passed in.
    pub fn persist_history(&self, rooms: &[Room], sync: &SyncState) -> Result<(), StorageError> {
        let updated_at = now_rfc3339()?;
        let record = HistoryRecord {
            rooms: rooms
                .iter()
                .map(|room| RoomRecord::from_room(room, &updated_at))
                .collect(),
            sync: SyncRecord::from_state(sync, &updated_at),
        };

        debug!(
            rooms = record.rooms.len(),
            progress = record.sync.progress,
            chunk = record.sync.chunk_order,
            "persisting history chunk"
        );
        self.append(&JsonLine::History(record))
    }

    /// Single-row upsert keyed by room id.
    pub fn upsert_room(&self, room: &Room) -> Result<(), StorageError> {
        let updated_at = now_rfc3339()?;
        debug!(room = %room.id, "upserting room");
        self.append(&JsonLine::Room(RoomRecord::from_room(room, &updated_at)))
    }

    /// Rewrites the file as the header plus one snapshot of the replayed state.
    pub fn compact(&self) -> Result<(), StorageError> {
        let mut file = lock_unpoisoned(&self.file);
        let replay = read_replay(&self.path)?;

        let mut rooms = replay.rooms.values().cloned().collect::<Vec<_>>();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));

        let mut lines = vec![JsonLine::Store(replay.header.clone())];
        match replay.sync.clone() {
            Some(sync) => lines.push(JsonLine::History(HistoryRecord { rooms, sync })),
            None => lines.extend(rooms.into_iter().map(JsonLine::Room)),
        }

        let temp_path = compaction_path(&self.path);
        write_lines(&temp_path, &lines)?;
        fs::rename(&temp_path, &self.path)
            .map_err(|source| StorageError::io("replacing compacted store", &self.path, source))?;
        *file = open_append(&self.path)?;

        info!(
            path = %self.path.display(),
            records = replay.records,
            rooms = replay.rooms.len(),
            "compacted chat store"
        );
        Ok(())
    }

    fn append(&self, line: &JsonLine) -> Result<(), StorageError> {
        let mut encoded = serde_json::to_string(line)
            .map_err(|source| StorageError::json_serialize(&self.path, source))?;
        encoded.push('\n');

        let mut file = lock_unpoisoned(&self.file);
        let start_len = file
            .metadata()
            .map_err(|source| StorageError::io("reading store length", &self.path, source))?
            .len();

        let written = file
            .write_all(encoded.as_bytes())
            .and_then(|()| file.sync_data());
        if let Err(source) = written {
            if let Err(truncate_error) = file.set_len(start_len) {
                warn!(
                    path = %self.path.display(),
                    error = %truncate_error,
                    "failed to roll back partial store record"
                );
            }
            return Err(StorageError::io("appending store record", &self.path, source));
        }

        Ok(())
    }
}

fn read_replay(path: &Path) -> Result<Replay, StorageError> {
    let bytes = fs::read(path).map_err(|source| StorageError::io("reading store file", path, source))?;
    replay_bytes(path, &bytes)
}

fn open_append(path: &Path) -> Result<File, StorageError> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|source| StorageError::io("opening store file for append", path, source))
}

fn write_fresh_file(path: &Path) -> Result<(), StorageError> {
    let header = StoreHeader::v1(now_rfc3339()?);
    write_lines(path, &[JsonLine::Store(header)])
}

fn write_lines(path: &Path, lines: &[JsonLine]) -> Result<(), StorageError> {
    let mut contents = String::new();
    for line in lines {
        let encoded =
            serde_json::to_string(line).map_err(|source| StorageError::json_serialize(path, source))?;
        contents.push_str(&encoded);
        contents.push('\n');
    }

    let mut file = File::create(path)
        .map_err(|source| StorageError::io("creating store file", path, source))?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|source| StorageError::io("writing store file", path, source))
}

fn now_rfc3339() -> Result<String, StorageError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(StorageError::ClockFormat)
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
