use std::collections::HashMap;
use std::path::Path;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use crate::error::StorageError;
use crate::room::{clamp_progress, sort_rooms, Room, SyncState, SYNC_COMPLETE};
use crate::schema::{JsonLine, RoomRecord, StoreHeader, SyncRecord, STORE_VERSION};

/// Result of reading the store file from the top.
#[derive(Debug)]
pub(crate) struct Replay {
    pub(crate) header: StoreHeader,
    pub(crate) rooms: HashMap<String, RoomRecord>,
    pub(crate) sync: Option<SyncRecord>,
    pub(crate) records: usize,
    /// Byte length of the fully terminated prefix of the file.
    pub(crate) valid_len: u64,
    pub(crate) torn_tail: bool,
}

impl Replay {
    pub(crate) fn rooms(&self) -> Vec<Room> {
        let mut rooms = self
            .rooms
            .values()
            .cloned()
            .map(RoomRecord::into_room)
            .collect::<Vec<_>>();
        sort_rooms(&mut rooms);
        rooms
    }

    pub(crate) fn sync_state(&self) -> SyncState {
        let Some(record) = self.sync.as_ref() else {
            return SyncState::default();
        };

        SyncState {
            progress: clamp_progress(record.progress),
            chunk_order: record.chunk_order,
            sync_type: record.sync_type.clone(),
            in_progress: record.in_progress,
            updated_at: OffsetDateTime::parse(&record.updated_at, &Rfc3339).ok(),
        }
    }
}

pub(crate) fn replay_bytes(path: &Path, bytes: &[u8]) -> Result<Replay, StorageError> {
    let mut header: Option<StoreHeader> = None;
    let mut rooms = HashMap::new();
    let mut sync = None;
    let mut records = 0usize;
    let mut valid_len = 0u64;
    let mut torn_tail = false;

    let mut offset = 0usize;
    let mut line_number = 0usize;
    while offset < bytes.len() {
        line_number += 1;
        let (raw, terminated) = match bytes[offset..].iter().position(|byte| *byte == b'\n') {
            Some(end) => (&bytes[offset..offset + end], true),
            None => (&bytes[offset..], false),
        };
        if !terminated {
            warn!(path = %path.display(), line = line_number, "discarding torn trailing store record");
            torn_tail = true;
            break;
        }
        let next_offset = offset + raw.len() + 1;

        let line = std::str::from_utf8(raw).map_err(|source| {
            StorageError::io_line(
                path,
                line_number,
                std::io::Error::new(std::io::ErrorKind::InvalidData, source),
            )
        })?;
        let parsed = parse_json_line(path, line_number, line)?;

        if line_number == 1 {
            match parsed {
                JsonLine::Store(parsed_header) => {
                    validate_header_line(path, line_number, &parsed_header)?;
                    header = Some(parsed_header);
                }
                JsonLine::Room(_) | JsonLine::History(_) => {
                    return Err(StorageError::InvalidHeaderRecord {
                        path: path.to_path_buf(),
                        line: line_number,
                    });
                }
            }
        } else {
            match parsed {
                JsonLine::Store(_) => {
                    return Err(StorageError::InvalidRecord {
                        path: path.to_path_buf(),
                        line: line_number,
                    });
                }
                JsonLine::Room(room) => {
                    validate_room_record(path, line_number, &room)?;
                    rooms.insert(room.id.clone(), room);
                }
                JsonLine::History(history) => {
                    for room in &history.rooms {
                        validate_room_record(path, line_number, room)?;
                    }
                    validate_sync_record(path, line_number, &history.sync)?;
                    for room in history.rooms {
                        rooms.insert(room.id.clone(), room);
                    }
                    sync = Some(history.sync);
                }
            }
            records += 1;
        }

        offset = next_offset;
        valid_len = offset as u64;
    }

    let header = header.ok_or_else(|| StorageError::MissingHeader {
        path: path.to_path_buf(),
    })?;

    Ok(Replay {
        header,
        rooms,
        sync,
        records,
        valid_len,
        torn_tail,
    })
}

pub(crate) fn parse_json_line(
    path: &Path,
    line_number: usize,
    line: &str,
) -> Result<JsonLine, StorageError> {
    serde_json::from_str::<JsonLine>(line)
        .map_err(|source| StorageError::json_line(path, line_number, source))
}

pub(crate) fn validate_header_line(
    path: &Path,
    line_number: usize,
    header: &StoreHeader,
) -> Result<(), StorageError> {
    if header.version != STORE_VERSION {
        return Err(StorageError::UnsupportedVersion {
            path: path.to_path_buf(),
            line: line_number,
            found: header.version,
        });
    }

    validate_rfc3339(path, line_number, "created_at", &header.created_at)
}

fn validate_room_record(
    path: &Path,
    line_number: usize,
    room: &RoomRecord,
) -> Result<(), StorageError> {
    validate_rfc3339(path, line_number, "updated_at", &room.updated_at)
}

fn validate_sync_record(
    path: &Path,
    line_number: usize,
    sync: &SyncRecord,
) -> Result<(), StorageError> {
    if sync.progress > u32::from(SYNC_COMPLETE) {
        return Err(StorageError::InvalidProgress {
            path: path.to_path_buf(),
            line: line_number,
            found: sync.progress,
        });
    }

    validate_rfc3339(path, line_number, "updated_at", &sync.updated_at)
}

pub(crate) fn validate_rfc3339(
    path: &Path,
    line_number: usize,
    field: &'static str,
    value: &str,
) -> Result<(), StorageError> {
    if OffsetDateTime::parse(value, &Rfc3339).is_err() {
        return Err(StorageError::InvalidTimestamp {
            path: path.to_path_buf(),
            line: line_number,
            field,
            value: value.to_string(),
        });
    }

    Ok(())
}
