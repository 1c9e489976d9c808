#![allow(dead_code)]

use chat_app::app::{App, HostOps};
use chat_app::event::AppEvent;
use chat_client::{
    AppStateKind, ClientEvent, Conversation, HistoryMessage, HistorySyncChunk, MessageContent,
    MessageEvent, Presence,
};
use chat_store::{Room, SyncState};
use chatterm::parse_input_events;

/// One side effect scheduled by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    LoadStore,
    InitClient,
    Connect,
    BeginPairing,
    PersistHistory { rooms: Vec<Room>, sync: SyncState },
    PersistRoom(Room),
    FetchContacts,
    FetchAppState(AppStateKind),
    SendPresence(Presence),
    LogoutAndExit,
}

#[derive(Default)]
pub struct HostSpy {
    pub calls: Vec<HostCall>,
    pub render_requests: usize,
    pub stop_requests: usize,
}

impl HostSpy {
    /// Drains recorded calls so each step can be asserted on its own.
    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn persisted_rooms(&self) -> Vec<&Room> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::PersistRoom(room) => Some(room),
                _ => None,
            })
            .collect()
    }

    pub fn last_persisted_sync(&self) -> Option<&SyncState> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::PersistHistory { sync, .. } => Some(sync),
            _ => None,
        })
    }
}

impl HostOps for HostSpy {
    fn load_store(&mut self) {
        self.calls.push(HostCall::LoadStore);
    }

    fn init_client(&mut self) {
        self.calls.push(HostCall::InitClient);
    }

    fn connect(&mut self) {
        self.calls.push(HostCall::Connect);
    }

    fn begin_pairing(&mut self) {
        self.calls.push(HostCall::BeginPairing);
    }

    fn persist_history(&mut self, rooms: Vec<Room>, sync: SyncState) {
        self.calls.push(HostCall::PersistHistory { rooms, sync });
    }

    fn persist_room(&mut self, room: Room) {
        self.calls.push(HostCall::PersistRoom(room));
    }

    fn fetch_contacts(&mut self) {
        self.calls.push(HostCall::FetchContacts);
    }

    fn fetch_app_state(&mut self, kind: AppStateKind) {
        self.calls.push(HostCall::FetchAppState(kind));
    }

    fn send_presence(&mut self, presence: Presence) {
        self.calls.push(HostCall::SendPresence(presence));
    }

    fn logout_and_exit(&mut self) {
        self.calls.push(HostCall::LogoutAndExit);
    }

    fn request_render(&mut self) {
        self.render_requests += 1;
    }

    fn request_stop(&mut self) {
        self.stop_requests += 1;
    }
}

pub fn conversation(id: &str, name: &str, last_msg_timestamp: i64) -> Conversation {
    Conversation {
        id: id.to_string(),
        name: Some(name.to_string()),
        last_msg_timestamp,
        ..Conversation::default()
    }
}

pub fn history_message(sender_id: &str, timestamp: i64, text: &str) -> HistoryMessage {
    HistoryMessage {
        sender_id: sender_id.to_string(),
        sender_name: None,
        from_me: false,
        timestamp,
        message_type: "text".to_string(),
        content: Some(MessageContent::Text(text.to_string())),
    }
}

pub fn chunk(progress: u32, chunk_order: u32, conversations: Vec<Conversation>) -> AppEvent {
    AppEvent::Client(ClientEvent::HistorySync(HistorySyncChunk {
        progress,
        chunk_order,
        conversations,
        ..HistorySyncChunk::default()
    }))
}

pub fn message(chat_id: &str, sender_id: &str, timestamp: i64, text: &str) -> AppEvent {
    AppEvent::Client(ClientEvent::Message(MessageEvent {
        chat_id: chat_id.to_string(),
        sender_id: sender_id.to_string(),
        sender_name: None,
        from_me: false,
        timestamp,
        message_type: "text".to_string(),
        content: Some(MessageContent::Text(text.to_string())),
    }))
}

/// Feeds raw terminal bytes through the key parser into `app`.
pub fn press(app: &mut App, host: &mut HostSpy, raw: &str) {
    for event in parse_input_events(raw) {
        app.handle(AppEvent::Input(event), host);
    }
}

pub fn room_ids(app: &App) -> Vec<&str> {
    app.rooms().rooms().iter().map(|room| room.id.as_str()).collect()
}
