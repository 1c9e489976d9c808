use std::collections::HashMap;

use chat_client::{
    AppStateKind, ClientEvent, Contact, Conversation, HistoryMessage, HistorySyncChunk,
    MessageEvent, PairingEvent, Presence,
};
use chat_store::{clamp_progress, time_from_unix, Room, SyncState, SYNC_COMPLETE};
use chatterm::InputEvent;
use tracing::{debug, error, info, warn};

use crate::commands::{Action, KeyMap};
use crate::event::AppEvent;
use crate::room_list::{Direction, RoomList};
use crate::session::{Session, SessionState, SyncProgress};
use crate::summary::{format_message_line, summarize, SummaryCache};

/// Side effects the reconciler schedules. Implementations run them off the
/// consumer loop and report back by posting [`AppEvent`]s.
pub trait HostOps {
    fn load_store(&mut self);
    fn init_client(&mut self);
    fn connect(&mut self);
    fn begin_pairing(&mut self);
    fn persist_history(&mut self, rooms: Vec<Room>, sync: SyncState);
    fn persist_room(&mut self, room: Room);
    fn fetch_contacts(&mut self);
    fn fetch_app_state(&mut self, kind: AppStateKind);
    fn send_presence(&mut self, presence: Presence);
    /// Best-effort log-out; posts [`AppEvent::LogoutFinished`] when done.
    fn logout_and_exit(&mut self);
    fn request_render(&mut self);
    fn request_stop(&mut self);
}

const WELCOME_PAIRING_STATUS: &str = "Connecting...";
const PAIRING_SCAN_STATUS: &str = "Scan this code with your phone to link this device";
const SELF_SENDER: &str = "You";

/// Owns all domain state. Only the consumer loop touches it, one event at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    session: Session,
    rooms: RoomList,
    sync: SyncState,
    summaries: SummaryCache,
    contacts: HashMap<String, Contact>,
    /// Conversation names from history sync or the store.
    chat_titles: HashMap<String, String>,
    keymap: KeyMap,
    status: Option<String>,
    dev_notices: bool,
    /// The store load finished, successfully or not.
    store_loaded: bool,
    connected: bool,
    /// Pairing reset the checkpoint; stored progress belongs to the old device.
    fresh_session: bool,
    pub should_exit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new(false)
    }
}

impl App {
    pub fn new(dev_notices: bool) -> Self {
        Self {
            session: Session::new(),
            rooms: RoomList::new(),
            sync: SyncState::default(),
            summaries: SummaryCache::new(),
            contacts: HashMap::new(),
            chat_titles: HashMap::new(),
            keymap: KeyMap::default(),
            status: None,
            dev_notices,
            store_loaded: false,
            connected: false,
            fresh_session: false,
            should_exit: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn rooms(&self) -> &RoomList {
        &self.rooms
    }

    /// In-memory sync checkpoint, as last handed to the store.
    pub fn sync(&self) -> &SyncState {
        &self.sync
    }

    pub fn summaries(&self) -> &SummaryCache {
        &self.summaries
    }

    /// Latest status notice (failed writes, developer notices).
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Kicks off the two startup tasks: store load and client init.
    pub fn start(&mut self, host: &mut dyn HostOps) {
        host.load_store();
        host.init_client();
        host.request_render();
    }

    pub fn handle(&mut self, event: AppEvent, host: &mut dyn HostOps) {
        debug!(kind = event.kind(), state = self.state().label(), "handling event");
        match event {
            AppEvent::Client(event) => self.on_client_event(event, host),
            AppEvent::Pairing(event) => self.on_pairing_event(event, host),
            AppEvent::StoreLoaded { rooms, sync } => self.on_store_loaded(rooms, sync, host),
            AppEvent::StoreLoadFailed(error) => {
                warn!(%error, "starting without saved chats");
                self.store_loaded = true;
                self.settle_connected_state();
                self.notice(format!("Could not load saved chats: {error}"), host);
            }
            AppEvent::ClientReady { paired } => self.on_client_ready(paired, host),
            AppEvent::ClientFailed(error) => self.on_client_failed(&error, host),
            AppEvent::PairingFailed(error) => self.on_pairing_failed(&error, host),
            AppEvent::ContactsLoaded(contacts) => self.on_contacts_loaded(contacts, host),
            AppEvent::ContactsFailed(error) => {
                warn!(%error, "contact fetch failed");
                self.notice(format!("Could not load contacts: {error}"), host);
            }
            AppEvent::PersistFailed(error) => {
                warn!(%error, "store write failed");
                self.notice(format!("Could not save chats: {error}"), host);
            }
            AppEvent::LogoutFinished => self.on_logout_finished(host),
            AppEvent::Input(event) => self.on_input(&event, host),
            AppEvent::Resize => host.request_render(),
        }
    }

    pub fn on_client_event(&mut self, event: ClientEvent, host: &mut dyn HostOps) {
        match event {
            ClientEvent::Connected => self.on_connected(host),
            ClientEvent::LoggedOut { reason } => self.on_logged_out(&reason, host),
            ClientEvent::HistorySync(chunk) => self.on_history_sync(chunk, host),
            ClientEvent::Message(message) => self.on_message(message, host),
            ClientEvent::ContactUpdated {
                id,
                full_name,
                first_name,
            } => {
                let contact = self.contact_entry(&id);
                if full_name.is_some() {
                    contact.full_name = full_name;
                }
                if first_name.is_some() {
                    contact.first_name = first_name;
                }
                self.retitle_and_persist(&[id], host);
            }
            ClientEvent::PushNameChanged { id, push_name } => {
                self.contact_entry(&id).push_name = Some(push_name);
                self.retitle_and_persist(&[id], host);
            }
        }
    }

    /// Seeds state from the store. Rooms already delivered live win over
    /// their stored copies.
    pub fn on_store_loaded(&mut self, stored: Vec<Room>, sync: SyncState, host: &mut dyn HostOps) {
        info!(
            rooms = stored.len(),
            progress = sync.progress,
            in_progress = sync.in_progress,
            "loaded saved chats"
        );

        let mut merged: Vec<Room> = stored
            .into_iter()
            .filter(|room| self.rooms.get(&room.id).is_none())
            .collect();
        for room in &merged {
            if !room.title.is_empty() && room.title != room.id {
                self.chat_titles
                    .entry(room.id.clone())
                    .or_insert_with(|| room.title.clone());
            }
            if !room.last_message.is_empty() {
                self.summaries.seed(
                    &room.id,
                    format_message_line(room.time, &room.title, &room.last_message),
                );
            }
        }
        merged.extend(self.rooms.rooms().iter().cloned());
        self.rooms.replace_all(merged);

        let raised = self.merge_stored_sync(sync);
        if raised {
            host.persist_history(Vec::new(), self.sync.clone());
        }

        match self.state() {
            SessionState::Loading | SessionState::Connecting => {
                if self.sync.in_progress && !self.sync.is_complete() {
                    let progress = self.sync_progress(self.sync.progress);
                    self.session.transition(SessionState::HistorySync(progress));
                } else if self.sync.is_complete() {
                    self.session.transition(SessionState::Ready { overlay: None });
                }
            }
            SessionState::HistorySync(_) if raised => {
                if self.sync.is_complete() {
                    self.session.transition(SessionState::Ready { overlay: None });
                } else {
                    let progress = self.sync_progress(self.sync.progress);
                    self.session.transition(SessionState::HistorySync(progress));
                }
            }
            _ => {}
        }
        self.store_loaded = true;
        self.settle_connected_state();
        host.request_render();
    }

    pub fn on_client_ready(&mut self, paired: bool, host: &mut dyn HostOps) {
        info!(paired, "client ready");
        if paired {
            if matches!(self.state(), SessionState::Loading) {
                self.session.transition(SessionState::Connecting);
            }
            host.connect();
        } else {
            self.session
                .transition(SessionState::Welcome { notice: None });
        }
        host.request_render();
    }

    pub fn on_client_failed(&mut self, message: &str, host: &mut dyn HostOps) {
        error!(error = message, "client failure");
        self.session
            .transition(SessionState::Error(format!("Client error: {message}")));
        host.request_render();
    }

    pub fn on_connected(&mut self, host: &mut dyn HostOps) {
        self.connected = true;
        host.fetch_contacts();
        self.settle_connected_state();
        host.request_render();
    }

    pub fn on_logged_out(&mut self, reason: &str, host: &mut dyn HostOps) {
        warn!(reason, "session terminated by remote");
        self.session.transition(SessionState::Exiting {
            message: format!("Logged out: {reason}"),
        });
        host.logout_and_exit();
        host.request_render();
    }

    pub fn on_history_sync(&mut self, chunk: HistorySyncChunk, host: &mut dyn HostOps) {
        debug!(
            progress = chunk.progress,
            chunk = chunk.chunk_order,
            conversations = chunk.conversations.len(),
            "history chunk"
        );

        let mut renamed = Vec::with_capacity(chunk.push_names.len());
        for hint in chunk.push_names {
            self.contact_entry(&hint.id).push_name = Some(hint.push_name);
            renamed.push(hint.id);
        }

        let mut touched = Vec::with_capacity(chunk.conversations.len());
        for conversation in &chunk.conversations {
            if let Some(name) = non_blank(conversation.name.as_deref()) {
                self.chat_titles
                    .insert(conversation.id.clone(), name.to_string());
            }

            let room = self.room_from_conversation(conversation);
            let lines: Vec<String> = conversation
                .messages
                .iter()
                .map(|message| self.history_line(message))
                .collect();
            if lines.is_empty() {
                if !room.last_message.is_empty() {
                    self.summaries.seed(
                        &room.id,
                        format_message_line(room.time, &room.title, &room.last_message),
                    );
                }
            } else {
                self.summaries.replace(&room.id, lines);
            }

            self.rooms.upsert(room.clone());
            touched.push(room);
        }
        renamed.retain(|id| !touched.iter().any(|room| &room.id == id));
        touched.extend(self.retitle(&renamed));

        let chunk_percent = clamp_progress(chunk.progress);
        if let Some(sync_type) = chunk.sync_type {
            self.sync.sync_type = sync_type.label().to_string();
        }
        self.sync.progress = self.sync.progress.max(chunk_percent);
        self.sync.chunk_order = chunk.chunk_order;
        self.sync.in_progress = !self.sync.is_complete();

        match self.state() {
            SessionState::Ready { .. } => {
                let overlay = (chunk_percent < SYNC_COMPLETE)
                    .then(|| self.sync_progress(chunk_percent));
                self.session.transition(SessionState::Ready { overlay });
            }
            state if state.is_final() => {}
            _ if self.sync.is_complete() => {
                self.session.transition(SessionState::Ready { overlay: None });
            }
            _ => {
                let progress = self.sync_progress(self.sync.progress);
                self.session.transition(SessionState::HistorySync(progress));
            }
        }

        host.persist_history(touched, self.sync.clone());
        host.request_render();
    }

    pub fn on_message(&mut self, message: MessageEvent, host: &mut dyn HostOps) {
        let summary = summarize(message.content.as_ref(), &message.message_type);
        let time = time_from_unix(message.timestamp);
        let opened = self
            .rooms
            .opened_room()
            .is_some_and(|room| room.id == message.chat_id);

        let mut room = self
            .rooms
            .get(&message.chat_id)
            .cloned()
            .unwrap_or_else(|| Room::new(message.chat_id.clone(), ""));
        room.title = self.resolve_title(&message.chat_id);

        let newer = match (time, room.time) {
            (Some(time), Some(current)) => time >= current,
            _ => true,
        };
        if newer {
            room.last_message = summary.clone();
            if time.is_some() {
                room.time = time;
            }
        }
        if !message.from_me && !opened {
            room.unread_count = room.unread_count.saturating_add(1);
        }

        let sender = self.sender_label(
            &message.sender_id,
            message.sender_name.as_deref(),
            message.from_me,
        );
        self.summaries
            .push(&room.id, format_message_line(time, &sender, &summary));
        self.rooms.upsert(room.clone());

        if self.dev_notices {
            self.status = Some(format!("New message in {}", room.title));
        }
        host.persist_room(room);
        host.request_render();
    }

    pub fn on_contacts_loaded(&mut self, contacts: Vec<Contact>, host: &mut dyn HostOps) {
        info!(contacts = contacts.len(), "contacts loaded");
        let mut ids = Vec::with_capacity(contacts.len());
        for contact in contacts {
            let entry = self.contact_entry(&contact.id);
            entry.full_name = contact.full_name.or(entry.full_name.take());
            entry.first_name = contact.first_name.or(entry.first_name.take());
            entry.push_name = contact.push_name.or(entry.push_name.take());
            ids.push(contact.id);
        }
        self.retitle_and_persist(&ids, host);
    }

    pub fn on_pairing_event(&mut self, event: PairingEvent, host: &mut dyn HostOps) {
        let SessionState::Pairing { code, .. } = self.state() else {
            if event == PairingEvent::Success {
                host.fetch_app_state(AppStateKind::Contacts);
            } else {
                debug!(?event, "ignoring pairing event outside pairing");
            }
            return;
        };
        let code = code.clone();

        let notice = match event {
            PairingEvent::Code(code) => {
                self.session.transition(SessionState::Pairing {
                    code: Some(code),
                    status: PAIRING_SCAN_STATUS.to_string(),
                });
                host.request_render();
                return;
            }
            PairingEvent::Other(status) => {
                self.session
                    .transition(SessionState::Pairing { code, status });
                host.request_render();
                return;
            }
            PairingEvent::Success => {
                info!("pairing succeeded, starting a new session");
                self.sync = SyncState::new(0, 0, "");
                self.fresh_session = true;
                host.persist_history(Vec::new(), self.sync.clone());
                let progress = self.sync_progress(0);
                self.session.transition(SessionState::HistorySync(progress));
                host.fetch_app_state(AppStateKind::Contacts);
                host.request_render();
                return;
            }
            PairingEvent::Timeout => "Pairing timed out. Press Enter to try again.".to_string(),
            PairingEvent::UnexpectedEvent => {
                "Pairing failed: unexpected response from the server.".to_string()
            }
            PairingEvent::ClientOutdated => {
                "This client version was rejected as outdated.".to_string()
            }
            PairingEvent::ScannedWithoutMultidevice => {
                "Enable multi-device on your phone, then try again.".to_string()
            }
            PairingEvent::Error(error) => format!("Pairing failed: {error}"),
        };

        warn!(notice, "pairing ended without a session");
        self.session.transition(SessionState::Welcome {
            notice: Some(notice),
        });
        host.request_render();
    }

    pub fn on_pairing_failed(&mut self, message: &str, host: &mut dyn HostOps) {
        warn!(error = message, "pairing could not start");
        if matches!(self.state(), SessionState::Pairing { .. }) {
            self.session.transition(SessionState::Welcome {
                notice: Some(format!("Pairing failed: {message}")),
            });
        }
        host.request_render();
    }

    pub fn on_logout_finished(&mut self, host: &mut dyn HostOps) {
        self.should_exit = true;
        host.request_stop();
    }

    pub fn on_input(&mut self, event: &InputEvent, host: &mut dyn HostOps) {
        match event {
            InputEvent::FocusIn | InputEvent::FocusOut => {
                if matches!(self.state(), SessionState::Ready { .. }) {
                    host.send_presence(if *event == InputEvent::FocusIn {
                        Presence::Available
                    } else {
                        Presence::Unavailable
                    });
                }
                return;
            }
            _ => {}
        }

        let Some(action) = self.keymap.action(event) else {
            return;
        };
        match action {
            Action::Quit => return self.on_quit(host),
            Action::Logout => return self.on_logout_requested(host),
            Action::Open => self.on_open(host),
            Action::Close => self.rooms.close(),
            Action::Up => self.rooms.move_cursor(Direction::Up),
            Action::Down => self.rooms.move_cursor(Direction::Down),
            Action::Top => self.rooms.cursor_to_top(),
            Action::Bottom => self.rooms.cursor_to_bottom(),
        }
        host.request_render();
    }

    pub fn on_quit(&mut self, host: &mut dyn HostOps) {
        self.session.transition(SessionState::Exiting {
            message: "Goodbye".to_string(),
        });
        self.should_exit = true;
        host.request_stop();
        host.request_render();
    }

    fn on_logout_requested(&mut self, host: &mut dyn HostOps) {
        if matches!(self.state(), SessionState::Exiting { .. }) {
            return;
        }
        info!("log-out requested");
        self.session.transition(SessionState::Exiting {
            message: "Logging out...".to_string(),
        });
        host.logout_and_exit();
        host.request_render();
    }

    fn on_open(&mut self, host: &mut dyn HostOps) {
        if matches!(self.state(), SessionState::Welcome { .. }) {
            self.session.transition(SessionState::Pairing {
                code: None,
                status: WELCOME_PAIRING_STATUS.to_string(),
            });
            host.begin_pairing();
            return;
        }
        if !self.state().shows_rooms() {
            return;
        }

        self.rooms.open();
        let Some(id) = self
            .rooms
            .opened_room()
            .filter(|room| room.unread_count > 0)
            .map(|room| room.id.clone())
        else {
            return;
        };
        if let Some(room) = self.rooms.update(&id, |room| room.unread_count = 0) {
            host.persist_room(room);
        }
    }

    /// Leaves the startup states once both the connection and the saved
    /// checkpoint are known.
    fn settle_connected_state(&mut self) {
        if !self.connected || !self.store_loaded {
            return;
        }
        match self.state() {
            SessionState::Loading | SessionState::Connecting | SessionState::HistorySync(_) => {
                if self.sync.history_ready() {
                    self.session.transition(SessionState::Ready { overlay: None });
                } else if !matches!(self.state(), SessionState::HistorySync(_)) {
                    let progress = self.sync_progress(self.sync.progress);
                    self.session.transition(SessionState::HistorySync(progress));
                }
            }
            _ => {}
        }
    }

    /// Folds the stored checkpoint into the live one. Progress never drops,
    /// so chunks that beat the store load cannot undo a finished sync.
    /// Returns whether the stored checkpoint raised live progress.
    fn merge_stored_sync(&mut self, stored: SyncState) -> bool {
        if self.fresh_session {
            return false;
        }
        if self.sync == SyncState::default() {
            self.sync = stored;
            return false;
        }
        if self.sync.sync_type.is_empty() {
            self.sync.sync_type = stored.sync_type;
        }
        if self.sync.chunk_order == 0 {
            self.sync.chunk_order = stored.chunk_order;
        }
        if stored.progress <= self.sync.progress {
            return false;
        }
        debug!(
            live = self.sync.progress,
            stored = stored.progress,
            "stored checkpoint is ahead of live sync"
        );
        self.sync.progress = stored.progress;
        self.sync.in_progress = !self.sync.is_complete();
        true
    }

    fn notice(&mut self, message: String, host: &mut dyn HostOps) {
        self.status = Some(message);
        host.request_render();
    }

    fn sync_progress(&self, percent: u8) -> SyncProgress {
        SyncProgress {
            percent,
            sync_type: self.sync.sync_type.clone(),
        }
    }

    fn contact_entry(&mut self, id: &str) -> &mut Contact {
        self.contacts
            .entry(id.to_string())
            .or_insert_with(|| Contact {
                id: id.to_string(),
                ..Contact::default()
            })
    }

    /// Contact name, then conversation name, then the raw id.
    fn resolve_title(&self, id: &str) -> String {
        self.contacts
            .get(id)
            .and_then(Contact::display_name)
            .or_else(|| non_blank(self.chat_titles.get(id).map(String::as_str)))
            .unwrap_or(id)
            .to_string()
    }

    fn sender_label(&self, sender_id: &str, sender_name: Option<&str>, from_me: bool) -> String {
        if from_me {
            return SELF_SENDER.to_string();
        }
        self.contacts
            .get(sender_id)
            .and_then(Contact::display_name)
            .or_else(|| non_blank(sender_name))
            .unwrap_or(sender_id)
            .to_string()
    }

    fn history_line(&self, message: &HistoryMessage) -> String {
        let sender = self.sender_label(
            &message.sender_id,
            message.sender_name.as_deref(),
            message.from_me,
        );
        format_message_line(
            time_from_unix(message.timestamp),
            &sender,
            &summarize(message.content.as_ref(), &message.message_type),
        )
    }

    fn room_from_conversation(&self, conversation: &Conversation) -> Room {
        let existing = self.rooms.get(&conversation.id);
        let latest = conversation.messages.last();

        let timestamp = if conversation.last_msg_timestamp > 0 {
            conversation.last_msg_timestamp
        } else {
            latest.map_or(0, |message| message.timestamp)
        };
        let mut time = time_from_unix(timestamp);
        let mut last_message = latest
            .map(|message| summarize(message.content.as_ref(), &message.message_type))
            .or_else(|| existing.map(|room| room.last_message.clone()))
            .unwrap_or_default();

        // A live message may already be newer than what history replays.
        if let Some(existing) = existing.filter(|room| room.time > time) {
            time = existing.time;
            last_message = existing.last_message.clone();
        }

        Room {
            id: conversation.id.clone(),
            title: self.resolve_title(&conversation.id),
            last_message,
            time,
            unread_count: conversation.unread_count,
        }
    }

    /// Rewrites titles for `ids` in place and returns the rooms that changed.
    fn retitle(&mut self, ids: &[String]) -> Vec<Room> {
        let mut changed = Vec::new();
        for id in ids {
            let title = self.resolve_title(id);
            if self.rooms.get(id).is_some_and(|room| room.title != title) {
                changed.extend(self.rooms.update(id, |room| room.title = title));
            }
        }
        changed
    }

    fn retitle_and_persist(&mut self, ids: &[String], host: &mut dyn HostOps) {
        let changed = self.retitle(ids);
        if changed.is_empty() {
            return;
        }
        for room in changed {
            host.persist_room(room);
        }
        host.request_render();
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
