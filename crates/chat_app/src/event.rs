//! The single event queue consumed by the main loop.

use std::sync::mpsc::{self, Receiver, Sender};

use chat_client::{ClientEvent, Contact, PairingEvent};
use chat_store::{Room, SyncState};
use chatterm::InputEvent;
use tracing::debug;

/// Everything the consumer loop reacts to: client events, results of
/// background tasks, and terminal input.
#[derive(Debug)]
pub enum AppEvent {
    Client(ClientEvent),
    Pairing(PairingEvent),
    StoreLoaded { rooms: Vec<Room>, sync: SyncState },
    StoreLoadFailed(String),
    ClientReady { paired: bool },
    /// Client init or connect failed.
    ClientFailed(String),
    PairingFailed(String),
    ContactsLoaded(Vec<Contact>),
    ContactsFailed(String),
    PersistFailed(String),
    LogoutFinished,
    Input(InputEvent),
    Resize,
}

impl AppEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Client(event) => event.kind(),
            Self::Pairing(_) => "pairing",
            Self::StoreLoaded { .. } => "store_loaded",
            Self::StoreLoadFailed(_) => "store_load_failed",
            Self::ClientReady { .. } => "client_ready",
            Self::ClientFailed(_) => "client_failed",
            Self::PairingFailed(_) => "pairing_failed",
            Self::ContactsLoaded(_) => "contacts_loaded",
            Self::ContactsFailed(_) => "contacts_failed",
            Self::PersistFailed(_) => "persist_failed",
            Self::LogoutFinished => "logout_finished",
            Self::Input(_) => "input",
            Self::Resize => "resize",
        }
    }
}

/// Posting side of the queue; cheap to clone into background tasks.
#[derive(Debug, Clone)]
pub struct EventQueue {
    sender: Sender<AppEvent>,
}

impl EventQueue {
    pub fn new() -> (Self, Receiver<AppEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }

    /// Posts `event`; dropped silently once the consumer has exited.
    pub fn post(&self, event: AppEvent) {
        let kind = event.kind();
        if self.sender.send(event).is_err() {
            debug!(kind, "event queue closed, dropping event");
        }
    }
}
