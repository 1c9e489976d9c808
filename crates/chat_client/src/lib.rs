//! Contract between the chat application and an external messaging client.
//!
//! This crate defines the inbound event stream, the pairing status stream and
//! the outbound command surface. It carries no transport, encryption or
//! protocol code; implementations live in their own crates.

mod content;

use std::fmt;
use std::sync::mpsc::Receiver;

pub use content::{MessageContent, FALLBACK_SUMMARY};

/// Callback the client invokes, from any thread, for every inbound event.
pub type EventSink = Box<dyn Fn(ClientEvent) + Send + Sync + 'static>;

/// Error returned by outbound client commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The command needs a paired device.
    NotPaired,
    /// The command needs a live connection.
    NotConnected,
    Connect(String),
    Pairing(String),
    Request {
        operation: &'static str,
        message: String,
    },
}

impl ClientError {
    #[must_use]
    pub fn request(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            operation,
            message: message.into(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPaired => f.write_str("device is not paired"),
            Self::NotConnected => f.write_str("client is not connected"),
            Self::Connect(message) => write!(f, "failed to connect: {message}"),
            Self::Pairing(message) => write!(f, "pairing failed: {message}"),
            Self::Request { operation, message } => write!(f, "{operation} failed: {message}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Phase label attached to a history sync chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncType {
    InitialBootstrap,
    InitialStatusV3,
    Full,
    Recent,
    PushName,
    NonBlockingData,
    OnDemand,
}

impl SyncType {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::InitialBootstrap => "initial_bootstrap",
            Self::InitialStatusV3 => "initial_status_v3",
            Self::Full => "full",
            Self::Recent => "recent",
            Self::PushName => "push_name",
            Self::NonBlockingData => "non_blocking_data",
            Self::OnDemand => "on_demand",
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One message as replayed inside a history chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryMessage {
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub from_me: bool,
    /// Unix seconds.
    pub timestamp: i64,
    /// Protocol message type, used when `content` is absent.
    pub message_type: String,
    pub content: Option<MessageContent>,
}

/// Conversation metadata delivered by history sync.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conversation {
    pub id: String,
    pub name: Option<String>,
    /// Unix seconds, `0` when unknown.
    pub last_msg_timestamp: i64,
    pub unread_count: u32,
    /// Oldest first.
    pub messages: Vec<HistoryMessage>,
}

/// Display-name hint carried alongside a history chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushName {
    pub id: String,
    pub push_name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySyncChunk {
    /// Percentage reported by the client; may exceed 100 or go backwards.
    pub progress: u32,
    pub chunk_order: u32,
    pub sync_type: Option<SyncType>,
    pub conversations: Vec<Conversation>,
    pub push_names: Vec<PushName>,
}

/// A live message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub chat_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub from_me: bool,
    /// Unix seconds.
    pub timestamp: i64,
    pub message_type: String,
    pub content: Option<MessageContent>,
}

/// Inbound events from the messaging client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connected,
    /// The remote side ended this device's session.
    LoggedOut { reason: String },
    HistorySync(HistorySyncChunk),
    Message(MessageEvent),
    ContactUpdated {
        id: String,
        full_name: Option<String>,
        first_name: Option<String>,
    },
    PushNameChanged { id: String, push_name: String },
}

impl ClientEvent {
    /// Short label used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::LoggedOut { .. } => "logged_out",
            Self::HistorySync(_) => "history_sync",
            Self::Message(_) => "message",
            Self::ContactUpdated { .. } => "contact_updated",
            Self::PushNameChanged { .. } => "push_name_changed",
        }
    }
}

/// Status items yielded by [`ChatClient::begin_pairing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingEvent {
    /// A code to show the user; refreshed codes arrive as further `Code` items.
    Code(String),
    Success,
    Timeout,
    UnexpectedEvent,
    ClientOutdated,
    ScannedWithoutMultidevice,
    Error(String),
    Other(String),
}

impl PairingEvent {
    /// Returns true when no further pairing items follow this one.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Code(_) | Self::Other(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Available,
    Unavailable,
}

/// App-state collections the client can be asked to resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStateKind {
    Contacts,
    Regular,
    RegularLow,
    RegularHigh,
    CriticalBlock,
}

impl AppStateKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Regular => "regular",
            Self::RegularLow => "regular_low",
            Self::RegularHigh => "regular_high",
            Self::CriticalBlock => "critical_block",
        }
    }
}

/// One address-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contact {
    pub id: String,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub push_name: Option<String>,
}

impl Contact {
    /// Best name to show: full name, then first name, then push name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        [&self.full_name, &self.first_name, &self.push_name]
            .into_iter()
            .filter_map(|name| name.as_deref())
            .map(str::trim)
            .find(|name| !name.is_empty())
    }
}

/// Immutable metadata describing a client implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProfile {
    pub client_id: String,
    pub device_name: String,
}

/// Outbound command surface of a messaging client.
///
/// Every method may block on the network; callers run them off the UI thread.
pub trait ChatClient: Send + Sync + 'static {
    fn profile(&self) -> ClientProfile;

    fn is_paired(&self) -> bool;

    fn is_connected(&self) -> bool;

    /// Installs the inbound event callback, replacing any previous one.
    fn set_event_handler(&self, sink: EventSink);

    fn connect(&self) -> Result<(), ClientError>;

    /// Starts pairing a new device. The receiver closes after a terminal item.
    fn begin_pairing(&self) -> Result<Receiver<PairingEvent>, ClientError>;

    fn send_presence(&self, presence: Presence) -> Result<(), ClientError>;

    fn fetch_contacts(&self) -> Result<Vec<Contact>, ClientError>;

    fn fetch_app_state(&self, kind: AppStateKind) -> Result<(), ClientError>;

    fn logout(&self) -> Result<(), ClientError>;
}
