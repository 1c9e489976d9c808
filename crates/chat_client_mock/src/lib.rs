//! Deterministic scripted implementation of the `chat_client` contract.
//!
//! No network is involved. `connect` replays a fixed event script on a
//! background thread and `begin_pairing` replays a fixed pairing script. Every
//! outbound command is recorded so tests can assert on what the app asked for.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chat_client::{
    AppStateKind, ChatClient, ClientError, ClientEvent, ClientProfile, Contact, Conversation,
    EventSink, HistoryMessage, HistorySyncChunk, MessageContent, MessageEvent, PairingEvent,
    Presence, PushName, SyncType,
};

/// Stable client identifier used for explicit startup selection.
pub const MOCK_CLIENT_ID: &str = "mock";

/// One recorded outbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Connect,
    BeginPairing,
    SendPresence(Presence),
    FetchContacts,
    FetchAppState(AppStateKind),
    Logout,
}

type SharedSink = Arc<Mutex<Option<EventSink>>>;

pub struct MockClient {
    script: Vec<ClientEvent>,
    pairing_script: Vec<PairingEvent>,
    contacts: Vec<Contact>,
    event_delay: Duration,
    connect_error: Option<ClientError>,
    paired: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    sink: SharedSink,
    calls: Mutex<Vec<MockCall>>,
}

impl MockClient {
    const DEMO_EVENT_DELAY_MS: u64 = 400;
    const PAIRING_DELAY_MS: u64 = 1_500;

    /// Creates an unpaired client that replays `script` after `connect`.
    #[must_use]
    pub fn new(script: Vec<ClientEvent>) -> Self {
        Self {
            script,
            pairing_script: vec![
                PairingEvent::Code("2@mock-pairing-code".to_string()),
                PairingEvent::Success,
            ],
            contacts: Vec::new(),
            event_delay: Duration::ZERO,
            connect_error: None,
            paired: Arc::new(AtomicBool::new(false)),
            connected: Arc::new(AtomicBool::new(false)),
            sink: Arc::new(Mutex::new(None)),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn paired(self, paired: bool) -> Self {
        self.paired.store(paired, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn with_pairing_script(mut self, pairing_script: Vec<PairingEvent>) -> Self {
        self.pairing_script = pairing_script;
        self
    }

    #[must_use]
    pub fn with_contacts(mut self, contacts: Vec<Contact>) -> Self {
        self.contacts = contacts;
        self
    }

    /// Delay before each scripted event and pairing item.
    #[must_use]
    pub fn with_event_delay(mut self, event_delay: Duration) -> Self {
        self.event_delay = event_delay;
        self
    }

    /// Makes every `connect` call fail with `error`.
    #[must_use]
    pub fn failing_connect(mut self, error: ClientError) -> Self {
        self.connect_error = Some(error);
        self
    }

    /// Commands received so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        lock_unpoisoned(&self.calls).clone()
    }

    /// Delivers `event` to the installed handler on the caller's thread.
    pub fn emit(&self, event: ClientEvent) {
        deliver(&self.sink, event);
    }

    fn record(&self, call: MockCall) {
        lock_unpoisoned(&self.calls).push(call);
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new(demo_script())
            .with_contacts(demo_contacts())
            .with_event_delay(Duration::from_millis(Self::DEMO_EVENT_DELAY_MS))
            .with_pairing_script(vec![
                PairingEvent::Code("2@mock-pairing-code".to_string()),
                PairingEvent::Other("waiting for scan".to_string()),
                PairingEvent::Success,
            ])
    }
}

impl ChatClient for MockClient {
    fn profile(&self) -> ClientProfile {
        ClientProfile {
            client_id: MOCK_CLIENT_ID.to_string(),
            device_name: "mock device".to_string(),
        }
    }

    fn is_paired(&self) -> bool {
        self.paired.load(Ordering::SeqCst)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_event_handler(&self, sink: EventSink) {
        *lock_unpoisoned(&self.sink) = Some(sink);
    }

    fn connect(&self) -> Result<(), ClientError> {
        self.record(MockCall::Connect);
        if let Some(error) = self.connect_error.clone() {
            return Err(error);
        }
        if !self.is_paired() {
            // Pairing connects on its own once the code is scanned.
            return Ok(());
        }
        if self.connected.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let sink = Arc::clone(&self.sink);
        let script = self.script.clone();
        let delay = self.event_delay;
        spawn_named("chat-mock-events", move || {
            deliver(&sink, ClientEvent::Connected);
            for event in script {
                pause(delay);
                deliver(&sink, event);
            }
        });
        Ok(())
    }

    fn begin_pairing(&self) -> Result<Receiver<PairingEvent>, ClientError> {
        self.record(MockCall::BeginPairing);
        if self.is_paired() {
            return Err(ClientError::Pairing("device is already paired".to_string()));
        }

        let (tx, rx) = mpsc::channel();
        let pairing_script = self.pairing_script.clone();
        let paired = Arc::clone(&self.paired);
        let connected = Arc::clone(&self.connected);
        let sink = Arc::clone(&self.sink);
        let script = self.script.clone();
        let delay = self.event_delay;
        let code_delay = if delay.is_zero() {
            Duration::ZERO
        } else {
            Duration::from_millis(Self::PAIRING_DELAY_MS)
        };

        spawn_named("chat-mock-pairing", move || {
            for event in pairing_script {
                pause(if matches!(event, PairingEvent::Success) {
                    code_delay
                } else {
                    delay
                });
                let success = matches!(event, PairingEvent::Success);
                let terminal = event.is_terminal();
                if tx.send(event).is_err() {
                    return;
                }
                if success {
                    // Connected first, so a racing `connect` never replays the script twice.
                    connected.store(true, Ordering::SeqCst);
                    paired.store(true, Ordering::SeqCst);
                    deliver(&sink, ClientEvent::Connected);
                    for event in script {
                        pause(delay);
                        deliver(&sink, event);
                    }
                    return;
                }
                if terminal {
                    return;
                }
            }
        });
        Ok(rx)
    }

    fn send_presence(&self, presence: Presence) -> Result<(), ClientError> {
        self.record(MockCall::SendPresence(presence));
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        Ok(())
    }

    fn fetch_contacts(&self) -> Result<Vec<Contact>, ClientError> {
        self.record(MockCall::FetchContacts);
        Ok(self.contacts.clone())
    }

    fn fetch_app_state(&self, kind: AppStateKind) -> Result<(), ClientError> {
        self.record(MockCall::FetchAppState(kind));
        if !self.is_paired() {
            return Err(ClientError::NotPaired);
        }
        Ok(())
    }

    fn logout(&self) -> Result<(), ClientError> {
        self.record(MockCall::Logout);
        self.paired.store(false, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Demo conversation set used by `MockClient::default()`.
#[must_use]
pub fn demo_script() -> Vec<ClientEvent> {
    const BASE: i64 = 1_771_000_000;

    let text = |sender: &str, from_me: bool, offset: i64, body: &str| HistoryMessage {
        sender_id: sender.to_string(),
        sender_name: None,
        from_me,
        timestamp: BASE + offset,
        message_type: "text".to_string(),
        content: Some(MessageContent::Text(body.to_string())),
    };

    vec![
        ClientEvent::HistorySync(HistorySyncChunk {
            progress: 35,
            chunk_order: 1,
            sync_type: Some(SyncType::InitialBootstrap),
            conversations: vec![
                Conversation {
                    id: "alice@s.mock".to_string(),
                    name: None,
                    last_msg_timestamp: BASE + 120,
                    unread_count: 1,
                    messages: vec![
                        text("me@s.mock", true, 60, "are we still on for friday?"),
                        text("alice@s.mock", false, 120, "yes! 7pm at the usual place"),
                    ],
                },
                Conversation {
                    id: "team@g.mock".to_string(),
                    name: Some("Release team".to_string()),
                    last_msg_timestamp: BASE + 90,
                    unread_count: 4,
                    messages: vec![HistoryMessage {
                        sender_id: "bob@s.mock".to_string(),
                        sender_name: Some("Bob".to_string()),
                        from_me: false,
                        timestamp: BASE + 90,
                        message_type: "document".to_string(),
                        content: Some(MessageContent::Document {
                            title: "release-notes.pdf".to_string(),
                        }),
                    }],
                },
            ],
            push_names: vec![PushName {
                id: "bob@s.mock".to_string(),
                push_name: "Bob".to_string(),
            }],
        }),
        ClientEvent::HistorySync(HistorySyncChunk {
            progress: 70,
            chunk_order: 2,
            sync_type: Some(SyncType::Recent),
            conversations: vec![Conversation {
                id: "carol@s.mock".to_string(),
                name: Some("Carol".to_string()),
                last_msg_timestamp: BASE + 30,
                unread_count: 0,
                messages: vec![HistoryMessage {
                    sender_id: "carol@s.mock".to_string(),
                    sender_name: None,
                    from_me: false,
                    timestamp: BASE + 30,
                    message_type: "location".to_string(),
                    content: Some(MessageContent::Location {
                        latitude: 48.858_37,
                        longitude: 2.294_481,
                    }),
                }],
            }],
            push_names: Vec::new(),
        }),
        ClientEvent::HistorySync(HistorySyncChunk {
            progress: 100,
            chunk_order: 3,
            sync_type: Some(SyncType::Full),
            conversations: Vec::new(),
            push_names: Vec::new(),
        }),
        ClientEvent::Message(MessageEvent {
            chat_id: "carol@s.mock".to_string(),
            sender_id: "carol@s.mock".to_string(),
            sender_name: Some("Carol".to_string()),
            from_me: false,
            timestamp: BASE + 300,
            message_type: "image".to_string(),
            content: Some(MessageContent::Image { caption: None }),
        }),
        ClientEvent::Message(MessageEvent {
            chat_id: "dave@s.mock".to_string(),
            sender_id: "dave@s.mock".to_string(),
            sender_name: Some("Dave".to_string()),
            from_me: false,
            timestamp: BASE + 360,
            message_type: "text".to_string(),
            content: Some(MessageContent::Text("hey, long time no see".to_string())),
        }),
    ]
}

#[must_use]
pub fn demo_contacts() -> Vec<Contact> {
    vec![Contact {
        id: "alice@s.mock".to_string(),
        full_name: Some("Alice Liddell".to_string()),
        first_name: Some("Alice".to_string()),
        push_name: None,
    }]
}

fn deliver(sink: &SharedSink, event: ClientEvent) {
    if let Some(sink) = lock_unpoisoned(sink).as_ref() {
        sink(event);
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

fn spawn_named<F>(name: &str, task: F)
where
    F: FnOnce() + Send + 'static,
{
    // A failed spawn only loses scripted demo events.
    let _ = thread::Builder::new().name(name.to_string()).spawn(task);
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::Sender;

    use super::*;

    const WAIT: Duration = Duration::from_secs(2);

    fn install_channel(client: &MockClient) -> Receiver<ClientEvent> {
        let (tx, rx) = mpsc::channel();
        let tx: Mutex<Sender<ClientEvent>> = Mutex::new(tx);
        client.set_event_handler(Box::new(move |event| {
            let _ = lock_unpoisoned(&tx).send(event);
        }));
        rx
    }

    fn progress_chunk(progress: u32) -> ClientEvent {
        ClientEvent::HistorySync(HistorySyncChunk {
            progress,
            chunk_order: 1,
            ..HistorySyncChunk::default()
        })
    }

    #[test]
    fn profile_exposes_explicit_mock_identity() {
        assert_eq!(MockClient::new(Vec::new()).profile().client_id, MOCK_CLIENT_ID);
    }

    #[test]
    fn paired_connect_emits_connected_then_script_in_order() {
        let client = MockClient::new(vec![progress_chunk(50), progress_chunk(100)]).paired(true);
        let rx = install_channel(&client);

        client.connect().expect("connect should succeed");

        assert_eq!(rx.recv_timeout(WAIT).expect("connected"), ClientEvent::Connected);
        assert_eq!(rx.recv_timeout(WAIT).expect("first chunk"), progress_chunk(50));
        assert_eq!(rx.recv_timeout(WAIT).expect("second chunk"), progress_chunk(100));
        assert!(client.is_connected());
        assert_eq!(client.calls(), vec![MockCall::Connect]);
    }

    #[test]
    fn unpaired_connect_is_a_quiet_no_op() {
        let client = MockClient::new(vec![progress_chunk(50)]);
        let rx = install_channel(&client);

        client.connect().expect("connect should succeed");
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert!(!client.is_connected());
    }

    #[test]
    fn pairing_yields_code_then_success_and_starts_the_session() {
        let client = MockClient::new(vec![progress_chunk(10)]);
        let events = install_channel(&client);

        let pairing = client.begin_pairing().expect("pairing should start");
        let items: Vec<_> = pairing.iter().collect();

        assert_eq!(
            items,
            vec![
                PairingEvent::Code("2@mock-pairing-code".to_string()),
                PairingEvent::Success,
            ]
        );
        assert_eq!(events.recv_timeout(WAIT).expect("connected"), ClientEvent::Connected);
        assert_eq!(events.recv_timeout(WAIT).expect("chunk"), progress_chunk(10));
        assert!(client.is_paired());
    }

    #[test]
    fn failed_pairing_stream_stops_at_terminal_item() {
        let client = MockClient::new(Vec::new()).with_pairing_script(vec![
            PairingEvent::Code("2@one".to_string()),
            PairingEvent::Timeout,
            PairingEvent::Success,
        ]);

        let items: Vec<_> = client.begin_pairing().expect("pairing").iter().collect();
        assert_eq!(items.last(), Some(&PairingEvent::Timeout));
        assert!(!client.is_paired());
    }

    #[test]
    fn commands_are_recorded_and_logout_unpairs() {
        let client = MockClient::new(Vec::new())
            .paired(true)
            .with_contacts(demo_contacts());

        client.connect().expect("connect");
        client
            .send_presence(Presence::Available)
            .expect("presence while connected");
        assert_eq!(client.fetch_contacts().expect("contacts"), demo_contacts());
        client
            .fetch_app_state(AppStateKind::Contacts)
            .expect("app state");
        client.logout().expect("logout");

        assert_eq!(
            client.calls(),
            vec![
                MockCall::Connect,
                MockCall::SendPresence(Presence::Available),
                MockCall::FetchContacts,
                MockCall::FetchAppState(AppStateKind::Contacts),
                MockCall::Logout,
            ]
        );
        assert!(!client.is_paired());
        assert_eq!(
            client.send_presence(Presence::Unavailable),
            Err(ClientError::NotConnected)
        );
    }

    #[test]
    fn failing_connect_reports_configured_error() {
        let client = MockClient::new(Vec::new())
            .paired(true)
            .failing_connect(ClientError::Connect("offline".to_string()));

        assert_eq!(
            client.connect(),
            Err(ClientError::Connect("offline".to_string()))
        );
        assert!(!client.is_connected());
    }

    #[test]
    fn demo_script_ends_history_at_full_progress() {
        let last_progress = demo_script()
            .iter()
            .filter_map(|event| match event {
                ClientEvent::HistorySync(chunk) => Some(chunk.progress),
                _ => None,
            })
            .last();
        assert_eq!(last_progress, Some(100));
    }
}
