use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chat_client::{AppStateKind, ChatClient, Presence};
use chat_store::{ChatStore, Room, StorageError, SyncState};
use tracing::{debug, error, warn};

use crate::app::HostOps;
use crate::event::{AppEvent, EventQueue};

/// A store write queue drained by its own thread. Bulk history and
/// single-room writes each get one, so neither waits behind the other;
/// `ChatStore` serializes the appends themselves.
struct StoreWriter<T> {
    sender: Sender<T>,
    handle: JoinHandle<()>,
}

impl<T> StoreWriter<T> {
    fn join(self, name: &str) {
        drop(self.sender);
        if self.handle.join().is_err() {
            error!(writer = name, "store writer panicked");
        }
    }
}

/// Runs the reconciler's side effects on background threads.
///
/// Every task reports back by posting onto the event queue; nothing here
/// touches domain state.
pub struct RuntimeController {
    client: Arc<dyn ChatClient>,
    store: Result<Arc<ChatStore>, String>,
    queue: EventQueue,
    history_writer: Option<StoreWriter<(Vec<Room>, SyncState)>>,
    room_writer: Option<StoreWriter<Room>>,
    render_requested: bool,
    stop_requested: bool,
}

impl RuntimeController {
    /// Wires the client's event callback into `queue` and starts the store writers.
    pub fn new(
        client: Arc<dyn ChatClient>,
        store: Result<ChatStore, StorageError>,
        queue: EventQueue,
    ) -> Self {
        let sink_queue = queue.clone();
        client.set_event_handler(Box::new(move |event| {
            sink_queue.post(AppEvent::Client(event));
        }));

        let store = store.map(Arc::new).map_err(|error| error.to_string());
        let (history_writer, room_writer) = match &store {
            Ok(store) => (
                spawn_writer::<(Vec<Room>, SyncState)>(
                    HISTORY_WRITER,
                    store,
                    &queue,
                    |store, (rooms, sync)| store.persist_history(&rooms, &sync),
                ),
                spawn_writer::<Room>(ROOM_WRITER, store, &queue, |store, room| {
                    store.upsert_room(&room)
                }),
            ),
            Err(error) => {
                warn!(%error, "store unavailable, writes will be dropped");
                (None, None)
            }
        };

        Self {
            client,
            store,
            queue,
            history_writer,
            room_writer,
            render_requested: false,
            stop_requested: false,
        }
    }

    /// Returns and clears the pending render request.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Waits for queued store writes to land. Later persists report failure.
    pub fn shutdown(&mut self) {
        if let Some(writer) = self.history_writer.take() {
            writer.join(HISTORY_WRITER);
        }
        if let Some(writer) = self.room_writer.take() {
            writer.join(ROOM_WRITER);
        }
    }

    fn spawn_task(
        &self,
        name: &str,
        task: impl FnOnce(&dyn ChatClient, &EventQueue) + Send + 'static,
    ) -> Result<(), String> {
        let client = Arc::clone(&self.client);
        let queue = self.queue.clone();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || task(client.as_ref(), &queue))
            .map(|_| ())
            .map_err(|error| {
                error!(task = name, %error, "failed to spawn task");
                format!("failed to spawn {name}: {error}")
            })
    }

    fn write_failed(&self) {
        let error = match &self.store {
            Ok(_) => "store writer stopped".to_string(),
            Err(error) => error.clone(),
        };
        self.queue.post(AppEvent::PersistFailed(error));
    }
}

impl Drop for RuntimeController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

const HISTORY_WRITER: &str = "chat-store-history";
const ROOM_WRITER: &str = "chat-store-rooms";

fn spawn_writer<T: Send + 'static>(
    name: &str,
    store: &Arc<ChatStore>,
    queue: &EventQueue,
    apply: fn(&ChatStore, T) -> Result<(), StorageError>,
) -> Option<StoreWriter<T>> {
    let (sender, receiver) = mpsc::channel::<T>();
    let store = Arc::clone(store);
    let queue = queue.clone();
    let spawned = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            for write in receiver {
                if let Err(error) = apply(&store, write) {
                    error!(%error, "store write failed");
                    queue.post(AppEvent::PersistFailed(error.to_string()));
                }
            }
        });

    match spawned {
        Ok(handle) => Some(StoreWriter { sender, handle }),
        Err(error) => {
            error!(writer = name, %error, "failed to spawn store writer");
            None
        }
    }
}

impl HostOps for RuntimeController {
    fn load_store(&mut self) {
        let store = match &self.store {
            Ok(store) => Arc::clone(store),
            Err(error) => {
                self.queue.post(AppEvent::StoreLoadFailed(error.clone()));
                return;
            }
        };
        let spawned = self.spawn_task("chat-store-load", move |_, queue| {
            queue.post(match store.load_all() {
                Ok((rooms, sync)) => AppEvent::StoreLoaded { rooms, sync },
                Err(error) => AppEvent::StoreLoadFailed(error.to_string()),
            });
        });
        if let Err(error) = spawned {
            self.queue.post(AppEvent::StoreLoadFailed(error));
        }
    }

    fn init_client(&mut self) {
        let spawned = self.spawn_task("chat-client-init", |client, queue| {
            let profile = client.profile();
            debug!(
                client = %profile.client_id,
                device = %profile.device_name,
                "client initialized"
            );
            queue.post(AppEvent::ClientReady {
                paired: client.is_paired(),
            });
        });
        if let Err(error) = spawned {
            self.queue.post(AppEvent::ClientFailed(error));
        }
    }

    fn connect(&mut self) {
        let spawned = self.spawn_task("chat-client-connect", |client, queue| {
            if let Err(error) = client.connect() {
                queue.post(AppEvent::ClientFailed(error.to_string()));
            }
        });
        if let Err(error) = spawned {
            self.queue.post(AppEvent::ClientFailed(error));
        }
    }

    fn begin_pairing(&mut self) {
        let spawned = self.spawn_task("chat-client-pairing", |client, queue| {
            let receiver = match client.begin_pairing() {
                Ok(receiver) => receiver,
                Err(error) => {
                    queue.post(AppEvent::PairingFailed(error.to_string()));
                    return;
                }
            };
            if let Err(error) = client.connect() {
                queue.post(AppEvent::ClientFailed(error.to_string()));
                return;
            }
            for event in receiver {
                queue.post(AppEvent::Pairing(event));
            }
            debug!("pairing stream closed");
        });
        if let Err(error) = spawned {
            self.queue.post(AppEvent::PairingFailed(error));
        }
    }

    fn persist_history(&mut self, rooms: Vec<Room>, sync: SyncState) {
        let sent = self
            .history_writer
            .as_ref()
            .is_some_and(|writer| writer.sender.send((rooms, sync)).is_ok());
        if !sent {
            self.write_failed();
        }
    }

    fn persist_room(&mut self, room: Room) {
        let sent = self
            .room_writer
            .as_ref()
            .is_some_and(|writer| writer.sender.send(room).is_ok());
        if !sent {
            self.write_failed();
        }
    }

    fn fetch_contacts(&mut self) {
        let spawned = self.spawn_task("chat-client-contacts", |client, queue| {
            queue.post(match client.fetch_contacts() {
                Ok(contacts) => AppEvent::ContactsLoaded(contacts),
                Err(error) => AppEvent::ContactsFailed(error.to_string()),
            });
        });
        if let Err(error) = spawned {
            self.queue.post(AppEvent::ContactsFailed(error));
        }
    }

    fn fetch_app_state(&mut self, kind: AppStateKind) {
        let spawned = self.spawn_task("chat-client-app-state", move |client, _| {
            if let Err(error) = client.fetch_app_state(kind) {
                warn!(kind = kind.label(), %error, "app state fetch failed");
            }
        });
        if let Err(error) = spawned {
            warn!(kind = kind.label(), %error, "skipping app state fetch");
        }
    }

    fn send_presence(&mut self, presence: Presence) {
        let spawned = self.spawn_task("chat-client-presence", move |client, _| {
            if let Err(error) = client.send_presence(presence) {
                warn!(?presence, %error, "presence update failed");
            }
        });
        if let Err(error) = spawned {
            warn!(?presence, %error, "skipping presence update");
        }
    }

    fn logout_and_exit(&mut self) {
        let spawned = self.spawn_task("chat-client-logout", |client, queue| {
            if let Err(error) = client.logout() {
                warn!(%error, "log-out failed, exiting anyway");
            }
            queue.post(AppEvent::LogoutFinished);
        });
        if spawned.is_err() {
            self.queue.post(AppEvent::LogoutFinished);
        }
    }

    fn request_render(&mut self) {
        self.render_requested = true;
    }

    fn request_stop(&mut self) {
        self.stop_requested = true;
    }
}
