mod support;

use assert_matches::assert_matches;
use chat_app::app::App;
use chat_app::event::AppEvent;
use chat_app::session::{SessionState, SyncProgress};
use chat_client::{
    AppStateKind, ClientEvent, Contact, HistorySyncChunk, PairingEvent, Presence, PushName,
};
use chat_store::{Room, SyncState};
use pretty_assertions::assert_eq;
use support::{
    chunk, conversation, history_message, message, press, room_ids, HostCall, HostSpy,
};

fn ready_app(host: &mut HostSpy) -> App {
    let mut app = App::default();
    app.handle(
        chunk(
            100,
            1,
            vec![conversation("a", "Alice", 1_000), conversation("b", "Bob", 2_000)],
        ),
        host,
    );
    assert_eq!(app.state(), &SessionState::Ready { overlay: None });
    host.take_calls();
    app
}

fn welcome_app(host: &mut HostSpy) -> App {
    let mut app = App::default();
    app.handle(AppEvent::ClientReady { paired: false }, host);
    assert_matches!(app.state(), SessionState::Welcome { notice: None });
    host.take_calls();
    app
}

#[test]
fn start_dispatches_store_load_and_client_init() {
    let mut app = App::default();
    let mut host = HostSpy::default();

    app.start(&mut host);

    assert_eq!(host.calls, vec![HostCall::LoadStore, HostCall::InitClient]);
    assert_eq!(app.state(), &SessionState::Loading);
    assert_eq!(host.render_requests, 1);
}

#[test]
fn first_sync_from_empty_storage_reaches_ready_and_checkpoints() {
    let mut app = App::default();
    let mut host = HostSpy::default();
    app.start(&mut host);
    app.handle(
        AppEvent::StoreLoaded {
            rooms: Vec::new(),
            sync: SyncState::default(),
        },
        &mut host,
    );
    assert_eq!(app.state(), &SessionState::Loading);
    host.take_calls();

    app.handle(chunk(50, 1, vec![conversation("a", "Alice", 1_000)]), &mut host);

    let alice = Room::new("a", "Alice").at_unix(1_000);
    assert_eq!(app.rooms().rooms(), [alice.clone()].as_slice());
    assert_matches!(
        app.state(),
        SessionState::HistorySync(SyncProgress { percent: 50, .. })
    );
    assert_eq!(
        host.take_calls(),
        vec![HostCall::PersistHistory {
            rooms: vec![alice.clone()],
            sync: SyncState::new(50, 1, ""),
        }]
    );
    assert!(app.sync().in_progress);

    app.handle(chunk(100, 2, vec![conversation("a", "Alice", 1_000)]), &mut host);

    assert_eq!(app.state(), &SessionState::Ready { overlay: None });
    let sync = host.last_persisted_sync().expect("checkpoint persisted");
    assert_eq!(sync.progress, 100);
    assert!(!sync.in_progress);
    assert_eq!(app.rooms().rooms(), [alice].as_slice());
}

#[test]
fn interrupted_sync_resumes_in_history_sync_until_complete() {
    let mut app = App::default();
    let mut host = HostSpy::default();
    app.start(&mut host);

    app.handle(
        AppEvent::StoreLoaded {
            rooms: vec![Room::new("a", "Alice").at_unix(1_000)],
            sync: SyncState::new(40, 3, "recent"),
        },
        &mut host,
    );
    assert_eq!(
        app.state(),
        &SessionState::HistorySync(SyncProgress {
            percent: 40,
            sync_type: "recent".to_string(),
        })
    );

    app.handle(AppEvent::ClientReady { paired: true }, &mut host);
    app.handle(AppEvent::Client(ClientEvent::Connected), &mut host);
    assert_matches!(
        app.state(),
        SessionState::HistorySync(SyncProgress { percent: 40, .. })
    );
    assert!(host.calls.contains(&HostCall::Connect));
    assert!(host.calls.contains(&HostCall::FetchContacts));
    host.take_calls();

    app.handle(chunk(100, 4, Vec::new()), &mut host);

    assert_eq!(app.state(), &SessionState::Ready { overlay: None });
    let sync = host.last_persisted_sync().expect("checkpoint persisted");
    assert_eq!(sync.progress, 100);
    assert!(!sync.in_progress);
}

#[test]
fn early_connection_waits_for_the_saved_checkpoint() {
    let mut app = App::default();
    let mut host = HostSpy::default();
    app.start(&mut host);

    app.handle(AppEvent::ClientReady { paired: true }, &mut host);
    app.handle(AppEvent::Client(ClientEvent::Connected), &mut host);
    assert_eq!(app.state(), &SessionState::Connecting);

    app.handle(
        AppEvent::StoreLoaded {
            rooms: Vec::new(),
            sync: SyncState::new(40, 3, "recent"),
        },
        &mut host,
    );
    assert_matches!(
        app.state(),
        SessionState::HistorySync(SyncProgress { percent: 40, .. })
    );
}

#[test]
fn chunk_before_store_load_keeps_a_completed_checkpoint() {
    let mut app = App::default();
    let mut host = HostSpy::default();
    app.start(&mut host);
    app.handle(AppEvent::ClientReady { paired: true }, &mut host);
    app.handle(AppEvent::Client(ClientEvent::Connected), &mut host);
    app.handle(chunk(20, 1, vec![conversation("a", "Alice", 1_000)]), &mut host);
    assert_matches!(
        app.state(),
        SessionState::HistorySync(SyncProgress { percent: 20, .. })
    );

    app.handle(
        AppEvent::StoreLoaded {
            rooms: vec![Room::new("b", "Bob").at_unix(2_000)],
            sync: SyncState::new(100, 9, "full"),
        },
        &mut host,
    );

    assert_eq!(app.state(), &SessionState::Ready { overlay: None });
    assert_eq!(app.sync().progress, 100);
    assert!(!app.sync().in_progress);
    assert_eq!(app.sync().sync_type, "full");
    let sync = host.last_persisted_sync().expect("merged checkpoint persisted");
    assert_eq!(sync.progress, 100);
    assert!(!sync.in_progress);
    assert_eq!(room_ids(&app), vec!["b", "a"]);
}

#[test]
fn chunk_before_store_load_resumes_from_the_higher_checkpoint() {
    let mut app = App::default();
    let mut host = HostSpy::default();
    app.handle(AppEvent::ClientReady { paired: true }, &mut host);
    app.handle(AppEvent::Client(ClientEvent::Connected), &mut host);
    app.handle(chunk(20, 1, Vec::new()), &mut host);

    app.handle(
        AppEvent::StoreLoaded {
            rooms: Vec::new(),
            sync: SyncState::new(60, 4, "recent"),
        },
        &mut host,
    );

    assert_eq!(
        app.state(),
        &SessionState::HistorySync(SyncProgress {
            percent: 60,
            sync_type: "recent".to_string(),
        })
    );
    assert!(app.sync().in_progress);
    assert_eq!(app.sync().chunk_order, 1);
    assert_eq!(host.last_persisted_sync().map(|sync| sync.progress), Some(60));

    app.handle(
        AppEvent::StoreLoaded {
            rooms: Vec::new(),
            sync: SyncState::new(30, 2, "recent"),
        },
        &mut host,
    );
    assert_eq!(app.sync().progress, 60);
}

#[test]
fn store_load_after_pairing_does_not_restore_the_old_checkpoint() {
    let mut host = HostSpy::default();
    let mut app = welcome_app(&mut host);
    press(&mut app, &mut host, "\r");
    app.handle(AppEvent::Pairing(PairingEvent::Success), &mut host);
    host.take_calls();

    app.handle(
        AppEvent::StoreLoaded {
            rooms: Vec::new(),
            sync: SyncState::new(100, 9, "full"),
        },
        &mut host,
    );

    assert_eq!(app.sync().progress, 0);
    assert!(app.sync().in_progress);
    assert_matches!(
        app.state(),
        SessionState::HistorySync(SyncProgress { percent: 0, .. })
    );
    assert_eq!(host.last_persisted_sync(), None);
}

#[test]
fn connection_with_nothing_saved_is_ready() {
    let mut app = App::default();
    let mut host = HostSpy::default();

    app.handle(AppEvent::ClientReady { paired: true }, &mut host);
    app.handle(AppEvent::Client(ClientEvent::Connected), &mut host);
    app.handle(AppEvent::StoreLoadFailed("permission denied".to_string()), &mut host);

    assert_eq!(app.state(), &SessionState::Ready { overlay: None });
    assert_eq!(
        app.status(),
        Some("Could not load saved chats: permission denied")
    );
}

#[test]
fn completed_checkpoint_goes_straight_to_ready() {
    let mut app = App::default();
    let mut host = HostSpy::default();

    app.handle(
        AppEvent::StoreLoaded {
            rooms: vec![
                Room::new("a", "Alice").with_last_message("see you").at_unix(1_000),
                Room::new("b", "Bob").at_unix(2_000),
            ],
            sync: SyncState::new(100, 9, "full"),
        },
        &mut host,
    );
    app.handle(AppEvent::ClientReady { paired: true }, &mut host);

    assert_eq!(app.state(), &SessionState::Ready { overlay: None });
    assert_eq!(room_ids(&app), vec!["b", "a"]);
    assert_eq!(host.calls, vec![HostCall::Connect]);
    let seeded: Vec<&str> = app.summaries().lines("a").collect();
    assert_eq!(seeded.len(), 1);
    assert!(seeded[0].ends_with("Alice: see you"));
}

#[test]
fn live_rooms_win_over_stored_copies() {
    let mut app = App::default();
    let mut host = HostSpy::default();

    app.handle(message("a", "a", 5_000, "fresh"), &mut host);
    app.handle(
        AppEvent::StoreLoaded {
            rooms: vec![
                Room::new("a", "Alice").with_last_message("stale").at_unix(1_000),
                Room::new("b", "Bob").at_unix(2_000),
            ],
            sync: SyncState::default(),
        },
        &mut host,
    );

    assert_eq!(room_ids(&app), vec!["a", "b"]);
    let live = app.rooms().get("a").expect("live room kept");
    assert_eq!(live.last_message, "fresh");
    assert_eq!(live.unix_time(), 5_000);
}

#[test]
fn unpaired_client_pairs_and_starts_a_new_session() {
    let mut host = HostSpy::default();
    let mut app = welcome_app(&mut host);

    press(&mut app, &mut host, "\r");
    assert_eq!(
        app.state(),
        &SessionState::Pairing {
            code: None,
            status: "Connecting...".to_string(),
        }
    );
    assert_eq!(host.take_calls(), vec![HostCall::BeginPairing]);

    app.handle(AppEvent::Pairing(PairingEvent::Code("2@abc".to_string())), &mut host);
    assert_eq!(
        app.state(),
        &SessionState::Pairing {
            code: Some("2@abc".to_string()),
            status: "Scan this code with your phone to link this device".to_string(),
        }
    );

    app.handle(
        AppEvent::Pairing(PairingEvent::Other("waiting for scan".to_string())),
        &mut host,
    );
    assert_eq!(
        app.state(),
        &SessionState::Pairing {
            code: Some("2@abc".to_string()),
            status: "waiting for scan".to_string(),
        }
    );

    app.handle(AppEvent::Client(ClientEvent::Connected), &mut host);
    assert_matches!(app.state(), SessionState::Pairing { .. });
    assert_eq!(host.take_calls(), vec![HostCall::FetchContacts]);

    app.handle(AppEvent::Pairing(PairingEvent::Success), &mut host);
    assert_matches!(
        app.state(),
        SessionState::HistorySync(SyncProgress { percent: 0, .. })
    );
    assert_eq!(
        host.take_calls(),
        vec![
            HostCall::PersistHistory {
                rooms: Vec::new(),
                sync: SyncState::new(0, 0, ""),
            },
            HostCall::FetchAppState(AppStateKind::Contacts),
        ]
    );
}

#[test]
fn pairing_failures_return_to_welcome_with_a_notice() {
    let cases = [
        (
            PairingEvent::Timeout,
            "Pairing timed out. Press Enter to try again.",
        ),
        (
            PairingEvent::ClientOutdated,
            "This client version was rejected as outdated.",
        ),
        (
            PairingEvent::ScannedWithoutMultidevice,
            "Enable multi-device on your phone, then try again.",
        ),
        (
            PairingEvent::Error("socket reset".to_string()),
            "Pairing failed: socket reset",
        ),
    ];

    for (event, expected) in cases {
        let mut host = HostSpy::default();
        let mut app = welcome_app(&mut host);
        press(&mut app, &mut host, "\r");

        app.handle(AppEvent::Pairing(event), &mut host);

        assert_eq!(
            app.state(),
            &SessionState::Welcome {
                notice: Some(expected.to_string()),
            }
        );
    }

    let mut host = HostSpy::default();
    let mut app = welcome_app(&mut host);
    press(&mut app, &mut host, "\r");
    app.handle(AppEvent::PairingFailed("not allowed".to_string()), &mut host);
    assert_eq!(
        app.state(),
        &SessionState::Welcome {
            notice: Some("Pairing failed: not allowed".to_string()),
        }
    );
}

#[test]
fn pairing_events_outside_pairing_do_not_change_state() {
    let mut host = HostSpy::default();
    let mut app = welcome_app(&mut host);

    app.handle(AppEvent::Pairing(PairingEvent::Code("late".to_string())), &mut host);
    assert_matches!(app.state(), SessionState::Welcome { notice: None });
    assert!(host.calls.is_empty());

    app.handle(AppEvent::Pairing(PairingEvent::Success), &mut host);
    assert_matches!(app.state(), SessionState::Welcome { notice: None });
    assert_eq!(
        host.calls,
        vec![HostCall::FetchAppState(AppStateKind::Contacts)]
    );
}

#[test]
fn history_messages_fill_the_summary_cache_and_push_names_title_rooms() {
    let mut app = App::default();
    let mut host = HostSpy::default();
    let mut alice = conversation("a", "Alice", 0);
    alice.messages = vec![
        history_message("a", 900, "one"),
        history_message("a", 1_000, "two"),
    ];

    app.handle(
        AppEvent::Client(ClientEvent::HistorySync(HistorySyncChunk {
            progress: 20,
            chunk_order: 1,
            conversations: vec![alice, conversation("c", " ", 500)],
            push_names: vec![PushName {
                id: "c".to_string(),
                push_name: "Carol".to_string(),
            }],
            ..HistorySyncChunk::default()
        })),
        &mut host,
    );

    let room = app.rooms().get("a").expect("room a");
    assert_eq!(room.last_message, "two");
    assert_eq!(room.unix_time(), 1_000);
    let lines: Vec<&str> = app.summaries().lines("a").collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with("a: two"));
    assert_eq!(app.rooms().get("c").map(|room| room.title.as_str()), Some("Carol"));
}

#[test]
fn sync_progress_never_goes_backwards() {
    let mut app = App::default();
    let mut host = HostSpy::default();

    app.handle(chunk(60, 1, Vec::new()), &mut host);
    app.handle(chunk(40, 2, Vec::new()), &mut host);

    assert_matches!(
        app.state(),
        SessionState::HistorySync(SyncProgress { percent: 60, .. })
    );
    assert_eq!(host.last_persisted_sync().map(|sync| sync.progress), Some(60));
    assert_eq!(app.sync().chunk_order, 2);

    app.handle(chunk(250, 3, Vec::new()), &mut host);
    assert_eq!(app.state(), &SessionState::Ready { overlay: None });
    assert_eq!(app.sync().progress, 100);
}

#[test]
fn incremental_sync_in_ready_shows_overlay_without_lowering_checkpoint() {
    let mut host = HostSpy::default();
    let mut app = ready_app(&mut host);

    app.handle(chunk(30, 2, Vec::new()), &mut host);
    assert_eq!(
        app.state(),
        &SessionState::Ready {
            overlay: Some(SyncProgress {
                percent: 30,
                sync_type: String::new(),
            }),
        }
    );
    let sync = host.last_persisted_sync().expect("checkpoint persisted");
    assert_eq!(sync.progress, 100);
    assert!(!sync.in_progress);

    app.handle(chunk(100, 3, Vec::new()), &mut host);
    assert_eq!(app.state(), &SessionState::Ready { overlay: None });
}

#[test]
fn live_messages_count_unread_until_the_room_is_opened() {
    let mut host = HostSpy::default();
    let mut app = ready_app(&mut host);

    app.handle(message("a", "a", 3_000, "hi"), &mut host);
    assert_eq!(room_ids(&app), vec!["a", "b"]);
    assert_eq!(app.rooms().cursor(), Some(0));
    assert_eq!(
        host.take_calls(),
        vec![HostCall::PersistRoom(
            Room::new("a", "Alice")
                .with_last_message("hi")
                .at_unix(3_000)
                .with_unread(1)
        )]
    );

    press(&mut app, &mut host, "\r");
    assert_eq!(app.rooms().opened_room().map(|room| room.id.as_str()), Some("a"));
    assert_eq!(
        host.take_calls(),
        vec![HostCall::PersistRoom(
            Room::new("a", "Alice").with_last_message("hi").at_unix(3_000)
        )]
    );

    app.handle(message("a", "a", 4_000, "still there?"), &mut host);
    app.handle(message("b", "b", 3_500, "ping"), &mut host);

    assert_eq!(app.rooms().get("a").map(|room| room.unread_count), Some(0));
    assert_eq!(app.rooms().get("b").map(|room| room.unread_count), Some(1));
    assert_eq!(app.rooms().opened_room().map(|room| room.id.as_str()), Some("a"));
    assert_eq!(app.summaries().len("a"), 2);
}

#[test]
fn older_live_message_keeps_latest_preview() {
    let mut host = HostSpy::default();
    let mut app = ready_app(&mut host);
    app.handle(message("b", "b", 2_500, "latest"), &mut host);

    app.handle(message("b", "b", 1_500, "delayed"), &mut host);

    let room = app.rooms().get("b").expect("room b");
    assert_eq!(room.last_message, "latest");
    assert_eq!(room.unix_time(), 2_500);
    assert_eq!(room.unread_count, 2);
    assert_eq!(app.summaries().len("b"), 2);
}

#[test]
fn developer_notices_announce_live_messages() {
    let mut host = HostSpy::default();
    let mut app = App::new(true);
    app.handle(chunk(100, 1, vec![conversation("a", "Alice", 1_000)]), &mut host);

    app.handle(message("a", "a", 2_000, "hello"), &mut host);

    assert_eq!(app.status(), Some("New message in Alice"));
}

#[test]
fn contact_updates_retitle_and_persist_rooms() {
    let mut host = HostSpy::default();
    let mut app = ready_app(&mut host);

    app.handle(
        AppEvent::ContactsLoaded(vec![Contact {
            id: "a".to_string(),
            full_name: Some("Alice Liddell".to_string()),
            ..Contact::default()
        }]),
        &mut host,
    );
    app.handle(
        AppEvent::Client(ClientEvent::ContactUpdated {
            id: "b".to_string(),
            full_name: None,
            first_name: Some("Robert".to_string()),
        }),
        &mut host,
    );
    app.handle(
        AppEvent::Client(ClientEvent::PushNameChanged {
            id: "a".to_string(),
            push_name: "Ally".to_string(),
        }),
        &mut host,
    );

    assert_eq!(
        app.rooms().get("a").map(|room| room.title.as_str()),
        Some("Alice Liddell")
    );
    assert_eq!(app.rooms().get("b").map(|room| room.title.as_str()), Some("Robert"));
    let persisted: Vec<&str> = host
        .persisted_rooms()
        .iter()
        .map(|room| room.title.as_str())
        .collect();
    assert_eq!(persisted, vec!["Alice Liddell", "Robert"]);
}

#[test]
fn focus_changes_send_presence_only_when_ready() {
    let mut host = HostSpy::default();
    let mut app = welcome_app(&mut host);
    press(&mut app, &mut host, "\x1b[I");
    assert!(host.calls.is_empty());

    let mut app = ready_app(&mut host);
    press(&mut app, &mut host, "\x1b[I");
    press(&mut app, &mut host, "\x1b[O");
    assert_eq!(
        host.calls,
        vec![
            HostCall::SendPresence(Presence::Available),
            HostCall::SendPresence(Presence::Unavailable),
        ]
    );
}

#[test]
fn quit_exits_immediately() {
    let mut host = HostSpy::default();
    let mut app = ready_app(&mut host);

    press(&mut app, &mut host, "q");

    assert_eq!(
        app.state(),
        &SessionState::Exiting {
            message: "Goodbye".to_string(),
        }
    );
    assert!(app.should_exit);
    assert_eq!(host.stop_requests, 1);
    assert!(host.calls.is_empty());
}

#[test]
fn forced_logout_exits_after_logout_finishes() {
    let mut host = HostSpy::default();
    let mut app = ready_app(&mut host);

    press(&mut app, &mut host, "\x11");
    assert_eq!(
        app.state(),
        &SessionState::Exiting {
            message: "Logging out...".to_string(),
        }
    );
    assert_eq!(host.take_calls(), vec![HostCall::LogoutAndExit]);
    assert!(!app.should_exit);

    press(&mut app, &mut host, "\x11");
    assert!(host.calls.is_empty());

    app.handle(AppEvent::LogoutFinished, &mut host);
    assert!(app.should_exit);
    assert_eq!(host.stop_requests, 1);
}

#[test]
fn remote_logout_terminates_the_session() {
    let mut host = HostSpy::default();
    let mut app = ready_app(&mut host);

    app.handle(
        AppEvent::Client(ClientEvent::LoggedOut {
            reason: "device removed".to_string(),
        }),
        &mut host,
    );

    assert_eq!(
        app.state(),
        &SessionState::Exiting {
            message: "Logged out: device removed".to_string(),
        }
    );
    assert_eq!(host.calls, vec![HostCall::LogoutAndExit]);
}

#[test]
fn client_failure_is_terminal_but_quit_still_works() {
    let mut app = App::default();
    let mut host = HostSpy::default();

    app.handle(AppEvent::ClientFailed("connection refused".to_string()), &mut host);
    app.handle(chunk(100, 1, vec![conversation("a", "Alice", 1_000)]), &mut host);
    press(&mut app, &mut host, "\r");

    assert_eq!(
        app.state(),
        &SessionState::Error("Client error: connection refused".to_string())
    );

    press(&mut app, &mut host, "q");
    assert_matches!(app.state(), SessionState::Exiting { .. });
    assert!(app.should_exit);
}

#[test]
fn storage_failures_surface_as_notices_without_touching_rooms() {
    let mut host = HostSpy::default();
    let mut app = ready_app(&mut host);
    let before = app.rooms().clone();

    app.handle(AppEvent::PersistFailed("disk full".to_string()), &mut host);
    assert_eq!(app.status(), Some("Could not save chats: disk full"));
    assert_eq!(app.rooms(), &before);

    app.handle(AppEvent::StoreLoadFailed("bad header".to_string()), &mut host);
    assert_eq!(app.status(), Some("Could not load saved chats: bad header"));
    assert_eq!(app.state(), &SessionState::Ready { overlay: None });

    app.handle(AppEvent::ContactsFailed("timeout".to_string()), &mut host);
    assert_eq!(app.status(), Some("Could not load contacts: timeout"));
}
