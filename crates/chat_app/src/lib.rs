//! Terminal chat client: session state machine, room list and history sync
//! reconciliation on top of a pluggable messaging client.
//!
//! ## Configuration
//!
//! `chat_app` reads its settings from the environment:
//!
//! - `CHAT_APP_CLIENT` selects the messaging client. Only `mock` ships here.
//! - `CHAT_APP_STORE_PATH` overrides the store file
//!   (default `<cwd>/.chatterm/store.jsonl`).
//! - `CHAT_APP_LOG_FILE` overrides the log file
//!   (default `<cwd>/.chatterm/chat_app.log`).
//! - `CHAT_APP_LOG` or `RUST_LOG` sets the tracing filter; `RUST_LOG` wins.
//! - `CHAT_APP_DEV=1` posts a status notice for every live message.
//! - `CHAT_APP_MOCK_PAIRED=1` starts the mock client already paired.
//!
//! Blank values count as unset.
//!
//! ## Event flow
//!
//! Client callbacks, terminal input and background task results all land on
//! one [`event::EventQueue`]. The main loop is the only consumer and the only
//! owner of [`app::App`]; side effects go out through [`app::HostOps`].

pub mod app;
pub mod clients;
pub mod commands;
pub mod config;
pub mod event;
pub mod logging;
pub mod room_list;
pub mod runtime;
pub mod session;
pub mod summary;
pub mod tui;
