//! Session lifecycle.
//!
//! `Loading -> {Welcome, Connecting} -> Pairing -> HistorySync -> Ready`, with
//! `Error` reachable from anywhere. `Error` has no retry: the only way out is
//! `Exiting`, and nothing leaves `Exiting`.

use tracing::{debug, info};

/// Progress shown while history is replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    pub percent: u8,
    /// Phase label of the latest chunk, empty until one arrives.
    pub sync_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Welcome { notice: Option<String> },
    Connecting,
    Pairing { code: Option<String>, status: String },
    HistorySync(SyncProgress),
    /// `overlay` is set while a later incremental sync runs.
    Ready { overlay: Option<SyncProgress> },
    Error(String),
    Exiting { message: String },
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Welcome { .. } => "welcome",
            Self::Connecting => "connecting",
            Self::Pairing { .. } => "pairing",
            Self::HistorySync(_) => "history_sync",
            Self::Ready { .. } => "ready",
            Self::Error(_) => "error",
            Self::Exiting { .. } => "exiting",
        }
    }

    /// States the reconciler never transitions out of on its own.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Exiting { .. })
    }

    pub fn shows_rooms(&self) -> bool {
        matches!(self, Self::HistorySync(_) | Self::Ready { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: SessionState::Loading,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Moves to `next` unless the current state forbids it.
    ///
    /// Returns whether the transition was applied.
    pub fn transition(&mut self, next: SessionState) -> bool {
        let allowed = match (&self.state, &next) {
            (SessionState::Exiting { .. }, _) => false,
            (SessionState::Error(_), SessionState::Exiting { .. }) => true,
            (SessionState::Error(_), _) => false,
            _ => true,
        };
        if !allowed {
            debug!(
                from = self.state.label(),
                to = next.label(),
                "ignoring session transition"
            );
            return false;
        }

        if self.state.label() != next.label() {
            info!(from = self.state.label(), to = next.label(), "session transition");
        }
        self.state = next;
        true
    }
}
