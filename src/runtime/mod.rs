//! Runtime orchestration.

pub mod tui;

pub use tui::Tui;
