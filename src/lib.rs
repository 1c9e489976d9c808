//! Terminal surface for full-screen chat views.
//!
//! - [`Tui`] owns a [`Terminal`], decodes raw input into [`InputEvent`]s and
//!   draws a [`Component`] as a fixed grid of rows, rewriting only rows that
//!   changed since the previous frame.
//! - [`ProcessTerminal`] is the raw-mode stdin/stdout implementation.
//! - Text helpers measure and fit strings that carry ANSI styling.

pub mod config;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;

pub use crate::config::TerminalConfig;
pub use crate::core::component::Component;
pub use crate::core::input::{parse_input_events, parse_key, InputEvent};
pub use crate::core::terminal::Terminal;
pub use crate::core::text::ansi::strip_ansi;
pub use crate::core::text::fit::{fit_to_width, truncate_to_width};
pub use crate::core::text::width::visible_width;
pub use crate::platform::process_terminal::ProcessTerminal;
pub use crate::render::renderer::ScreenRenderer;
pub use crate::runtime::tui::Tui;
