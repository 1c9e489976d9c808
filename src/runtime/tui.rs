//! Terminal lifecycle and frame drawing.
//!
//! `Tui` owns the terminal. Input and resize notifications are handed to the
//! caller's callbacks (usually forwarding into an event queue) and drawing is
//! an explicit call, so the caller's loop decides when frames are produced.

use std::io;

use crate::core::component::Component;
use crate::core::input::{parse_input_events, InputEvent};
use crate::core::terminal::Terminal;
use crate::render::renderer::ScreenRenderer;

const ENTER_SCREEN: &str = "\x1b[?1049h\x1b[?25l\x1b[?2004h\x1b[?1004h";
const LEAVE_SCREEN: &str = "\x1b[?1004l\x1b[?2004l\x1b[?25h\x1b[?1049l";
const STOP_DRAIN_MAX_MS: u64 = 1000;
const STOP_DRAIN_IDLE_MS: u64 = 50;

pub struct Tui<T: Terminal> {
    terminal: T,
    renderer: ScreenRenderer,
    running: bool,
}

impl<T: Terminal> Tui<T> {
    pub fn new(terminal: T) -> Self {
        Self {
            terminal,
            renderer: ScreenRenderer::new(),
            running: false,
        }
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Enters the alternate screen and starts delivering input.
    ///
    /// `on_input` runs on the terminal's input thread, once per decoded event.
    pub fn start<I, R>(&mut self, mut on_input: I, on_resize: R) -> io::Result<()>
    where
        I: FnMut(InputEvent) + Send + 'static,
        R: FnMut() + Send + 'static,
    {
        if self.running {
            return Ok(());
        }

        self.terminal.start(
            Box::new(move |data: String| {
                for event in parse_input_events(&data) {
                    on_input(event);
                }
            }),
            Box::new(on_resize),
        )?;
        self.running = true;
        self.terminal.write(ENTER_SCREEN);
        self.renderer.request_full_redraw_next();
        Ok(())
    }

    /// Renders `root` at the current terminal size and writes the diff.
    pub fn draw(&mut self, root: &mut dyn Component) {
        if !self.running {
            return;
        }
        let width = usize::from(self.terminal.columns());
        let height = usize::from(self.terminal.rows());
        let lines = root.render(width, height);
        let output = self.renderer.render(&lines, width, height);
        if !output.is_empty() {
            self.terminal.write(&output);
        }
    }

    /// Forces the next `draw` to repaint every row.
    pub fn invalidate(&mut self) {
        self.renderer.request_full_redraw_next();
    }

    /// Leaves the alternate screen and restores the terminal. Idempotent.
    pub fn stop(&mut self) -> io::Result<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        self.terminal.write(LEAVE_SCREEN);
        self.terminal
            .drain_input(STOP_DRAIN_MAX_MS, STOP_DRAIN_IDLE_MS);
        self.terminal.stop()
    }
}

impl<T: Terminal> Drop for Tui<T> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
