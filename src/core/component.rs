//! Component trait.

use crate::core::input::InputEvent;

/// Something that can draw itself into a terminal-sized box.
pub trait Component {
    /// Render to a list of lines for the given viewport.
    ///
    /// Lines may be shorter than `width`; the renderer pads and clips them.
    /// Lines past `height` are dropped.
    fn render(&mut self, width: usize, height: usize) -> Vec<String>;

    /// Handle input events.
    fn handle_event(&mut self, _event: &InputEvent) {}

    /// Invalidate any cached state.
    fn invalidate(&mut self) {}
}

impl<F> Component for F
where
    F: FnMut(usize, usize) -> Vec<String>,
{
    fn render(&mut self, width: usize, height: usize) -> Vec<String> {
        self(width, height)
    }
}
