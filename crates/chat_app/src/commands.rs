use chatterm::InputEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Top,
    Bottom,
    /// Open the room under the cursor, or confirm pairing on the welcome screen.
    Open,
    Close,
    Quit,
    /// Log the device out, then exit.
    Logout,
}

/// Vim-style key bindings. `g` waits for a second `g`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    pending_g: bool,
}

impl KeyMap {
    pub fn action(&mut self, event: &InputEvent) -> Option<Action> {
        if std::mem::take(&mut self.pending_g) && event.is("g") {
            return Some(Action::Top);
        }

        let action = if event.is("up") || event.is("k") {
            Action::Up
        } else if event.is("down") || event.is("j") {
            Action::Down
        } else if event.is("G") || event.is("end") {
            Action::Bottom
        } else if event.is("home") {
            Action::Top
        } else if event.is("enter") {
            Action::Open
        } else if event.is("escape") {
            Action::Close
        } else if event.is("q") || event.is("ctrl+c") {
            Action::Quit
        } else if event.is("ctrl+q") {
            Action::Logout
        } else {
            self.pending_g = event.is("g");
            return None;
        };
        Some(action)
    }
}
