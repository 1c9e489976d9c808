//! Keyboard and focus input decoding.
//!
//! Raw terminal reads can carry several keys at once (fast typing, paste, or
//! a focus report followed by a key), so decoding first splits the chunk into
//! single sequences and then names each one.

const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";
const FOCUS_IN: &str = "\x1b[I";
const FOCUS_OUT: &str = "\x1b[O";

/// Input event delivered to components.
///
/// `key_id` is a normalized name such as `up`, `enter`, `ctrl+c` or `alt+x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key { raw: String, key_id: String },
    Text { raw: String, text: String },
    Paste { text: String },
    FocusIn,
    FocusOut,
    UnknownRaw { raw: String },
}

impl InputEvent {
    /// Returns true when this is the named key or the given literal text.
    #[must_use]
    pub fn is(&self, id: &str) -> bool {
        match self {
            Self::Key { key_id, .. } => key_id == id,
            Self::Text { text, .. } => text == id,
            _ => false,
        }
    }
}

/// Decodes one raw terminal read into events, in order.
#[must_use]
pub fn parse_input_events(data: &str) -> Vec<InputEvent> {
    let mut events = Vec::new();
    let mut remaining = data;

    while !remaining.is_empty() {
        let Some(start) = remaining.find(PASTE_START) else {
            events.extend(split_sequences(remaining).into_iter().map(decode_sequence));
            break;
        };

        events.extend(
            split_sequences(&remaining[..start])
                .into_iter()
                .map(decode_sequence),
        );
        let body = &remaining[start + PASTE_START.len()..];
        match body.find(PASTE_END) {
            Some(end) => {
                events.push(InputEvent::Paste {
                    text: body[..end].to_string(),
                });
                remaining = &body[end + PASTE_END.len()..];
            }
            None => {
                events.push(InputEvent::Paste {
                    text: body.to_string(),
                });
                break;
            }
        }
    }

    events
}

/// Names a single key sequence, or `None` for plain printable text.
#[must_use]
pub fn parse_key(sequence: &str) -> Option<String> {
    let named = match sequence {
        "\x1b" => "escape",
        "\r" | "\n" | "\x1bOM" => "enter",
        "\t" => "tab",
        "\x1b[Z" => "shift+tab",
        " " => "space",
        "\x7f" | "\x08" => "backspace",
        "\x1b[A" | "\x1bOA" => "up",
        "\x1b[B" | "\x1bOB" => "down",
        "\x1b[C" | "\x1bOC" => "right",
        "\x1b[D" | "\x1bOD" => "left",
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => "home",
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => "end",
        "\x1b[2~" => "insert",
        "\x1b[3~" => "delete",
        "\x1b[5~" => "pageUp",
        "\x1b[6~" => "pageDown",
        _ => return parse_modified(sequence),
    };
    Some(named.to_string())
}

fn parse_modified(sequence: &str) -> Option<String> {
    let mut chars = sequence.chars();
    let first = chars.next()?;
    let rest = chars.as_str();

    if rest.is_empty() {
        let code = first as u32;
        if (1..=26).contains(&code) {
            let letter = char::from(b'a' + (code as u8 - 1));
            return Some(format!("ctrl+{letter}"));
        }
        return None;
    }

    if first != '\x1b' {
        return None;
    }

    // xterm modified cursor keys: ESC [ 1 ; <mod> <final>
    if let Some(params) = rest.strip_prefix("[1;") {
        let (modifier, final_byte) = params.split_at(params.len().saturating_sub(1));
        let base = match final_byte {
            "A" => "up",
            "B" => "down",
            "C" => "right",
            "D" => "left",
            "H" => "home",
            "F" => "end",
            _ => return None,
        };
        let prefix = modifier_prefix(modifier.parse().ok()?)?;
        return Some(format!("{prefix}{base}"));
    }

    let mut rest_chars = rest.chars();
    match (rest_chars.next(), rest_chars.next()) {
        (Some(ch), None) if !ch.is_control() => Some(format!("alt+{ch}")),
        _ => None,
    }
}

fn modifier_prefix(code: u8) -> Option<&'static str> {
    match code {
        2 => Some("shift+"),
        3 => Some("alt+"),
        4 => Some("shift+alt+"),
        5 => Some("ctrl+"),
        6 => Some("shift+ctrl+"),
        7 => Some("ctrl+alt+"),
        _ => None,
    }
}

fn decode_sequence(sequence: &str) -> InputEvent {
    match sequence {
        FOCUS_IN => return InputEvent::FocusIn,
        FOCUS_OUT => return InputEvent::FocusOut,
        _ => {}
    }

    if let Some(key_id) = parse_key(sequence) {
        return InputEvent::Key {
            raw: sequence.to_string(),
            key_id,
        };
    }

    if !sequence.starts_with('\x1b') && !sequence.chars().any(char::is_control) {
        return InputEvent::Text {
            raw: sequence.to_string(),
            text: sequence.to_string(),
        };
    }

    InputEvent::UnknownRaw {
        raw: sequence.to_string(),
    }
}

fn split_sequences(data: &str) -> Vec<&str> {
    let bytes = data.as_bytes();
    let mut sequences = Vec::new();
    let mut idx = 0;

    while idx < data.len() {
        let len = if bytes[idx] == 0x1b {
            escape_sequence_len(data, idx)
        } else {
            data[idx..].chars().next().map_or(1, char::len_utf8)
        };
        sequences.push(&data[idx..idx + len]);
        idx += len;
    }

    sequences
}

fn escape_sequence_len(data: &str, start: usize) -> usize {
    let bytes = data.as_bytes();
    match bytes.get(start + 1) {
        None => 1,
        Some(b'[') => bytes[start + 2..]
            .iter()
            .position(|byte| (0x40..=0x7e).contains(byte))
            .map_or(data.len() - start, |offset| offset + 3),
        Some(b'O') if start + 2 < bytes.len() => 3,
        Some(0x1b) => 1,
        Some(_) => {
            let next = data[start + 1..].chars().next().map_or(1, char::len_utf8);
            1 + next
        }
    }
}
