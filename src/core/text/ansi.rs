//! Escape sequence scanning.

pub const RESET: &str = "\x1b[0m";

/// Returns the byte length of the escape sequence starting at `pos`, if any.
///
/// Recognizes CSI (`ESC [` .. final byte) and OSC (`ESC ]` .. BEL or ST).
#[must_use]
pub fn escape_len(input: &str, pos: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }

    match bytes.get(pos + 1)? {
        b'[' => bytes[pos + 2..]
            .iter()
            .position(|byte| (0x40..=0x7e).contains(byte))
            .map(|offset| offset + 3),
        b']' => {
            let body = &bytes[pos + 2..];
            body.iter().enumerate().find_map(|(offset, byte)| match byte {
                0x07 => Some(offset + 3),
                0x1b if body.get(offset + 1) == Some(&b'\\') => Some(offset + 4),
                _ => None,
            })
        }
        _ => None,
    }
}

/// Removes every recognized escape sequence from `input`.
#[must_use]
pub fn strip_ansi(input: &str) -> String {
    let mut clean = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(len) = escape_len(input, idx) {
            idx += len;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        clean.push(ch);
        idx += ch.len_utf8();
    }
    clean
}
