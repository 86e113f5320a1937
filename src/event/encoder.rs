// src/event/encoder.rs

//! Server-sent-events framing.
//!
//! A frame is an optional `event: <type>` line, one `data: <line>` per line
//! of the payload and a terminating blank line. An empty payload still
//! produces exactly one (empty) `data:` line so the client sees an event.

use super::OrchestrationEvent;

/// Encode one orchestration event as a complete frame.
pub fn encode(event: &OrchestrationEvent) -> String {
    encode_frame(Some(event.kind()), event.payload())
}

/// Encode an arbitrary payload, with an optional event type marker.
pub fn encode_frame(event: Option<&str>, data: &str) -> String {
    let mut frame = String::with_capacity(data.len() + 32);

    if let Some(event) = event.filter(|e| !e.is_empty()) {
        frame.push_str("event: ");
        frame.push_str(event);
        frame.push('\n');
    }

    let mut wrote_data = false;
    for line in payload_lines(data) {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
        wrote_data = true;
    }
    if !wrote_data {
        frame.push_str("data: \n");
    }

    frame.push('\n');
    frame
}

/// Line boundaries recognised in a payload: `\n`, `\r`, vertical tab, form
/// feed, the file/group/record separators, NEL and the Unicode line and
/// paragraph separators. `\r\n` counts as one boundary.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split `data` into lines; a trailing terminator does not open a new empty
/// line.
fn payload_lines(data: &str) -> impl Iterator<Item = &str> {
    let mut rest = data;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.char_indices().find(|&(_, c)| is_line_break(c)) {
            Some((idx, c)) => {
                let line = &rest[..idx];
                let skip = if rest[idx..].starts_with("\r\n") {
                    2
                } else {
                    c.len_utf8()
                };
                rest = &rest[idx + skip..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = "";
                Some(line)
            }
        }
    })
}
