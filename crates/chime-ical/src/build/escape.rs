//! iCalendar TEXT value escaping (RFC 5545 §3.3.11).

/// Escapes a TEXT property value.
///
/// Backslash, semicolon, and comma are backslash-escaped; a line break
/// becomes the literal sequence `\n`. Carriage returns are dropped so that
/// both `\n` and `\r\n` input conventions collapse to one escape.
#[must_use]
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }

    out
}
