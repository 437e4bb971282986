//! Non-printable character escaping for terminal output.

/// Escape control characters so the text is one visual line.
///
/// Space is kept. `\n \r \t \v \f` become two-character escapes; other C0 and
/// C1 controls (and DEL) become `\uXXXX`.
pub fn encode_escaped(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            c if is_non_printable(c) => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn is_non_printable(c: char) -> bool {
    matches!(c as u32, 0x00..=0x1f | 0x7f..=0x9f)
}
