//! HTML entity escaping.

/// Escapes the five characters with meaning in HTML text and attribute
/// contexts: `& < > " '`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes an optional string; `None` maps to the empty string.
pub fn escape_opt(text: Option<&str>) -> String {
    text.map(escape).unwrap_or_default()
}

/// Stringifies any displayable value, then escapes it.
pub fn escape_value<T: std::fmt::Display>(value: T) -> String {
    escape(&value.to_string())
}
