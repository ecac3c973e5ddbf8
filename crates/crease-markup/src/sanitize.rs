//! HTML escaping for untrusted text

/// Escape `&`, `<`, `>`, `"` and `'` so the text displays literally.
///
/// Not idempotent: escaping twice turns `&lt;` into `&amp;lt;`. Callers
/// escape exactly once.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
