//! Convert formatted markup back to plain text for terminals

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(/?)([a-z]+)>").unwrap());

/// Bullet shown in front of list items
pub const BULLET: &str = "- ";

/// Render a fragment produced by [`format`](crate::format) or
/// [`plain_paragraph`](crate::plain_paragraph) as plain text.
///
/// Paragraph breaks become a blank line, `<br>` a newline, and list items
/// start on their own line behind [`BULLET`]. Emphasis is dropped and
/// entities are decoded.
///
/// Each complete line of the result depends only on the same line of the
/// raw text, so a growing reply only ever changes its last line.
pub fn to_plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut last = 0;

    for caps in TAG.captures_iter(markup) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        out.push_str(&unescape(&markup[last..whole.start()]));
        last = whole.end();

        let closing = !caps[1].is_empty();
        match (closing, name.as_str()) {
            (false, "br") => out.push('\n'),
            (false, "p") if !out.is_empty() => out.push_str("\n\n"),
            (false, "li") => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(BULLET);
            }
            _ => {}
        }
    }
    out.push_str(&unescape(&markup[last..]));
    out
}

/// Decode the entities produced by [`escape`](crate::escape)
fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
