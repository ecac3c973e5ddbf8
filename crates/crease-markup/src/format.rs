//! Lightweight markup formatting for assistant replies
//!
//! Understands `**bold**`, `*italic*`, `- ` bullet lines, `1. ` numbered
//! lines and blank-line paragraph breaks. Everything else is shown as
//! escaped literal text. The output is an HTML fragment.

use std::sync::LazyLock;

use regex::Regex;

use crate::sanitize::escape;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

/// Non-empty body, so a stray `**` left over from the bold pass stays literal.
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").unwrap());

static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\. (.+)$").unwrap());

/// Format raw reply text into an HTML fragment.
///
/// The input is escaped first, so nothing in `raw` can produce a tag of its
/// own. Returns an empty string for empty input.
pub fn format(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let escaped = escape(raw);
    let bolded = BOLD.replace_all(&escaped, "<strong>${1}</strong>");
    let emphasized = ITALIC.replace_all(&bolded, "<em>${1}</em>");
    let listed = apply_lists(&emphasized);
    let formatted = listed.replace("\n\n", "</p><p>").replace('\n', "<br>");

    if starts_with_block(&formatted) {
        formatted
    } else {
        format!("<p>{}</p>", formatted)
    }
}

/// Render text as a single literal paragraph with no markup interpretation.
pub fn plain_paragraph(raw: &str) -> String {
    format!("<p>{}</p>", escape(raw))
}

/// Turn list lines into `<li>` items.
///
/// Each contiguous run of bullet lines is wrapped in one `<ul>`. Numbered
/// lines become bare items with no `<ol>` around them.
fn apply_lists(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut run: Vec<String> = Vec::new();

    for line in text.split('\n') {
        if let Some(item) = bullet_item(line) {
            run.push(format!("<li>{}</li>", item));
            continue;
        }

        if !run.is_empty() {
            lines.push(format!("<ul>{}</ul>", run.concat()));
            run.clear();
        }

        match NUMBERED_ITEM.captures(line) {
            Some(caps) => lines.push(format!("<li>{}</li>", &caps[1])),
            None => lines.push(line.to_string()),
        }
    }

    if !run.is_empty() {
        lines.push(format!("<ul>{}</ul>", run.concat()));
    }

    lines.join("\n")
}

fn bullet_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ").filter(|item| !item.is_empty())
}

fn starts_with_block(fragment: &str) -> bool {
    fragment.starts_with("<ul>") || fragment.starts_with("<li>")
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERATED_TAGS: &[&str] = &[
        "<strong>", "</strong>", "<em>", "</em>", "<ul>", "</ul>", "<li>", "</li>", "<p>",
        "</p>", "<br>",
    ];

    const ENTITIES: &[&str] = &["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"];

    /// Assert that no markup-significant character survives outside our own tags.
    fn assert_injection_free(input: &str) {
        let output = format(input);
        let mut stripped = output.clone();
        for tag in GENERATED_TAGS {
            stripped = stripped.replace(tag, "");
        }
        for c in ['<', '>', '"', '\''] {
            assert!(
                !stripped.contains(c),
                "{:?} leaked {:?} in {:?}",
                input,
                c,
                output
            );
        }
        for (idx, _) in stripped.match_indices('&') {
            let rest = &stripped[idx..];
            assert!(
                ENTITIES.iter().any(|e| rest.starts_with(e)),
                "bare '&' in {:?} from {:?}",
                output,
                input
            );
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format(""), "");
    }

    #[test]
    fn test_plain_text_wrapped_in_paragraph() {
        assert_eq!(format("Keep your eyes level."), "<p>Keep your eyes level.</p>");
    }

    #[test]
    fn test_bold() {
        let out = format("**bold**");
        assert_eq!(out, "<p><strong>bold</strong></p>");
        assert!(!out.contains("<em>"));
    }

    #[test]
    fn test_italic() {
        assert_eq!(format("*it*"), "<p><em>it</em></p>");
    }

    #[test]
    fn test_bold_and_italic_together() {
        assert_eq!(
            format("a **firm** and *soft* grip"),
            "<p>a <strong>firm</strong> and <em>soft</em> grip</p>"
        );
    }

    #[test]
    fn test_bold_is_non_greedy() {
        assert_eq!(
            format("**a** and **b**"),
            "<p><strong>a</strong> and <strong>b</strong></p>"
        );
    }

    #[test]
    fn test_unmatched_markers_stay_literal() {
        assert_eq!(format("a **"), "<p>a **</p>");
        assert_eq!(format("**open"), "<p>**open</p>");
        assert_eq!(format("2 * 3"), "<p>2 * 3</p>");
    }

    #[test]
    fn test_markers_do_not_span_lines() {
        assert_eq!(format("**a\nb**"), "<p>**a<br>b**</p>");
    }

    #[test]
    fn test_bullet_list() {
        assert_eq!(format("- a\n- b"), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_separate_bullet_runs_get_separate_lists() {
        assert_eq!(
            format("- a\nbreak\n- b"),
            "<ul><li>a</li></ul><br>break<br><ul><li>b</li></ul>"
        );
    }

    #[test]
    fn test_bullet_after_text() {
        assert_eq!(
            format("Drills:\n- forward defence\n- **sweep**"),
            "<p>Drills:<br><ul><li>forward defence</li><li><strong>sweep</strong></li></ul></p>"
        );
    }

    #[test]
    fn test_dash_without_content_is_not_an_item() {
        assert_eq!(format("- "), "<p>- </p>");
        assert_eq!(format("-a"), "<p>-a</p>");
    }

    #[test]
    fn test_numbered_items_have_no_wrapper() {
        let out = format("1. grip\n2. stance");
        assert_eq!(out, "<li>grip</li><br><li>stance</li>");
        assert!(!out.contains("<ol>"));
        assert!(!out.contains("<ul>"));
    }

    #[test]
    fn test_numbered_needs_space_after_dot() {
        assert_eq!(format("3.5 overs"), "<p>3.5 overs</p>");
    }

    #[test]
    fn test_paragraphs_and_line_breaks() {
        assert_eq!(format("one\ntwo\n\nthree"), "<p>one<br>two</p><p>three</p>");
    }

    #[test]
    fn test_markup_split_resolves_once_complete() {
        // What a reader sees after each chunk of "**cover drive**".
        assert_eq!(format("**cov"), "<p>**cov</p>");
        assert_eq!(format("**cover drive*"), "<p><em>*cover drive</em></p>");
        assert_eq!(
            format("**cover drive**"),
            "<p><strong>cover drive</strong></p>"
        );
    }

    #[test]
    fn test_injection_free() {
        for input in [
            "<script>alert('x')</script>",
            "a & b < c > d \" e ' f",
            "**<b>bold</b>**",
            "*<i onclick=\"x\">*",
            "- <li>item</li>\n- &amp;",
            "1. \"quoted\"\n2. 'single'",
            "&lt; already escaped &gt;",
            "<p>\n\n</p>",
            "'''\"\"\"<<<>>>&&&",
        ] {
            assert_injection_free(input);
        }
    }

    #[test]
    fn test_escaped_text_never_forms_tags() {
        assert_eq!(
            format("<strong>x</strong>"),
            "<p>&lt;strong&gt;x&lt;/strong&gt;</p>"
        );
    }

    #[test]
    fn test_plain_paragraph() {
        assert_eq!(plain_paragraph("**not bold** <b>"), "<p>**not bold** &lt;b&gt;</p>");
    }
}
