//! HTML transcript of the conversation, rewritten after every render

use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

use crease_chat::{MessageBody, MessageId, RenderSink, Role};

const STYLE: &str = "\
body{font-family:sans-serif;max-width:48rem;margin:2rem auto;background:#f4f6f2}\
.message{padding:.75rem 1rem;margin:.5rem 0;border-radius:.75rem}\
.user{background:#1f6f43;color:#fff;margin-left:20%}\
.assistant{background:#fff;margin-right:20%}\
.typing span{display:inline-block;width:.5rem;height:.5rem;\
margin:0 .1rem;border-radius:50%;background:#999}";

const TYPING: &str = "<div class=\"typing\"><span></span><span></span><span></span></div>";

struct Entry {
    id: MessageId,
    role: Role,
    body: MessageBody,
}

/// Writes a self-contained HTML page with every message to `path`
pub struct HtmlTranscript {
    path: PathBuf,
    entries: Mutex<Vec<Entry>>,
}

impl HtmlTranscript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderSink for HtmlTranscript {
    fn render_message(&self, id: MessageId, role: Role, body: &MessageBody) {
        let page = {
            let mut entries = self.entries.lock();
            match entries.iter_mut().find(|e| e.id == id) {
                Some(entry) => entry.body = body.clone(),
                None => entries.push(Entry {
                    id,
                    role,
                    body: body.clone(),
                }),
            }
            render_page(&entries)
        };

        if let Err(e) = fs::write(&self.path, page) {
            tracing::warn!("Failed to write transcript {}: {}", self.path.display(), e);
        }
    }
}

fn render_page(entries: &[Entry]) -> String {
    let mut page = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    page.push_str("<title>crease transcript</title>\n");
    page.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));

    for entry in entries {
        let content = entry.body.markup().unwrap_or(TYPING);
        page.push_str(&format!(
            "<div class=\"message {}\" id=\"{}\">{}</div>\n",
            entry.role.as_str(),
            entry.id,
            content
        ));
    }

    page.push_str("</body>\n</html>\n");
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_page_on_each_render() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = HtmlTranscript::new(dir.path().join("chat.html"));

        transcript.render_message(
            MessageId(0),
            Role::User,
            &MessageBody::Markup("<p>Hello</p>".into()),
        );
        transcript.render_message(MessageId(1), Role::Assistant, &MessageBody::Composing);

        let page = fs::read_to_string(transcript.path()).unwrap();
        assert!(page.contains("<div class=\"message user\" id=\"msg-0\"><p>Hello</p></div>"));
        assert!(page.contains(&format!(
            "<div class=\"message assistant\" id=\"msg-1\">{}</div>",
            TYPING
        )));

        transcript.render_message(
            MessageId(1),
            Role::Assistant,
            &MessageBody::Markup("<p>Hi there!</p>".into()),
        );

        let page = fs::read_to_string(transcript.path()).unwrap();
        assert!(page.contains("id=\"msg-1\"><p>Hi there!</p></div>"));
        assert!(!page.contains("typing\"><span>"));
        assert_eq!(page.matches("class=\"message ").count(), 2);
        assert!(page.ends_with("</html>\n"));
    }

    #[test]
    fn test_unwritable_path_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = HtmlTranscript::new(dir.path().join("missing").join("chat.html"));
        transcript.render_message(MessageId(0), Role::User, &MessageBody::Composing);
        assert!(!transcript.path().exists());
    }
}
