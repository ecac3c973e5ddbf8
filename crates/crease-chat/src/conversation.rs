//! Conversation log: messages in display order, with one streaming reply at most.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sink::MessageBody;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Position of a message in its log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub usize);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Lifecycle of a message's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    /// Reply still arriving; text may grow
    Streaming,
    /// Final text
    Complete,
    /// Text was replaced by a fallback notice
    Notice,
}

/// A single message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub state: MessageState,
}

impl Message {
    /// Whether the reply is still arriving
    pub fn is_streaming(&self) -> bool {
        self.state == MessageState::Streaming
    }

    /// What a render sink should display for this message right now.
    ///
    /// Always derived from the current text; nothing is cached.
    pub fn body(&self) -> MessageBody {
        match self.role {
            Role::User => MessageBody::Markup(crease_markup::plain_paragraph(&self.text)),
            Role::Assistant if self.is_streaming() && self.text.is_empty() => {
                MessageBody::Composing
            }
            Role::Assistant => MessageBody::Markup(crease_markup::format(&self.text)),
        }
    }
}

/// Ordered, in-memory message history for one session
#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, role: Role, text: String, state: MessageState) -> MessageId {
        let id = MessageId(self.messages.len());
        self.messages.push(Message {
            id,
            role,
            text,
            created_at: Utc::now(),
            state,
        });
        id
    }

    /// Append a finished user message
    pub fn push_user(&mut self, text: impl Into<String>) -> MessageId {
        self.push(Role::User, text.into(), MessageState::Complete)
    }

    /// Append an empty assistant message that will receive a streamed reply.
    ///
    /// A reply that is still streaming is frozen first, so at most one
    /// message is ever in the streaming state.
    pub fn push_placeholder(&mut self) -> MessageId {
        if let Some(previous) = self.messages.iter_mut().find(|m| m.is_streaming()) {
            tracing::warn!("{} was still streaming; freezing it", previous.id);
            previous.state = MessageState::Complete;
        }
        self.push(Role::Assistant, String::new(), MessageState::Streaming)
    }

    /// Replace the text of a streaming message with its grown buffer.
    ///
    /// Returns false if the message is unknown or no longer streaming.
    pub fn update_text(&mut self, id: MessageId, text: &str) -> bool {
        match self.get_mut(id) {
            Some(message) if message.is_streaming() => {
                debug_assert!(
                    text.starts_with(message.text.as_str()),
                    "streamed text must only grow"
                );
                message.text.clear();
                message.text.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Freeze a streaming message with the text it has
    pub fn finish(&mut self, id: MessageId) -> bool {
        match self.get_mut(id) {
            Some(message) if message.is_streaming() => {
                message.state = MessageState::Complete;
                true
            }
            _ => false,
        }
    }

    /// Freeze a streaming message, replacing its text with a fallback notice
    pub fn finish_with_notice(&mut self, id: MessageId, notice: &str) -> bool {
        match self.get_mut(id) {
            Some(message) if message.is_streaming() => {
                message.text = notice.to_string();
                message.state = MessageState::Notice;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(id.0)
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.get_mut(id.0)
    }

    /// All messages in display order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut log = ConversationLog::new();
        let a = log.push_user("how do I play a pull shot?");
        let b = log.push_placeholder();
        assert_eq!(a, MessageId(0));
        assert_eq!(b, MessageId(1));
        assert_eq!(log.messages().len(), 2);
        assert_eq!(log.messages()[1].role, Role::Assistant);
    }

    #[test]
    fn test_placeholder_shows_composing() {
        let mut log = ConversationLog::new();
        let id = log.push_placeholder();
        assert_eq!(log.get(id).unwrap().body(), MessageBody::Composing);
        assert!(log.get(id).unwrap().is_streaming());
    }

    #[test]
    fn test_streamed_text_grows_then_freezes() {
        let mut log = ConversationLog::new();
        let id = log.push_placeholder();
        assert!(log.update_text(id, "Hi "));
        assert!(log.update_text(id, "Hi there!"));
        assert_eq!(log.get(id).unwrap().text, "Hi there!");

        assert!(log.finish(id));
        assert!(!log.get(id).unwrap().is_streaming());
        // Frozen messages no longer accept text.
        assert!(!log.update_text(id, "Hi there! more"));
        assert_eq!(log.get(id).unwrap().text, "Hi there!");
    }

    #[test]
    fn test_notice_replaces_text() {
        let mut log = ConversationLog::new();
        let id = log.push_placeholder();
        log.update_text(id, "partial");
        assert!(log.finish_with_notice(id, "Sorry"));

        let message = log.get(id).unwrap();
        assert_eq!(message.text, "Sorry");
        assert_eq!(message.state, MessageState::Notice);
        assert_eq!(message.body(), MessageBody::Markup("<p>Sorry</p>".into()));
    }

    #[test]
    fn test_user_text_is_not_formatted() {
        let mut log = ConversationLog::new();
        let id = log.push_user("**why** <b>");
        assert_eq!(
            log.get(id).unwrap().body(),
            MessageBody::Markup("<p>**why** &lt;b&gt;</p>".into())
        );
    }

    #[test]
    fn test_at_most_one_streaming_message() {
        let mut log = ConversationLog::new();
        let first = log.push_placeholder();
        let second = log.push_placeholder();
        assert_eq!(log.get(first).unwrap().state, MessageState::Complete);
        assert!(log.get(second).unwrap().is_streaming());
    }

    #[test]
    fn test_unknown_id() {
        let mut log = ConversationLog::new();
        assert!(!log.update_text(MessageId(3), "x"));
        assert!(!log.finish(MessageId(3)));
        assert!(log.get(MessageId(3)).is_none());
    }

    #[test]
    fn test_message_id_display() {
        assert_eq!(MessageId(7).to_string(), "msg-7");
    }
}
