//! Display-side collaborators driven by the exchange controller

use std::sync::Arc;

use crate::conversation::{MessageId, Role};

/// What to show for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Transient "assistant is typing" indicator
    Composing,
    /// Formatted HTML fragment
    Markup(String),
}

impl MessageBody {
    pub fn markup(&self) -> Option<&str> {
        match self {
            MessageBody::Composing => None,
            MessageBody::Markup(markup) => Some(markup),
        }
    }
}

/// Receives message content to display.
///
/// Called once when a message is created and again every time an assistant
/// reply grows. Each call replaces whatever was shown for `id` before.
pub trait RenderSink: Send + Sync {
    fn render_message(&self, id: MessageId, role: Role, body: &MessageBody);
}

/// Every sink in the list receives every render, in order
impl RenderSink for Vec<Arc<dyn RenderSink>> {
    fn render_message(&self, id: MessageId, role: Role, body: &MessageBody) {
        for sink in self {
            sink.render_message(id, role, body);
        }
    }
}

/// The input box and scroll position of the host surface
pub trait InputAffordance: Send + Sync {
    /// Empty the input field after a submission was accepted
    fn clear_input(&self);

    /// Disable (`true`) or re-enable (`false`) input while an exchange runs
    fn set_busy(&self, busy: bool);

    /// Give the input field focus again
    fn focus(&self);

    /// Show the most recent message
    fn scroll_to_latest(&self);
}
