//! crease-chat: Streaming chat exchanges
//!
//! This crate owns the conversation log and drives one exchange at a time:
//! the user's message goes out through a [`Transport`], the reply is
//! accumulated chunk by chunk, and every change is pushed to a [`RenderSink`].

pub mod accumulator;
pub mod controller;
pub mod conversation;
pub mod notice;
pub mod sink;
pub mod transport;

pub use accumulator::{StreamAccumulator, StreamOutcome, Update};
pub use controller::{ExchangeController, RejectReason, StreamState, SubmitOutcome};
pub use conversation::{ConversationLog, Message, MessageId, MessageState, Role};
pub use notice::FallbackNotices;
pub use sink::{InputAffordance, MessageBody, RenderSink};
pub use transport::{OllamaTransport, Transport};
