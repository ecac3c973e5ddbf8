//! Exchange controller: one user submission and its streamed reply at a time

use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    accumulator::{StreamAccumulator, StreamOutcome, Update},
    conversation::{ConversationLog, Message, MessageId, Role},
    notice::FallbackNotices,
    sink::{InputAffordance, MessageBody, RenderSink},
    transport::Transport,
};

/// Progress of the exchange in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// No exchange in flight; submissions are accepted
    #[default]
    Idle,
    /// Request sent, no reply text yet
    AwaitingFirstByte,
    /// Reply text is arriving
    Streaming,
    /// Reply finished (with content, empty, or aborted); cleanup pending
    Completed,
    /// Request or stream failed; cleanup pending
    Failed,
}

/// Why a submission was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing but whitespace
    Blank,
    /// Another exchange is in flight
    Busy,
}

/// Result of calling [`ExchangeController::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing happened
    Rejected(RejectReason),
    /// The exchange ran to the end
    Finished(StreamOutcome),
}

/// Drives exchanges between the user, the transport and the display.
///
/// All fields are `Arc`-wrapped, so cloning is cheap and clones share the
/// same conversation. A clone can [`abort`](Self::abort) an exchange that
/// another clone is running.
#[derive(Clone)]
pub struct ExchangeController {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn RenderSink>,
    input: Arc<dyn InputAffordance>,
    notices: Arc<FallbackNotices>,
    log: Arc<Mutex<ConversationLog>>,
    state: Arc<Mutex<StreamState>>,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl ExchangeController {
    pub fn new(
        transport: Arc<dyn Transport>,
        sink: Arc<dyn RenderSink>,
        input: Arc<dyn InputAffordance>,
    ) -> Self {
        Self {
            transport,
            sink,
            input,
            notices: Arc::new(FallbackNotices::default()),
            log: Arc::new(Mutex::new(ConversationLog::new())),
            state: Arc::new(Mutex::new(StreamState::Idle)),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// Replace the fallback notices
    pub fn with_notices(mut self, notices: FallbackNotices) -> Self {
        self.notices = Arc::new(notices);
        self
    }

    /// Current exchange state
    pub fn state(&self) -> StreamState {
        *self.state.lock()
    }

    /// Whether an exchange is in flight
    pub fn is_busy(&self) -> bool {
        self.state() != StreamState::Idle
    }

    /// Snapshot of the conversation in display order
    pub fn messages(&self) -> Vec<Message> {
        self.log.lock().messages().to_vec()
    }

    pub fn notices(&self) -> &FallbackNotices {
        &self.notices
    }

    /// Abort the exchange in flight, keeping the reply text received so far.
    ///
    /// Returns false when nothing was running.
    pub fn abort(&self) -> bool {
        let state = self.state.lock();
        if *state == StreamState::Idle {
            return false;
        }
        tracing::debug!("Aborting exchange ({:?})", *state);
        self.cancel.lock().cancel();
        true
    }

    /// Submit user text and run the exchange to completion.
    ///
    /// Blank text, or text submitted while another exchange is in flight, is
    /// ignored without touching the conversation or the transport. Dropping
    /// the returned future ends the exchange like [`abort`](Self::abort).
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring blank submission");
            return SubmitOutcome::Rejected(RejectReason::Blank);
        }

        let cancel = {
            let mut state = self.state.lock();
            if *state != StreamState::Idle {
                tracing::warn!("Exchange in flight ({:?}), ignoring submission", *state);
                return SubmitOutcome::Rejected(RejectReason::Busy);
            }
            *state = StreamState::AwaitingFirstByte;

            let token = CancellationToken::new();
            *self.cancel.lock() = token.clone();
            token
        };
        let mut guard = ExchangeGuard {
            controller: self,
            reply: None,
        };

        self.input.clear_input();

        let user_id = self.log.lock().push_user(text);
        self.render(user_id);
        self.input.scroll_to_latest();

        let reply_id = self.log.lock().push_placeholder();
        guard.reply = Some(reply_id);
        self.render(reply_id);
        self.input.scroll_to_latest();

        self.input.set_busy(true);
        tracing::debug!("Exchange started: {} -> {}", user_id, reply_id);

        let outcome = self.run_exchange(text, reply_id, &cancel).await;

        *self.state.lock() = match outcome {
            StreamOutcome::Failed(_) => StreamState::Failed,
            _ => StreamState::Completed,
        };
        tracing::debug!("Exchange finished: {:?}", outcome);

        drop(guard);
        SubmitOutcome::Finished(outcome)
    }

    async fn run_exchange(
        &self,
        text: &str,
        reply_id: MessageId,
        cancel: &CancellationToken,
    ) -> StreamOutcome {
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            sent = self.transport.send(text) => Some(sent),
        };

        let chunks: crease_ai::ChunkStream = match sent {
            Some(Ok(chunks)) => chunks,
            Some(Err(e)) => {
                if e.is_connection_failure() {
                    tracing::error!("Could not reach the server: {}", e);
                } else if e.is_model_missing() {
                    tracing::error!("Model is not installed on the server: {}", e);
                }
                Box::pin(tokio_stream::once(Err(e)))
            }
            // The accumulator sees the cancelled token before polling this.
            None => Box::pin(tokio_stream::empty()),
        };

        let mut accumulator = StreamAccumulator::new(FallbackNotices::clone(&self.notices));
        let outcome = accumulator
            .consume(chunks, cancel, |update| match update {
                Update::Streamed { text, markup } => {
                    {
                        let mut state = self.state.lock();
                        if *state == StreamState::AwaitingFirstByte {
                            *state = StreamState::Streaming;
                        }
                    }
                    self.log.lock().update_text(reply_id, text);
                    self.sink
                        .render_message(reply_id, Role::Assistant, &MessageBody::Markup(markup));
                    self.input.scroll_to_latest();
                }
                Update::Notice { text, markup } => {
                    self.log.lock().finish_with_notice(reply_id, text);
                    self.sink
                        .render_message(reply_id, Role::Assistant, &MessageBody::Markup(markup));
                    self.input.scroll_to_latest();
                }
            })
            .await;

        match outcome {
            StreamOutcome::Completed => {
                self.log.lock().finish(reply_id);
            }
            StreamOutcome::Cancelled => {
                self.log.lock().finish(reply_id);
                // Clears the composing indicator if nothing had arrived yet.
                self.render(reply_id);
            }
            StreamOutcome::Empty | StreamOutcome::Failed(_) => {}
        }

        outcome
    }

    /// Render a message from its current text
    fn render(&self, id: MessageId) {
        let rendered = self.log.lock().get(id).map(|m| (m.role, m.body()));
        if let Some((role, body)) = rendered {
            self.sink.render_message(id, role, &body);
        }
    }

    /// Return to idle and give the input back, whatever the outcome
    fn release(&self) {
        *self.state.lock() = StreamState::Idle;
        self.input.set_busy(false);
        self.input.focus();
        self.input.scroll_to_latest();
    }
}

/// Cleanup for one accepted exchange; runs even if `submit` is dropped.
struct ExchangeGuard<'a> {
    controller: &'a ExchangeController,
    reply: Option<MessageId>,
}

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.reply {
            // A reply still streaming here was abandoned mid-exchange.
            let abandoned = self.controller.log.lock().finish(id);
            if abandoned {
                tracing::warn!("Exchange dropped before {} finished", id);
                self.controller.render(id);
            }
        }
        self.controller.release();
    }
}
