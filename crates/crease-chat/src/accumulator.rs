//! Accumulates a streamed reply and re-renders it after every chunk.
//!
//! The whole buffer is formatted again on each chunk instead of patching the
//! previous output: a marker such as `**` can be split across two chunks
//! and only resolves once both halves have arrived.

use crease_ai::ChunkStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::notice::FallbackNotices;

/// How a reply stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The stream finished with real content
    Completed,
    /// The stream finished with nothing but whitespace
    Empty,
    /// The request or the stream failed
    Failed(String),
    /// The exchange was aborted; whatever arrived is kept
    Cancelled,
}

/// A change to show for the reply being accumulated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update<'a> {
    /// The buffer grew; `markup` is the formatted whole buffer
    Streamed { text: &'a str, markup: String },
    /// The reply is replaced by a fallback notice
    Notice { text: &'a str, markup: String },
}

/// Growing text buffer for one reply
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    buffer: String,
    chunks: usize,
    notices: FallbackNotices,
}

impl StreamAccumulator {
    pub fn new(notices: FallbackNotices) -> Self {
        Self {
            buffer: String::new(),
            chunks: 0,
            notices,
        }
    }

    /// Append a chunk and return the formatted whole buffer
    pub fn push(&mut self, chunk: &str) -> String {
        self.buffer.push_str(chunk);
        self.chunks += 1;
        crease_markup::format(&self.buffer)
    }

    /// Text received so far
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Whether anything but whitespace has arrived
    pub fn has_content(&self) -> bool {
        !self.buffer.trim().is_empty()
    }

    /// Drain `chunks` in arrival order, reporting every change to `on_update`.
    ///
    /// Returns once the stream ends, fails, or `cancel` fires. Empty and
    /// failed replies end with one `Update::Notice`.
    pub async fn consume<F>(
        &mut self,
        mut chunks: ChunkStream,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> StreamOutcome
    where
        F: FnMut(Update<'_>),
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Reply cancelled after {} chunks", self.chunks);
                    return StreamOutcome::Cancelled;
                }
                next = chunks.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    let markup = self.push(&chunk);
                    on_update(Update::Streamed {
                        text: &self.buffer,
                        markup,
                    });
                }
                Some(Err(e)) => {
                    tracing::error!("Reply stream failed after {} chunks: {}", self.chunks, e);
                    on_update(Update::Notice {
                        text: &self.notices.failure,
                        markup: crease_markup::format(&self.notices.failure),
                    });
                    return StreamOutcome::Failed(e.to_string());
                }
                None => break,
            }
        }

        if self.has_content() {
            tracing::debug!(
                "Reply complete: {} chunks, {} bytes",
                self.chunks,
                self.buffer.len()
            );
            StreamOutcome::Completed
        } else {
            tracing::warn!("Reply stream ended without content");
            on_update(Update::Notice {
                text: &self.notices.empty,
                markup: crease_markup::format(&self.notices.empty),
            });
            StreamOutcome::Empty
        }
    }
}
