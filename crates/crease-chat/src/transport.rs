//! Transport abstraction for sending a message and streaming the reply

use async_trait::async_trait;
use crease_ai::{ChunkStream, OllamaProvider, Result};

/// Sends one user message and returns the reply as a chunk stream
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start an exchange.
    ///
    /// An `Err` means the request could not be established; failures after
    /// that arrive as `Err` items on the returned stream.
    async fn send(&self, message: &str) -> Result<ChunkStream>;
}

/// Transport backed by an Ollama server's generate endpoint
pub struct OllamaTransport {
    provider: OllamaProvider,
    model: String,
    streaming: bool,
}

impl OllamaTransport {
    /// Create a streaming transport for `model`
    pub fn new(provider: OllamaProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            streaming: true,
        }
    }

    /// Ask for the whole reply at once instead of streaming it.
    ///
    /// The reply is then delivered as a single chunk.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Transport for OllamaTransport {
    async fn send(&self, message: &str) -> Result<ChunkStream> {
        if self.streaming {
            return self.provider.stream_generate(&self.model, message).await;
        }

        tracing::debug!("Requesting buffered reply from {}", self.provider.base_url());
        let reply = self.provider.generate(&self.model, message).await?;
        Ok(Box::pin(tokio_stream::once(Ok(reply))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_by_default() {
        let transport = OllamaTransport::new(OllamaProvider::local(), "cricket-coach");
        assert!(transport.streaming);
        assert_eq!(transport.model(), "cricket-coach");
        assert!(!transport.with_streaming(false).streaming);
    }

    #[tokio::test]
    async fn test_empty_model_fails_send() {
        let transport = OllamaTransport::new(OllamaProvider::new("http://127.0.0.1:9"), "");
        assert!(transport.send("hello").await.is_err());

        let buffered = OllamaTransport::new(OllamaProvider::new("http://127.0.0.1:9"), "")
            .with_streaming(false);
        assert!(buffered.send("hello").await.is_err());
    }
}
