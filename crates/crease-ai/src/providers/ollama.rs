//! Ollama generate API provider

use async_stream::stream;
use futures::StreamExt;

use crate::{
    error::{Error, Result},
    stream::{ChunkStream, NdjsonDecoder},
    types::{DEFAULT_BASE_URL, GenerateRequest, GenerateResponse, ModelInfo, ModelList},
};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaProvider {
    /// Create a provider for the server at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a provider for a server on the default local port
    pub fn local() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Server address without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    /// Stream a reply to `prompt`, one text fragment per item
    pub async fn stream_generate(&self, model: &str, prompt: &str) -> Result<ChunkStream> {
        check_model(model)?;
        let request = GenerateRequest::streaming(model, prompt);

        tracing::debug!("Streaming generate request to {} (model {})", self.base_url, model);

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::status(status, body));
        }

        Ok(Box::pin(create_stream(response)))
    }

    /// Ask for the whole reply in a single response
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        check_model(model)?;
        let request = GenerateRequest::buffered(model, prompt);

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::status(status, body));
        }

        let body = response.text().await?;
        let reply: GenerateResponse = serde_json::from_str(&body)?;
        if let Some(message) = reply.error {
            return Err(Error::Server(message));
        }
        Ok(reply.text().to_string())
    }

    /// List models installed on the server
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::status(status, body));
        }

        let body = response.text().await?;
        let list: ModelList = serde_json::from_str(&body)?;
        Ok(list.models)
    }

    /// Whether a model with this name (with or without a `:tag`) is installed
    pub async fn has_model(&self, name: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| model_matches(&m.name, name)))
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::local()
    }
}

fn check_model(model: &str) -> Result<()> {
    if model.trim().is_empty() {
        return Err(Error::InvalidConfig("model name is empty".to_string()));
    }
    Ok(())
}

/// Whether an installed model name refers to `wanted`.
///
/// `cricket-coach` matches an installed `cricket-coach:latest`.
pub fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || installed
            .split_once(':')
            .is_some_and(|(base, _)| base == wanted)
}

fn create_stream(response: reqwest::Response) -> impl futures::Stream<Item = Result<String>> {
    stream! {
        let mut body = response.bytes_stream();
        let mut decoder = NdjsonDecoder::new();

        while let Some(item) = body.next().await {
            match item {
                Ok(bytes) => {
                    for item in decoder.push(&bytes) {
                        let failed = item.is_err();
                        yield item;
                        if failed {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Generate stream broke off: {}", e);
                    yield Err(Error::Stream(e.to_string()));
                    return;
                }
            }
        }

        if let Some(item) = decoder.finish() {
            yield item;
        }
    }
}
