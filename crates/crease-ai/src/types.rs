//! Wire types for the Ollama generate API

use serde::{Deserialize, Serialize};

/// Default address of a local Ollama server
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "cricket-coach";

/// Body of a `POST /api/generate` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model name, e.g. "cricket-coach" or "llama3.2:latest"
    pub model: String,
    /// The user's message
    pub prompt: String,
    /// Whether the server should answer with newline-delimited chunks
    pub stream: bool,
}

impl GenerateRequest {
    /// Create a streaming request
    pub fn streaming(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: true,
        }
    }

    /// Create a request answered with a single JSON object
    pub fn buffered(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            stream: false,
            ..Self::streaming(model, prompt)
        }
    }
}

/// One line of a streamed reply, or the whole buffered reply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    /// Text fragment produced by the model; absent on some terminal lines
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
    /// Set when the server gave up part way through the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    /// The text fragment, empty when the line carried none
    pub fn text(&self) -> &str {
        self.response.as_deref().unwrap_or_default()
    }
}

/// A model installed on the server
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// Response of `GET /api/tags`
#[derive(Debug, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_stream_flag() {
        let json = serde_json::to_value(GenerateRequest::streaming("m", "hi")).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["prompt"], "hi");
        assert_eq!(json["stream"], true);

        let json = serde_json::to_value(GenerateRequest::buffered("m", "hi")).unwrap();
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_missing_text() {
        let r: GenerateResponse =
            serde_json::from_str(r#"{"model":"m","done":true,"total_duration":12}"#).unwrap();
        assert!(r.done);
        assert_eq!(r.text(), "");
        assert!(r.error.is_none());
    }

    #[test]
    fn test_response_error_line() {
        let r: GenerateResponse =
            serde_json::from_str(r#"{"error":"model runner has unexpectedly stopped"}"#).unwrap();
        assert_eq!(r.error.as_deref(), Some("model runner has unexpectedly stopped"));
        assert_eq!(r.text(), "");
    }

    #[test]
    fn test_model_list_tolerates_extra_fields() {
        let list: ModelList = serde_json::from_str(
            r#"{"models":[{"name":"cricket-coach:latest","size":42,"digest":"abc"}]}"#,
        )
        .unwrap();
        assert_eq!(list.models.len(), 1);
        assert_eq!(list.models[0].name, "cricket-coach:latest");
    }
}
