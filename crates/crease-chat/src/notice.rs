//! Fixed replies shown when an exchange produces no real content

use crease_ai::DEFAULT_MODEL;

/// Guidance texts substituted for the assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackNotices {
    /// Shown when the stream ends without any non-whitespace text
    pub empty: String,
    /// Shown when the request or the stream fails
    pub failure: String,
}

impl FallbackNotices {
    /// Notices naming the model the user should check for
    pub fn for_model(model: &str) -> Self {
        Self {
            empty: format!(
                "I apologize, but I couldn't generate a response. \
                 Please make sure Ollama is running with the {model} model."
            ),
            failure: format!(
                "Sorry, I'm having trouble connecting to the server. Please ensure:\n\n\
                 1. **Ollama is running** on your machine\n\
                 2. The **{model}** model is loaded\n\
                 3. The backend server is running\n\n\
                 Try running: `ollama run {model}`"
            ),
        }
    }
}

impl Default for FallbackNotices {
    fn default() -> Self {
        Self::for_model(DEFAULT_MODEL)
    }
}
