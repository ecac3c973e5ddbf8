//! Generation server clients

pub mod ollama;

pub use ollama::{OllamaProvider, model_matches};
