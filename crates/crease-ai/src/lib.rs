//! crease-ai: Streaming client for Ollama-compatible generation servers
//!
//! This crate turns a prompt into a stream of reply text fragments and
//! defines the error type shared by everything that talks to the server.

pub mod error;
pub mod providers;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use providers::{OllamaProvider, model_matches};
pub use stream::{ChunkStream, NdjsonDecoder};
pub use types::*;
