//! Client for the remote model service.
//!
//! The agent talks to the model through [`LlmClient`], so the loop can run
//! against the real HTTPS client or a scripted one in tests.

mod gemini;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;
pub use types::{
    GenerationConfig, InputItem, Interaction, InteractionInput, InteractionRequest, Output,
    ToolCall, ToolResult,
};

/// Failure talking to the model service. Aborts the current turn.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing GEMINI_API_KEY")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one request and return the model's response.
    async fn create_interaction(
        &self,
        request: &InteractionRequest,
    ) -> Result<Interaction, LlmError>;
}
