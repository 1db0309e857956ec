//! HTTPS client for the Gemini interactions endpoint.

use async_trait::async_trait;

use super::{Interaction, InteractionRequest, LlmClient, LlmError};
use crate::config::Config;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn create_interaction(
        &self,
        request: &InteractionRequest,
    ) -> Result<Interaction, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        tracing::debug!(
            "POST {} (model={}, continuation={:?})",
            self.api_url,
            request.model,
            request.previous_interaction_id
        );

        let response = self
            .http
            .post(&self.api_url)
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
