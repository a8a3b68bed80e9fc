//! Ollama provider for self-hosted vision model inference.
//!
//! Talks to an Ollama instance via its HTTP API in strict JSON mode.
//! No authentication: the credential is the instance's base URL.

use super::extract::{extract_json, Fallback};
use super::prompt::build_prompt;
use super::provider::{
    caption_from_value, parse_caption, parse_envelope, read_body, request_failure,
    CaptionProvider, ImageInput,
};
use crate::error::BackendResult;
use crate::types::CaptionResult;
use crate::values::{ImageContext, MimeType, ProviderIdentifier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Ollama provider for self-hosted vision model inference.
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            // Vision models running locally can be slow
            timeout: Duration::from_secs(300),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse the model output, trying strict JSON before the extractor.
    fn parse_output(&self, text: &str) -> BackendResult<CaptionResult> {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => caption_from_value(self.id(), value, text),
            Err(e) => {
                tracing::debug!(
                    provider = %self.id(),
                    error = %e,
                    "Strict JSON parse failed, falling back to extraction"
                );
                parse_caption(
                    self.id(),
                    extract_json(text, Fallback::OutermostBraces),
                    text,
                )
            }
        }
    }
}

/// Ollama /api/generate request body.
#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
    stream: bool,
    format: String,
}

/// Ollama /api/generate response.
#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl CaptionProvider for OllamaProvider {
    fn id(&self) -> ProviderIdentifier {
        ProviderIdentifier::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.client.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn generate_caption(
        &self,
        image: &[u8],
        mime_type: MimeType,
        context: &ImageContext,
    ) -> BackendResult<CaptionResult> {
        let backend = self.id();
        let url = format!("{}/api/generate", self.endpoint);
        let start = Instant::now();
        let image = ImageInput::from_bytes(image, mime_type);

        let body = OllamaRequest {
            model: self.model.clone(),
            prompt: build_prompt(context),
            images: vec![image.data],
            stream: false,
            format: "json".to_string(),
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_failure(backend, e))?;

        let body = read_body(backend, resp).await?;
        let ollama_resp: OllamaResponse = parse_envelope(backend, &body)?;

        tracing::debug!(
            provider = %backend,
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "Backend responded"
        );

        self.parse_output(&ollama_resp.response)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
