//! OpenAI provider using the Chat Completions API.
//!
//! Sends the image via data URL in the user message content array.

use super::extract::{extract_json, Fallback};
use super::prompt::build_prompt;
use super::provider::{
    parse_caption, parse_envelope, read_body, request_failure, CaptionProvider, Credential,
    ImageInput,
};
use crate::error::{BackendFailure, BackendResult};
use crate::types::CaptionResult;
use crate::values::{ImageContext, MimeType, ProviderIdentifier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    api_key: Credential,
    model: String,
    endpoint: String,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: Credential, model: &str) -> Self {
        Self::with_endpoint(api_key, model, DEFAULT_ENDPOINT)
    }

    /// Create with a custom API base URL (any OpenAI-compatible server).
    pub fn with_endpoint(api_key: Credential, model: &str, endpoint: &str) -> Self {
        Self {
            api_key,
            model: model.to_string(),
            endpoint: format!("{}/chat/completions", endpoint.trim_end_matches('/')),
            max_tokens: 1000,
            timeout: Duration::from_secs(60),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[async_trait]
impl CaptionProvider for OpenAiProvider {
    fn id(&self) -> ProviderIdentifier {
        ProviderIdentifier::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        !self.api_key.expose().is_empty()
    }

    async fn generate_caption(
        &self,
        image: &[u8],
        mime_type: MimeType,
        context: &ImageContext,
    ) -> BackendResult<CaptionResult> {
        let backend = self.id();
        let start = Instant::now();
        let image = ImageInput::from_bytes(image, mime_type);

        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ChatContent::Text {
                        text: build_prompt(context),
                    },
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_failure(backend, e))?;

        let body = read_body(backend, resp).await?;
        let chat_resp: ChatResponse = parse_envelope(backend, &body)?;

        let text = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendFailure::MalformedResponse {
                backend,
                reason: "OpenAI returned empty choices array, no content generated".to_string(),
                raw: body.clone(),
                violation: None,
            })?;

        tracing::debug!(
            provider = %backend,
            model = %self.model,
            tokens = chat_resp.usage.map(|u| u.total_tokens),
            latency_ms = start.elapsed().as_millis() as u64,
            "Backend responded"
        );

        parse_caption(backend, extract_json(&text, Fallback::None), &text)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
