//! Google Gemini provider using the `generateContent` REST API.
//!
//! Sends the prompt and the image as an inline base64 part.

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

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider.
pub struct GeminiProvider {
    api_key: Credential,
    model: String,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: Credential, model: &str) -> Self {
        Self::with_endpoint(api_key, model, DEFAULT_ENDPOINT)
    }

    /// Create with a custom API base URL.
    pub fn with_endpoint(api_key: Credential, model: &str, endpoint: &str) -> Self {
        Self {
            api_key,
            model: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(60),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[async_trait]
impl CaptionProvider for GeminiProvider {
    fn id(&self) -> ProviderIdentifier {
        ProviderIdentifier::Gemini
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

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: build_prompt(context),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.media_type.to_string(),
                            data: image.data,
                        },
                    },
                ],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_failure(backend, e))?;

        let body = read_body(backend, resp).await?;
        let response: GenerateResponse = parse_envelope(backend, &body)?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| BackendFailure::MalformedResponse {
                backend,
                reason: "Gemini returned no text candidates".to_string(),
                raw: body.clone(),
                violation: None,
            })?;

        tracing::debug!(
            provider = %backend,
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "Backend responded"
        );

        parse_caption(backend, extract_json(&text, Fallback::None), &text)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    fn provider_for(server: &MockServer) -> GeminiProvider {
        GeminiProvider::with_endpoint(Credential::new("gm-test"), "gemini-2.0-flash", &server.uri())
    }

    #[tokio::test]
    async fn test_generate_caption_fenced_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "gm-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(
                "```json\n{\"short_caption\":\"S\",\"long_description\":\"L\",\"hashtags\":[\"x\"],\"cta\":\"C\"}\n```",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let caption = provider
            .generate_caption(&[1, 2, 3], MimeType::Png, &ImageContext::none())
            .await
            .unwrap();
        assert_eq!(caption.short_caption(), "S");
        assert_eq!(caption.hashtags(), ["x"]);
    }

    #[tokio::test]
    async fn test_request_carries_inline_image_and_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(
                r#"{"short_caption":"S","long_description":"L","hashtags":["x"],"cta":"C"}"#,
            )))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let context = ImageContext::parse(Some("formal")).unwrap();
        provider
            .generate_caption(&[1, 2, 3], MimeType::Webp, &context)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert!(parts[0]["text"]
            .as_str()
            .unwrap()
            .ends_with("Context/Tone: formal"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/webp");
        assert_eq!(parts[1]["inline_data"]["data"], "AQID");
    }

    #[tokio::test]
    async fn test_invalid_api_key_is_credential_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT",
                    "details": [{ "reason": "API_KEY_INVALID" }]
                }
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .generate_caption(&[1], MimeType::Jpeg, &ImageContext::none())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendFailure::InvalidCredential {
                backend: ProviderIdentifier::Gemini,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .generate_caption(&[1], MimeType::Jpeg, &ImageContext::none())
            .await
            .unwrap_err();
        match err {
            BackendFailure::Unreachable { backend, reason } => {
                assert_eq!(backend, ProviderIdentifier::Gemini);
                assert!(reason.contains("503"));
                assert!(reason.contains("overloaded"));
            }
            other => panic!("Expected Unreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt_without_candidates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .generate_caption(&[1], MimeType::Jpeg, &ImageContext::none())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendFailure::MalformedResponse { .. }));
        assert!(err.raw().unwrap().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(candidate("{}"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server).with_timeout(Duration::from_millis(50));
        let err = provider
            .generate_caption(&[1], MimeType::Jpeg, &ImageContext::none())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendFailure::Timeout {
                backend: ProviderIdentifier::Gemini,
                ..
            }
        ));
    }
}
