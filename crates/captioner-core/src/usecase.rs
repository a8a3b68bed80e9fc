//! The caption generation use case.
//!
//! Validates request inputs, selects and invokes one adapter, re-checks the
//! returned caption, and logs exactly one event at the start and one at the
//! terminal outcome. No retries and no timeout at this layer: timeouts are
//! enforced by each adapter's transport.

use crate::error::{BackendFailure, CaptionError, InputError};
use crate::llm::ProviderSource;
use crate::types::{CaptionResult, GeneratedCaption};
use crate::values::{ImageContext, MimeType, ProviderIdentifier};

/// One caption request as received from the transport layer.
#[derive(Debug, Clone, Copy)]
pub struct CaptionRequest<'a> {
    /// Raw image bytes
    pub image: &'a [u8],
    /// Declared MIME type string
    pub mime_type: &'a str,
    /// Optional tone/context
    pub context: Option<&'a str>,
    /// Optional provider name; the source's default when absent
    pub provider: Option<&'a str>,
}

/// Terminal outcome of a caption request.
#[derive(Debug)]
pub enum Outcome {
    Success(GeneratedCaption),
    ValidationRejected(InputError),
    BackendFailed(BackendFailure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<GeneratedCaption, CaptionError> {
        match self {
            Outcome::Success(caption) => Ok(caption),
            Outcome::ValidationRejected(e) => Err(e.into()),
            Outcome::BackendFailed(e) => Err(e.into()),
        }
    }
}

/// Inputs after validation.
struct Validated {
    mime_type: MimeType,
    context: ImageContext,
    provider: ProviderIdentifier,
}

/// Generate a caption for one image.
pub struct GenerateCaption<S> {
    source: S,
}

impl<S: ProviderSource> GenerateCaption<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run the request to a terminal outcome.
    pub async fn execute(&self, request: CaptionRequest<'_>) -> Outcome {
        tracing::info!(
            provider = request.provider.unwrap_or(self.source.default_provider().as_str()),
            mime_type = request.mime_type,
            has_context = request.context.is_some(),
            image_size = request.image.len(),
            "Starting caption generation"
        );

        let outcome = self.run(request).await;
        log_outcome(&outcome);
        outcome
    }

    async fn run(&self, request: CaptionRequest<'_>) -> Outcome {
        let validated = match self.validate(&request) {
            Ok(validated) => validated,
            Err(e) => return Outcome::ValidationRejected(e),
        };

        tracing::debug!(
            mime_type = %validated.mime_type,
            has_context = validated.context.is_present(),
            provider = %validated.provider,
            "Inputs validated"
        );

        let adapter = match self.source.provider(validated.provider) {
            Ok(adapter) => adapter,
            Err(e) => return Outcome::ValidationRejected(e),
        };

        let caption = match adapter
            .generate_caption(request.image, validated.mime_type, &validated.context)
            .await
        {
            Ok(caption) => caption,
            Err(e) => return Outcome::BackendFailed(e),
        };

        // Entity invariants hold for the adapter's output too
        if let Err(violation) = caption.validate() {
            return Outcome::BackendFailed(BackendFailure::MalformedResponse {
                backend: adapter.id(),
                reason: violation.to_string(),
                raw: raw_caption(&caption),
                violation: Some(violation),
            });
        }

        Outcome::Success(GeneratedCaption {
            caption,
            provider: adapter.id(),
        })
    }

    /// Parse every input; the first failure wins.
    fn validate(&self, request: &CaptionRequest<'_>) -> Result<Validated, InputError> {
        let mime_type = MimeType::parse(request.mime_type)?;
        let context = ImageContext::parse(request.context)?;
        let provider = match request.provider.map(str::trim).filter(|p| !p.is_empty()) {
            Some(name) => ProviderIdentifier::parse(name)?,
            None => self.source.default_provider(),
        };

        if request.image.is_empty() {
            return Err(InputError::EmptyImage);
        }

        Ok(Validated {
            mime_type,
            context,
            provider,
        })
    }
}

/// Caption as JSON for diagnostics; never blank.
fn raw_caption(caption: &CaptionResult) -> String {
    serde_json::to_string(caption).unwrap_or_else(|e| format!("<unserializable caption: {e}>"))
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Success(generated) => tracing::info!(
            provider = %generated.provider,
            hashtag_count = generated.caption.hashtags().len(),
            "Caption generated successfully"
        ),
        Outcome::ValidationRejected(e) => tracing::warn!(
            provider = e.backend().map(|id| id.as_str()),
            category = %e.category(),
            error = %e,
            "Input validation failed"
        ),
        Outcome::BackendFailed(e) => match e.raw() {
            Some(raw) => tracing::error!(
                provider = %e.backend(),
                category = %e.category(),
                error = %e,
                raw,
                "Caption generation failed"
            ),
            None => tracing::error!(
                provider = %e.backend(),
                category = %e.category(),
                error = %e,
                "Caption generation failed"
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{BackendResult, CaptionValidationError, ErrorCategory};
    use crate::llm::{CaptionProvider, ConfiguredProviders};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    type ResponseFn = dyn Fn() -> BackendResult<CaptionResult> + Send + Sync;

    /// A mock adapter whose response is produced by a closure.
    #[derive(Clone)]
    struct MockProvider {
        id: ProviderIdentifier,
        response_fn: Arc<ResponseFn>,
        /// Shared call counter for post-hoc assertions.
        call_count: Arc<AtomicU32>,
    }

    impl MockProvider {
        fn success() -> Self {
            Self::with(|| {
                Ok(CaptionResult::new("S", "L", vec!["x".into(), "y".into()], "C").unwrap())
            })
        }

        fn failing(make: fn() -> BackendFailure) -> Self {
            Self::with(move || Err(make()))
        }

        fn with(f: impl Fn() -> BackendResult<CaptionResult> + Send + Sync + 'static) -> Self {
            Self {
                id: ProviderIdentifier::Gemini,
                response_fn: Arc::new(f),
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }
    }

    #[async_trait]
    impl CaptionProvider for MockProvider {
        fn id(&self) -> ProviderIdentifier {
            self.id
        }

        fn model(&self) -> &str {
            "mock-v1"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn generate_caption(
            &self,
            _image: &[u8],
            _mime_type: MimeType,
            _context: &ImageContext,
        ) -> BackendResult<CaptionResult> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            (self.response_fn)()
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(60)
        }
    }

    /// Hands out the mock for every configured provider.
    struct MockSource {
        provider: MockProvider,
        configured: Vec<ProviderIdentifier>,
    }

    impl MockSource {
        fn new(provider: MockProvider) -> Self {
            Self {
                provider,
                configured: ProviderIdentifier::ALL.to_vec(),
            }
        }
    }

    impl ProviderSource for MockSource {
        fn default_provider(&self) -> ProviderIdentifier {
            ProviderIdentifier::Gemini
        }

        fn provider(
            &self,
            provider: ProviderIdentifier,
        ) -> Result<Box<dyn CaptionProvider>, InputError> {
            if !self.configured.contains(&provider) {
                return Err(InputError::ProviderUnconfigured(provider));
            }
            let mut mock = self.provider.clone();
            mock.id = provider;
            Ok(Box::new(mock))
        }
    }

    fn request<'a>(image: &'a [u8]) -> CaptionRequest<'a> {
        CaptionRequest {
            image,
            mime_type: "image/jpeg",
            context: None,
            provider: None,
        }
    }

    #[tokio::test]
    async fn test_success_with_default_provider() {
        let use_case = GenerateCaption::new(MockSource::new(MockProvider::success()));
        let outcome = use_case.execute(request(&[1, 2, 3])).await;

        match outcome {
            Outcome::Success(generated) => {
                assert_eq!(generated.provider, ProviderIdentifier::Gemini);
                assert_eq!(generated.caption.short_caption(), "S");
                assert_eq!(generated.caption.hashtags().len(), 2);
            }
            other => panic!("Expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_explicit_provider_is_case_insensitive() {
        let use_case = GenerateCaption::new(MockSource::new(MockProvider::success()));
        let outcome = use_case
            .execute(CaptionRequest {
                provider: Some(" OLLAMA "),
                ..request(&[1])
            })
            .await;
        let generated = outcome.into_result().unwrap();
        assert_eq!(generated.provider, ProviderIdentifier::Ollama);
    }

    #[tokio::test]
    async fn test_validation_short_circuits_in_order() {
        let mock = MockProvider::success();
        let calls = mock.call_count.clone();
        let use_case = GenerateCaption::new(MockSource::new(mock));

        // Bad MIME wins over bad context and bad provider
        let long = "x".repeat(600);
        let outcome = use_case
            .execute(CaptionRequest {
                image: &[1],
                mime_type: "image/tiff",
                context: Some(long.as_str()),
                provider: Some("nope"),
            })
            .await;
        assert!(matches!(
            outcome,
            Outcome::ValidationRejected(InputError::UnsupportedMediaType { .. })
        ));

        let outcome = use_case
            .execute(CaptionRequest {
                context: Some(long.as_str()),
                provider: Some("nope"),
                ..request(&[1])
            })
            .await;
        assert!(matches!(
            outcome,
            Outcome::ValidationRejected(InputError::ContextTooLong { .. })
        ));

        let outcome = use_case
            .execute(CaptionRequest {
                provider: Some("nope"),
                ..request(&[1])
            })
            .await;
        assert!(matches!(
            outcome,
            Outcome::ValidationRejected(InputError::UnknownProvider { .. })
        ));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_image_rejected_before_backend() {
        let mock = MockProvider::success();
        let calls = mock.call_count.clone();
        let use_case = GenerateCaption::new(MockSource::new(mock));

        let outcome = use_case.execute(request(&[])).await;
        assert!(matches!(
            outcome,
            Outcome::ValidationRejected(InputError::EmptyImage)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_provider() {
        let mut source = MockSource::new(MockProvider::success());
        source.configured = vec![ProviderIdentifier::Gemini];
        let use_case = GenerateCaption::new(source);

        let err = use_case
            .execute(CaptionRequest {
                provider: Some("openai"),
                ..request(&[1])
            })
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ProviderUnconfigured);
        assert_eq!(err.backend(), Some(ProviderIdentifier::OpenAi));
    }

    #[test]
    fn test_raw_caption_is_json() {
        let caption = CaptionResult::new("S", "L", vec!["x".into()], "C").unwrap();
        assert_eq!(
            raw_caption(&caption),
            r#"{"short_caption":"S","long_description":"L","hashtags":["x"],"cta":"C"}"#
        );
    }

    #[tokio::test]
    async fn test_backend_failure_is_forwarded_once() {
        let mock = MockProvider::failing(|| BackendFailure::Timeout {
            backend: ProviderIdentifier::Gemini,
            reason: "operation timed out".to_string(),
        });
        let calls = mock.call_count.clone();
        let use_case = GenerateCaption::new(MockSource::new(mock));

        let err = use_case
            .execute(request(&[1]))
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::BackendTimeout);
        // No retries at this layer
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entity_violation_surfaces_as_data_error() {
        let mock = MockProvider::failing(|| BackendFailure::MalformedResponse {
            backend: ProviderIdentifier::Gemini,
            reason: "Too many hashtags".to_string(),
            raw: "{}".to_string(),
            violation: Some(CaptionValidationError::TooManyHashtags { count: 12, max: 10 }),
        });
        let use_case = GenerateCaption::new(MockSource::new(mock));

        match use_case.execute(request(&[1])).await {
            Outcome::BackendFailed(e) => {
                assert_eq!(e.category(), ErrorCategory::MalformedBackendResponse);
                assert!(matches!(
                    e.violation(),
                    Some(CaptionValidationError::TooManyHashtags { .. })
                ));
            }
            other => panic!("Expected BackendFailed, got {other:?}"),
        }
    }

    // --- End-to-end through the real factory and adapters ---

    fn config_for(provider: ProviderIdentifier, endpoint: &str) -> Config {
        let mut config = Config::default();
        config.default_provider = provider;
        config.llm.openai.api_key = "sk-test".to_string();
        config.llm.openai.endpoint = endpoint.to_string();
        config.llm.ollama.endpoint = endpoint.to_string();
        config
    }

    #[tokio::test]
    async fn test_end_to_end_fenced_json() {
        let server = MockServer::start().await;
        let content = "```json\n{\"short_caption\":\"S\",\"long_description\":\"L\",\"hashtags\":[\"x\",\"y\"],\"cta\":\"C\"}\n```";
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_for(ProviderIdentifier::OpenAi, &server.uri());
        let use_case = GenerateCaption::new(ConfiguredProviders::new(&config));
        let generated = use_case
            .execute(CaptionRequest {
                context: Some("cheerful"),
                ..request(&[0xFF, 0xD8, 0xFF])
            })
            .await
            .into_result()
            .unwrap();

        assert_eq!(generated.provider, ProviderIdentifier::OpenAi);
        assert_eq!(generated.caption.short_caption(), "S");
        assert_eq!(generated.caption.long_description(), "L");
        assert_eq!(generated.caption.hashtags(), ["x", "y"]);
        assert_eq!(generated.caption.cta(), "C");
    }

    #[tokio::test]
    async fn test_end_to_end_transport_error_names_backend() {
        let config = config_for(ProviderIdentifier::Ollama, "http://127.0.0.1:1");
        let use_case = GenerateCaption::new(ConfiguredProviders::new(&config));

        let err = use_case
            .execute(request(&[1, 2, 3]))
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::BackendUnreachable);
        assert_eq!(err.backend(), Some(ProviderIdentifier::Ollama));
    }

    #[tokio::test]
    async fn test_end_to_end_garbage_preserves_raw_text() {
        let server = MockServer::start().await;
        let garbage = "  I'm sorry, I cannot describe this image. ";
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llava",
                "response": garbage,
                "done": true
            })))
            .mount(&server)
            .await;

        let config = config_for(ProviderIdentifier::Ollama, &server.uri());
        let use_case = GenerateCaption::new(ConfiguredProviders::new(&config));

        match use_case.execute(request(&[1, 2, 3])).await {
            Outcome::BackendFailed(e) => {
                assert_eq!(e.category(), ErrorCategory::MalformedBackendResponse);
                assert_eq!(e.backend(), ProviderIdentifier::Ollama);
                assert_eq!(e.raw(), Some(garbage));
            }
            other => panic!("Expected BackendFailed, got {other:?}"),
        }
    }
}
