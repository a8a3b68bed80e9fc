//! Caption provider trait and the plumbing shared by every adapter.
//!
//! Defines the interface that all backends implement, the opaque credential
//! they are constructed with, and the helpers that translate transport
//! errors and model output into the crate's error taxonomy.

use crate::error::{BackendFailure, BackendResult, CaptionValidationError};
use crate::types::{CaptionFields, CaptionResult};
use crate::values::{ImageContext, MimeType, ProviderIdentifier};
use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;

/// Base64-encoded image ready to send to an LLM API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type of the image
    pub media_type: MimeType,
}

impl ImageInput {
    pub fn from_bytes(bytes: &[u8], media_type: MimeType) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type,
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Opaque provider credential: an API key for cloud backends, a base URL
/// for self-hosted ones. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Trait that all caption backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn CaptionProvider>` for dynamic dispatch).
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Which backend this adapter talks to.
    fn id(&self) -> ProviderIdentifier;

    /// Model name sent to the backend.
    fn model(&self) -> &str;

    /// Check whether the provider is configured and reachable.
    async fn is_available(&self) -> bool;

    /// Generate a caption with exactly one backend call.
    async fn generate_caption(
        &self,
        image: &[u8],
        mime_type: MimeType,
        context: &ImageContext,
    ) -> BackendResult<CaptionResult>;

    /// Transport timeout ceiling for this provider.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Map a `reqwest` send/read error onto the taxonomy.
pub(crate) fn request_failure(backend: ProviderIdentifier, err: reqwest::Error) -> BackendFailure {
    if err.is_timeout() {
        BackendFailure::Timeout {
            backend,
            reason: err.to_string(),
        }
    } else {
        BackendFailure::Unreachable {
            backend,
            reason: err.to_string(),
        }
    }
}

/// Read the response body, turning non-success statuses into failures.
pub(crate) async fn read_body(
    backend: ProviderIdentifier,
    resp: reqwest::Response,
) -> BackendResult<String> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| request_failure(backend, e))?;

    if status.is_success() {
        return Ok(text);
    }

    let reason = format!("HTTP {status}: {text}");
    if is_auth_rejection(status, &text) {
        Err(BackendFailure::InvalidCredential { backend, reason })
    } else if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        Err(BackendFailure::Timeout { backend, reason })
    } else {
        Err(BackendFailure::Unreachable { backend, reason })
    }
}

/// 401/403, or Gemini's 400 with `API_KEY_INVALID`.
fn is_auth_rejection(status: StatusCode, body: &str) -> bool {
    status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || (status == StatusCode::BAD_REQUEST && body.contains("API_KEY_INVALID"))
}

/// Parse a backend's JSON envelope, keeping the body for diagnostics on failure.
pub(crate) fn parse_envelope<T: serde::de::DeserializeOwned>(
    backend: ProviderIdentifier,
    body: &str,
) -> BackendResult<T> {
    serde_json::from_str(body).map_err(|e| BackendFailure::MalformedResponse {
        backend,
        reason: format!("Failed to parse {backend} response envelope: {e}"),
        raw: body.to_string(),
        violation: None,
    })
}

/// Parse extracted model text as JSON and build a validated caption.
///
/// `raw` is the untouched model output, preserved on failure.
pub(crate) fn parse_caption(
    backend: ProviderIdentifier,
    json_text: &str,
    raw: &str,
) -> BackendResult<CaptionResult> {
    let value: serde_json::Value =
        serde_json::from_str(json_text).map_err(|e| BackendFailure::MalformedResponse {
            backend,
            reason: format!("Failed to parse JSON: {e}"),
            raw: raw.to_string(),
            violation: None,
        })?;
    caption_from_value(backend, value, raw)
}

/// Build a validated caption from parsed JSON.
pub(crate) fn caption_from_value(
    backend: ProviderIdentifier,
    value: serde_json::Value,
    raw: &str,
) -> BackendResult<CaptionResult> {
    let invalid = |violation: CaptionValidationError| BackendFailure::MalformedResponse {
        backend,
        reason: violation.to_string(),
        raw: raw.to_string(),
        violation: Some(violation),
    };

    let fields: CaptionFields = serde_json::from_value(value)
        .map_err(|e| invalid(CaptionValidationError::Schema(e.to_string())))?;
    CaptionResult::try_from(fields).map_err(invalid)
}
