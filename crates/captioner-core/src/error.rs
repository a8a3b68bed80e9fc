//! Error types for caption generation.
//!
//! Errors are organized by layer: request inputs, the caption entity,
//! backend calls, and configuration. [`CaptionError`] is the closed union
//! returned to callers, and [`ErrorCategory`] flattens it into the small
//! taxonomy an outer transport maps onto status codes.

use crate::values::{MimeType, ProviderIdentifier};
use serde::Serialize;
use thiserror::Error;

/// Top-level error type for caption generation.
#[derive(Error, Debug)]
pub enum CaptionError {
    /// The request was rejected before any backend was contacted
    #[error(transparent)]
    Input(#[from] InputError),

    /// The selected backend failed or returned unusable content
    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

impl CaptionError {
    /// Flat category for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CaptionError::Input(e) => e.category(),
            CaptionError::Backend(e) => e.category(),
        }
    }

    /// Backend involved in the failure, if one was selected.
    pub fn backend(&self) -> Option<ProviderIdentifier> {
        match self {
            CaptionError::Input(e) => e.backend(),
            CaptionError::Backend(e) => Some(e.backend()),
        }
    }
}

/// Request inputs that fail domain validation. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Unsupported MIME type: '{mime}'. Supported types: {}", MimeType::SUPPORTED.join(", "))]
    UnsupportedMediaType { mime: String },

    #[error("Context too long ({length} characters, maximum {max})")]
    ContextTooLong { length: usize, max: usize },

    #[error("Invalid provider: '{requested}'. Must be one of: {}", .valid.join(", "))]
    UnknownProvider {
        requested: String,
        valid: Vec<String>,
    },

    #[error("Invalid image: image data is empty")]
    EmptyImage,

    /// The provider is registered but has no credential configured
    #[error("Provider '{0}' is not configured")]
    ProviderUnconfigured(ProviderIdentifier),
}

impl InputError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            InputError::ProviderUnconfigured(_) => ErrorCategory::ProviderUnconfigured,
            _ => ErrorCategory::InputValidation,
        }
    }

    /// Backend named by the rejection, if any.
    pub fn backend(&self) -> Option<ProviderIdentifier> {
        match self {
            InputError::ProviderUnconfigured(id) => Some(*id),
            _ => None,
        }
    }
}

/// Violations of the caption entity's invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionValidationError {
    #[error("Short caption cannot be empty")]
    EmptyShortCaption,

    #[error("Long description cannot be empty")]
    EmptyLongDescription,

    #[error("CTA cannot be empty")]
    EmptyCta,

    #[error("At least one hashtag is required")]
    NoHashtags,

    #[error("Too many hashtags ({count}, maximum {max})")]
    TooManyHashtags { count: usize, max: usize },

    #[error("Hashtag '{0}' should not contain # symbol")]
    HashtagContainsHash(String),

    #[error("Hashtags cannot be empty")]
    EmptyHashtag,

    /// A field is missing or has the wrong JSON type
    #[error("Invalid caption data format: {0}")]
    Schema(String),
}

/// Failures raised by a backend adapter.
///
/// Every variant names the backend. Only `MalformedResponse` carries
/// response content, and only for diagnostics.
#[derive(Error, Debug)]
pub enum BackendFailure {
    /// Network error or non-success HTTP status
    #[error("AI provider '{backend}' unavailable: {reason}")]
    Unreachable {
        backend: ProviderIdentifier,
        reason: String,
    },

    /// The backend rejected the configured credential
    #[error("AI provider '{backend}' rejected its credential: {reason}")]
    InvalidCredential {
        backend: ProviderIdentifier,
        reason: String,
    },

    /// The transport timeout elapsed before the backend answered
    #[error("AI provider '{backend}' timed out: {reason}")]
    Timeout {
        backend: ProviderIdentifier,
        reason: String,
    },

    /// The backend answered with unparsable or schema-violating content
    #[error("Invalid caption data from '{backend}': {reason}")]
    MalformedResponse {
        backend: ProviderIdentifier,
        reason: String,
        raw: String,
        #[source]
        violation: Option<CaptionValidationError>,
    },
}

impl BackendFailure {
    pub fn backend(&self) -> ProviderIdentifier {
        match self {
            BackendFailure::Unreachable { backend, .. }
            | BackendFailure::InvalidCredential { backend, .. }
            | BackendFailure::Timeout { backend, .. }
            | BackendFailure::MalformedResponse { backend, .. } => *backend,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            BackendFailure::Unreachable { reason, .. }
            | BackendFailure::InvalidCredential { reason, .. }
            | BackendFailure::Timeout { reason, .. }
            | BackendFailure::MalformedResponse { reason, .. } => reason,
        }
    }

    /// Raw offending payload (malformed responses only).
    pub fn raw(&self) -> Option<&str> {
        match self {
            BackendFailure::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// The entity validation error, when the payload parsed but broke a caption invariant.
    pub fn violation(&self) -> Option<&CaptionValidationError> {
        match self {
            BackendFailure::MalformedResponse { violation, .. } => violation.as_ref(),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BackendFailure::Unreachable { .. } => ErrorCategory::BackendUnreachable,
            BackendFailure::InvalidCredential { .. } => ErrorCategory::BackendAuthRejected,
            BackendFailure::Timeout { .. } => ErrorCategory::BackendTimeout,
            BackendFailure::MalformedResponse { .. } => ErrorCategory::MalformedBackendResponse,
        }
    }
}

/// Flat failure taxonomy exposed to outer layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InputValidation,
    ProviderUnconfigured,
    BackendUnreachable,
    BackendTimeout,
    BackendAuthRejected,
    MalformedBackendResponse,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InputValidation => "input_validation",
            ErrorCategory::ProviderUnconfigured => "provider_unconfigured",
            ErrorCategory::BackendUnreachable => "backend_unreachable",
            ErrorCategory::BackendTimeout => "backend_timeout",
            ErrorCategory::BackendAuthRejected => "backend_auth_rejected",
            ErrorCategory::MalformedBackendResponse => "malformed_backend_response",
        }
    }

    /// Whether a higher layer may safely retry. Nothing in this crate retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCategory::BackendUnreachable | ErrorCategory::BackendTimeout
        )
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Convenience type alias for caption generation results.
pub type Result<T> = std::result::Result<T, CaptionError>;

/// Convenience type alias for adapter results.
pub type BackendResult<T> = std::result::Result<T, BackendFailure>;
