//! Self-validating request values.
//!
//! Each type can only be obtained through its `parse` constructor, so a value
//! that exists is valid for its whole lifetime and is never re-checked
//! downstream.

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum context length in characters, measured after trimming.
pub const MAX_CONTEXT_CHARS: usize = 500;

/// Supported image MIME type.
///
/// `image/jpg` is kept distinct from `image/jpeg` so the value round-trips to
/// exactly the string it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    Jpeg,
    Jpg,
    Png,
    Webp,
    Gif,
}

impl MimeType {
    /// Accepted MIME strings, sorted.
    pub const SUPPORTED: [&'static str; 5] = [
        "image/gif",
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/webp",
    ];

    pub fn parse(value: &str) -> Result<Self, InputError> {
        match value {
            "image/jpeg" => Ok(Self::Jpeg),
            "image/jpg" => Ok(Self::Jpg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::Webp),
            "image/gif" => Ok(Self::Gif),
            other => Err(InputError::UnsupportedMediaType {
                mime: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Jpg => "image/jpg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Map a file extension (without the dot, any case) to a MIME type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detect the MIME type from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            // JPEG: FF D8 FF
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            // PNG: 89 50 4E 47
            [0x89, b'P', b'N', b'G', ..] => Some(Self::Png),
            // GIF: GIF8
            [b'G', b'I', b'F', b'8', ..] => Some(Self::Gif),
            // WebP: RIFF....WEBP
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MimeType {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Optional tone or context supplied with the image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageContext(Option<String>);

impl ImageContext {
    /// Trim the input; blank input becomes "no context".
    pub fn parse(value: Option<&str>) -> Result<Self, InputError> {
        let Some(trimmed) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Self(None));
        };

        let length = trimmed.chars().count();
        if length > MAX_CONTEXT_CHARS {
            return Err(InputError::ContextTooLong {
                length,
                max: MAX_CONTEXT_CHARS,
            });
        }

        Ok(Self(Some(trimmed.to_string())))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for ImageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or(""))
    }
}

/// Registered backend names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderIdentifier {
    #[default]
    Gemini,
    OpenAi,
    Ollama,
}

impl ProviderIdentifier {
    /// Every registered provider, in listing order.
    pub const ALL: [ProviderIdentifier; 3] = [Self::Gemini, Self::OpenAi, Self::Ollama];

    /// Case-insensitive parse of a provider name.
    pub fn parse(value: &str) -> Result<Self, InputError> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| InputError::UnknownProvider {
                requested: value.to_string(),
                valid: Self::ALL.iter().map(|id| id.as_str().to_string()).collect(),
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// Human-readable backend name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Google Gemini",
            Self::OpenAi => "OpenAI GPT-4",
            Self::Ollama => "Ollama (self-hosted)",
        }
    }

    /// Self-hosted backends take a base URL instead of a secret key.
    pub fn is_self_hosted(&self) -> bool {
        matches!(self, Self::Ollama)
    }
}

impl fmt::Display for ProviderIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderIdentifier {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProviderIdentifier {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProviderIdentifier> for String {
    fn from(id: ProviderIdentifier) -> Self {
        id.as_str().to_string()
    }
}
