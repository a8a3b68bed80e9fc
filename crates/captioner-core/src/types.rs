//! Core data types for generated captions.

use crate::error::CaptionValidationError;
use crate::values::ProviderIdentifier;
use serde::{Deserialize, Serialize};

/// Maximum number of hashtags in a caption.
pub const MAX_HASHTAGS: usize = 10;

/// A validated caption.
///
/// Only obtainable through [`CaptionResult::new`] (or `TryFrom<CaptionFields>`),
/// so every instance satisfies the invariants checked by [`validate`](Self::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionResult {
    short_caption: String,
    long_description: String,
    hashtags: Vec<String>,
    cta: String,
}

impl CaptionResult {
    pub fn new(
        short_caption: impl Into<String>,
        long_description: impl Into<String>,
        hashtags: Vec<String>,
        cta: impl Into<String>,
    ) -> Result<Self, CaptionValidationError> {
        let caption = Self {
            short_caption: short_caption.into(),
            long_description: long_description.into(),
            hashtags,
            cta: cta.into(),
        };
        caption.validate()?;
        Ok(caption)
    }

    /// Check every invariant of the entity.
    pub fn validate(&self) -> Result<(), CaptionValidationError> {
        if self.short_caption.trim().is_empty() {
            return Err(CaptionValidationError::EmptyShortCaption);
        }
        if self.long_description.trim().is_empty() {
            return Err(CaptionValidationError::EmptyLongDescription);
        }
        if self.cta.trim().is_empty() {
            return Err(CaptionValidationError::EmptyCta);
        }
        if self.hashtags.is_empty() {
            return Err(CaptionValidationError::NoHashtags);
        }
        if self.hashtags.len() > MAX_HASHTAGS {
            return Err(CaptionValidationError::TooManyHashtags {
                count: self.hashtags.len(),
                max: MAX_HASHTAGS,
            });
        }
        for tag in &self.hashtags {
            if tag.contains('#') {
                return Err(CaptionValidationError::HashtagContainsHash(tag.clone()));
            }
            if tag.trim().is_empty() {
                return Err(CaptionValidationError::EmptyHashtag);
            }
        }
        Ok(())
    }

    pub fn short_caption(&self) -> &str {
        &self.short_caption
    }

    pub fn long_description(&self) -> &str {
        &self.long_description
    }

    pub fn hashtags(&self) -> &[String] {
        &self.hashtags
    }

    pub fn cta(&self) -> &str {
        &self.cta
    }
}

/// Unvalidated caption fields as they appear in backend JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptionFields {
    pub short_caption: String,
    pub long_description: String,
    pub hashtags: Vec<String>,
    pub cta: String,
}

impl TryFrom<CaptionFields> for CaptionResult {
    type Error = CaptionValidationError;

    fn try_from(fields: CaptionFields) -> Result<Self, Self::Error> {
        CaptionResult::new(
            fields.short_caption,
            fields.long_description,
            fields.hashtags,
            fields.cta,
        )
    }
}

/// A caption together with the provider that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCaption {
    #[serde(flatten)]
    pub caption: CaptionResult,

    /// Provider used for generation
    pub provider: ProviderIdentifier,
}
