//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.llm.gemini.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llm.gemini.timeout_secs must be > 0".into(),
            ));
        }
        if self.llm.openai.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llm.openai.timeout_secs must be > 0".into(),
            ));
        }
        if self.llm.ollama.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llm.ollama.timeout_secs must be > 0".into(),
            ));
        }
        if self.llm.openai.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "llm.openai.max_tokens must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        if self.llm.available_providers().is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one AI provider must be configured \
                 (GEMINI_API_KEY, OPENAI_API_KEY, or llm.ollama.endpoint)"
                    .into(),
            ));
        }
        Ok(())
    }
}
