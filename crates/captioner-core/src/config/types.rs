//! Sub-configuration structs with their defaults.

use crate::llm::{resolve_env_var, Credential};
use crate::values::ProviderIdentifier;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits applied to uploads before the core is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image size in megabytes
    pub max_file_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
        }
    }
}

impl LimitsConfig {
    /// Saturates for limits too large to express in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// LLM provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Google Gemini configuration
    pub gemini: GeminiConfig,

    /// OpenAI configuration
    pub openai: OpenAiConfig,

    /// Ollama (self-hosted) configuration
    pub ollama: OllamaConfig,
}

impl LlmConfig {
    /// Resolve the credential for a provider.
    ///
    /// Cloud providers yield their API key, Ollama yields its base URL.
    /// `None` means the provider is not configured.
    pub fn credential(&self, provider: ProviderIdentifier) -> Option<Credential> {
        let raw = match provider {
            ProviderIdentifier::Gemini => &self.gemini.api_key,
            ProviderIdentifier::OpenAi => &self.openai.api_key,
            ProviderIdentifier::Ollama => &self.ollama.endpoint,
        };
        resolve_env_var(raw).map(Credential::new)
    }

    /// Providers that currently have a credential.
    pub fn available_providers(&self) -> Vec<ProviderIdentifier> {
        ProviderIdentifier::ALL
            .into_iter()
            .filter(|id| self.credential(*id).is_some())
            .collect()
    }
}

/// Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GEMINI_API_KEY}".to_string(),
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama API base URL (supports ${ENV_VAR} syntax)
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Request timeout in seconds. Local inference can be slow.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llava".to_string(),
            timeout_secs: 300,
        }
    }
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl OllamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
