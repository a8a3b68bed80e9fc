//! Provider selection.
//!
//! [`ProviderFactory`] is the fixed mapping from provider name to adapter.
//! [`ConfiguredProviders`] pairs it with the loaded configuration so the use
//! case can ask for an adapter by identifier and learn up front when a
//! provider has no credential.

use super::gemini::GeminiProvider;
use super::ollama::OllamaProvider;
use super::openai::OpenAiProvider;
use super::provider::{CaptionProvider, Credential};
use crate::config::{Config, LlmConfig};
use crate::error::InputError;
use crate::values::ProviderIdentifier;

/// Factory that creates the adapter for a provider.
///
/// Model names, endpoints and timeouts come from the config captured at
/// construction; the credential is passed through unexamined.
#[derive(Debug, Clone)]
pub struct ProviderFactory {
    config: LlmConfig,
}

impl ProviderFactory {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    /// Create an adapter from an untrusted provider name.
    ///
    /// The name is parsed again here, so callers that skipped
    /// [`ProviderIdentifier::parse`] still get `UnknownProvider`.
    pub fn create(
        &self,
        provider: &str,
        credential: Credential,
    ) -> Result<Box<dyn CaptionProvider>, InputError> {
        let id = ProviderIdentifier::parse(provider)?;
        Ok(self.create_for(id, credential))
    }

    /// Create an adapter for an already-parsed identifier.
    pub fn create_for(
        &self,
        provider: ProviderIdentifier,
        credential: Credential,
    ) -> Box<dyn CaptionProvider> {
        match provider {
            ProviderIdentifier::Gemini => {
                let cfg = &self.config.gemini;
                Box::new(
                    GeminiProvider::with_endpoint(credential, &cfg.model, &cfg.endpoint)
                        .with_timeout(cfg.timeout()),
                )
            }
            ProviderIdentifier::OpenAi => {
                let cfg = &self.config.openai;
                Box::new(
                    OpenAiProvider::with_endpoint(credential, &cfg.model, &cfg.endpoint)
                        .with_max_tokens(cfg.max_tokens)
                        .with_timeout(cfg.timeout()),
                )
            }
            ProviderIdentifier::Ollama => {
                let cfg = &self.config.ollama;
                // The credential is the base URL for Ollama
                Box::new(
                    OllamaProvider::new(credential.expose(), &cfg.model)
                        .with_timeout(cfg.timeout()),
                )
            }
        }
    }
}

/// Source of adapters for the caption use case.
pub trait ProviderSource: Send + Sync {
    /// Provider used when the request does not name one.
    fn default_provider(&self) -> ProviderIdentifier;

    /// Adapter for `provider`, or `ProviderUnconfigured` if it has no credential.
    fn provider(&self, provider: ProviderIdentifier)
        -> Result<Box<dyn CaptionProvider>, InputError>;
}

/// Adapters built from the loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredProviders {
    default_provider: ProviderIdentifier,
    llm: LlmConfig,
    factory: ProviderFactory,
}

impl ConfiguredProviders {
    pub fn new(config: &Config) -> Self {
        Self {
            default_provider: config.default_provider,
            llm: config.llm.clone(),
            factory: ProviderFactory::new(config.llm.clone()),
        }
    }

    /// Providers that currently have a credential.
    pub fn available(&self) -> Vec<ProviderIdentifier> {
        self.llm.available_providers()
    }
}

impl ProviderSource for ConfiguredProviders {
    fn default_provider(&self) -> ProviderIdentifier {
        self.default_provider
    }

    fn provider(
        &self,
        provider: ProviderIdentifier,
    ) -> Result<Box<dyn CaptionProvider>, InputError> {
        let credential = self
            .llm
            .credential(provider)
            .ok_or(InputError::ProviderUnconfigured(provider))?;
        self.factory.create(provider.as_str(), credential)
    }
}
