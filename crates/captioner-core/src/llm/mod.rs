//! Vision LLM backends for caption generation.
//!
//! Provides a provider abstraction over multiple backends (Gemini, OpenAI,
//! Ollama), the extractor that pulls JSON out of free-form model output, and
//! the factory that maps a provider name and credential to an adapter.

pub(crate) mod extract;
pub(crate) mod factory;
pub(crate) mod gemini;
pub(crate) mod ollama;
pub(crate) mod openai;
pub(crate) mod prompt;
pub(crate) mod provider;

pub use extract::{extract_json, Fallback};
pub use factory::{ConfiguredProviders, ProviderFactory, ProviderSource};
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use prompt::{build_prompt, CAPTION_PROMPT};
pub use provider::{resolve_env_var, CaptionProvider, Credential, ImageInput};
