//! Captioner Core - social media captions for images from vision LLMs.
//!
//! Takes one image plus an optional tone hint and returns a validated
//! caption: a short caption, a long description, hashtags and a call to
//! action. The backend is chosen per request from a fixed set of providers.
//!
//! # Architecture
//!
//! ```text
//! Request → Validate inputs → Select provider → Vision LLM → Extract JSON → CaptionResult
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use captioner_core::{CaptionRequest, Config, ConfiguredProviders, GenerateCaption};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let use_case = GenerateCaption::new(ConfiguredProviders::new(&config));
//!
//!     let image = std::fs::read("./photo.jpg")?;
//!     let caption = use_case
//!         .execute(CaptionRequest {
//!             image: &image,
//!             mime_type: "image/jpeg",
//!             context: Some("playful"),
//!             provider: None,
//!         })
//!         .await
//!         .into_result()?;
//!     println!("{}", caption.caption.short_caption());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod types;
pub mod usecase;
pub mod values;

pub use config::Config;
pub use error::{
    BackendFailure, BackendResult, CaptionError, CaptionValidationError, ConfigError,
    ErrorCategory, InputError, Result,
};
pub use llm::{CaptionProvider, ConfiguredProviders, Credential, ProviderFactory, ProviderSource};
pub use types::{CaptionResult, GeneratedCaption};
pub use usecase::{CaptionRequest, GenerateCaption, Outcome};
pub use values::{ImageContext, MimeType, ProviderIdentifier};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
