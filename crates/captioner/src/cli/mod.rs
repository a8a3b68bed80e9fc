//! Command handlers.

pub mod config;
pub mod generate;
pub mod providers;

use captioner_core::{Config, ConfigError};
use std::path::Path;

/// Load the config at `path`, or defaults when no file exists there.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        Config::load_from(path)
    } else {
        Ok(Config::default())
    }
}
