//! Logging initialization.
//!
//! Log output goes to stderr so stdout stays reserved for caption output.

use captioner_core::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` table, with CLI flag overrides.
pub fn init_from_config(config: &LoggingConfig, verbose: bool, json_logs: bool) {
    init(
        effective_level(config, verbose),
        json_logs || config.format == "json",
    );
}

/// `--verbose` raises the level to debug but never lowers trace.
fn effective_level(config: &LoggingConfig, verbose: bool) -> &str {
    match config.level.as_str() {
        "trace" => "trace",
        _ if verbose => "debug",
        level => level,
    }
}
