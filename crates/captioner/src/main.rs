//! Captioner CLI - social media captions for images from vision LLMs.
//!
//! # Usage
//!
//! ```bash
//! # Caption an image with the default provider
//! captioner generate photo.jpg
//!
//! # Pick a provider and a tone
//! captioner generate photo.png --provider ollama --context "playful, summer vibes"
//!
//! # List providers and probe the configured ones
//! captioner providers --check
//!
//! # View configuration
//! captioner config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Captioner - social media captions for images from vision LLMs.
#[derive(Parser, Debug)]
#[command(name = "captioner")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "CAPTIONER_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a caption for one image
    Generate(cli::generate::GenerateArgs),

    /// List caption providers and their configuration status
    Providers(cli::providers::ProvidersArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
        .unwrap_or_else(captioner_core::Config::default_path);

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match cli::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `captioner config path`."
            );
            captioner_core::Config::default()
        }
    };
    logging::init_from_config(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("Captioner v{}", captioner_core::VERSION);

    match cli.command {
        Commands::Generate(args) => cli::generate::execute(args, &config).await,
        Commands::Providers(args) => cli::providers::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config_path).await,
    }
}
