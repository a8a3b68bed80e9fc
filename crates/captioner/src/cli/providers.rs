//! The `captioner providers` command.

use captioner_core::{Config, ConfiguredProviders, ProviderIdentifier, ProviderSource};
use clap::Args;
use console::style;

/// Arguments for the `providers` command.
#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Probe each configured provider for reachability
    #[arg(long)]
    pub check: bool,
}

/// Execute the providers command.
pub async fn execute(args: ProvidersArgs, config: &Config) -> anyhow::Result<()> {
    let providers = ConfiguredProviders::new(config);
    let available = providers.available();

    for id in ProviderIdentifier::ALL {
        let configured = available.contains(&id);
        let marker = if id == providers.default_provider() {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        let status = match (configured, args.check) {
            (false, _) => style("not configured").yellow().to_string(),
            (true, false) => style("configured").green().to_string(),
            (true, true) => probe(&providers, id).await,
        };

        println!(
            "{marker} {:<8} {:<22} {:<18} {status}",
            id.as_str(),
            id.display_name(),
            model_for(config, id),
        );
    }

    Ok(())
}

async fn probe(providers: &ConfiguredProviders, id: ProviderIdentifier) -> String {
    match providers.provider(id) {
        Ok(adapter) if adapter.is_available().await => style("available").green().to_string(),
        Ok(_) => style("unavailable").red().to_string(),
        Err(e) => style(e.to_string()).red().to_string(),
    }
}

fn model_for(config: &Config, id: ProviderIdentifier) -> &str {
    match id {
        ProviderIdentifier::Gemini => config.llm.gemini.model.as_str(),
        ProviderIdentifier::OpenAi => config.llm.openai.model.as_str(),
        ProviderIdentifier::Ollama => config.llm.ollama.model.as_str(),
    }
}
