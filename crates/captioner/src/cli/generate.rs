//! The `captioner generate` command.

use anyhow::Context;
use captioner_core::config::LimitsConfig;
use captioner_core::{
    CaptionRequest, Config, ConfiguredProviders, GenerateCaption, GeneratedCaption, MimeType,
};
use clap::{Args, ValueEnum};
use console::style;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Image file to caption
    #[arg(required = true)]
    pub image: PathBuf,

    /// Tone or context hint for the caption (max 500 characters)
    #[arg(short, long)]
    pub context: Option<String>,

    /// Provider to use: gemini, openai or ollama
    #[arg(short, long, env = "CAPTIONER_PROVIDER")]
    pub provider: Option<String>,

    /// MIME type override (detected from extension or content otherwise)
    #[arg(long)]
    pub mime: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// JSON object with the caption fields and provider
    Json,
    /// Human-readable text
    Text,
}

/// Execute the generate command.
pub async fn execute(args: GenerateArgs, config: &Config) -> anyhow::Result<()> {
    let image = read_image(&args.image, &config.limits)?;
    let mime_type = detect_mime(&args.image, &image, args.mime.as_deref());
    tracing::debug!(path = ?args.image, mime_type = %mime_type, "Image loaded");

    let use_case = GenerateCaption::new(ConfiguredProviders::new(config));
    let request = CaptionRequest {
        image: &image,
        mime_type: &mime_type,
        context: args.context.as_deref(),
        provider: args.provider.as_deref(),
    };

    let spinner = create_spinner()?;
    let outcome = use_case.execute(request).await;
    spinner.finish_and_clear();

    let generated = outcome
        .into_result()
        .map_err(|e| anyhow::anyhow!("{e} [{}]", e.category()))?;

    match args.format {
        OutputFormat::Json if args.pretty => {
            println!("{}", serde_json::to_string_pretty(&generated)?)
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&generated)?),
        OutputFormat::Text => print_text(&generated),
    }

    Ok(())
}

/// Read the image, enforcing the upload size limit before loading it.
fn read_image(path: &Path, limits: &LimitsConfig) -> anyhow::Result<Vec<u8>> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("Cannot read image: {}", path.display()))?
        .len();

    let max = limits.max_file_size_bytes();
    if size > max {
        anyhow::bail!(
            "File too large: {} ({:.1} MB, maximum {} MB)",
            path.display(),
            size as f64 / (1024.0 * 1024.0),
            limits.max_file_size_mb
        );
    }
    if size == 0 {
        anyhow::bail!("Image is empty: {}", path.display());
    }

    std::fs::read(path).with_context(|| format!("Cannot read image: {}", path.display()))
}

/// MIME type for the request: the override, then the extension, then magic bytes.
///
/// Anything unrecognized is passed through so the core rejects it with the
/// list of supported types.
fn detect_mime(path: &Path, bytes: &[u8], explicit: Option<&str>) -> String {
    if let Some(mime) = explicit {
        return mime.to_string();
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(MimeType::from_extension)
        .or_else(|| MimeType::sniff(bytes))
        .map(|mime| mime.as_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

fn create_spinner() -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.set_message("Generating caption...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn print_text(generated: &GeneratedCaption) {
    let caption = &generated.caption;
    let hashtags = caption
        .hashtags()
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ");

    println!("{}", style(caption.short_caption()).bold());
    println!();
    println!("{}", caption.long_description());
    println!();
    println!("{}", style(hashtags).cyan());
    println!();
    println!("{} {}", style("CTA:").dim(), caption.cta());
    println!();
    println!(
        "{}",
        style(format!("via {}", generated.provider.display_name())).dim()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_mime_prefers_override() {
        let mime = detect_mime(Path::new("a.png"), &[], Some("image/webp"));
        assert_eq!(mime, "image/webp");
    }

    #[test]
    fn test_detect_mime_from_extension() {
        assert_eq!(detect_mime(Path::new("a.JPG"), &[], None), "image/jpeg");
        assert_eq!(detect_mime(Path::new("a.gif"), &[], None), "image/gif");
    }

    #[test]
    fn test_detect_mime_sniffs_without_extension() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime(Path::new("upload"), &png, None), "image/png");
    }

    #[test]
    fn test_detect_mime_unknown_passes_through() {
        let mime = detect_mime(Path::new("notes.txt"), b"hello", None);
        assert_eq!(mime, "application/octet-stream");
    }

    #[test]
    fn test_read_image_rejects_oversized() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; 1024 * 1024 + 1]).unwrap();

        let limits = LimitsConfig {
            max_file_size_mb: 1,
        };
        let err = read_image(file.path(), &limits).unwrap_err();
        assert!(err.to_string().contains("File too large"));
    }

    #[test]
    fn test_read_image_rejects_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = read_image(file.path(), &LimitsConfig::default()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_read_image_ok() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        let bytes = read_image(file.path(), &LimitsConfig::default()).unwrap();
        assert_eq!(bytes.len(), 4);
    }
}
