use anyhow::Result;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ImageRequestAdapter;
use crate::config::{Config, DisplayMode};
use crate::core::batch::BatchFailure;
use crate::core::{
    generate_batch, BatchMode, BatchOutcome, EnhancementSettings, GenerationRequest, Style,
};
use crate::output;

#[derive(Args)]
pub struct GenerateArgs {
    /// The prompt describing the image to generate
    #[arg(required = true)]
    pub prompt: String,

    /// Style (Realistic, Anime, Sketch, Cyberpunk, 3D Art, Cartoon, Digital Painting)
    #[arg(short, long)]
    pub style: Option<String>,

    /// Number of images to generate (1-4)
    #[arg(short = 'n', long)]
    pub count: Option<u8>,

    /// Image width in pixels (base64_json endpoints)
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels (base64_json endpoints)
    #[arg(long)]
    pub height: Option<u32>,

    /// Inference steps (base64_json endpoints)
    #[arg(long)]
    pub steps: Option<u32>,

    /// Brightness factor (0.5 - 2.0)
    #[arg(long)]
    pub brightness: Option<f32>,

    /// Contrast factor (0.5 - 2.0)
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Sharpness factor (0.5 - 2.0)
    #[arg(long)]
    pub sharpness: Option<f32>,

    /// Output directory for generated images
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also bundle all images into pixelgenius_images.zip
    #[arg(short, long)]
    pub zip: bool,

    /// Don't save individual images
    #[arg(long)]
    pub no_save: bool,

    /// Send all requests at once instead of one after another
    #[arg(long)]
    pub parallel: bool,

    /// Output format (text, json, quiet)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

#[derive(Serialize)]
struct ImageSummary {
    index: usize,
    width: u32,
    height: u32,
    /// Encoding the endpoint delivered; saved files are always PNG
    source_format: &'static str,
    received_bytes: usize,
    path: Option<PathBuf>,
}

#[derive(Serialize)]
struct GenerateSummary<'a> {
    prompt: &'a str,
    style: &'a str,
    combined_prompt: String,
    requested: usize,
    filters: EnhancementSettings,
    images: Vec<ImageSummary>,
    failures: &'a [BatchFailure],
    archive: Option<PathBuf>,
}

/// Build the request from arguments, falling back to config defaults
fn build_request(args: &GenerateArgs, config: &Config) -> Result<GenerationRequest> {
    let style = match &args.style {
        Some(s) => s.parse::<Style>()?,
        None => config.defaults.style,
    };

    let mut request = GenerationRequest::new(&args.prompt)
        .with_style(style)
        .with_size(
            args.width.unwrap_or(config.defaults.width),
            args.height.unwrap_or(config.defaults.height),
        );
    if let Some(steps) = args.steps.or(config.defaults.inference_steps) {
        request = request.with_inference_steps(steps);
    }

    request.validate()?;
    Ok(request)
}

fn build_filters(args: &GenerateArgs, config: &Config) -> EnhancementSettings {
    EnhancementSettings::new(
        args.brightness.unwrap_or(config.filters.brightness),
        args.contrast.unwrap_or(config.filters.contrast),
        args.sharpness.unwrap_or(config.filters.sharpness),
    )
}

pub async fn run(args: GenerateArgs, config: &Config) -> Result<()> {
    // Blank prompts never reach the endpoint
    let request = build_request(&args, config)?;
    let filters = build_filters(&args, config);
    let count = args.count.unwrap_or(config.defaults.num_images);
    let mode = if args.parallel {
        BatchMode::Concurrent
    } else {
        BatchMode::Sequential
    };

    let adapter = ImageRequestAdapter::new(&config.api)?;

    // Show progress
    let pb = if args.format == "text" {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.magenta} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("🚀 Generating images: {}...", request.prompt_preview(40)));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut outcome = generate_batch(&adapter, &request, count, mode).await;
    outcome.enhance(&filters);

    if let Some(pb) = &pb {
        if outcome.is_empty() {
            pb.finish_with_message(format!("{} No images generated", "✗".red()));
        } else {
            pb.finish_with_message(format!(
                "{} Generated {} of {} image(s)",
                "✓".green(),
                outcome.images.len(),
                outcome.requested
            ));
        }
    }

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    let bitmaps: Vec<_> = outcome.images.iter().map(|i| &i.image.bitmap).collect();

    let paths = if !args.no_save && config.output.auto_save && !bitmaps.is_empty() {
        let pngs = output::encode_all(bitmaps.iter().copied())?;
        output::save_images(&pngs, &output_dir, &output::run_prefix()).await?
    } else {
        Vec::new()
    };

    let archive = if args.zip && !bitmaps.is_empty() {
        Some(output::write_archive(bitmaps.iter().copied(), &output_dir).await?)
    } else {
        None
    };

    match args.format.as_str() {
        "json" => {
            let summary = summarize(&request, &filters, &outcome, &paths, archive);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "quiet" => {
            for path in paths.iter().chain(archive.iter()) {
                println!("{}", path.display());
            }
        }
        _ => print_text(&request, &outcome, &paths, archive.as_deref(), config),
    }

    Ok(())
}

fn summarize<'a>(
    request: &'a GenerationRequest,
    filters: &EnhancementSettings,
    outcome: &'a BatchOutcome,
    paths: &[PathBuf],
    archive: Option<PathBuf>,
) -> GenerateSummary<'a> {
    GenerateSummary {
        prompt: &request.prompt,
        style: request.style.label(),
        combined_prompt: request.combined_prompt(),
        requested: outcome.requested,
        filters: *filters,
        images: outcome
            .images
            .iter()
            .enumerate()
            .map(|(pos, entry)| ImageSummary {
                index: entry.index,
                width: entry.image.width(),
                height: entry.image.height(),
                source_format: entry.image.format_name(),
                received_bytes: entry.image.bytes.len(),
                path: paths.get(pos).cloned(),
            })
            .collect(),
        failures: &outcome.failures,
        archive,
    }
}

fn print_text(
    request: &GenerationRequest,
    outcome: &BatchOutcome,
    paths: &[PathBuf],
    archive: Option<&Path>,
    config: &Config,
) {
    println!();
    println!("{}: {}", "Prompt".cyan().bold(), request.prompt);
    println!("{}: {}", "Style".cyan().bold(), request.style);

    for failure in &outcome.failures {
        eprintln!(
            "{} {}: {}",
            "Error".red().bold(),
            format!("(image {})", failure.index).dimmed(),
            failure.failure
        );
    }

    if outcome.is_empty() {
        println!();
        println!("{}", "⚠️  No images generated. Try again or adjust your prompt.".yellow());
        return;
    }

    println!();
    if paths.is_empty() {
        println!(
            "{}: {} (not saved)",
            "Generated Images".cyan().bold(),
            outcome.images.len()
        );
    } else {
        println!("{}:", "Generated Images".cyan().bold());
        for path in paths {
            println!("  {}", path.display());
        }
    }

    if let Some(archive) = archive {
        println!("{}: {}", "Archive".cyan().bold(), archive.display());
    }

    // Try to display the first image in the terminal
    if config.output.display == DisplayMode::Terminal {
        if let Some(first) = outcome.images.first() {
            println!();
            display_image_terminal(&first.image.bitmap);
        }
    }
}

/// Display an image in the terminal using viuer
fn display_image_terminal(image: &image::DynamicImage) {
    let conf = viuer::Config {
        width: Some(80),
        height: Some(30),
        absolute_offset: false,
        ..Default::default()
    };

    if let Err(e) = viuer::print(image, &conf) {
        tracing::debug!("Failed to display image in terminal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(prompt: &str) -> GenerateArgs {
        GenerateArgs {
            prompt: prompt.to_string(),
            style: None,
            count: None,
            width: None,
            height: None,
            steps: None,
            brightness: None,
            contrast: None,
            sharpness: None,
            output: None,
            zip: false,
            no_save: false,
            parallel: false,
            format: "text".to_string(),
        }
    }

    #[test]
    fn test_blank_prompt_is_rejected_before_any_request() {
        let config = Config::default();
        assert!(build_request(&args("  "), &config).is_err());
    }

    #[test]
    fn test_arguments_override_config_defaults() {
        let mut config = Config::default();
        config.set("defaults.style", "sketch").unwrap();
        config.set("defaults.inference_steps", "25").unwrap();

        let request = build_request(&args("a barn"), &config).unwrap();
        assert_eq!(request.style, Style::Sketch);
        assert_eq!(request.inference_steps, Some(25));
        assert_eq!(request.width, Some(1024));

        let mut custom = args("a barn");
        custom.style = Some("cartoon".to_string());
        custom.width = Some(512);
        custom.steps = Some(40);
        let request = build_request(&custom, &config).unwrap();
        assert_eq!(request.style, Style::Cartoon);
        assert_eq!(request.width, Some(512));
        assert_eq!(request.inference_steps, Some(40));
    }

    #[test]
    fn test_unknown_style_is_an_error() {
        let mut bad = args("a barn");
        bad.style = Some("watercolor".to_string());
        assert!(build_request(&bad, &Config::default()).is_err());
    }

    #[test]
    fn test_filter_arguments_are_clamped() {
        let mut custom = args("a barn");
        custom.brightness = Some(5.0);
        custom.contrast = Some(0.1);

        let filters = build_filters(&custom, &Config::default());
        assert_eq!(filters.brightness, 2.0);
        assert_eq!(filters.contrast, 0.5);
        assert_eq!(filters.sharpness, 1.0);
    }
}
