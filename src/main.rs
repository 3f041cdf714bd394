mod api_client;
mod config;
mod error;
mod generator;
mod materializer;
mod packager;
mod padder;
mod prompts;
mod resampler;
mod variants;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use image::ImageFormat;

use crate::api_client::{ClientSettings, ImageApiClient, DEFAULT_ENDPOINT};
use crate::config::{MaterializerConfig, PackagerKind, ResizeFilter};
use crate::materializer::Materializer;
use crate::padder::DEFAULT_PADDING_RATIO;
use crate::prompts::PromptBatch;

#[derive(Parser)]
#[command(name = "iconsmith")]
#[command(about = "Generate candidate logos and turn one logo into platform icon sets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pad, resize and package a logo into macOS and Android icon layouts
    Materialize {
        /// Source image (any format the image crate decodes)
        source: PathBuf,

        /// JSON config describing outputs; defaults are laid out under --out
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory used when no config file is given
        #[arg(short, long, default_value = "icons")]
        out: PathBuf,

        /// Edge of the square master icon in pixels
        #[arg(long)]
        master_edge: Option<u32>,

        /// Canvas size relative to the longer source side
        #[arg(long)]
        padding_ratio: Option<f64>,

        /// Resampling filter
        #[arg(long, value_enum)]
        filter: Option<ResizeFilter>,

        /// How to build the .icns container
        #[arg(long, value_enum)]
        packager: Option<PackagerKind>,
    },
    /// Center an image on a transparent square canvas
    Pad {
        /// Input image
        input: PathBuf,
        /// Output PNG
        output: PathBuf,

        #[arg(long, default_value_t = DEFAULT_PADDING_RATIO)]
        padding_ratio: f64,
    },
    /// Request candidate logos from an image-generation API
    Generate {
        /// JSON file with `style_base` and a list of `{name, prompt}`
        #[arg(short, long)]
        prompts: PathBuf,

        /// Directory the decoded images are written to
        #[arg(short, long)]
        out_dir: PathBuf,

        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: String,

        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        #[arg(long, default_value = "dall-e-3")]
        model: String,

        #[arg(long, default_value = "1024x1024")]
        size: String,

        #[arg(long, default_value = "hd")]
        quality: String,

        /// Images requested per prompt
        #[arg(long, default_value_t = 1)]
        count: u32,

        /// Overall timeout per request
        #[arg(long, default_value_t = 120)]
        timeout_secs: u64,
    },
    /// Write the default materializer config so it can be edited
    InitConfig {
        /// Where to write the config
        #[arg(default_value = "iconsmith.json")]
        path: PathBuf,

        /// Output directory the default layout points at
        #[arg(short, long, default_value = "icons")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Materialize {
            source,
            config,
            out,
            master_edge,
            padding_ratio,
            filter,
            packager,
        } => {
            let overrides = Overrides {
                master_edge,
                padding_ratio,
                filter,
                packager,
            };
            materialize(&source, config.as_deref(), &out, overrides)
        }
        Commands::Pad {
            input,
            output,
            padding_ratio,
        } => pad(&input, &output, padding_ratio),
        Commands::Generate {
            prompts,
            out_dir,
            api_key,
            endpoint,
            model,
            size,
            quality,
            count,
            timeout_secs,
        } => {
            let settings = ClientSettings {
                endpoint,
                model,
                size,
                quality,
                count,
                timeout: Duration::from_secs(timeout_secs),
            };
            generate(&prompts, &out_dir, api_key, settings).await
        }
        Commands::InitConfig { path, out } => init_config(&path, &out),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

struct Overrides {
    master_edge: Option<u32>,
    padding_ratio: Option<f64>,
    filter: Option<ResizeFilter>,
    packager: Option<PackagerKind>,
}

fn materialize(
    source: &Path,
    config_path: Option<&Path>,
    out: &Path,
    overrides: Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => MaterializerConfig::load(path)?,
        None => MaterializerConfig::for_output_dir(out),
    };
    if let Some(edge) = overrides.master_edge {
        config.master_edge = edge;
    }
    if let Some(ratio) = overrides.padding_ratio {
        config.padding_ratio = ratio;
    }
    if let Some(filter) = overrides.filter {
        config.filter = filter;
    }
    if let Some(packager) = overrides.packager {
        config.packager = packager;
    }

    let materializer = Materializer::new(config);
    log::debug!("Using config: {:?}", materializer.config());
    let report = materializer.run(source)?;

    println!(
        "Master: {} (source {}x{}, padded to {}x{})",
        report.master_path.display(),
        report.source_size.0,
        report.source_size.1,
        report.padded_edge,
        report.padded_edge
    );
    for target in &report.targets {
        println!("  {}: {} files", target.name, target.files.len());
    }

    let failed = report.failed_targets();
    if !failed.is_empty() {
        return Err(format!("packaging failed for: {}", failed.join(", ")).into());
    }
    println!("\n🎉 All icons processed!");
    Ok(())
}

fn init_config(path: &Path, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    MaterializerConfig::for_output_dir(out).save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn pad(input: &Path, output: &Path, ratio: f64) -> Result<(), Box<dyn std::error::Error>> {
    padder::check_padding_ratio(ratio)?;

    let img = image::open(input)?;
    let padded = padder::pad_to_square(&img, ratio)?;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    padded.save_with_format(output, ImageFormat::Png)?;

    println!(
        "Created padded logo at: {} ({}x{})",
        output.display(),
        padded.width(),
        padded.height()
    );
    Ok(())
}

async fn generate(
    prompts: &Path,
    out_dir: &Path,
    api_key: String,
    settings: ClientSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = PromptBatch::load(prompts)?;
    let client = ImageApiClient::new(api_key, settings)?;

    let summary = generator::run_batch(&client, &batch, out_dir).await?;
    println!(
        "{} of {} prompts succeeded, {} images saved to {}",
        summary.succeeded.len(),
        batch.prompts.len(),
        summary.saved.len(),
        out_dir.display()
    );
    for (name, reason) in &summary.failed {
        eprintln!("❌ {}: {}", name, reason);
    }
    Ok(())
}
