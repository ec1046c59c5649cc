//! larkpix CLI — run the publishing pipeline from the command line.
//!
//! Reads the same environment variables as the service (GEMINI_API_KEY,
//! LARK_APP_ID, LARK_APP_SECRET, LARK_PARENT_NODE).

use anyhow::Context;
use clap::{Parser, Subcommand};
use larkpix_core::{Config, GenerationRequest};
use larkpix_services::{source, Publisher};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "larkpix", about = "Generate images and publish them to Lark Drive")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a prompt and publish it
    Generate {
        /// Text prompt describing the image
        prompt: String,
        /// URL of an input image to edit
        #[arg(long)]
        image_url: Option<String>,
        /// Inline base64 image payload, uploaded as-is without generation
        #[arg(long)]
        image: Option<String>,
        /// Aspect ratio, e.g. 1:1, 16:9
        #[arg(long, default_value = "1:1")]
        aspect_ratio: String,
        /// Output resolution: 1K, 2K, 4K
        #[arg(long, default_value = "1K")]
        image_size: String,
        /// Model alias or full model name
        #[arg(long, default_value = "default")]
        model: String,
    },
    /// Publish a local image file as-is, skipping generation
    Publish {
        /// Path to the image file
        file: std::path::PathBuf,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = Config::from_env().context(
        "Failed to load configuration. Set GEMINI_API_KEY, LARK_APP_ID, LARK_APP_SECRET and LARK_PARENT_NODE",
    )?;
    let publisher = Publisher::new(&config)?;

    let cli = Cli::parse();

    let request = match cli.command {
        Commands::Generate {
            prompt,
            image_url,
            image,
            aspect_ratio,
            image_size,
            model,
        } => {
            let mut request = GenerationRequest::from_prompt(prompt);
            request.image_url = image_url;
            request.image = image;
            request.aspect_ratio = aspect_ratio;
            request.image_size = image_size;
            request.model = model;
            request
        }
        Commands::Publish { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Read image file {}", file.display()))?;
            GenerationRequest::from_inline(source::encode_inline(&bytes))
        }
    };

    let outcome = publisher.publish(request).await?;
    print_json(&outcome)?;
    Ok(())
}
