use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stream_catalog::{config::Config, pipeline::Pipeline};

#[derive(Parser)]
#[command(name = "stream-catalog")]
#[command(about = "Build a verified, deduplicated streaming catalog from configured sources")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Catalog output path (overrides config file)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("stream_catalog={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting stream-catalog v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(output) = cli.output {
        config.pipeline.output_path = output;
    }

    // Misconfiguration surfaces here, before any network activity
    let pipeline = Pipeline::from_config(&config)?;
    let catalog = pipeline.run().await;

    let rendered = serde_json::to_string_pretty(&catalog)?;
    tokio::fs::write(&config.pipeline.output_path, rendered).await?;
    info!(
        "Catalog with {} entries written to {}",
        catalog.len(),
        config.pipeline.output_path.display()
    );

    Ok(())
}
