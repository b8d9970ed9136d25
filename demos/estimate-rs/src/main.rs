mod provider;
mod report;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use cfa_rt::{AnalysisConfig, pipeline, records};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "estimate")]
#[command(version, about = "Estimate regional reproduction numbers from a case line list")]
struct Cli {
    /// Line-list source: a local CSV path or an http(s) URL
    #[arg(short, long)]
    input: String,

    /// Analysis configuration (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cache directory for downloaded inputs
    #[arg(long, default_value = "cache")]
    cache_dir: PathBuf,

    /// Directory the result tables are written to
    #[arg(short, long, default_value = "results")]
    output_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    let raw = provider::load(&cli.input, &cli.cache_dir)?;
    let records = records::ingest(raw, config.unknown_location_limit)?;
    let output = pipeline::run(&records, &config)?;
    report::write(&cli.output_dir, &output, &config)?;

    Ok(())
}
