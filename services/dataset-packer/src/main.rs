//! Sea-ice dataset packer.
//!
//! Reads a stored full-grid dataset, optionally quantizes it to 16 bits and
//! writes sequence or multi-frame training examples next to it.

mod config;
mod pack;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::PackerConfig;

#[derive(Parser, Debug)]
#[command(name = "dataset-packer")]
#[command(about = "Pack stored sea-ice datasets into training examples")]
struct Args {
    /// Configuration file path (defaults plus environment when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of the stored dataset
    #[arg(short, long)]
    input: PathBuf,

    /// Directory to write the packed examples to
    #[arg(short, long)]
    output: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => PackerConfig::from_file(path)?.with_env_overrides(),
        None => PackerConfig::from_env(),
    };
    info!(
        mode = %config.mode,
        horizon = config.horizon,
        quantize = config.quantize,
        "Loaded configuration"
    );

    let manifest = pack::run(&config, &args.input, &args.output)?;
    info!(
        output = %args.output.display(),
        examples = manifest.samples,
        "Done"
    );

    Ok(())
}
