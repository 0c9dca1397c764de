//! Blockthin CLI
//!
//! Downsamples one storage block per invocation:
//!
//! ```text
//! blockthin --input data/<block-id> --output data/out --interval 5m
//! ```
//!
//! A new uniquely-named block directory is created under `--output`. On
//! any failure the error is logged and the process exits non-zero; the
//! partially written output directory is left for the operator to remove.

use blockthin::downsample::{downsample_block, parse_interval};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "blockthin")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Downsample a time-series storage block")]
pub struct Cli {
    /// Path to the source block directory
    #[arg(long)]
    pub input: PathBuf,

    /// Parent directory under which the new block directory is created
    #[arg(long)]
    pub output: PathBuf,

    /// Minimum spacing between retained samples (e.g. 30s, 5m, 1h)
    #[arg(long)]
    pub interval: String,
}

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "blockthin=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let interval_ms = parse_interval(&cli.interval)?;
    downsample_block(&cli.input, &cli.output, interval_ms)?;
    Ok(())
}
