//! CLI entry point for tileable texture synthesis

use clap::Parser;
use tilesynth::io::cli::{Cli, FileProcessor};
use tilesynth::io::configuration::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

fn main() -> tilesynth::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut processor = FileProcessor::new(cli);
    processor.process()
}
