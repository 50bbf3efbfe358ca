use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lc_cli::commands::merge;
use lc_cli::{Cli, Config, Location};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // stdout carries the merged stream, so diagnostics go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let location = Location::parse(&cli.path, &config.bucket)?;
    tracing::debug!(?location, "resolved location");

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    let written = merge::run(&mut writer, &location, &config)?;
    tracing::debug!(lines = written, "merge complete");

    Ok(())
}
