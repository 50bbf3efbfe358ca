//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Merge log files into one chronologically ordered stream.
///
/// Every line is prefixed with the time extracted from it and the name of
/// the file it came from.
#[derive(Debug, Parser)]
#[command(name = "logcomb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bucket URL (`https://.../<bucket>/<prefix>`, `gs://<bucket>/<prefix>`)
    /// or local directory.
    pub path: String,
}
