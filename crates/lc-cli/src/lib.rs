//! logcomb CLI library.
//!
//! This crate provides the command-line interface that merges log sources
//! into a single chronological stream.

mod cli;
pub mod commands;
mod config;
mod location;

pub use cli::Cli;
pub use config::{Config, DEFAULT_BUCKET};
pub use location::Location;
