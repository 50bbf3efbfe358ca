//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use lc_core::{DEFAULT_MAX_LINE_BYTES, ProcessOptions, TagStyle};
use serde::{Deserialize, Serialize};

/// Bucket whose name marks the object prefix in HTTP(S) URLs.
pub const DEFAULT_BUCKET: &str = "kubernetes-jenkins";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bucket name expected in HTTP(S) source URLs.
    pub bucket: String,
    /// Cloud Storage JSON API endpoint.
    pub storage_endpoint: String,
    /// Longest line accepted from any source, in bytes.
    pub max_line_bytes: usize,
    /// Layout of the `[source]` column.
    pub tag: TagStyle,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bucket", &self.bucket)
            .field("storage_endpoint", &self.storage_endpoint)
            .field("max_line_bytes", &self.max_line_bytes)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            storage_endpoint: lc_gcs::DEFAULT_ENDPOINT.to_string(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            tag: TagStyle::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (LOGCOMB_*, LOGCOMB_TAG__COLUMN for nested keys)
        figment = figment.merge(Env::prefixed("LOGCOMB_").split("__"));

        figment.extract()
    }

    /// Options handed to every per-source task.
    pub const fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            style: self.tag,
            max_line_bytes: self.max_line_bytes,
        }
    }
}

/// Returns the platform-specific config directory for logcomb.
///
/// On Linux: `~/.config/logcomb`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("logcomb"))
}
