//! Discovered log sources and the seam for opening them.

use std::error::Error as StdError;
use std::future::Future;

use tokio::io::AsyncBufRead;

/// Name suffixes that mark an object or file as a log.
pub const LOG_SUFFIXES: &[&str] = &[".log", "build-log.txt"];

/// Returns true if `name` looks like a log file.
pub fn is_log_name(name: &str) -> bool {
    LOG_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// One input contributing lines to the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Position in discovery order. Breaks ties between equal timestamps.
    pub index: usize,
    /// Fully-qualified object or file name.
    pub name: String,
    /// `name` with the discovery prefix removed.
    pub display_name: String,
}

/// Result of enumerating a location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Common root stripped from names for display.
    pub prefix: String,
    /// Candidate names in discovery order.
    pub names: Vec<String>,
}

impl Discovery {
    /// Assigns indexes in discovery order.
    pub fn into_sources(self) -> Vec<Source> {
        let prefix = self.prefix;
        self.names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Source {
                index,
                display_name: name.strip_prefix(prefix.as_str()).unwrap_or(&name).to_string(),
                name,
            })
            .collect()
    }
}

/// Opens a readable byte stream for a source name.
///
/// Implementations are shared across all per-source tasks, so they must be
/// cheap to use concurrently.
pub trait SourceReader: Send + Sync + 'static {
    type Stream: AsyncBufRead + Send + Unpin + 'static;
    type Error: StdError + Send + Sync + 'static;

    fn open(&self, name: &str) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send;
}
