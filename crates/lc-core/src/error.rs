//! Errors produced while discovering, reading, and merging sources.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed cause for errors raised by a pluggable reader or enumerator.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Fatal merge errors.
///
/// Any of these aborts the whole run. A line without a recognizable timestamp
/// is never an error: it inherits the previous line's time.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The list of candidate sources could not be produced.
    #[error("failed to list sources under {location}")]
    Enumerate {
        location: String,
        #[source]
        source: BoxError,
    },

    /// A source could not be opened for reading.
    #[error("failed to open {name}")]
    Open {
        name: String,
        #[source]
        source: BoxError,
    },

    /// The underlying stream failed partway through a source.
    #[error("failed to read line {row} of {name}")]
    Scan {
        name: String,
        row: u64,
        #[source]
        source: std::io::Error,
    },

    /// A single line exceeded the configured buffer ceiling.
    #[error("line {row} of {name} exceeds the maximum line length of {limit} bytes")]
    LineTooLong { name: String, row: u64, limit: usize },

    /// A per-source task panicked or was cancelled.
    #[error("source task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl MergeError {
    /// Wraps an enumeration failure for the given location.
    pub fn enumerate(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Enumerate {
            location: location.into(),
            source: source.into(),
        }
    }

    /// Wraps an open failure for the given source name.
    pub fn open(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Open {
            name: name.into(),
            source: source.into(),
        }
    }
}
