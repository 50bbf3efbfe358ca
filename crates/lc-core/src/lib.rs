//! Core merge engine for logcomb.
//!
//! This crate contains the fundamental types and logic for:
//! - Timestamp extraction: finding a comparable wall-clock time in a free-text line
//! - Tagging: sort keys and the `time [source] line` display form
//! - Processing: per-source line scanning with fallback and day-rollover state
//! - Merging: concurrent per-source processing and the global sort
//! - Local discovery: walking a directory tree for log files

mod error;
mod key;
pub mod local;
mod merge;
mod process;
pub mod source;
mod tag;
mod timestamp;

pub use error::{BoxError, MergeError};
pub use key::{SORT_KEY_WIDTH, SortKey};
pub use local::{LocalReader, discover_local};
pub use merge::{merge, write_lines};
pub use process::{DEFAULT_MAX_LINE_BYTES, ProcessOptions, Processor, RollingTimeState};
pub use source::{Discovery, LOG_SUFFIXES, Source, SourceReader, is_log_name};
pub use tag::{LineTagger, TagStyle, TaggedLine, display_time};
pub use timestamp::TimeExtractor;
