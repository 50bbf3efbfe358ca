//! Annotating raw lines with display time and provenance.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::key::SortKey;

/// Shortening and alignment rules for the `[source]` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagStyle {
    /// Names longer than this many characters are shortened.
    pub max_len: usize,
    /// Characters kept from the start of a shortened name.
    pub head: usize,
    /// Characters kept from the end of a shortened name.
    pub tail: usize,
    /// Width the bracketed tag is left-justified to.
    pub column: usize,
}

impl Default for TagStyle {
    fn default() -> Self {
        Self {
            max_len: 60,
            head: 17,
            tail: 40,
            column: 62,
        }
    }
}

impl TagStyle {
    /// Shortens `name` to `head...tail` when it exceeds `max_len` characters.
    pub fn shorten(&self, name: &str) -> String {
        let len = name.chars().count();
        if len <= self.max_len {
            return name.to_string();
        }

        let head: String = name.chars().take(self.head).collect();
        let tail: String = name.chars().skip(len.saturating_sub(self.tail)).collect();
        format!("{head}...{tail}")
    }

    /// The bracketed, padded tag printed before every line of a source.
    pub fn provenance(&self, display_name: &str) -> String {
        let tag = format!("[{}]", self.shorten(display_name));
        format!("{tag:<width$}", width = self.column)
    }
}

/// `HH:MM:SS.nnnnnnnnn`.
pub fn display_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S%.9f").to_string()
}

/// One annotated input line, ready to be sorted and printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine {
    key: SortKey,
    text: String,
}

impl TaggedLine {
    pub const fn key(&self) -> SortKey {
        self.key
    }

    /// The printable line, without the sort key.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Composed form: the rendered sort key, a space, then the printable line.
impl fmt::Display for TaggedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.text)
    }
}

/// Tags the lines of one source.
#[derive(Debug, Clone)]
pub struct LineTagger {
    source: usize,
    provenance: String,
}

impl LineTagger {
    pub fn new(source: usize, display_name: &str, style: &TagStyle) -> Self {
        Self {
            source,
            provenance: style.provenance(display_name),
        }
    }

    pub fn tag(&self, day: u8, time: NaiveTime, row: u64, raw: &str) -> TaggedLine {
        TaggedLine {
            key: SortKey::new(day, time, self.source, row),
            text: format!("{} {} {raw}", display_time(time), self.provenance),
        }
    }
}
