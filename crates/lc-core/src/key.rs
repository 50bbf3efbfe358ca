//! Total ordering of merged lines.

use std::fmt;

use chrono::{NaiveTime, Timelike};

/// Width of the rendered key for source indexes below 10 000 and rows below 10^8.
pub const SORT_KEY_WIDTH: usize = 34;

/// Ordering key of one merged line.
///
/// Keys compare by day, then wall-clock time to the nanosecond, then source
/// discovery order, then row within the source. `(source, row)` is unique per
/// line, so two distinct lines never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    day: u8,
    time: NaiveTime,
    source: usize,
    row: u64,
}

impl SortKey {
    pub const fn new(day: u8, time: NaiveTime, source: usize, row: u64) -> Self {
        Self {
            day,
            time,
            source,
            row,
        }
    }

    pub const fn day(&self) -> u8 {
        self.day
    }

    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    pub const fn source(&self) -> usize {
        self.source
    }

    pub const fn row(&self) -> u64 {
        self.row
    }
}

/// Fixed-width, zero-padded form. Byte order of the rendering matches [`Ord`].
impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02}:{:02}:{:02}.{:09}:{:04}:{:08}",
            self.day,
            self.time.hour(),
            self.time.minute(),
            self.time.second(),
            self.time.nanosecond(),
            self.source,
            self.row
        )
    }
}
