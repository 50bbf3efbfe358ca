//! Heuristic wall-clock extraction from free-text log lines.
//!
//! Log producers never agree on a format, so a line is tested against an
//! ordered list of patterns. Patterns anchored at the start of the line come
//! first so that a structured prefix wins over an unrelated time-shaped value
//! embedded later in the message. The unanchored patterns at the end find
//! *some* time whenever one appears anywhere in the line.

use chrono::NaiveTime;
use regex::{Captures, Regex};

/// Fractional-second precision of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    Seconds,
    Millis,
    Micros,
    Nanos,
}

impl Precision {
    /// Multiplier that turns a fraction with this many digits into nanoseconds.
    const fn nanos_per_unit(self) -> u32 {
        match self {
            Self::Seconds => 1_000_000_000,
            Self::Millis => 1_000_000,
            Self::Micros => 1_000,
            Self::Nanos => 1,
        }
    }
}

/// `HH:MM:SS` with one capture group per field.
const CLOCK: &str = r"(\d{2}):(\d{2}):(\d{2})";

/// Abbreviated English month names.
const MONTH: &str = "(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)";

#[derive(Debug)]
struct TimePattern {
    regex: Regex,
    precision: Precision,
}

impl TimePattern {
    fn new(pattern: &str, precision: Precision) -> Self {
        Self {
            regex: Regex::new(pattern).expect("time patterns are valid regexes"),
            precision,
        }
    }

    /// Returns the first occurrence in `line` that forms a valid clock time.
    fn find(&self, line: &str) -> Option<NaiveTime> {
        self.regex
            .captures_iter(line)
            .find_map(|caps| clock_from_captures(&caps, self.precision))
    }
}

/// Builds a time from captures 1-3 (h, m, s) and the optional fraction in 4.
fn clock_from_captures(caps: &Captures<'_>, precision: Precision) -> Option<NaiveTime> {
    let field = |idx: usize| caps.get(idx)?.as_str().parse::<u32>().ok();

    let nanos = match precision {
        Precision::Seconds => 0,
        _ => field(4)? * precision.nanos_per_unit(),
    };

    NaiveTime::from_hms_nano_opt(field(1)?, field(2)?, field(3)?, nanos)
}

/// Precompiled, ordered set of timestamp matchers.
///
/// Build one per run and share it by reference; matching never mutates it.
#[derive(Debug)]
pub struct TimeExtractor {
    patterns: Vec<TimePattern>,
}

impl Default for TimeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeExtractor {
    pub fn new() -> Self {
        let patterns = vec![
            // glog: I0102 15:04:05.000000
            TimePattern::new(
                &format!(r"^[A-Za-z]\d{{4}}\s+{CLOCK}\.(\d{{6}})"),
                Precision::Micros,
            ),
            TimePattern::new(
                &format!(r"^[A-Za-z]\d{{4}}\s+{CLOCK}\.(\d{{3}})"),
                Precision::Millis,
            ),
            // syslog-style: Jan 02 15:04:05.000000
            TimePattern::new(
                &format!(r"^{MONTH}\s+\d{{1,2}}\s+{CLOCK}\.(\d{{6}})"),
                Precision::Micros,
            ),
            TimePattern::new(
                &format!(r"^{MONTH}\s+\d{{1,2}}\s+{CLOCK}\.(\d{{3}})"),
                Precision::Millis,
            ),
            // logrus: time="2006-01-02T15:04:05.000000000Z"
            TimePattern::new(
                &format!(r#"time="\d{{4}}-\d{{2}}-\d{{2}}T{CLOCK}\.(\d{{9}})Z"#),
                Precision::Nanos,
            ),
            TimePattern::new(&format!(r"{CLOCK}\.(\d{{9}})"), Precision::Nanos),
            TimePattern::new(&format!(r"{CLOCK}\.(\d{{6}})"), Precision::Micros),
            TimePattern::new(&format!(r"{CLOCK}\.(\d{{3}})"), Precision::Millis),
            TimePattern::new(CLOCK, Precision::Seconds),
        ];

        Self { patterns }
    }

    /// Returns the time of the first pattern that matches `line`, if any.
    pub fn extract(&self, line: &str) -> Option<NaiveTime> {
        self.patterns.iter().find_map(|pattern| pattern.find(line))
    }

    /// Like [`extract`](Self::extract), but returns `fallback` when nothing matches.
    pub fn extract_or(&self, line: &str, fallback: NaiveTime) -> NaiveTime {
        self.extract(line).unwrap_or(fallback)
    }
}
