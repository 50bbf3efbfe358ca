//! Turning one source into an ordered batch of tagged lines.

use chrono::{NaiveTime, Timelike};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::MergeError;
use crate::source::{Source, SourceReader};
use crate::tag::{LineTagger, TagStyle, TaggedLine};
use crate::timestamp::TimeExtractor;

/// Default ceiling for a single buffered line (32 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 32 * 1024 * 1024;

/// Time state carried from line to line within one source.
///
/// `day` flips to 1 once a line's hour is more than one hour earlier than the
/// hour of the first timestamp seen, and never flips back. This is a coarse
/// midnight heuristic: it misfires when a source starts with irregular hours
/// or steps backward by less than the threshold across midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingTimeState {
    current: NaiveTime,
    first: Option<NaiveTime>,
    day: u8,
}

impl Default for RollingTimeState {
    fn default() -> Self {
        Self {
            current: NaiveTime::MIN,
            first: None,
            day: 0,
        }
    }
}

impl RollingTimeState {
    /// Folds in the time extracted from the next line, if any, and returns
    /// the `(day, time)` that line should be sorted under.
    pub fn advance(&mut self, extracted: Option<NaiveTime>) -> (u8, NaiveTime) {
        if let Some(time) = extracted {
            self.current = time;
            self.first.get_or_insert(time);
        }

        let hour = i64::from(self.current.hour());
        if self
            .first
            .is_some_and(|first| hour < i64::from(first.hour()) - 1)
        {
            self.day = 1;
        }

        (self.day, self.current)
    }

    pub const fn current(&self) -> NaiveTime {
        self.current
    }

    pub const fn first(&self) -> Option<NaiveTime> {
        self.first
    }

    pub const fn day(&self) -> u8 {
        self.day
    }
}

/// Options shared by every per-source task of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    pub style: TagStyle,
    pub max_line_bytes: usize,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            style: TagStyle::default(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

/// Reads sources line by line and tags every line with its sort key.
#[derive(Debug, Default)]
pub struct Processor {
    extractor: TimeExtractor,
    options: ProcessOptions,
}

impl Processor {
    pub fn new(options: ProcessOptions) -> Self {
        Self {
            extractor: TimeExtractor::new(),
            options,
        }
    }

    /// Opens `source` through `reader` and processes it to the end.
    ///
    /// The stream is dropped, and so released, on every return path.
    pub async fn run<R: SourceReader>(
        &self,
        reader: &R,
        source: &Source,
    ) -> Result<Vec<TaggedLine>, MergeError> {
        let stream = reader
            .open(&source.name)
            .await
            .map_err(|e| MergeError::open(&source.name, e))?;
        tracing::debug!(source = %source.name, index = source.index, "opened source");

        self.process(source, stream).await
    }

    /// Tags every line of `stream` in read order.
    pub async fn process<S: AsyncBufRead + Unpin>(
        &self,
        source: &Source,
        mut stream: S,
    ) -> Result<Vec<TaggedLine>, MergeError> {
        let tagger = LineTagger::new(source.index, &source.display_name, &self.options.style);
        let limit = self.options.max_line_bytes;
        // Room for the limit plus a CRLF terminator.
        let read_cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(2);

        let mut state = RollingTimeState::default();
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        let mut row: u64 = 0;

        loop {
            buf.clear();
            let read = (&mut stream)
                .take(read_cap)
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|source_err| MergeError::Scan {
                    name: source.name.clone(),
                    row: row + 1,
                    source: source_err,
                })?;
            if read == 0 {
                break;
            }
            row += 1;

            trim_line_ending(&mut buf);
            if buf.len() > limit {
                return Err(MergeError::LineTooLong {
                    name: source.name.clone(),
                    row,
                    limit,
                });
            }

            let raw = String::from_utf8_lossy(&buf);
            let (day, time) = state.advance(self.extractor.extract(&raw));
            lines.push(tagger.tag(day, time, row, &raw));
        }

        tracing::debug!(
            source = %source.name,
            lines = lines.len(),
            day_rollover = state.day() == 1,
            "processed source"
        );

        Ok(lines)
    }
}

/// Drops a trailing `\n`, then one trailing `\r`. The `\r` goes even without a
/// `\n`, which only happens on the final line of a stream.
fn trim_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn source(index: usize, name: &str) -> Source {
        Source {
            index,
            name: name.to_string(),
            display_name: name.to_string(),
        }
    }

    async fn process_text(text: &str) -> Vec<TaggedLine> {
        Processor::default()
            .process(&source(0, "a.log"), text.as_bytes())
            .await
            .unwrap()
    }

    #[test]
    fn state_falls_back_to_previous_time() {
        let mut state = RollingTimeState::default();
        assert_eq!(state.advance(None), (0, NaiveTime::MIN));
        assert_eq!(state.first(), None);

        assert_eq!(state.advance(Some(time(10, 0, 0))), (0, time(10, 0, 0)));
        assert_eq!(state.advance(None), (0, time(10, 0, 0)));
        assert_eq!(state.first(), Some(time(10, 0, 0)));
        assert_eq!(state.current(), time(10, 0, 0));
    }

    #[test]
    fn first_time_is_the_first_extracted_time() {
        let mut state = RollingTimeState::default();
        state.advance(None);
        state.advance(None);
        state.advance(Some(time(8, 0, 0)));
        state.advance(Some(time(9, 0, 0)));
        assert_eq!(state.first(), Some(time(8, 0, 0)));
    }

    #[test]
    fn day_rollover_is_sticky() {
        let mut state = RollingTimeState::default();
        assert_eq!(state.advance(Some(time(23, 0, 0))).0, 0);
        assert_eq!(state.advance(Some(time(23, 59, 0))).0, 0);
        assert_eq!(state.advance(Some(time(1, 0, 0))).0, 1);
        assert_eq!(state.advance(Some(time(23, 30, 0))).0, 1);
        assert_eq!(state.advance(None).0, 1);
        assert_eq!(state.day(), 1);
    }

    #[test]
    fn one_hour_back_is_not_a_rollover() {
        let mut state = RollingTimeState::default();
        state.advance(Some(time(10, 30, 0)));
        assert_eq!(state.advance(Some(time(9, 0, 0))).0, 0);
        assert_eq!(state.advance(Some(time(8, 59, 59))).0, 1);
    }

    #[test]
    fn midnight_first_hour_never_rolls_over() {
        let mut state = RollingTimeState::default();
        state.advance(Some(time(0, 10, 0)));
        assert_eq!(state.advance(Some(time(0, 0, 0))).0, 0);
        assert_eq!(state.advance(Some(time(23, 0, 0))).0, 0);
    }

    #[tokio::test]
    async fn rows_are_one_based_and_untimed_lines_inherit() {
        let lines = process_text("header\nI0101 10:00:00.000001 start\n  continued\n").await;

        assert_eq!(lines.len(), 3);
        let rows: Vec<u64> = lines.iter().map(|l| l.key().row()).collect();
        assert_eq!(rows, vec![1, 2, 3]);
        assert_eq!(lines[0].key().time(), NaiveTime::MIN);
        assert_eq!(lines[1].key().time(), lines[2].key().time());
        assert!(lines[2].text().ends_with("  continued"));
    }

    #[tokio::test]
    async fn rollover_lines_sort_after_day_zero_lines() {
        let mut lines = process_text(
            "23:10:00 before midnight\n01:05:00 after midnight\n23:20:00 late echo\n",
        )
        .await;
        let days: Vec<u8> = lines.iter().map(|l| l.key().day()).collect();
        assert_eq!(days, vec![0, 1, 1]);

        lines.sort_by_key(TaggedLine::key);
        let texts: Vec<&str> = lines.iter().map(TaggedLine::text).collect();
        assert!(texts[0].ends_with("before midnight"));
        assert!(texts[1].ends_with("after midnight"));
        assert!(texts[2].ends_with("late echo"));
    }

    #[tokio::test]
    async fn strips_crlf_and_keeps_final_unterminated_line() {
        let lines = process_text("12:00:00 one\r\n12:00:01 two").await;
        assert_eq!(lines.len(), 2);
        assert!(lines[0].text().ends_with(" 12:00:00 one"));
        assert!(lines[1].text().ends_with(" 12:00:01 two"));
    }

    #[tokio::test]
    async fn strips_bare_carriage_return_on_final_line() {
        let lines = process_text("12:00:00 one\r\n12:00:01 two\r").await;
        assert_eq!(lines.len(), 2);
        assert!(lines[1].text().ends_with(" 12:00:01 two"));
        assert!(!lines[1].text().contains('\r'));
    }

    #[tokio::test]
    async fn empty_source_yields_no_lines() {
        assert!(process_text("").await.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let processor = Processor::default();
        let bytes: &[u8] = b"12:00:00 caf\xff\n";
        let lines = processor.process(&source(0, "a.log"), bytes).await.unwrap();
        assert!(lines[0].text().ends_with("caf\u{fffd}"));
    }

    #[tokio::test]
    async fn line_over_limit_is_a_scan_failure() {
        let processor = Processor::new(ProcessOptions {
            max_line_bytes: 8,
            ..ProcessOptions::default()
        });
        let input: &[u8] = b"12345678\r\n123456789\n";

        let err = processor
            .process(&source(0, "big.log"), input)
            .await
            .unwrap_err();

        match err {
            MergeError::LineTooLong { name, row, limit } => {
                assert_eq!(name, "big.log");
                assert_eq!(row, 2);
                assert_eq!(limit, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn stream_failure_is_a_scan_failure() {
        let stream = tokio::io::BufReader::new(FailingRead(io::ErrorKind::ConnectionReset));
        let err = Processor::default()
            .process(&source(3, "remote.log"), stream)
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::Scan { row: 1, .. }));
    }

    /// A reader that fails on first use.
    struct FailingRead(io::ErrorKind);

    impl tokio::io::AsyncRead for FailingRead {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Err(io::Error::new(self.0, "stream reset")))
        }
    }
}
