//! Concurrent per-source processing and the global chronological sort.

use std::io::{self, Write};
use std::sync::Arc;

use rayon::prelude::*;
use tokio::task::JoinSet;

use crate::error::MergeError;
use crate::process::Processor;
use crate::source::{Source, SourceReader};
use crate::tag::TaggedLine;

/// Processes every source concurrently and returns all lines in merged order.
///
/// One task is spawned per source, all at once. Batches arrive in
/// completion order but are concatenated in input order before a stable
/// sort, so lines with equal keys (only possible when two sources share an
/// index) keep the order of `sources`. The first failing source aborts the
/// run: returning drops the `JoinSet`, which cancels the remaining tasks at
/// their next read.
pub async fn merge<R: SourceReader>(
    sources: Vec<Source>,
    reader: Arc<R>,
    processor: Arc<Processor>,
) -> Result<Vec<TaggedLine>, MergeError> {
    let source_count = sources.len();
    let mut tasks = JoinSet::new();
    for (position, source) in sources.into_iter().enumerate() {
        let reader = Arc::clone(&reader);
        let processor = Arc::clone(&processor);
        tasks.spawn(async move {
            processor
                .run(reader.as_ref(), &source)
                .await
                .map(|batch| (position, batch))
        });
    }

    let mut batches = Vec::with_capacity(source_count);
    while let Some(joined) = tasks.join_next().await {
        batches.push(joined??);
    }
    batches.sort_unstable_by_key(|(position, _)| *position);

    let mut combined: Vec<TaggedLine> = batches
        .into_iter()
        .flat_map(|(_, batch)| batch)
        .collect();
    combined.par_sort_by_key(TaggedLine::key);

    tracing::info!(
        sources = source_count,
        lines = combined.len(),
        "merged sources"
    );

    Ok(combined)
}

/// Writes merged lines, sort keys stripped, one per line.
pub fn write_lines<W: Write>(writer: &mut W, lines: &[TaggedLine]) -> io::Result<()> {
    for line in lines {
        writeln!(writer, "{}", line.text())?;
    }
    writer.flush()
}
