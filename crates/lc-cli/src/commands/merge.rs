//! Merge every log source under a location and write the result.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use lc_core::{Discovery, LocalReader, Processor, SourceReader, TaggedLine};
use lc_gcs::{BucketReader, Client};

use crate::{Config, Location};

/// Merges all sources under `location` into `writer`, returning the number
/// of lines written. Nothing is written unless every source succeeds.
pub fn run<W: Write>(writer: &mut W, location: &Location, config: &Config) -> Result<usize> {
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let lines = runtime.block_on(collect(location, config))?;

    lc_core::write_lines(writer, &lines).context("failed to write merged output")?;
    Ok(lines.len())
}

async fn collect(location: &Location, config: &Config) -> Result<Vec<TaggedLine>> {
    let processor = Arc::new(Processor::new(config.process_options()));

    match location {
        Location::Local(root) => {
            let discovery = lc_core::discover_local(root)?;
            merge_discovered(discovery, LocalReader, processor).await
        }
        Location::Bucket { bucket, prefix } => {
            let client = Client::new(&config.storage_endpoint)
                .context("failed to create storage client")?;
            let discovery = client
                .discover(bucket, prefix)
                .await
                .with_context(|| format!("failed to list sources under gs://{bucket}/{prefix}"))?;
            let reader = BucketReader::new(client, bucket.as_str());
            merge_discovered(discovery, reader, processor).await
        }
    }
}

async fn merge_discovered<R: SourceReader>(
    discovery: Discovery,
    reader: R,
    processor: Arc<Processor>,
) -> Result<Vec<TaggedLine>> {
    if discovery.names.is_empty() {
        tracing::warn!(prefix = %discovery.prefix, "no log sources found");
        return Ok(Vec::new());
    }
    let sources = discovery.into_sources();

    Ok(lc_core::merge(sources, Arc::new(reader), processor).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use lc_core::TagStyle;
    use tempfile::TempDir;

    fn narrow_config() -> Config {
        Config {
            tag: TagStyle {
                column: 10,
                ..TagStyle::default()
            },
            ..Config::default()
        }
    }

    fn run_to_string(location: &Location, config: &Config) -> Result<String> {
        let mut out = Vec::new();
        run(&mut out, location, config)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn merges_local_directory_chronologically() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("a.log"),
            "I0101 10:00:00.000000 start\nI0101 10:00:05.000000 end\n",
        )
        .unwrap();
        fs::write(temp.path().join("b.log"), "I0101 09:59:59.999999 boot\n").unwrap();
        fs::write(temp.path().join("notes.txt"), "I0101 08:00:00.000000 ignored\n").unwrap();

        let location = Location::Local(temp.path().to_path_buf());
        let output = run_to_string(&location, &narrow_config()).unwrap();

        insta::assert_snapshot!(output, @r"
        09:59:59.999999000 [/b.log]   I0101 09:59:59.999999 boot
        10:00:00.000000000 [/a.log]   I0101 10:00:00.000000 start
        10:00:05.000000000 [/a.log]   I0101 10:00:05.000000 end
        ");
    }

    #[test]
    fn empty_directory_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let location = Location::Local(temp.path().to_path_buf());

        let mut out = Vec::new();
        let written = run(&mut out, &location, &Config::default()).unwrap();

        assert_eq!(written, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn failing_source_suppresses_all_output() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.log"), "I0101 10:00:00.000000 fine\n").unwrap();
        fs::write(
            temp.path().join("b.log"),
            format!("I0101 10:00:01.000000 {}\n", "x".repeat(64)),
        )
        .unwrap();
        let config = Config {
            max_line_bytes: 40,
            ..Config::default()
        };

        let mut out = Vec::new();
        let err = run(&mut out, &Location::Local(temp.path().to_path_buf()), &config).unwrap_err();

        assert!(format!("{err:#}").contains("exceeds the maximum line length"));
        assert!(out.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let location = Location::Local(temp.path().join("absent"));

        let err = run(&mut Vec::new(), &location, &Config::default()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to list sources"));
    }
}
