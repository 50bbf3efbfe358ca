//! Interpretation of the positional source argument.

use std::path::PathBuf;

use anyhow::{Result, bail};

/// Where the log files to merge live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Objects in a storage bucket whose names start with `prefix`.
    Bucket { bucket: String, prefix: String },
    /// Files under a local directory (or a single local file).
    Local(PathBuf),
}

impl Location {
    /// Classifies `path` as a bucket location or a local path.
    ///
    /// HTTP(S) URLs must contain `/<bucket>/`; everything after it becomes
    /// the object prefix. `gs://<bucket>/<prefix>` names the bucket
    /// directly. Anything else is treated as a filesystem path.
    pub fn parse(path: &str, bucket: &str) -> Result<Self> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let marker = format!("/{bucket}/");
            let Some((_, prefix)) = path.split_once(&marker) else {
                bail!("unable to determine prefix: {path} does not contain {marker}");
            };
            return Ok(Self::Bucket {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
            });
        }

        if let Some(rest) = path.strip_prefix("gs://") {
            let (name, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            if name.is_empty() {
                bail!("unable to determine bucket: {path}");
            }
            return Ok(Self::Bucket {
                bucket: name.to_string(),
                prefix: prefix.to_string(),
            });
        }

        Ok(Self::Local(PathBuf::from(path)))
    }
}
