//! Log sources on local disk.

use std::fs;
use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::BufReader;

use crate::error::MergeError;
use crate::source::{Discovery, SourceReader, is_log_name};

/// Buffer size for `BufReader` (64KB for optimal performance on large files)
const BUFFER_SIZE: usize = 64 * 1024;

/// Walks `root` in lexical order and collects every log file beneath it.
///
/// The canonical root becomes the display prefix, so names render as
/// `/nested/file.log` relative to it.
pub fn discover_local(root: &Path) -> Result<Discovery, MergeError> {
    let location = root.display().to_string();
    let root = root
        .canonicalize()
        .map_err(|e| MergeError::enumerate(&location, e))?;

    let mut names = Vec::new();
    walk(&root, &mut names).map_err(|e| MergeError::enumerate(&location, e))?;

    tracing::info!(root = %root.display(), sources = names.len(), "discovered local sources");

    Ok(Discovery {
        prefix: root.to_string_lossy().into_owned(),
        names,
    })
}

fn walk(path: &Path, names: &mut Vec<String>) -> io::Result<()> {
    let file_type = fs::symlink_metadata(path)?.file_type();
    if !file_type.is_dir() {
        let name = path.to_string_lossy();
        if is_log_name(&name) {
            names.push(name.into_owned());
        }
        return Ok(());
    }

    let mut entries = fs::read_dir(path)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        walk(&entry.path(), names)?;
    }
    Ok(())
}

/// Opens sources as files on local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalReader;

impl SourceReader for LocalReader {
    type Stream = BufReader<File>;
    type Error = io::Error;

    async fn open(&self, name: &str) -> Result<Self::Stream, Self::Error> {
        let file = File::open(name).await?;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
}
