//! Async filesystem wrapper.
//!
//! Everything the engine does to loose files on disk goes through here: listing
//! a directory for the catalog, reading a sample for preview or export, and
//! staging the export tree. The helpers sit on `tokio::fs` so that a listing or
//! an export never blocks the caller's runtime thread.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Lists the immediate children of `path`, sorted by name.
///
/// Entries whose file type cannot be determined are reported as files.
pub async fn read_dir(path: &Path) -> io::Result<Vec<DirEntryInfo>> {
    let mut reader = fs::read_dir(path).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Size in bytes of the file at `path`.
pub async fn stat_size(path: &Path) -> io::Result<u64> {
    Ok(fs::metadata(path).await?.len())
}

pub async fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path).await
}

/// Writes `bytes` to `path`, creating missing parent directories first.
pub async fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await
}

/// Recursive `mkdir -p`.
pub async fn make_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await
}

/// Creates a fresh, uniquely named directory `<root>/<prefix>*`, creating `root` first.
///
/// The directory is not removed on drop; callers clean it up with [`remove_tree`].
pub async fn make_temp_dir(root: &Path, prefix: &str) -> io::Result<PathBuf> {
    let root = root.to_path_buf();
    let prefix = prefix.to_string();
    tokio::task::spawn_blocking(move || -> io::Result<PathBuf> {
        std::fs::create_dir_all(&root)?;
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir_in(&root)?;
        Ok(dir.into_path())
    })
    .await
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

/// Removes a directory tree. A tree that is already gone is not an error.
pub async fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
