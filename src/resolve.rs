//! Byte resolution for item references.
//!
//! Preview and export read sample bytes through the same [`SourceResolver`], so a
//! reference that previews fine is exactly the one that gets exported.

use crate::archive::ZipSource;
use crate::error::SourceUnavailable;
use crate::fsx;
use crate::pack::{ItemSource, PackItem};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

type SharedSource = Arc<Mutex<ZipSource>>;

/// Reads the bytes behind [`ItemSource`]s.
///
/// Source archives are opened once and the handle is reused for later entries of the
/// same archive. Handles only live as long as the resolver, so a resolver is normally
/// created per export. Locks are only taken inside blocking tasks.
#[derive(Default, Clone)]
pub struct SourceResolver {
    archives: Arc<Mutex<HashMap<PathBuf, SharedSource>>>,
}

impl SourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of archives currently held open.
    pub fn open_archives(&self) -> usize {
        self.archives.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub async fn resolve(&self, source: &ItemSource) -> Result<Vec<u8>, SourceUnavailable> {
        match source {
            ItemSource::Disk { path } => fsx::read_file(path)
                .await
                .map_err(|e| SourceUnavailable::new(format!("{}: {e}", path.display()))),
            ItemSource::Archive { archive, entry } => {
                let archives = Arc::clone(&self.archives);
                let archive = archive.clone();
                let entry = entry.clone();
                tokio::task::spawn_blocking(move || {
                    let handle = cached_source(&archives, archive)?;
                    let mut source = handle.lock().unwrap_or_else(|e| e.into_inner());
                    source.extract(&entry).map_err(|e| SourceUnavailable::new(e.to_string()))
                })
                .await
                .map_err(|e| SourceUnavailable::new(e.to_string()))?
            }
        }
    }

    /// Bytes for auditioning a pack item before export.
    pub async fn preview(&self, item: &PackItem) -> Result<Vec<u8>, SourceUnavailable> {
        self.resolve(item.source()).await
    }
}

/// Returns the shared handle for `path`, opening the archive on first use.
///
/// The map lock is released while the central directory is parsed, so different
/// archives open in parallel. If two tasks race on the same archive, the first
/// handle inserted wins and the other is dropped.
fn cached_source(archives: &Mutex<HashMap<PathBuf, SharedSource>>, path: PathBuf) -> Result<SharedSource, SourceUnavailable> {
    if let Some(handle) = archives.lock().unwrap_or_else(|e| e.into_inner()).get(&path) {
        return Ok(Arc::clone(handle));
    }

    let source = ZipSource::open(&path).map_err(|e| SourceUnavailable::new(e.to_string()))?;
    debug!(archive = %path.display(), entries = source.len(), "opened source archive");

    let mut map = archives.lock().unwrap_or_else(|e| e.into_inner());
    let handle = map.entry(path).or_insert_with(|| Arc::new(Mutex::new(source)));
    Ok(Arc::clone(handle))
}

/// One-shot resolution without handle reuse.
pub async fn resolve_bytes(source: &ItemSource) -> Result<Vec<u8>, SourceUnavailable> {
    SourceResolver::new().resolve(source).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;

    #[tokio::test]
    async fn archive_handles_are_reused() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let zip_path = dir.path().join("kit.zip");
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&zip_path)?);
        for (name, data) in [("a.wav", b"aa"), ("b.wav", b"bb")] {
            zip.start_file(name, FileOptions::default())?;
            zip.write_all(data)?;
        }
        zip.finish()?;

        let resolver = SourceResolver::new();
        let a = ItemSource::Archive { archive: zip_path.clone(), entry: "a.wav".into() };
        let b = ItemSource::Archive { archive: zip_path.clone(), entry: "b.wav".into() };
        assert_eq!(resolver.resolve(&a).await?, b"aa");
        assert_eq!(resolver.resolve(&b).await?, b"bb");
        assert_eq!(resolver.open_archives(), 1);

        let missing = ItemSource::Archive { archive: zip_path, entry: "c.wav".into() };
        assert!(resolver.resolve(&missing).await.is_err());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_reads_share_one_handle_per_archive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut sources = Vec::new();
        for kit in ["one.zip", "two.zip"] {
            let zip_path = dir.path().join(kit);
            let mut zip = zip::ZipWriter::new(std::fs::File::create(&zip_path)?);
            zip.start_file("s.wav", FileOptions::default())?;
            zip.write_all(kit.as_bytes())?;
            zip.finish()?;
            sources.push(ItemSource::Archive { archive: zip_path, entry: "s.wav".into() });
        }

        let resolver = SourceResolver::new();
        let (a, b, c) = tokio::join!(
            resolver.resolve(&sources[0]),
            resolver.resolve(&sources[1]),
            resolver.resolve(&sources[0]),
        );
        assert_eq!(a?, b"one.zip");
        assert_eq!(b?, b"two.zip");
        assert_eq!(c?, b"one.zip");
        assert_eq!(resolver.open_archives(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn missing_disk_file_is_unavailable() {
        let err = resolve_bytes(&ItemSource::Disk { path: "/definitely/not/here.wav".into() }).await;
        assert!(err.unwrap_err().reason.contains("here.wav"));
    }
}
