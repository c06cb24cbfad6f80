//! # Pack Materializer
//!
//! Turns a virtual [`Pack`] into a real ZIP archive:
//!
//! 1. An empty pack short-circuits to [`ExportOutcome::EmptyPack`] without touching the disk.
//! 2. A fresh staging directory (`sample-pack-*`) is created under the configured temp root.
//! 3. Every scope (the root, then each folder) is staged as its own task. Items of a scope are
//!    resolved and written in stored order; a failing item is recorded and skipped.
//! 4. The staging directory is compressed into the destination, its contents at the archive root.
//! 5. The staging directory is removed. If compression failed it is kept for inspection instead.

use crate::archive;
use crate::config::EngineConfig;
use crate::error::{scope_label, MaterializeError};
use crate::fsx;
use crate::pack::{Pack, PackItem};
use crate::progress::{ProgressCallback, ProgressState, ProgressTracker};
use crate::resolve::SourceResolver;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const STAGING_PREFIX: &str = "sample-pack-";

/// An item that could not be written to the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// Folder path, or `None` for the pack root.
    pub scope: Option<String>,
    pub name: String,
    pub reason: String,
}

impl FailedItem {
    /// `folder/name`, or just `name` at the root.
    pub fn display_path(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{scope}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub succeeded_count: usize,
    pub failed_items: Vec<FailedItem>,
    pub output_path: PathBuf,
}

impl ExportReport {
    pub fn total(&self) -> usize {
        self.succeeded_count + self.failed_items.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_items.is_empty()
    }

    /// Status line for the user: counts, plus the names of failed items.
    pub fn summary(&self) -> String {
        let mut line = format!("exported {}/{} items", self.succeeded_count, self.total());
        if !self.failed_items.is_empty() {
            let names: Vec<_> = self.failed_items.iter().map(FailedItem::display_path).collect();
            line.push_str(&format!(", {} failed: {}", self.failed_items.len(), names.join(", ")));
        }
        line
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing to export; no directory or archive was created.
    EmptyPack,
    Exported(ExportReport),
}

impl ExportOutcome {
    pub fn report(&self) -> Option<&ExportReport> {
        match self {
            ExportOutcome::EmptyPack => None,
            ExportOutcome::Exported(report) => Some(report),
        }
    }
}

/// Sanitize a name so it is a valid file name on Windows, macOS and Linux.
///
/// * Replaces characters that are illegal in NTFS (`< > : " / \\ | ? *` and ASCII control chars)
///   with an underscore.
/// * Trims trailing dots and spaces that Windows forbids.
/// * Prefixes reserved DOS device names (`CON`, `NUL`, `COM1`...) with an underscore.
/// * Falls back to `pack` if nothing is left.
pub fn sanitize_filename(name: &str) -> String {
    const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    let mut cleaned = name
        .trim()
        .chars()
        .map(|c| if c.is_control() || FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect::<String>();

    while cleaned.ends_with('.') || cleaned.ends_with(' ') {
        cleaned.pop();
    }

    let upper = cleaned.to_ascii_uppercase();
    const RESERVED: [&str; 22] = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9", "LPT1",
        "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    if RESERVED.contains(&upper.as_str()) {
        cleaned = format!("_{cleaned}");
    }

    if cleaned.is_empty() {
        "pack".to_string()
    } else {
        cleaned
    }
}

/// Suggested file name for the save dialog: `<pack name>.zip`.
pub fn default_export_file_name(pack: &Pack) -> String {
    format!("{}.zip", sanitize_filename(pack.name()))
}

/// Outcome of staging a single scope.
#[derive(Debug, Default)]
struct ScopeResult {
    succeeded: usize,
    failures: Vec<FailedItem>,
}

/// Everything a staging task needs, owned so it can move into the task.
struct ScopeJob {
    scope: Option<String>,
    dir: PathBuf,
    items: Vec<PackItem>,
}

pub struct Materializer {
    temp_root: PathBuf,
    compression_level: i32,
    progress: Option<Arc<ProgressCallback>>,
}

impl Materializer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            temp_root: config.temp_root.clone(),
            compression_level: config.compression_level,
            progress: None,
        }
    }

    /// Install a callback that receives a [`ProgressState`] as items are staged.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressState) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Exports `pack` to a ZIP archive at `destination`.
    ///
    /// Per-item failures are collected in the report and never abort the export. Only a
    /// staging directory that cannot be created or an archive that cannot be written is
    /// returned as an error.
    pub async fn materialize(&self, pack: &Pack, destination: &Path) -> Result<ExportOutcome, MaterializeError> {
        if pack.is_empty() {
            info!(pack = pack.name(), "nothing to export");
            return Ok(ExportOutcome::EmptyPack);
        }

        let staging = self.create_staging_dir().await?;
        info!(
            pack = pack.name(),
            items = pack.item_count(),
            folders = pack.folders().len(),
            staging = %staging.display(),
            "exporting pack"
        );

        let tracker = Arc::new(match &self.progress {
            Some(callback) => ProgressTracker::with_callback(Duration::from_millis(100), Arc::clone(callback)),
            None => ProgressTracker::default(),
        });
        tracker.set_total(pack.item_count() as u64);

        let resolver = SourceResolver::new();
        let results = stage_scopes(scope_jobs(pack, &staging), &resolver, &tracker).await;

        let mut succeeded_count = 0;
        let mut failed_items = Vec::new();
        for result in results {
            succeeded_count += result.succeeded;
            failed_items.extend(result.failures);
        }

        if let Err(source) =
            archive::zip_directory_async(staging.clone(), destination.to_path_buf(), self.compression_level).await
        {
            warn!(staging = %staging.display(), error = %source, "archive write failed; staged files kept");
            return Err(MaterializeError::ArchiveWrite { temp_dir: staging, source });
        }

        if let Err(e) = fsx::remove_tree(&staging).await {
            warn!(staging = %staging.display(), error = %e, "could not remove staging directory");
        }

        let report = ExportReport { succeeded_count, failed_items, output_path: destination.to_path_buf() };
        info!(output = %destination.display(), "{}", report.summary());
        Ok(ExportOutcome::Exported(report))
    }

    async fn create_staging_dir(&self) -> Result<PathBuf, MaterializeError> {
        // Cleanup is explicit: the directory must survive a failed archive write.
        fsx::make_temp_dir(&self.temp_root, STAGING_PREFIX)
            .await
            .map_err(|source| MaterializeError::TempDir { root: self.temp_root.clone(), source })
    }
}

/// Exports with default settings.
pub async fn materialize(pack: &Pack, destination: &Path) -> Result<ExportOutcome, MaterializeError> {
    Materializer::new(&EngineConfig::default()).materialize(pack, destination).await
}

/// The root scope first, then folders in insertion order.
fn scope_jobs(pack: &Pack, staging: &Path) -> Vec<ScopeJob> {
    let root = ScopeJob { scope: None, dir: staging.to_path_buf(), items: pack.root_items().to_vec() };
    let folders = pack.folders().iter().map(|folder| ScopeJob {
        scope: Some(folder.path().to_string()),
        dir: staging.join(folder.path()),
        items: folder.items().to_vec(),
    });
    std::iter::once(root).chain(folders).collect()
}

/// Stages all scopes concurrently and returns their results in job order.
async fn stage_scopes(jobs: Vec<ScopeJob>, resolver: &SourceResolver, tracker: &Arc<ProgressTracker>) -> Vec<ScopeResult> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let scope = job.scope.clone();
            let names: Vec<String> = job.items.iter().map(|item| item.name().to_string()).collect();
            let resolver = resolver.clone();
            let tracker = Arc::clone(tracker);
            let handle = tokio::spawn(async move { stage_scope(job, &resolver, &tracker).await });
            (scope, names, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (scope, names, handle) in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                // A task that died takes its whole scope down with it.
                warn!(scope = scope_label(scope.as_deref()), error = %e, "scope staging task failed");
                let failures = names
                    .into_iter()
                    .map(|name| FailedItem { scope: scope.clone(), name, reason: "staging task aborted".to_string() })
                    .collect();
                results.push(ScopeResult { succeeded: 0, failures });
            }
        }
    }
    results
}

async fn stage_scope(job: ScopeJob, resolver: &SourceResolver, tracker: &ProgressTracker) -> ScopeResult {
    let mut result = ScopeResult::default();
    let scope = job.scope.as_deref();

    if let Err(e) = fsx::make_dir(&job.dir).await {
        warn!(scope = scope_label(scope), error = %e, "could not create folder");
        for item in &job.items {
            tracker.record_item(0, false, &Pack::relative_item_path(scope, item).to_string_lossy());
            result.failures.push(FailedItem {
                scope: job.scope.clone(),
                name: item.name().to_string(),
                reason: format!("could not create folder: {e}"),
            });
        }
        return result;
    }

    for item in &job.items {
        let label = Pack::relative_item_path(scope, item).to_string_lossy().into_owned();
        match stage_item(item, &job.dir, resolver).await {
            Ok(bytes) => {
                debug!(item = %label, bytes, "staged");
                tracker.record_item(bytes, true, &label);
                result.succeeded += 1;
            }
            Err(reason) => {
                warn!(item = %label, source = %item.source().describe(), %reason, "item failed");
                tracker.record_item(0, false, &label);
                result.failures.push(FailedItem { scope: job.scope.clone(), name: item.name().to_string(), reason });
            }
        }
    }
    result
}

async fn stage_item(item: &PackItem, dir: &Path, resolver: &SourceResolver) -> Result<u64, String> {
    let bytes = resolver.resolve(item.source()).await.map_err(|e| e.reason)?;
    let target = dir.join(item.name());
    fsx::write_file(&target, &bytes).await.map_err(|e| format!("write {}: {e}", target.display()))?;
    Ok(bytes.len() as u64)
}
