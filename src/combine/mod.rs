//! Batch combiner: merges several sample-pack archives into one.
//!
//! Each input is unpacked into its own directory named after the archive, so
//! `drums.zip` and `keys.zip` end up as `drums/` and `keys/` at the top of the result.

use crate::archive;
use crate::config::EngineConfig;
use crate::error::CombineError;
use crate::fsx;
use crate::progress::{ProgressCallback, ProgressState, ProgressTracker};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SCRATCH_PREFIX: &str = "combine-";
const OUTPUT_PREFIX: &str = "combined-pack-";

pub struct BatchCombiner {
    temp_root: PathBuf,
    output_dir: PathBuf,
    compression_level: i32,
    progress: Option<Arc<ProgressCallback>>,
}

impl BatchCombiner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            temp_root: config.temp_root.clone(),
            output_dir: config.output_dir.clone(),
            compression_level: config.compression_level,
            progress: None,
        }
    }

    /// Report one update per extracted archive.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressState) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Extracts every archive and zips the lot into a new `combined-pack-*.zip`.
    ///
    /// Any failure aborts the batch: the scratch directory is removed and no output is
    /// left behind.
    pub async fn combine(&self, archives: &[PathBuf]) -> Result<PathBuf, CombineError> {
        if archives.is_empty() {
            return Err(CombineError::NoInputs);
        }

        let scratch = fsx::make_temp_dir(&self.temp_root, SCRATCH_PREFIX)
            .await
            .map_err(|source| CombineError::TempDir { root: self.temp_root.clone(), source })?;

        let result = self.combine_into(archives, &scratch).await;
        if let Err(e) = fsx::remove_tree(&scratch).await {
            warn!(scratch = %scratch.display(), error = %e, "could not remove scratch directory");
        }
        result
    }

    async fn combine_into(&self, archives: &[PathBuf], scratch: &Path) -> Result<PathBuf, CombineError> {
        let tracker = match &self.progress {
            Some(callback) => ProgressTracker::with_callback(Duration::ZERO, Arc::clone(callback)),
            None => ProgressTracker::default(),
        };
        tracker.set_total(archives.len() as u64);

        for path in archives {
            let base = archive_base_name(path);
            let dest = scratch.join(&base);
            match archive::extract_all_async(path.clone(), dest).await {
                Ok(files) => {
                    info!(archive = %path.display(), files, into = %base, "extracted");
                    tracker.record_item(0, true, &base);
                }
                Err(source) => {
                    warn!(archive = %path.display(), error = %source, "extraction failed; aborting batch");
                    return Err(CombineError::Extract { archive: path.clone(), source });
                }
            }
        }

        let output = unique_output_path(&self.output_dir, chrono::Utc::now().timestamp_millis());
        let summary = archive::zip_directory_async(scratch.to_path_buf(), output.clone(), self.compression_level)
            .await
            .map_err(CombineError::Write)?;
        info!(output = %output.display(), files = summary.files, archives = archives.len(), "combined");
        Ok(output)
    }
}

/// Combines with default settings.
pub async fn combine(archives: &[PathBuf]) -> Result<PathBuf, CombineError> {
    BatchCombiner::new(&EngineConfig::default()).combine(archives).await
}

/// File name of `path` without a trailing `.zip` (any case).
pub fn archive_base_name(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let base = match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".zip") => &name[..cut],
        _ => name.as_str(),
    };
    if base.is_empty() {
        "archive".to_string()
    } else {
        base.to_string()
    }
}

fn unique_output_path(dir: &Path, millis: i64) -> PathBuf {
    let stem = format!("{OUTPUT_PREFIX}{millis}");
    let original = dir.join(format!("{stem}.zip"));
    if !original.exists() {
        return original;
    }
    let mut idx = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}-{idx}.zip"));
        if !candidate.exists() {
            return candidate;
        }
        idx += 1;
    }
}
