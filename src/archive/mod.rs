//! # ZIP Adapter
//!
//! Reading and writing of standard `.zip` archives on top of the `zip` crate.
//!
//! - [`ZipSource`] opens a source archive once and serves both its entry catalog and
//!   the bytes of single entries on demand. An open `ZipSource` can be reused for any
//!   number of extractions.
//! - [`zip_directory`] compresses a directory tree into one archive with the contents
//!   of the directory at the archive root.
//!
//! The `zip` crate is synchronous, so the `*_async` helpers run the work on
//! tokio's blocking pool.

use crate::error::ArchiveError;

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Highest Deflate level; used for every archive the engine writes unless configured otherwise.
pub const MAX_COMPRESSION_LEVEL: i32 = 9;

/// A single entry of a source archive's central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// The entry path as stored in the archive (`/`-separated, directories end with `/`).
    pub path: String,
    pub is_dir: bool,
    pub uncompressed_size: u64,
}

/// Counts of what [`zip_directory`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZipSummary {
    pub files: usize,
    pub directories: usize,
}

fn io_err(source: io::Error, path: &Path) -> ArchiveError {
    ArchiveError::Io { source, path: path.to_path_buf() }
}

fn zip_err(source: ZipError, path: &Path) -> ArchiveError {
    ArchiveError::Zip { source, path: path.to_path_buf() }
}

/// An open, read-only source archive.
pub struct ZipSource {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl ZipSource {
    /// Opens the archive at `path` and parses its central directory.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path).map_err(|e| io_err(e, path))?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| zip_err(e, path))?;
        Ok(Self { path: path.to_path_buf(), archive })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Returns every entry of the central directory, in stored order.
    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i).map_err(|e| zip_err(e, &self.path))?;
            entries.push(ArchiveEntry {
                path: file.name().to_string(),
                is_dir: file.is_dir(),
                uncompressed_size: file.size(),
            });
        }
        Ok(entries)
    }

    /// Reads the full content of the entry stored under `entry`.
    pub fn extract(&mut self, entry: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut file = match self.archive.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(ArchiveError::EntryNotFound {
                    archive: self.path.clone(),
                    entry: entry.to_string(),
                })
            }
            Err(e) => return Err(zip_err(e, &self.path)),
        };
        if file.is_dir() {
            return Err(ArchiveError::NotAFile {
                archive: self.path.clone(),
                entry: entry.to_string(),
            });
        }

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data).map_err(|e| io_err(e, &self.path))?;
        Ok(data)
    }

    /// Extracts every entry below `dest`, recreating the stored directory layout.
    ///
    /// Entries whose names would land outside `dest` (absolute paths, `..`) are skipped.
    /// Returns the number of files written.
    pub fn extract_all(&mut self, dest: &Path) -> Result<usize, ArchiveError> {
        fs::create_dir_all(dest).map_err(|e| io_err(e, dest))?;

        let mut written = 0;
        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i).map_err(|e| zip_err(e, &self.path))?;
            let Some(relative) = file.enclosed_name().map(Path::to_path_buf) else {
                warn!(archive = %self.path.display(), entry = file.name(), "skipping entry with unsafe path");
                continue;
            };
            let target = dest.join(relative);

            if file.is_dir() {
                fs::create_dir_all(&target).map_err(|e| io_err(e, &target))?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| io_err(e, parent))?;
            }
            let out = File::create(&target).map_err(|e| io_err(e, &target))?;
            let mut out = BufWriter::new(out);
            io::copy(&mut file, &mut out).map_err(|e| io_err(e, &target))?;
            out.flush().map_err(|e| io_err(e, &target))?;
            written += 1;
        }
        debug!(archive = %self.path.display(), dest = %dest.display(), files = written, "extracted archive");
        Ok(written)
    }
}

/// Converts a relative filesystem path into a `/`-separated archive entry name.
fn zip_entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Compresses the contents of `source_dir` into a new archive at `output`.
///
/// The directory itself is not stored: its children become top-level entries.
/// Entries are written in file-name order so the same tree always yields the same
/// entry order. Empty directories are kept as directory entries. `level` is clamped
/// to the valid Deflate range. If writing fails, the partial archive is deleted.
pub fn zip_directory(source_dir: &Path, output: &Path, level: i32) -> Result<ZipSummary, ArchiveError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_err(e, parent))?;
    }
    let file = File::create(output).map_err(|e| io_err(e, output))?;

    let summary = match write_tree(source_dir, file, output, level) {
        Ok(summary) => summary,
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(output) {
                warn!(output = %output.display(), error = %remove_err, "could not remove partial archive");
            }
            return Err(e);
        }
    };
    debug!(
        source = %source_dir.display(),
        output = %output.display(),
        files = summary.files,
        directories = summary.directories,
        "archive written"
    );
    Ok(summary)
}

fn write_tree(source_dir: &Path, file: File, output: &Path, level: i32) -> Result<ZipSummary, ArchiveError> {
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(level.clamp(0, MAX_COMPRESSION_LEVEL)));

    let mut summary = ZipSummary::default();
    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source_dir.to_path_buf());
            ArchiveError::Io { source: e.into(), path }
        })?;
        let relative = entry.path().strip_prefix(source_dir).map_err(|_| {
            io_err(io::Error::new(io::ErrorKind::InvalidInput, "entry outside of source directory"), entry.path())
        })?;
        let name = zip_entry_name(relative);

        if entry.file_type().is_dir() {
            writer.add_directory(format!("{name}/"), options).map_err(|e| zip_err(e, output))?;
            summary.directories += 1;
        } else {
            writer.start_file(name, options).map_err(|e| zip_err(e, output))?;
            let mut src = File::open(entry.path()).map_err(|e| io_err(e, entry.path()))?;
            io::copy(&mut src, &mut writer).map_err(|e| io_err(e, entry.path()))?;
            summary.files += 1;
        }
    }

    let mut inner = writer.finish().map_err(|e| zip_err(e, output))?;
    inner.flush().map_err(|e| io_err(e, output))?;
    Ok(summary)
}

/// Lists an archive's entries without blocking the runtime.
pub async fn list_entries(path: PathBuf) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    tokio::task::spawn_blocking(move || ZipSource::open(&path)?.entries()).await?
}

/// [`zip_directory`] on the blocking pool.
pub async fn zip_directory_async(source_dir: PathBuf, output: PathBuf, level: i32) -> Result<ZipSummary, ArchiveError> {
    tokio::task::spawn_blocking(move || zip_directory(&source_dir, &output, level)).await?
}

/// [`ZipSource::extract_all`] on the blocking pool.
pub async fn extract_all_async(archive: PathBuf, dest: PathBuf) -> Result<usize, ArchiveError> {
    tokio::task::spawn_blocking(move || ZipSource::open(&archive)?.extract_all(&dest)).await?
}
