//! # Source Catalog
//!
//! Read-only listings that feed the sample browser: the immediate children of a
//! folder on disk, or the audio content of a ZIP archive. Both are reduced to the
//! same [`CatalogEntry`] shape so the browser does not care where a sample lives.
//!
//! Listing never fails. A directory or archive that cannot be read produces an empty
//! [`CatalogListing`] carrying a warning.

use crate::archive::{self, ArchiveEntry};
use crate::error::CatalogReadFailure;
use crate::fsx;
use crate::pack::ItemSource;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extensions recognised as audio (compared case-insensitively).
pub const AUDIO_EXTENSIONS: [&str; 6] = ["wav", "mp3", "ogg", "flac", "aiff", "aif"];

/// Returns true if `name` ends in one of [`AUDIO_EXTENSIONS`].
pub fn is_audio_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => AUDIO_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Where a catalog entry was found.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryOrigin {
    Disk,
    Archive { archive_path: PathBuf },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    /// Absolute path on disk, or the entry path inside the archive
    /// (directories keep their trailing `/`).
    pub path: String,
    pub is_directory: bool,
    pub is_audio: bool,
    pub size: Option<u64>,
    pub origin: EntryOrigin,
}

impl CatalogEntry {
    /// The reference a pack item needs to read this entry's bytes later.
    /// Directories have none.
    pub fn to_source(&self) -> Option<ItemSource> {
        if self.is_directory {
            return None;
        }
        Some(match &self.origin {
            EntryOrigin::Disk => ItemSource::Disk { path: PathBuf::from(&self.path) },
            EntryOrigin::Archive { archive_path } => ItemSource::Archive {
                archive: archive_path.clone(),
                entry: self.path.clone(),
            },
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogListing {
    pub entries: Vec<CatalogEntry>,
    /// Set when the source could not be read; `entries` is then empty.
    pub warning: Option<String>,
}

impl CatalogListing {
    fn failed(failure: CatalogReadFailure) -> Self {
        warn!(path = %failure.path.display(), reason = %failure.reason, "catalog read failed");
        Self { entries: Vec::new(), warning: Some(failure.to_string()) }
    }

    pub fn directories(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.is_directory)
    }

    pub fn audio_files(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.is_audio)
    }
}

/// Lists the immediate children of a directory on disk.
///
/// Audio files carry their size; everything else has `size: None`.
pub async fn list_directory(path: &Path) -> CatalogListing {
    let children = match fsx::read_dir(path).await {
        Ok(children) => children,
        Err(e) => {
            return CatalogListing::failed(CatalogReadFailure { path: path.to_path_buf(), reason: e.to_string() })
        }
    };

    let mut entries = Vec::with_capacity(children.len());
    for child in children {
        let is_audio = !child.is_dir && is_audio_name(&child.name);
        let size = if is_audio {
            match fsx::stat_size(&child.path).await {
                Ok(size) => Some(size),
                Err(e) => {
                    debug!(path = %child.path.display(), error = %e, "stat failed");
                    None
                }
            }
        } else {
            None
        };
        entries.push(CatalogEntry {
            name: child.name,
            path: child.path.to_string_lossy().into_owned(),
            is_directory: child.is_dir,
            is_audio,
            size,
            origin: EntryOrigin::Disk,
        });
    }
    CatalogListing { entries, warning: None }
}

/// Lists the audio content of a ZIP archive plus the directories that contain it.
pub async fn list_archive(archive_path: &Path) -> CatalogListing {
    match archive::list_entries(archive_path.to_path_buf()).await {
        Ok(raw) => {
            let entries = catalog_archive_entries(archive_path, &raw);
            debug!(archive = %archive_path.display(), entries = entries.len(), "archive listed");
            CatalogListing { entries, warning: None }
        }
        Err(e) => CatalogListing::failed(CatalogReadFailure { path: archive_path.to_path_buf(), reason: e.to_string() }),
    }
}

/// Turns a raw central directory into catalog entries.
///
/// Non-audio files are dropped. Every directory prefix of an audio file is emitted
/// once as a directory entry, whether or not the archive stores it explicitly, so
/// flat-stored archives still browse as a tree. Audio files come first in stored
/// order, followed by directories in path order.
pub fn catalog_archive_entries(archive_path: &Path, raw: &[ArchiveEntry]) -> Vec<CatalogEntry> {
    let origin = EntryOrigin::Archive { archive_path: archive_path.to_path_buf() };
    let mut files = Vec::new();
    let mut directories = BTreeSet::new();

    for entry in raw {
        if entry.is_dir {
            directories.insert(format!("{}/", entry.path.trim_end_matches('/')));
            continue;
        }
        let name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
        if !is_audio_name(name) {
            continue;
        }
        let mut prefix = entry.path.as_str();
        while let Some((parent, _)) = prefix.rsplit_once('/') {
            directories.insert(format!("{parent}/"));
            prefix = parent;
        }
        files.push(CatalogEntry {
            name: name.to_string(),
            path: entry.path.clone(),
            is_directory: false,
            is_audio: true,
            size: Some(entry.uncompressed_size),
            origin: origin.clone(),
        });
    }

    let dir_entries = directories.into_iter().filter_map(|path| {
        let trimmed = path.trim_end_matches('/');
        let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
        if name.is_empty() || name == "." {
            return None;
        }
        Some(CatalogEntry {
            name: name.to_string(),
            path,
            is_directory: true,
            is_audio: false,
            size: None,
            origin: origin.clone(),
        })
    });
    files.into_iter().chain(dir_entries).collect()
}

/// Immediate children of an in-archive directory (`None` for the archive root).
pub fn archive_children<'a>(entries: &'a [CatalogEntry], dir: Option<&str>) -> Vec<&'a CatalogEntry> {
    let prefix = match dir {
        Some(d) if !d.is_empty() => format!("{}/", d.trim_end_matches('/')),
        _ => String::new(),
    };
    entries
        .iter()
        .filter(|e| {
            let Some(rest) = e.path.strip_prefix(prefix.as_str()) else {
                return false;
            };
            let rest = if e.is_directory { rest.trim_end_matches('/') } else { rest };
            !rest.is_empty() && !rest.contains('/')
        })
        .collect()
}

/// Parent of an in-archive directory, or `None` when `dir` is already top-level.
pub fn archive_parent(dir: &str) -> Option<String> {
    let trimmed = dir.trim_end_matches('/');
    trimmed.rsplit_once('/').map(|(parent, _)| format!("{parent}/"))
}
