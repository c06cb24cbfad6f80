use std::path::PathBuf;

use thiserror::Error;

/// Human-readable label for a pack scope: the root, or a folder path.
pub(crate) fn scope_label(scope: Option<&str>) -> &str {
    scope.unwrap_or("<root>")
}

/// Errors raised by the ZIP adapter in [`crate::archive`].
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", .path.display())]
    Io { source: std::io::Error, path: PathBuf },

    /// The archive could not be parsed or written by the `zip` crate.
    #[error("ZIP error in '{}': {source}", .path.display())]
    Zip { source: zip::result::ZipError, path: PathBuf },

    #[error("entry '{entry}' not found in '{}'", .archive.display())]
    EntryNotFound { archive: PathBuf, entry: String },

    #[error("entry '{entry}' in '{}' is a directory", .archive.display())]
    NotAFile { archive: PathBuf, entry: String },

    /// A blocking archive task panicked or was cancelled.
    #[error("archive task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Structural mutations of the pack model that would break an invariant.
///
/// Every operation returning one of these leaves the pack untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error("folder '{0}' already exists")]
    DuplicateFolder(String),

    #[error("'{name}' already exists in {}", scope_label(.scope.as_deref()))]
    Collision { scope: Option<String>, name: String },

    #[error("folder '{0}' does not exist")]
    FolderNotFound(String),

    #[error("item '{name}' not found in {}", scope_label(.scope.as_deref()))]
    ItemNotFound { scope: Option<String>, name: String },

    #[error("invalid name '{0}'")]
    InvalidName(String),
}

/// Byte resolution failed for a single item reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("source unavailable: {reason}")]
pub struct SourceUnavailable {
    pub reason: String,
}

impl SourceUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// A directory or archive could not be listed.
///
/// Never propagated as an error: the catalog turns it into an empty listing
/// with a warning attached.
#[derive(Debug, Clone, Error)]
#[error("could not read '{}': {reason}", .path.display())]
pub struct CatalogReadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Fatal export failures. Per-item failures never show up here; they are
/// collected in the export report instead.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("could not create a temporary directory in '{}': {source}", .root.display())]
    TempDir { root: PathBuf, source: std::io::Error },

    /// Compressing the staged tree failed. The staging directory is kept.
    #[error("writing the output archive failed (staged files kept in '{}'): {source}", .temp_dir.display())]
    ArchiveWrite { temp_dir: PathBuf, source: ArchiveError },
}

#[derive(Debug, Error)]
pub enum CombineError {
    #[error("no archives to combine")]
    NoInputs,

    #[error("could not create a temporary directory in '{}': {source}", .root.display())]
    TempDir { root: PathBuf, source: std::io::Error },

    #[error("failed to extract '{}': {source}", .archive.display())]
    Extract { archive: PathBuf, source: ArchiveError },

    #[error("failed to write the combined archive: {0}")]
    Write(#[source] ArchiveError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config '{}': {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid config '{}': {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("invalid value '{value}' for {var}")]
    InvalidValue { var: String, value: String },
}
