//! # Pack Model
//!
//! The virtual tree a user assembles before export: a named root with an ordered list
//! of items, plus a flat, insertion-ordered list of folders. A folder is identified by
//! its path string alone (`drums/kicks`); there is no parent/child link between
//! folders, so renaming or deleting `drums` leaves `drums/kicks` alone.
//!
//! Items are references ([`ItemSource`]) to bytes that live elsewhere. Nothing here
//! touches the filesystem; every operation either succeeds or leaves the pack exactly
//! as it was.

pub mod manifest;
pub mod session;

use crate::error::PackError;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use manifest::PackManifest;
pub use session::{PackSession, Prompt, Selection};

/// Name given to packs created without an explicit name.
pub const DEFAULT_PACK_NAME: &str = "New Pack";

/// Where an item's bytes are read from at export (or preview) time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum ItemSource {
    /// A loose file on disk.
    Disk { path: PathBuf },
    /// An entry inside a source ZIP archive.
    Archive { archive: PathBuf, entry: String },
}

impl ItemSource {
    /// File name of the referenced sample (last path segment).
    pub fn file_name(&self) -> Option<String> {
        match self {
            ItemSource::Disk { path } => path.file_name().map(|n| n.to_string_lossy().into_owned()),
            ItemSource::Archive { entry, .. } => entry
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ItemSource::Disk { path } => path.display().to_string(),
            ItemSource::Archive { archive, entry } => format!("{}:{}", archive.display(), entry),
        }
    }
}

/// One audio sample placed in the pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackItem {
    name: String,
    virtual_path: String,
    source: ItemSource,
    size: u64,
}

impl PackItem {
    pub fn new(name: impl Into<String>, source: ItemSource, size: u64) -> Self {
        let name = name.into();
        Self { virtual_path: name.clone(), name, source, size }
    }

    /// Item named after the file it points at. `None` when the source has no file name.
    pub fn from_source(source: ItemSource, size: u64) -> Option<Self> {
        let name = source.file_name()?;
        Some(Self::new(name, source, size))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the item within its scope.
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    pub fn source(&self) -> &ItemSource {
        &self.source
    }

    /// Informational byte length; never used for integrity checks.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Extension of the current name, without the dot.
    pub fn extension(&self) -> Option<&str> {
        split_extension(&self.name).1
    }
}

/// A virtual directory and the items placed in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackFolder {
    path: String,
    items: Vec<PackItem>,
}

impl PackFolder {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final segment of the folder path, as shown in a tree view.
    pub fn name(&self) -> &str {
        folder_name(&self.path)
    }

    pub fn items(&self) -> &[PackItem] {
        &self.items
    }
}

/// The aggregate root of the virtual pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pack {
    name: String,
    root_items: Vec<PackItem>,
    folders: Vec<PackFolder>,
}

impl Default for Pack {
    fn default() -> Self {
        Self::new(DEFAULT_PACK_NAME)
    }
}

/// Final `/`-separated segment of a folder path.
pub fn folder_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Splits `name` into stem and extension. Dot-files and names without a dot have no extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Applies the rename rule: keep the original extension unless `new_name` already ends with it.
fn with_original_extension(new_name: &str, original_ext: Option<&str>) -> String {
    match original_ext {
        Some(ext) => {
            let suffix = format!(".{}", ext.to_lowercase());
            if new_name.to_lowercase().ends_with(&suffix) {
                new_name.to_string()
            } else {
                format!("{new_name}.{ext}")
            }
        }
        None => new_name.to_string(),
    }
}

/// A single path segment: not empty, not `.`/`..`, no separators.
fn validate_segment(name: &str) -> Result<(), PackError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) || name.trim() != name {
        return Err(PackError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_folder_path(path: &str) -> Result<(), PackError> {
    path.split('/')
        .try_for_each(validate_segment)
        .map_err(|_| PackError::InvalidName(path.to_string()))
}

impl Pack {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), root_items: Vec::new(), folders: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn root_items(&self) -> &[PackItem] {
        &self.root_items
    }

    /// Folders in insertion order.
    pub fn folders(&self) -> &[PackFolder] {
        &self.folders
    }

    pub fn folder(&self, path: &str) -> Option<&PackFolder> {
        self.folders.iter().find(|f| f.path == path)
    }

    pub fn has_folder(&self, path: &str) -> bool {
        self.folder(path).is_some()
    }

    /// Number of items across the root and every folder.
    pub fn item_count(&self) -> usize {
        self.root_items.len() + self.folders.iter().map(|f| f.items.len()).sum::<usize>()
    }

    /// True when no item exists anywhere. Empty folders do not count.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Items of a scope: the root for `None`, otherwise the named folder.
    pub fn items(&self, scope: Option<&str>) -> Option<&[PackItem]> {
        match scope {
            None => Some(&self.root_items),
            Some(path) => self.folder(path).map(|f| f.items.as_slice()),
        }
    }

    fn items_mut(&mut self, scope: Option<&str>) -> Option<&mut Vec<PackItem>> {
        match scope {
            None => Some(&mut self.root_items),
            Some(path) => self.folders.iter_mut().find(|f| f.path == path).map(|f| &mut f.items),
        }
    }

    pub fn find_item(&self, scope: Option<&str>, virtual_path: &str) -> Option<&PackItem> {
        self.items(scope)?.iter().find(|i| i.virtual_path == virtual_path)
    }

    /// True if `scope` holds an item whose virtual path matches `name` ignoring ASCII case.
    ///
    /// Staged files land on the host filesystem, where `Kick.wav` and `kick.wav` may be the
    /// same file.
    fn name_taken(&self, scope: Option<&str>, name: &str) -> bool {
        self.items(scope)
            .is_some_and(|items| items.iter().any(|i| i.virtual_path.eq_ignore_ascii_case(name)))
    }

    /// Creates `name` under `parent` (or at the top level) and returns the new folder path.
    pub fn create_folder(&mut self, parent: Option<&str>, name: &str) -> Result<String, PackError> {
        validate_segment(name)?;
        let path = match parent {
            Some(parent) if !parent.is_empty() => format!("{parent}/{name}"),
            _ => name.to_string(),
        };
        self.create_folder_path(&path)?;
        Ok(path)
    }

    /// Registers a folder by its full path (`drums/kicks`).
    pub fn create_folder_path(&mut self, path: &str) -> Result<(), PackError> {
        validate_folder_path(path)?;
        if self.has_folder(path) {
            return Err(PackError::DuplicateFolder(path.to_string()));
        }
        self.folders.push(PackFolder { path: path.to_string(), items: Vec::new() });
        Ok(())
    }

    /// Appends `item` to the root (`None`) or to a folder.
    ///
    /// A folder that does not exist yet is created, empty, right before the item lands
    /// in it. Fails with `Collision` if the scope already holds the item's virtual path, ignoring
    /// ASCII case.
    pub fn add_item(&mut self, target: Option<&str>, item: PackItem) -> Result<(), PackError> {
        validate_segment(&item.name)?;
        if let Some(path) = target {
            validate_folder_path(path)?;
        }
        if self.name_taken(target, &item.virtual_path) {
            return Err(PackError::Collision {
                scope: target.map(str::to_string),
                name: item.virtual_path.clone(),
            });
        }
        if let Some(path) = target {
            if !self.has_folder(path) {
                self.create_folder_path(path)?;
            }
        }
        match self.items_mut(target) {
            Some(items) => {
                items.push(item);
                Ok(())
            }
            None => Err(PackError::FolderNotFound(target.unwrap_or_default().to_string())),
        }
    }

    /// Removes the item with `virtual_path` from `scope`. Returns whether anything was removed.
    pub fn remove_item(&mut self, scope: Option<&str>, virtual_path: &str) -> bool {
        let Some(items) = self.items_mut(scope) else {
            return false;
        };
        match items.iter().position(|i| i.virtual_path == virtual_path) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Renames an item, keeping its original extension. Returns the final name.
    pub fn rename_item(&mut self, scope: Option<&str>, virtual_path: &str, new_name: &str) -> Result<String, PackError> {
        let new_name = new_name.trim();
        validate_segment(new_name)?;
        let not_found = || PackError::ItemNotFound {
            scope: scope.map(str::to_string),
            name: virtual_path.to_string(),
        };

        let items = self.items_mut(scope).ok_or_else(not_found)?;
        let index = items.iter().position(|i| i.virtual_path == virtual_path).ok_or_else(not_found)?;
        let final_name = with_original_extension(new_name, items[index].extension());

        if final_name == items[index].virtual_path {
            return Ok(final_name);
        }
        let taken = items
            .iter()
            .enumerate()
            .any(|(i, other)| i != index && other.virtual_path.eq_ignore_ascii_case(&final_name));
        if taken {
            return Err(PackError::Collision { scope: scope.map(str::to_string), name: final_name });
        }

        let item = &mut items[index];
        item.name = final_name.clone();
        item.virtual_path = final_name.clone();
        Ok(final_name)
    }

    /// Replaces the last segment of a folder path. Returns the new path.
    ///
    /// Only this exact key moves; folders whose path merely starts with `old_path` keep
    /// their old keys.
    pub fn rename_folder(&mut self, old_path: &str, new_name: &str) -> Result<String, PackError> {
        let new_name = new_name.trim();
        validate_segment(new_name)?;
        let index = self
            .folders
            .iter()
            .position(|f| f.path == old_path)
            .ok_or_else(|| PackError::FolderNotFound(old_path.to_string()))?;

        let new_path = match old_path.rsplit_once('/') {
            Some((prefix, _)) => format!("{prefix}/{new_name}"),
            None => new_name.to_string(),
        };
        if new_path == old_path {
            return Ok(new_path);
        }
        if self.has_folder(&new_path) {
            return Err(PackError::Collision { scope: None, name: new_path });
        }

        self.folders[index].path = new_path.clone();
        Ok(new_path)
    }

    /// Drops a folder and its items. Folders nested under it by name are kept.
    pub fn delete_folder(&mut self, folder_path: &str) -> bool {
        let before = self.folders.len();
        self.folders.retain(|f| f.path != folder_path);
        self.folders.len() != before
    }

    /// Moves an item to another scope, appending it there. The target folder must exist.
    pub fn move_item(&mut self, from: Option<&str>, virtual_path: &str, to: Option<&str>) -> Result<(), PackError> {
        if self.find_item(from, virtual_path).is_none() {
            return Err(PackError::ItemNotFound {
                scope: from.map(str::to_string),
                name: virtual_path.to_string(),
            });
        }
        if from == to {
            return Ok(());
        }
        if let Some(path) = to {
            if !self.has_folder(path) {
                return Err(PackError::FolderNotFound(path.to_string()));
            }
        }
        if self.name_taken(to, virtual_path) {
            return Err(PackError::Collision { scope: to.map(str::to_string), name: virtual_path.to_string() });
        }

        let source_items = self.items_mut(from).ok_or_else(|| PackError::FolderNotFound(from.unwrap_or_default().to_string()))?;
        let index = source_items
            .iter()
            .position(|i| i.virtual_path == virtual_path)
            .ok_or_else(|| PackError::ItemNotFound { scope: from.map(str::to_string), name: virtual_path.to_string() })?;
        let item = source_items.remove(index);
        match self.items_mut(to) {
            Some(items) => {
                items.push(item);
                Ok(())
            }
            None => Err(PackError::FolderNotFound(to.unwrap_or_default().to_string())),
        }
    }

    /// Empties the pack, keeping its name.
    pub fn clear(&mut self) {
        self.root_items.clear();
        self.folders.clear();
    }

    /// Path of an item's file relative to the export root.
    pub fn relative_item_path(scope: Option<&str>, item: &PackItem) -> PathBuf {
        match scope {
            Some(folder) => Path::new(folder).join(&item.name),
            None => PathBuf::from(&item.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(name: &str) -> PackItem {
        PackItem::new(name, ItemSource::Disk { path: PathBuf::from(format!("/samples/{name}")) }, 10)
    }

    #[test]
    fn extension_rule_keeps_original_extension() {
        assert_eq!(with_original_extension("snare", Some("wav")), "snare.wav");
        assert_eq!(with_original_extension("snare.WAV", Some("wav")), "snare.WAV");
        assert_eq!(with_original_extension("snare.mp3", Some("wav")), "snare.mp3.wav");
        assert_eq!(with_original_extension("snare", None), "snare");
    }

    #[test]
    fn split_extension_ignores_dot_files() {
        assert_eq!(split_extension("kick.wav"), ("kick", Some("wav")));
        assert_eq!(split_extension("kick"), ("kick", None));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
        assert_eq!(split_extension("trailing."), ("trailing.", None));
    }

    #[test]
    fn source_file_name_uses_last_segment() {
        let src = ItemSource::Archive { archive: "/x/a.zip".into(), entry: "kicks/sub/k.wav".into() };
        assert_eq!(src.file_name().as_deref(), Some("k.wav"));
        let src = ItemSource::Disk { path: "/x/y/hat.aif".into() };
        assert_eq!(src.file_name().as_deref(), Some("hat.aif"));
    }

    #[test]
    fn create_folder_joins_parent_and_rejects_duplicates() {
        let mut pack = Pack::default();
        assert_eq!(pack.create_folder(None, "drums"), Ok("drums".to_string()));
        assert_eq!(pack.create_folder(Some("drums"), "kicks"), Ok("drums/kicks".to_string()));
        assert_eq!(pack.create_folder(None, "drums"), Err(PackError::DuplicateFolder("drums".into())));
        assert_eq!(pack.create_folder(None, "a/b"), Err(PackError::InvalidName("a/b".into())));
        assert_eq!(pack.create_folder(None, ""), Err(PackError::InvalidName("".into())));
        let paths: Vec<_> = pack.folders().iter().map(PackFolder::path).collect();
        assert_eq!(paths, ["drums", "drums/kicks"]);
        assert_eq!(pack.folders()[1].name(), "kicks");
    }

    #[test]
    fn add_item_creates_missing_folder() {
        let mut pack = Pack::default();
        pack.add_item(Some("fx"), disk("boom.wav")).unwrap();
        assert_eq!(pack.folder("fx").map(|f| f.items().len()), Some(1));
        assert_eq!(pack.item_count(), 1);
    }

    #[test]
    fn remove_item_reports_whether_anything_changed() {
        let mut pack = Pack::default();
        pack.add_item(None, disk("a.wav")).unwrap();
        assert!(!pack.remove_item(None, "b.wav"));
        assert!(!pack.remove_item(Some("nope"), "a.wav"));
        assert!(pack.remove_item(None, "a.wav"));
        assert!(pack.is_empty());
    }

    #[test]
    fn emptied_folder_survives() {
        let mut pack = Pack::default();
        pack.add_item(Some("loops"), disk("l.wav")).unwrap();
        assert!(pack.remove_item(Some("loops"), "l.wav"));
        assert!(pack.has_folder("loops"));
        assert!(pack.is_empty());
    }

    #[test]
    fn rename_to_same_name_is_a_noop() {
        let mut pack = Pack::default();
        pack.add_item(None, disk("kick.wav")).unwrap();
        let before = pack.clone();
        assert_eq!(pack.rename_item(None, "kick.wav", "kick"), Ok("kick.wav".to_string()));
        assert_eq!(pack, before);
    }

    #[test]
    fn rename_keeps_source() {
        let mut pack = Pack::default();
        pack.add_item(None, disk("kick.wav")).unwrap();
        pack.rename_item(None, "kick.wav", "boom").unwrap();
        let item = pack.find_item(None, "boom.wav").unwrap();
        assert_eq!(item.name(), "boom.wav");
        assert_eq!(item.source(), &ItemSource::Disk { path: "/samples/kick.wav".into() });
    }

    #[test]
    fn relative_item_path_nests_under_folder() {
        let item = disk("k.wav");
        assert_eq!(Pack::relative_item_path(Some("drums/kicks"), &item), PathBuf::from("drums/kicks/k.wav"));
        assert_eq!(Pack::relative_item_path(None, &item), PathBuf::from("k.wav"));
    }

    #[test]
    fn collisions_ignore_ascii_case() {
        let mut pack = Pack::default();
        pack.add_item(None, disk("kick.wav")).unwrap();
        pack.add_item(None, disk("snare.wav")).unwrap();
        assert!(matches!(pack.add_item(None, disk("Kick.WAV")), Err(PackError::Collision { .. })));

        let before = pack.clone();
        assert!(matches!(pack.rename_item(None, "snare.wav", "KICK"), Err(PackError::Collision { .. })));
        assert_eq!(pack, before);

        // Changing only the case of an item's own name is allowed.
        assert_eq!(pack.rename_item(None, "kick.wav", "Kick").unwrap(), "Kick.wav");
    }
}
