//! The interactive pack-building session.
//!
//! A [`PackSession`] owns the pack being assembled together with the navigation
//! cursor (the folder that dropped samples land in) and the current selection.
//! The application controller creates one session and hands it to whoever needs
//! it; there is no process-wide pack.

use super::{Pack, PackItem, DEFAULT_PACK_NAME};
use crate::catalog::CatalogEntry;
use crate::error::PackError;

use tracing::debug;

/// The answer to an interactive prompt. Cancelling is never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt<T> {
    Provided(T),
    Cancelled,
}

impl<T> From<Option<T>> for Prompt<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Prompt::Provided(v),
            None => Prompt::Cancelled,
        }
    }
}

/// The item currently selected in the pack tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub scope: Option<String>,
    pub virtual_path: String,
}

#[derive(Debug, Default)]
pub struct PackSession {
    pack: Pack,
    current_folder: Option<String>,
    selected: Option<Selection>,
}

impl PackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pack(pack: Pack) -> Self {
        Self { pack, current_folder: None, selected: None }
    }

    pub fn pack(&self) -> &Pack {
        &self.pack
    }

    /// Direct access to the pack. Callers are responsible for keeping the cursor valid.
    pub fn pack_mut(&mut self) -> &mut Pack {
        &mut self.pack
    }

    /// Folder that dropped items go to; `None` is the pack root.
    pub fn current_folder(&self) -> Option<&str> {
        self.current_folder.as_deref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    /// Replaces the pack with a fresh one. A blank name falls back to the default.
    pub fn new_pack(&mut self, name: Prompt<String>) -> bool {
        let Prompt::Provided(name) = name else {
            return false;
        };
        let name = name.trim();
        let name = if name.is_empty() { DEFAULT_PACK_NAME } else { name };
        debug!(name, "new pack");
        self.pack = Pack::new(name);
        self.current_folder = None;
        self.selected = None;
        true
    }

    /// Creates a folder under the cursor and moves the cursor into it.
    pub fn create_folder(&mut self, name: Prompt<String>) -> Result<Option<String>, PackError> {
        let Prompt::Provided(name) = name else {
            return Ok(None);
        };
        let path = self.pack.create_folder(self.current_folder.as_deref(), name.trim())?;
        self.current_folder = Some(path.clone());
        Ok(Some(path))
    }

    pub fn navigate(&mut self, folder: Option<&str>) -> Result<(), PackError> {
        if let Some(path) = folder {
            if !self.pack.has_folder(path) {
                return Err(PackError::FolderNotFound(path.to_string()));
            }
        }
        self.current_folder = folder.map(str::to_string);
        Ok(())
    }

    /// Adds a dropped catalog entry to the folder under the cursor.
    ///
    /// Only audio files are accepted; anything else is ignored and yields `Ok(None)`.
    /// Returns the virtual path of the new item.
    pub fn drop_entry(&mut self, entry: &CatalogEntry) -> Result<Option<String>, PackError> {
        if !entry.is_audio || entry.is_directory {
            return Ok(None);
        }
        let Some(source) = entry.to_source() else {
            return Ok(None);
        };
        let item = PackItem::new(entry.name.clone(), source, entry.size.unwrap_or(0));
        let virtual_path = item.virtual_path().to_string();
        self.pack.add_item(self.current_folder.as_deref(), item)?;
        debug!(item = %virtual_path, folder = ?self.current_folder, "item dropped into pack");
        Ok(Some(virtual_path))
    }

    pub fn select(&mut self, scope: Option<&str>, virtual_path: &str) -> bool {
        if self.pack.find_item(scope, virtual_path).is_none() {
            return false;
        }
        self.selected = Some(Selection {
            scope: scope.map(str::to_string),
            virtual_path: virtual_path.to_string(),
        });
        true
    }

    pub fn selected_item(&self) -> Option<&PackItem> {
        let sel = self.selected.as_ref()?;
        self.pack.find_item(sel.scope.as_deref(), &sel.virtual_path)
    }

    /// Renames the selected item. Returns the final name, or `None` if cancelled or nothing is selected.
    pub fn rename_selected(&mut self, new_name: Prompt<String>) -> Result<Option<String>, PackError> {
        let (Prompt::Provided(new_name), Some(sel)) = (new_name, self.selected.as_mut()) else {
            return Ok(None);
        };
        let final_name = self.pack.rename_item(sel.scope.as_deref(), &sel.virtual_path, &new_name)?;
        sel.virtual_path = final_name.clone();
        Ok(Some(final_name))
    }

    pub fn remove_selected(&mut self) -> bool {
        match self.selected.take() {
            Some(sel) => self.pack.remove_item(sel.scope.as_deref(), &sel.virtual_path),
            None => false,
        }
    }

    /// Renames a folder, keeping the cursor and selection on it when they pointed there.
    pub fn rename_folder(&mut self, path: &str, new_name: Prompt<String>) -> Result<Option<String>, PackError> {
        let Prompt::Provided(new_name) = new_name else {
            return Ok(None);
        };
        let new_path = self.pack.rename_folder(path, &new_name)?;
        if self.current_folder.as_deref() == Some(path) {
            self.current_folder = Some(new_path.clone());
        }
        if let Some(sel) = self.selected.as_mut().filter(|s| s.scope.as_deref() == Some(path)) {
            sel.scope = Some(new_path.clone());
        }
        Ok(Some(new_path))
    }

    /// Deletes a folder; a cursor or selection inside it falls back to the root.
    pub fn delete_folder(&mut self, path: &str) -> bool {
        if !self.pack.delete_folder(path) {
            return false;
        }
        if self.current_folder.as_deref() == Some(path) {
            self.current_folder = None;
        }
        if self.selected.as_ref().is_some_and(|s| s.scope.as_deref() == Some(path)) {
            self.selected = None;
        }
        true
    }

    /// Clears the pack after confirmation. Only an explicit `true` clears.
    pub fn clear(&mut self, confirmed: Prompt<bool>) -> bool {
        if confirmed != Prompt::Provided(true) {
            return false;
        }
        self.pack.clear();
        self.current_folder = None;
        self.selected = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntryOrigin;
    use std::path::PathBuf;

    fn audio_entry(name: &str) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            path: format!("kits/{name}"),
            is_directory: false,
            is_audio: true,
            size: Some(3),
            origin: EntryOrigin::Archive { archive_path: PathBuf::from("/s/kit.zip") },
        }
    }

    #[test]
    fn cancelled_prompts_change_nothing() {
        let mut session = PackSession::new();
        session.drop_entry(&audio_entry("a.wav")).unwrap();
        let before = session.pack().clone();

        assert!(!session.new_pack(Prompt::Cancelled));
        assert_eq!(session.create_folder(Prompt::Cancelled), Ok(None));
        assert!(!session.clear(Prompt::Cancelled));
        assert!(!session.clear(Prompt::Provided(false)));
        assert_eq!(session.pack(), &before);
    }

    #[test]
    fn drops_follow_the_cursor() {
        let mut session = PackSession::new();
        session.drop_entry(&audio_entry("a.wav")).unwrap();
        session.create_folder(Prompt::Provided("drums".into())).unwrap();
        assert_eq!(session.current_folder(), Some("drums"));
        session.drop_entry(&audio_entry("b.wav")).unwrap();

        assert_eq!(session.pack().root_items().len(), 1);
        assert_eq!(session.pack().folder("drums").map(|f| f.items().len()), Some(1));
    }

    #[test]
    fn non_audio_entries_are_ignored() {
        let mut session = PackSession::new();
        let mut entry = audio_entry("notes.txt");
        entry.is_audio = false;
        assert_eq!(session.drop_entry(&entry), Ok(None));
        assert!(session.pack().is_empty());
    }

    #[test]
    fn rename_selected_tracks_new_name() {
        let mut session = PackSession::new();
        session.drop_entry(&audio_entry("kick.wav")).unwrap();
        assert!(session.select(None, "kick.wav"));
        assert_eq!(session.rename_selected(Prompt::Provided("boom".into())), Ok(Some("boom.wav".into())));
        assert_eq!(session.selected_item().map(PackItem::name), Some("boom.wav"));
        assert!(session.remove_selected());
        assert!(session.pack().is_empty());
    }

    #[test]
    fn folder_rename_and_delete_fix_up_cursor() {
        let mut session = PackSession::new();
        session.create_folder(Prompt::Provided("drums".into())).unwrap();
        session.drop_entry(&audio_entry("k.wav")).unwrap();
        session.select(Some("drums"), "k.wav");

        session.rename_folder("drums", Prompt::Provided("perc".into())).unwrap();
        assert_eq!(session.current_folder(), Some("perc"));
        assert_eq!(session.selection().and_then(|s| s.scope.as_deref()), Some("perc"));

        assert!(session.delete_folder("perc"));
        assert_eq!(session.current_folder(), None);
        assert!(session.selection().is_none());
    }

    #[test]
    fn new_pack_resets_everything() {
        let mut session = PackSession::new();
        session.create_folder(Prompt::Provided("x".into())).unwrap();
        assert!(session.new_pack(Prompt::Provided("  ".into())));
        assert_eq!(session.pack().name(), DEFAULT_PACK_NAME);
        assert!(session.pack().folders().is_empty());
        assert_eq!(session.current_folder(), None);
    }
}
