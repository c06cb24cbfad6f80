//! JSON description of a pack, used by the command-line driver.
//!
//! A manifest is only an input format: loading one replays it through the regular
//! pack operations, so the same uniqueness and naming rules apply.

use super::{ItemSource, Pack, PackItem, DEFAULT_PACK_NAME};
use crate::error::PackError;

use serde::{Deserialize, Serialize};

fn default_name() -> String {
    DEFAULT_PACK_NAME.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// Name inside the pack. Defaults to the source's file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: ItemSource,
    #[serde(default)]
    pub size: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManifestFolder {
    pub path: String,
    #[serde(default)]
    pub items: Vec<ManifestItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PackManifest {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub items: Vec<ManifestItem>,
    #[serde(default)]
    pub folders: Vec<ManifestFolder>,
}

impl ManifestItem {
    fn into_item(self) -> Result<PackItem, PackError> {
        let name = match self.name {
            Some(name) => name,
            None => self
                .source
                .file_name()
                .ok_or_else(|| PackError::InvalidName(self.source.describe()))?,
        };
        Ok(PackItem::new(name, self.source, self.size))
    }

    fn from_item(item: &PackItem) -> Self {
        Self { name: Some(item.name().to_string()), source: item.source().clone(), size: item.size() }
    }
}

impl PackManifest {
    /// Builds a pack from the manifest, failing on the first rule violation.
    pub fn into_pack(self) -> Result<Pack, PackError> {
        let mut pack = Pack::new(self.name);
        for item in self.items {
            pack.add_item(None, item.into_item()?)?;
        }
        for folder in self.folders {
            pack.create_folder_path(&folder.path)?;
            for item in folder.items {
                pack.add_item(Some(&folder.path), item.into_item()?)?;
            }
        }
        Ok(pack)
    }

    pub fn from_pack(pack: &Pack) -> Self {
        Self {
            name: pack.name().to_string(),
            items: pack.root_items().iter().map(ManifestItem::from_item).collect(),
            folders: pack
                .folders()
                .iter()
                .map(|f| ManifestFolder {
                    path: f.path().to_string(),
                    items: f.items().iter().map(ManifestItem::from_item).collect(),
                })
                .collect(),
        }
    }
}
