//! Third-party mod identification.
//!
//! After a deployment finishes, every custom DLC folder of every deployed mod is
//! looked up in the third-party mod catalog. Folders the catalog does not know
//! about are reported so the author can submit them.
//!
//! The lookup is a read-only query behind [`ThirdPartyModLookup`]. The crate
//! ships [`JsonThirdPartyCatalog`], which reads a locally cached catalog:
//!
//! ```json
//! {
//!   "LE1": {
//!     "DLC_MOD_Example": { "modname": "Example", "modauthor": "Someone" }
//!   }
//! }
//! ```

use crate::error::{Error, Result};
use crate::game::Game;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Catalog entry describing a known custom DLC folder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ThirdPartyModInfo {
    #[serde(default)]
    pub modname: String,
    #[serde(default)]
    pub modauthor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modsite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moddescription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mountpriority: Option<i32>,
}

/// Read-only lookup of custom DLC folders in the third-party catalog.
pub trait ThirdPartyModLookup: Send + Sync {
    /// Return the catalog entry for `dlc_folder` in `game`, if there is one.
    fn third_party_mod_info(&self, dlc_folder: &str, game: Game) -> Option<ThirdPartyModInfo>;
}

/// Catalog loaded from a JSON file, keyed by game then DLC folder name.
///
/// Folder names are matched ASCII case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct JsonThirdPartyCatalog {
    entries: HashMap<Game, HashMap<String, ThirdPartyModInfo>>,
}

impl JsonThirdPartyCatalog {
    /// Parse a catalog from its JSON text.
    pub fn from_json(contents: &str) -> Result<Self> {
        let raw: HashMap<Game, HashMap<String, ThirdPartyModInfo>> =
            serde_json::from_str(contents)?;

        let entries = raw
            .into_iter()
            .map(|(game, folders)| {
                let folders = folders
                    .into_iter()
                    .map(|(folder, info)| (folder.to_ascii_lowercase(), info))
                    .collect();
                (game, folders)
            })
            .collect();

        Ok(Self { entries })
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.as_std_path().exists() {
            return Err(Error::CatalogNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path.as_std_path())?;
        let catalog = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded third-party catalog path={} entries={}",
            path,
            catalog.len()
        );
        Ok(catalog)
    }

    /// Number of folders across all games.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ThirdPartyModLookup for JsonThirdPartyCatalog {
    fn third_party_mod_info(&self, dlc_folder: &str, game: Game) -> Option<ThirdPartyModInfo> {
        self.entries
            .get(&game)
            .and_then(|folders| folders.get(&dlc_folder.to_ascii_lowercase()))
            .cloned()
    }
}
