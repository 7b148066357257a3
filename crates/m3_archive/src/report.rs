//! Third-party identification report.
//!
//! After a successful deployment every custom DLC folder of every mod is
//! looked up in the third-party catalog. Mods with folders the catalog does not
//! know are listed so the author can submit them.

use crate::error::{Error, Result};
use crate::set::DeploymentSet;
use camino::Utf8Path;
use m3_mod_core::{Game, JsonThirdPartyCatalog, ThirdPartyModLookup};
use rayon::prelude::*;
use serde::Serialize;

/// A mod with custom DLC folders unknown to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionCandidate {
    pub mod_name: String,
    pub game: Game,
    pub unknown_dlc_folders: Vec<String>,
}

/// Query the catalog for every mod in `set`. Order follows the set.
pub fn submission_candidates(
    set: &DeploymentSet,
    catalog: &dyn ThirdPartyModLookup,
) -> Vec<SubmissionCandidate> {
    set.mods()
        .par_iter()
        .filter_map(|m| {
            let unknown_dlc_folders: Vec<String> = m
                .custom_dlc_folders()
                .into_iter()
                .filter(|folder| catalog.third_party_mod_info(folder, m.game()).is_none())
                .collect();
            if unknown_dlc_folders.is_empty() {
                return None;
            }
            tracing::info!(
                "Mod '{}' has DLC folders unknown to the catalog: {}",
                m.name(),
                unknown_dlc_folders.join(", ")
            );
            Some(SubmissionCandidate {
                mod_name: m.name().to_string(),
                game: m.game(),
                unknown_dlc_folders,
            })
        })
        .collect()
}

/// Load a JSON catalog from disk.
pub fn load_catalog(path: &Utf8Path) -> Result<JsonThirdPartyCatalog> {
    JsonThirdPartyCatalog::load(path).map_err(|e| Error::Catalog(e.to_string()))
}
