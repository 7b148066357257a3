//! Reference collection.
//!
//! Asks every mod for the files it contributes. Mods targeting manifest
//! version 8.0 or later merge their `GAME1_EMBEDDED_TLK` folder into a single
//! synthesized file at write time, so the loose files are dropped here.

use crate::set::DeploymentSet;
use m3_mod_core::paths::{first_segment, normalize_separators, path_key};
use m3_mod_core::{EMBEDDED_TLK_MERGE_MIN_VERSION, GAME1_EMBEDDED_TLK_FOLDER};
use std::collections::HashSet;

/// Files contributed by one mod.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModReferences {
    /// Mod-relative paths with `\` separators, in descriptor order.
    pub paths: Vec<String>,
    /// At least one embedded TLK path was dropped by version gating.
    pub dropped_embedded_tlk: bool,
}

/// References of every mod in a [`DeploymentSet`], index-aligned with its mods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedReferences {
    pub per_mod: Vec<ModReferences>,
}

impl CollectedReferences {
    pub fn total_files(&self) -> usize {
        self.per_mod.iter().map(|m| m.paths.len()).sum()
    }
}

/// Collect the relative references of every mod in `set`.
pub fn collect(set: &DeploymentSet) -> CollectedReferences {
    let per_mod = set
        .mods()
        .iter()
        .map(|m| {
            let gate_embedded_tlk = m.moddesc_target_version() >= EMBEDDED_TLK_MERGE_MIN_VERSION;
            let mut seen = HashSet::new();
            let mut references = ModReferences::default();

            for path in m.relative_references(true) {
                let path = normalize_separators(&path);
                if path.is_empty() || !seen.insert(path_key(&path)) {
                    continue;
                }
                if gate_embedded_tlk
                    && first_segment(&path).eq_ignore_ascii_case(GAME1_EMBEDDED_TLK_FOLDER)
                {
                    references.dropped_embedded_tlk = true;
                    continue;
                }
                references.paths.push(path);
            }

            tracing::info!(
                "Collected references mod='{}' files={} embedded_tlk_dropped={}",
                m.name(),
                references.paths.len(),
                references.dropped_embedded_tlk
            );
            references
        })
        .collect();

    let references = CollectedReferences { per_mod };
    tracing::info!(
        "Collected {} files from {} mods",
        references.total_files(),
        set.len()
    );
    references
}
