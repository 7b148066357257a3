//! Archive layout planning.
//!
//! Turns the collected references into the exact list of archive entries:
//!
//! - In a multipack every mod goes below a folder named after the sanitized
//!   mod name (`Mod Name\DLC_MOD_X\...`).
//! - When the set spans several games every path is additionally prefixed
//!   with the game (`LE1\Mod Name\...`).
//! - Every ancestor folder of every file becomes a directory entry, once,
//!   in the order it is first seen.
//! - Every file gets a [`CompressionClass`].
//!
//! Planning is a pure function of its inputs apart from reading file sizes.

use crate::classify::{ClassificationRules, CompressionClass};
use crate::collector::CollectedReferences;
use crate::error::{Error, Result};
use crate::set::DeploymentSet;
use camino::Utf8PathBuf;
use m3_mod_core::paths::{ancestor_dirs, join, path_key, sanitize_name, SEPARATOR};
use m3_mod_core::GAME1_EMBEDDED_TLK_FOLDER;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMapping {
    /// Path inside the archive, `\` separated.
    pub in_archive_path: String,
    /// File on disk, or `None` for a directory entry.
    pub source: Option<Utf8PathBuf>,
}

impl FileMapping {
    pub fn directory(in_archive_path: impl Into<String>) -> Self {
        Self {
            in_archive_path: in_archive_path.into(),
            source: None,
        }
    }

    pub fn file(in_archive_path: impl Into<String>, source: Utf8PathBuf) -> Self {
        Self {
            in_archive_path: in_archive_path.into(),
            source: Some(source),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.source.is_none()
    }
}

/// A mod whose embedded TLK folder is merged into one synthesized file at write time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedTlkMerge {
    pub mod_index: usize,
    pub mod_name: String,
    /// Game prefix and multipack folder of the mod, possibly empty.
    pub archive_prefix: String,
    /// The mod's `GAME1_EMBEDDED_TLK` folder on disk.
    pub source_folder: Utf8PathBuf,
}

impl EmbeddedTlkMerge {
    /// In-archive folder the merged file is written to.
    pub fn archive_folder(&self) -> String {
        join(&self.archive_prefix, GAME1_EMBEDDED_TLK_FOLDER)
    }
}

/// Result of planning a deployment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeploymentPlan {
    /// Directory entries in first-seen order, followed by files in planning order.
    pub mappings: Vec<FileMapping>,
    /// In-archive path to the index of the mod that contributed it.
    pub mod_of_entry: BTreeMap<String, usize>,
    /// In-archive path to compression class, for files only.
    pub classes: BTreeMap<String, CompressionClass>,
    /// Sum of the sizes of all mapped files.
    pub total_size: u64,
    pub embedded_tlk: Vec<EmbeddedTlkMerge>,
}

impl DeploymentPlan {
    pub fn directories(&self) -> impl Iterator<Item = &FileMapping> {
        self.mappings.iter().filter(|m| m.is_directory())
    }

    pub fn files(&self) -> impl Iterator<Item = &FileMapping> {
        self.mappings.iter().filter(|m| !m.is_directory())
    }

    /// Files of one class, in planning order.
    pub fn files_of_class(&self, class: CompressionClass) -> Vec<&FileMapping> {
        self.files()
            .filter(|m| self.classes.get(&m.in_archive_path) == Some(&class))
            .collect()
    }

    pub fn class_of(&self, in_archive_path: &str) -> Option<CompressionClass> {
        self.classes.get(in_archive_path).copied()
    }
}

/// Plan the archive layout for `set`.
pub fn plan(
    set: &DeploymentSet,
    references: &CollectedReferences,
    rules: &ClassificationRules,
) -> Result<DeploymentPlan> {
    let tokens = multipack_tokens(set)?;

    let mut directories = Vec::new();
    let mut seen_directories = BTreeSet::new();
    let mut files = Vec::new();
    let mut seen_files = BTreeSet::new();
    let mut plan = DeploymentPlan::default();

    for (index, (descriptor, mod_refs)) in set.mods().iter().zip(&references.per_mod).enumerate() {
        let prefix = mod_prefix(set, index, &tokens);
        let version = descriptor.moddesc_target_version();
        let root = descriptor.root_path();

        for relative in &mod_refs.paths {
            let in_archive_path = join(&prefix, relative);
            if !seen_files.insert(path_key(&in_archive_path)) {
                tracing::warn!(
                    "Duplicate archive path, keeping first: {} (mod '{}')",
                    in_archive_path,
                    descriptor.name()
                );
                continue;
            }

            for directory in ancestor_dirs(&in_archive_path) {
                if seen_directories.insert(path_key(&directory)) {
                    plan.mod_of_entry.insert(directory.clone(), index);
                    directories.push(FileMapping::directory(directory));
                }
            }

            let source = relative
                .split(SEPARATOR)
                .filter(|s| !s.is_empty())
                .fold(root.to_path_buf(), |path, segment| path.join(segment));

            // Missing files count as empty here and fail when their pass runs.
            plan.total_size += std::fs::metadata(source.as_std_path())
                .map(|m| m.len())
                .unwrap_or(0);

            let class = rules.classify(relative, version);
            tracing::debug!("Mapped {} -> {} ({})", source, in_archive_path, class);

            plan.classes.insert(in_archive_path.clone(), class);
            plan.mod_of_entry.insert(in_archive_path.clone(), index);
            files.push(FileMapping::file(in_archive_path, source));
        }

        if mod_refs.dropped_embedded_tlk && descriptor.game().is_game1_family() {
            plan.embedded_tlk.push(EmbeddedTlkMerge {
                mod_index: index,
                mod_name: descriptor.name().to_string(),
                archive_prefix: prefix,
                source_folder: root.join(GAME1_EMBEDDED_TLK_FOLDER),
            });
        }
    }

    plan.mappings = directories;
    plan.mappings.extend(files);

    tracing::info!(
        "Planned archive entries={} directories={} total_size={} embedded_tlk_merges={}",
        plan.mappings.len(),
        plan.directories().count(),
        plan.total_size,
        plan.embedded_tlk.len()
    );

    Ok(plan)
}

/// Sanitized folder name per mod, checked for collisions. Empty when not a multipack.
fn multipack_tokens(set: &DeploymentSet) -> Result<Vec<String>> {
    if !set.is_multi_pack() {
        return Ok(vec![String::new(); set.len()]);
    }

    let mut claimed: HashMap<String, &str> = HashMap::new();
    let mut tokens = Vec::with_capacity(set.len());
    for descriptor in set.mods() {
        let token = sanitize_name(descriptor.name());
        if token.trim().is_empty() {
            return Err(Error::InvalidModName(descriptor.name().to_string()));
        }
        if let Some(first) = claimed.insert(path_key(&token), descriptor.name()) {
            return Err(Error::ModNameCollision {
                first: first.to_string(),
                second: descriptor.name().to_string(),
                token,
            });
        }
        tokens.push(token);
    }
    Ok(tokens)
}

fn mod_prefix(set: &DeploymentSet, index: usize, tokens: &[String]) -> String {
    let token = tokens.get(index).map(String::as_str).unwrap_or_default();
    if set.needs_game_prefix() {
        join(set.mods()[index].game().as_str(), token)
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::collect;
    use crate::test_support::TestMod;
    use camino::Utf8Path;
    use m3_mod_core::Game;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn plan_set(set: &DeploymentSet) -> Result<DeploymentPlan> {
        plan(set, &collect(set), &ClassificationRules::default())
    }

    fn paths(plan: &DeploymentPlan) -> Vec<&str> {
        plan.mappings
            .iter()
            .map(|m| m.in_archive_path.as_str())
            .collect()
    }

    #[test]
    fn test_single_mod_layout() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![TestMod::new("Solo", Game::ME3, root)
            .file("DLC_MOD_Solo\\CookedPCConsole\\a.pcc", b"aaaa")
            .file("DLC_MOD_Solo\\CookedPCConsole\\b.tfc", b"bb")
            .build()]);

        let plan = plan_set(&set).unwrap();
        assert_eq!(
            paths(&plan),
            vec![
                "DLC_MOD_Solo",
                "DLC_MOD_Solo\\CookedPCConsole",
                "DLC_MOD_Solo\\CookedPCConsole\\a.pcc",
                "DLC_MOD_Solo\\CookedPCConsole\\b.tfc",
                "moddesc.ini",
            ]
        );
        assert_eq!(plan.total_size, 4 + 2 + "[ModInfo]\n".len() as u64);
        assert_eq!(
            plan.class_of("DLC_MOD_Solo\\CookedPCConsole\\a.pcc"),
            Some(CompressionClass::SolidCompress)
        );
        assert_eq!(
            plan.class_of("DLC_MOD_Solo\\CookedPCConsole\\b.tfc"),
            Some(CompressionClass::NoCompress)
        );
        assert_eq!(plan.class_of("moddesc.ini"), Some(CompressionClass::NoCompress));
        assert_eq!(plan.class_of("DLC_MOD_Solo"), None);
    }

    // Two mods, same game: multipack folders, no game prefix.
    #[test]
    fn test_multipack_same_game() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![
            TestMod::new("Alpha Mod", Game::LE2, &root.join("a"))
                .file("DLC_MOD_Alpha\\a.pcc", b"a")
                .build(),
            TestMod::new("Beta: Mod!", Game::LE2, &root.join("b"))
                .file("DLC_MOD_Beta\\b.pcc", b"b")
                .build(),
        ]);

        let plan = plan_set(&set).unwrap();
        assert_eq!(
            paths(&plan),
            vec![
                "Alpha Mod",
                "Alpha Mod\\DLC_MOD_Alpha",
                "Beta Mod",
                "Beta Mod\\DLC_MOD_Beta",
                "Alpha Mod\\DLC_MOD_Alpha\\a.pcc",
                "Alpha Mod\\moddesc.ini",
                "Beta Mod\\DLC_MOD_Beta\\b.pcc",
                "Beta Mod\\moddesc.ini",
            ]
        );
        assert_eq!(plan.mod_of_entry["Beta Mod\\DLC_MOD_Beta\\b.pcc"], 1);
        assert_eq!(plan.mod_of_entry["Alpha Mod"], 0);
    }

    // Two mods, different games: every path below its game folder.
    #[test]
    fn test_multipack_game_prefix() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![
            TestMod::new("Foo", Game::ME2, &root.join("foo"))
                .file("DLC_MOD_Foo\\Movies\\intro.bik", b"bik")
                .build(),
            TestMod::new("Bar", Game::ME3, &root.join("bar"))
                .file("DLC_MOD_Bar\\x.pcc", b"x")
                .build(),
        ]);

        let plan = plan_set(&set).unwrap();
        let dirs: Vec<&str> = plan
            .directories()
            .map(|m| m.in_archive_path.as_str())
            .collect();
        assert_eq!(
            dirs,
            vec![
                "ME2",
                "ME2\\Foo",
                "ME2\\Foo\\DLC_MOD_Foo",
                "ME2\\Foo\\DLC_MOD_Foo\\Movies",
                "ME3",
                "ME3\\Bar",
                "ME3\\Bar\\DLC_MOD_Bar",
            ]
        );
        assert_eq!(
            plan.class_of("ME2\\Foo\\DLC_MOD_Foo\\Movies\\intro.bik"),
            Some(CompressionClass::NoCompress)
        );
        assert_eq!(
            plan.class_of("ME3\\Bar\\moddesc.ini"),
            Some(CompressionClass::NoCompress)
        );
    }

    #[test]
    fn test_embedded_tlk_merge_planned_for_game1_only() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![TestMod::new("Tlk", Game::LE1, root)
            .cmmver(8.0)
            .file("GAME1_EMBEDDED_TLK\\en.tlk", b"tlk")
            .build()]);

        let plan = plan_set(&set).unwrap();
        assert_eq!(paths(&plan), vec!["moddesc.ini"]);
        assert_eq!(plan.embedded_tlk.len(), 1);
        assert_eq!(plan.embedded_tlk[0].archive_folder(), "GAME1_EMBEDDED_TLK");
        assert_eq!(
            plan.embedded_tlk[0].source_folder,
            root.join("GAME1_EMBEDDED_TLK")
        );

        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![TestMod::new("Tlk", Game::LE3, root)
            .cmmver(8.0)
            .file("GAME1_EMBEDDED_TLK\\en.tlk", b"tlk")
            .build()]);
        assert!(plan_set(&set).unwrap().embedded_tlk.is_empty());
    }

    // Same mod below version 8: the TLK files are ordinary solid files.
    #[test]
    fn test_embedded_tlk_below_version_8_is_solid() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![TestMod::new("Tlk", Game::LE1, root)
            .cmmver(7.9)
            .file("GAME1_EMBEDDED_TLK\\en.tlk", b"tlk")
            .build()]);

        let plan = plan_set(&set).unwrap();
        assert!(plan.embedded_tlk.is_empty());
        assert_eq!(
            plan.class_of("GAME1_EMBEDDED_TLK\\en.tlk"),
            Some(CompressionClass::SolidCompress)
        );
    }

    #[test]
    fn test_name_collision_fails() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![
            TestMod::new("My Mod?", Game::ME3, &root.join("a")).build(),
            TestMod::new("my mod", Game::ME3, &root.join("b")).build(),
        ]);

        match plan_set(&set) {
            Err(Error::ModNameCollision { first, second, token }) => {
                assert_eq!(first, "My Mod?");
                assert_eq!(second, "my mod");
                assert_eq!(token, "my mod");
            }
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_token_fails() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![
            TestMod::new("???", Game::ME3, &root.join("a")).build(),
            TestMod::new("Fine", Game::ME3, &root.join("b")).build(),
        ]);
        assert!(matches!(plan_set(&set), Err(Error::InvalidModName(_))));
    }

    #[test]
    fn test_token_keeps_surrounding_whitespace() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![
            TestMod::new(" Spaced Mod ", Game::ME3, &root.join("a")).build(),
            TestMod::new("Fine", Game::ME3, &root.join("b")).build(),
        ]);

        let plan = plan_set(&set).unwrap();
        assert!(plan
            .mappings
            .iter()
            .any(|m| m.in_archive_path == " Spaced Mod \\moddesc.ini"));

        let blank = DeploymentSet::new(vec![
            TestMod::new(" ? ", Game::ME3, &root.join("c")).build(),
            TestMod::new("Fine", Game::ME3, &root.join("d")).build(),
        ]);
        assert!(matches!(plan_set(&blank), Err(Error::InvalidModName(_))));
    }

    #[test]
    fn test_missing_file_counts_as_empty() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![TestMod::new("Gone", Game::ME1, root)
            .missing_file("DLC_MOD_Gone\\gone.pcc")
            .build()]);

        let plan = plan_set(&set).unwrap();
        assert_eq!(plan.total_size, "[ModInfo]\n".len() as u64);
        assert_eq!(plan.files().count(), 2);
    }

    #[test]
    fn test_single_mod_root_file_has_no_directory() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![TestMod::new("Foo", Game::ME3, root)
            .file("CookedPCConsole/BioP_Foo.pcc", b"pcc")
            .build()]);

        let plan = plan_set(&set).unwrap();
        assert_eq!(
            paths(&plan),
            vec![
                "CookedPCConsole",
                "CookedPCConsole\\BioP_Foo.pcc",
                "moddesc.ini"
            ]
        );
        assert_eq!(
            plan.class_of("CookedPCConsole\\BioP_Foo.pcc"),
            Some(CompressionClass::SolidCompress)
        );
        assert_eq!(plan.class_of("moddesc.ini"), Some(CompressionClass::NoCompress));
    }

    #[test]
    fn test_two_games_two_mods_same_file() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = DeploymentSet::new(vec![
            TestMod::new("Foo", Game::ME2, &root.join("foo"))
                .file("data.bin", b"foo")
                .build(),
            TestMod::new("Bar", Game::ME3, &root.join("bar"))
                .file("data.bin", b"bar")
                .build(),
        ]);
        assert!(set.is_multi_pack());
        assert!(set.needs_game_prefix());

        let plan = plan_set(&set).unwrap();
        let dirs: Vec<&str> = plan
            .directories()
            .map(|m| m.in_archive_path.as_str())
            .collect();
        assert_eq!(dirs, vec!["ME2", "ME2\\Foo", "ME3", "ME3\\Bar"]);
        assert!(plan.class_of("ME2\\Foo\\data.bin").is_some());
        assert!(plan.class_of("ME3\\Bar\\data.bin").is_some());
        assert_eq!(
            plan.files().find(|f| f.in_archive_path == "ME3\\Bar\\data.bin").unwrap().source,
            Some(root.join("bar").join("data.bin"))
        );
    }

    fn layout_strategy() -> impl Strategy<Value = Vec<(Game, Vec<String>)>> {
        let segment = prop::sample::select(vec!["DLC_MOD_A", "dlc_mod_a", "Cooked", "M3Images"]);
        let file = prop::sample::select(vec!["a.pcc", "A.PCC", "b.tfc", "c.xml", "d.afc"]);
        let path = (prop::collection::vec(segment, 0..3), file).prop_map(|(dirs, file)| {
            let mut parts: Vec<&str> = dirs;
            parts.push(file);
            parts.join("\\")
        });
        let game = prop::sample::select(Game::ALL.to_vec());
        prop::collection::vec((game, prop::collection::vec(path, 0..8)), 1..4)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_layout_is_unique_and_complete(layout in layout_strategy()) {
            let dir = tempdir().unwrap();
            let root = Utf8Path::from_path(dir.path()).unwrap();
            let mods = layout
                .iter()
                .enumerate()
                .map(|(i, (game, files))| {
                    let mut m = TestMod::new(&format!("Mod {i}"), *game, &root.join(i.to_string()));
                    for f in files {
                        m = m.missing_file(f);
                    }
                    m.build()
                })
                .collect();
            let set = DeploymentSet::new(mods);
            let plan = plan_set(&set).unwrap();

            // Unique in-archive paths.
            let mut keys = BTreeSet::new();
            for m in &plan.mappings {
                prop_assert!(keys.insert(path_key(&m.in_archive_path)), "duplicate {}", m.in_archive_path);
            }

            // Every ancestor is a directory entry listed before any file.
            let directory_keys: BTreeSet<String> =
                plan.directories().map(|m| path_key(&m.in_archive_path)).collect();
            let first_file = plan.mappings.iter().position(|m| !m.is_directory()).unwrap_or(plan.mappings.len());
            prop_assert!(plan.mappings[first_file..].iter().all(|m| !m.is_directory()));
            for file in plan.files() {
                for ancestor in ancestor_dirs(&file.in_archive_path) {
                    prop_assert!(directory_keys.contains(&path_key(&ancestor)));
                }
            }

            // Every file has exactly one class, directories have none.
            for file in plan.files() {
                prop_assert!(plan.class_of(&file.in_archive_path).is_some());
            }
            for directory in plan.directories() {
                prop_assert!(plan.class_of(&directory.in_archive_path).is_none());
            }
            prop_assert_eq!(plan.classes.len(), plan.files().count());

            // Planning twice gives the same result.
            let again = plan_set(&set).unwrap();
            prop_assert_eq!(&again.mappings, &plan.mappings);
            prop_assert_eq!(&again.classes, &plan.classes);
        }
    }
}
