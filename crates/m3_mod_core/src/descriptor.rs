//! Mod descriptor abstraction.
//!
//! [`ModDescriptor`] decouples the deployment pipeline from the way a mod is
//! described on disk. The pipeline never mutates a descriptor; it only reads
//! identity, target game, manifest version and the list of files the mod
//! contributes.
//!
//! `m3_mod_project` ships the `moddesc.ini`-backed implementation.

use crate::game::Game;
use camino::Utf8Path;

/// Read-only view of a mod being deployed.
///
/// Implementations must be [`Send`] + [`Sync`] so the submission report can
/// query them in parallel.
pub trait ModDescriptor: Send + Sync {
    /// Display name of the mod, used for multipack namespacing.
    fn name(&self) -> &str;

    /// Version string as written by the mod author.
    fn version(&self) -> &str;

    /// Game the mod targets.
    fn game(&self) -> Game;

    /// Root folder of the mod on disk (the folder holding `moddesc.ini`).
    fn root_path(&self) -> &Utf8Path;

    /// Manifest parser version (`cmmver`).
    fn moddesc_target_version(&self) -> f64;

    /// Every file this mod contributes, relative to [`root_path`](Self::root_path).
    ///
    /// Paths use `\` as separator. When `include_all` is set the manifest
    /// itself is part of the list.
    fn relative_references(&self, include_all: bool) -> Vec<String>;

    /// Every custom DLC folder name this mod can install.
    fn custom_dlc_folders(&self) -> Vec<String>;
}
