//! Core shared types for Mass Effect mod deployment.
//!
//! This crate holds the pieces shared by the descriptor loader, the archive
//! pipeline and the `m3-deploy` CLI:
//!
//! - [`Game`]: the supported titles and their prefixes
//! - [`ModDescriptor`]: the read-only view of a mod that the pipeline consumes
//! - [`paths`]: name sanitisation and backslash path helpers
//! - [`catalog`]: third-party mod identification lookups

pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod game;
pub mod paths;

pub use catalog::{JsonThirdPartyCatalog, ThirdPartyModInfo, ThirdPartyModLookup};
pub use descriptor::ModDescriptor;
pub use error::{Error, Result};
pub use game::Game;

/// Folder holding game-1 embedded TLK XML fragments inside a mod.
pub const GAME1_EMBEDDED_TLK_FOLDER: &str = "GAME1_EMBEDDED_TLK";

/// File name of the synthesized compressed TLK merge data.
pub const GAME1_EMBEDDED_TLK_COMPRESSED_FILENAME: &str = "CombinedTLKMergeData.m3za";

/// Name of the mod manifest file at the root of every mod.
pub const MODDESC_FILENAME: &str = "moddesc.ini";

/// Folder holding images referenced by the manifest.
pub const M3_IMAGES_FOLDER: &str = "M3Images";

/// First manifest version that merges embedded TLK files instead of copying them.
pub const EMBEDDED_TLK_MERGE_MIN_VERSION: f64 = 8.0;
