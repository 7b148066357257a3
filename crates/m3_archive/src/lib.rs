//! Archive deployment pipeline for Mass Effect mods.
//!
//! Packs one or more mods into a single distributable archive:
//!
//! 1. [`collect`] asks every mod for the files it contributes.
//! 2. [`plan`] maps them to in-archive paths, synthesizes directory entries
//!    and assigns each file a [`CompressionClass`].
//! 3. [`ArchiveWriter`] writes the plan through an [`ArchiveEngine`] in
//!    strictly ordered passes and reports mods whose custom DLC folders are
//!    unknown to the third-party catalog.
//!
//! # Example
//!
//! ```no_run
//! use m3_archive::{deploy, ArchiveFormat, ArchiveWriter, ClassificationRules, DeploymentSet, WriteOptions};
//! use camino::Utf8Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let mods = Vec::new();
//! let set = DeploymentSet::new(mods);
//! let writer = ArchiveWriter::new(WriteOptions::default());
//! let report = deploy(
//!     &set,
//!     &ClassificationRules::default(),
//!     ArchiveFormat::SevenZip,
//!     Utf8Path::new("MyMod.7z"),
//!     &writer,
//! )?;
//! println!("Wrote {} entries", report.entries_written);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod collector;
pub mod container;
pub mod engine;
pub mod error;
pub mod planner;
pub mod progress;
pub mod report;
pub mod set;
pub mod writer;

#[cfg(test)]
mod test_support;

pub use classify::{ClassificationRules, CompressionClass};
pub use collector::{collect, CollectedReferences, ModReferences};
pub use container::{install_into_container, DlcContainer, InstallSummary};
pub use engine::{ArchiveEngine, ArchiveFormat, PassFile, PassSettings, SevenZipEngine, ZipEngine};
pub use error::{Error, Result};
pub use planner::{plan, DeploymentPlan, EmbeddedTlkMerge, FileMapping};
pub use progress::{NoProgress, ProgressSink, WritePass};
pub use report::{load_catalog, submission_candidates, SubmissionCandidate};
pub use set::DeploymentSet;
pub use writer::{compression_threads, ArchiveWriter, DeploymentReport, WriteOptions};

use camino::Utf8Path;

/// Collect, plan and write `set` to `output` in one call.
pub fn deploy(
    set: &DeploymentSet,
    rules: &ClassificationRules,
    format: ArchiveFormat,
    output: &Utf8Path,
    writer: &ArchiveWriter,
) -> Result<DeploymentReport> {
    let references = collect(set);
    let plan = plan(set, &references, rules)?;
    let mut engine = format.open(output)?;
    writer.write(set, &plan, engine.as_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestMod;
    use m3_mod_core::Game;
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;

    fn scenario_set(root: &Utf8Path) -> DeploymentSet {
        DeploymentSet::new(vec![TestMod::new("Archive Test", Game::LE1, root)
            .cmmver(8.0)
            .file("DLC_MOD_Arc\\CookedPCConsole\\Startup.pcc", &[7u8; 4096])
            .file("DLC_MOD_Arc\\CookedPCConsole\\Textures.tfc", b"texture cache")
            .file("GAME1_EMBEDDED_TLK\\BIOG_Arc.Strings_tlk.xml", b"<TlkFile/>")
            .build()])
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn test_deploy_7z_round_trip() {
        init_tracing();
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = scenario_set(&root.join("mod"));
        let output = root.join("out.7z");

        let writer = ArchiveWriter::new(WriteOptions {
            multithreaded: false,
        });
        let report = deploy(
            &set,
            &ClassificationRules::default(),
            ArchiveFormat::SevenZip,
            &output,
            &writer,
        )
        .unwrap();
        assert_eq!(report.threads, 1);

        let extract = root.join("extract");
        sevenz_rust::decompress_file(output.as_std_path(), extract.as_std_path()).unwrap();

        assert_eq!(
            fs::read(extract.join("DLC_MOD_Arc/CookedPCConsole/Startup.pcc")).unwrap(),
            vec![7u8; 4096]
        );
        assert_eq!(
            fs::read(extract.join("DLC_MOD_Arc/CookedPCConsole/Textures.tfc")).unwrap(),
            b"texture cache"
        );
        // Both are stored entries.
        assert_eq!(
            fs::read_to_string(extract.join("moddesc.ini")).unwrap(),
            "[ModInfo]\n"
        );
        assert!(extract
            .join("GAME1_EMBEDDED_TLK/CombinedTLKMergeData.m3za")
            .as_std_path()
            .is_file());
        assert!(!extract
            .join("GAME1_EMBEDDED_TLK/BIOG_Arc.Strings_tlk.xml")
            .as_std_path()
            .exists());
    }

    #[test]
    fn test_deploy_zip_round_trip() {
        init_tracing();
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let set = scenario_set(&root.join("mod"));
        let output = root.join("out.zip");

        deploy(
            &set,
            &ClassificationRules::default(),
            ArchiveFormat::Zip,
            &output,
            &ArchiveWriter::new(WriteOptions::default()),
        )
        .unwrap();

        let mut archive = zip::ZipArchive::new(fs::File::open(output.as_std_path()).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        for expected in [
            "DLC_MOD_Arc/",
            "DLC_MOD_Arc/CookedPCConsole/",
            "DLC_MOD_Arc/CookedPCConsole/Startup.pcc",
            "DLC_MOD_Arc/CookedPCConsole/Textures.tfc",
            "moddesc.ini",
            "GAME1_EMBEDDED_TLK/",
            "GAME1_EMBEDDED_TLK/CombinedTLKMergeData.m3za",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected} in {names:?}");
        }

        let mut texture = archive.by_name("DLC_MOD_Arc/CookedPCConsole/Textures.tfc").unwrap();
        assert_eq!(texture.compression(), zip::CompressionMethod::Stored);
        let mut contents = Vec::new();
        texture.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"texture cache");
        drop(texture);

        let startup = archive.by_name("DLC_MOD_Arc/CookedPCConsole/Startup.pcc").unwrap();
        assert_eq!(startup.compression(), zip::CompressionMethod::Deflated);
    }

    #[test]
    fn test_empty_set_writes_empty_zip() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let output = root.join("empty.zip");

        deploy(
            &DeploymentSet::new(Vec::new()),
            &ClassificationRules::default(),
            ArchiveFormat::Zip,
            &output,
            &ArchiveWriter::new(WriteOptions::default()),
        )
        .unwrap();

        let archive = zip::ZipArchive::new(fs::File::open(output.as_std_path()).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
