//! `moddesc.ini` backed mod descriptors.
//!
//! A mod on disk is a folder with a `moddesc.ini` manifest at its root:
//!
//! ```text
//! mod_dir/
//!   moddesc.ini                # [ModManager] [ModInfo] [BASEGAME] [CUSTOMDLC] ...
//!   BASEGAME/                  # moddir of the [BASEGAME] job
//!     SFXGame.pcc
//!   DLC_MOD_Example/           # custom DLC source folder
//!     CookedPCConsole/
//!       Startup_INT.pcc
//!   GAME1_EMBEDDED_TLK/        # optional TLK merge fragments (game 1 only)
//!     BIOG_Foo.Bar_tlk.xml
//!   M3Images/                  # optional manifest images, e.g. the banner
//! ```
//!
//! [`FsMod::load`] parses the manifest into a [`ModManifest`] and enumerates the
//! referenced files once, so the [`ModDescriptor`] methods are infallible.

pub mod error;
mod manifest;
mod structs;

pub use error::{Error, Result};
pub use manifest::{
    official_headers, Alternate, AlternateSource, Alternates, InstallJob, ModManifest,
};

use camino::{Utf8Path, Utf8PathBuf};
use m3_mod_core::paths::{join, normalize_separators, path_key, SEPARATOR};
use m3_mod_core::{
    Game, ModDescriptor, GAME1_EMBEDDED_TLK_FOLDER, M3_IMAGES_FOLDER, MODDESC_FILENAME,
};
use std::collections::HashSet;
use walkdir::WalkDir;

/// A mod loaded from a folder on disk.
#[derive(Debug, Clone)]
pub struct FsMod {
    root: Utf8PathBuf,
    manifest: ModManifest,
    /// Referenced files, excluding `moddesc.ini`.
    references: Vec<String>,
}

impl FsMod {
    /// Load the mod rooted at `mod_dir`.
    ///
    /// Reads `mod_dir/moddesc.ini` and enumerates every file the manifest
    /// references. Referenced folders that do not exist are skipped with a
    /// warning.
    pub fn load(mod_dir: &Utf8Path) -> Result<Self> {
        let moddesc_path = mod_dir.join(MODDESC_FILENAME);
        if !moddesc_path.as_std_path().exists() {
            return Err(Error::MissingModDesc(mod_dir.to_path_buf()));
        }

        let ini = ini::Ini::load_from_file_noescape(moddesc_path.as_std_path())?;
        let manifest = ModManifest::from_ini(&ini)?;
        let references = enumerate_references(mod_dir, &manifest)?;

        tracing::info!(
            "Loaded mod name='{}' version={} game={} cmmver={} files={}",
            manifest.name,
            manifest.version,
            manifest.game,
            manifest.cmmver,
            references.len()
        );

        Ok(Self {
            root: mod_dir.to_path_buf(),
            manifest,
            references,
        })
    }

    pub fn manifest(&self) -> &ModManifest {
        &self.manifest
    }
}

impl ModDescriptor for FsMod {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn version(&self) -> &str {
        &self.manifest.version
    }

    fn game(&self) -> Game {
        self.manifest.game
    }

    fn root_path(&self) -> &Utf8Path {
        &self.root
    }

    fn moddesc_target_version(&self) -> f64 {
        self.manifest.cmmver
    }

    fn relative_references(&self, include_all: bool) -> Vec<String> {
        let mut references = self.references.clone();
        if include_all {
            references.push(MODDESC_FILENAME.to_string());
        }
        references
    }

    fn custom_dlc_folders(&self) -> Vec<String> {
        self.manifest.custom_dlc_dest_dirs.clone()
    }
}

/// Resolve a backslash mod-relative path below `root`.
pub fn resolve_relative(root: &Utf8Path, relative: &str) -> Utf8PathBuf {
    relative
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

fn enumerate_references(root: &Utf8Path, manifest: &ModManifest) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut references = Vec::new();
    let mut push = |relative: String| {
        if seen.insert(path_key(&relative)) {
            references.push(relative);
        }
    };

    for job in &manifest.jobs {
        for file in &job.new_files {
            let relative = job_path(&job.directory, file);
            if job.game_directory_structure {
                walk_folder(root, &relative)?.into_iter().for_each(&mut push);
            } else {
                push(relative);
            }
        }
        for file in &job.add_files {
            push(job_path(&job.directory, file));
        }
        alternate_references(root, &job.alternates)?
            .into_iter()
            .for_each(&mut push);
    }

    alternate_references(root, &manifest.custom_dlc_alternates)?
        .into_iter()
        .for_each(&mut push);
    for folder in &manifest.custom_dlc_source_dirs {
        walk_folder(root, folder)?.into_iter().for_each(&mut push);
    }
    if manifest.uses_embedded_tlk {
        walk_folder(root, GAME1_EMBEDDED_TLK_FOLDER)?
            .into_iter()
            .for_each(&mut push);
    }

    for file in &manifest.additional_deployment_files {
        push(normalize_separators(file));
    }
    for folder in &manifest.additional_deployment_folders {
        walk_folder(root, folder)?.into_iter().for_each(&mut push);
    }

    if let Some(banner) = &manifest.banner_image {
        let relative = join(M3_IMAGES_FOLDER, banner);
        if resolve_relative(root, &relative).as_std_path().is_file() {
            push(relative);
        } else {
            tracing::warn!("Banner image does not exist, skipping: {}", relative);
        }
    }

    Ok(references)
}

/// `moddir` joined with a job file. A `.` directory is the mod root.
fn job_path(directory: &str, file: &str) -> String {
    let directory = if directory == "." { "" } else { directory };
    join(directory, &normalize_separators(file))
}

fn alternate_references(root: &Utf8Path, alternates: &Alternates) -> Result<Vec<String>> {
    let mut references = Vec::new();
    for alternate in &alternates.dlc {
        match &alternate.source {
            Some(AlternateSource::Path(folder)) => references.extend(walk_folder(root, folder)?),
            Some(AlternateSource::MultiList { root: list_root, files }) => {
                references.extend(files.iter().map(|f| join(list_root, f)))
            }
            None => {}
        }
    }
    for alternate in &alternates.files {
        match &alternate.source {
            Some(AlternateSource::Path(file)) => references.push(normalize_separators(file)),
            Some(AlternateSource::MultiList { root: list_root, files }) => {
                references.extend(files.iter().map(|f| join(list_root, f)))
            }
            None => {}
        }
    }
    Ok(references)
}

/// Every file below `folder`, sorted by name. A missing folder yields nothing.
fn walk_folder(root: &Utf8Path, folder: &str) -> Result<Vec<String>> {
    let folder_path = resolve_relative(root, folder);
    if !folder_path.as_std_path().is_dir() {
        tracing::warn!(
            "Referenced folder does not exist, skipping: {}",
            folder_path
        );
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder_path.as_std_path()).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root.as_std_path()) else {
            continue;
        };
        let Some(relative) = relative.to_str() else {
            tracing::warn!("Skipping non-UTF-8 path: {}", entry.path().display());
            continue;
        };
        files.push(normalize_separators(relative));
    }
    Ok(files)
}
