//! In-memory mod descriptors backed by scratch files.

use camino::{Utf8Path, Utf8PathBuf};
use m3_mod_core::{Game, ModDescriptor, MODDESC_FILENAME};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TestMod {
    name: String,
    game: Game,
    root: Utf8PathBuf,
    cmmver: f64,
    references: Vec<String>,
    dlc_folders: Vec<String>,
}

impl TestMod {
    pub fn new(name: &str, game: Game, root: &Utf8Path) -> Self {
        std::fs::create_dir_all(root.as_std_path()).unwrap();
        std::fs::write(root.join(MODDESC_FILENAME).as_std_path(), "[ModInfo]\n").unwrap();
        Self {
            name: name.to_string(),
            game,
            root: root.to_path_buf(),
            cmmver: 7.0,
            references: Vec::new(),
            dlc_folders: Vec::new(),
        }
    }

    pub fn cmmver(mut self, cmmver: f64) -> Self {
        self.cmmver = cmmver;
        self
    }

    /// Write `contents` to `relative` below the mod root and reference it.
    pub fn file(mut self, relative: &str, contents: &[u8]) -> Self {
        let path = self.root.join(relative.replace('\\', "/"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path()).unwrap();
        }
        std::fs::write(path.as_std_path(), contents).unwrap();
        self.references.push(relative.to_string());
        self
    }

    /// Reference a file without creating it.
    pub fn missing_file(mut self, relative: &str) -> Self {
        self.references.push(relative.to_string());
        self
    }

    pub fn dlc_folder(mut self, folder: &str) -> Self {
        self.dlc_folders.push(folder.to_string());
        self
    }

    pub fn build(self) -> Arc<dyn ModDescriptor> {
        Arc::new(self)
    }
}

impl ModDescriptor for TestMod {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn game(&self) -> Game {
        self.game
    }

    fn root_path(&self) -> &Utf8Path {
        &self.root
    }

    fn moddesc_target_version(&self) -> f64 {
        self.cmmver
    }

    fn relative_references(&self, include_all: bool) -> Vec<String> {
        let mut references = self.references.clone();
        if include_all {
            references.push(MODDESC_FILENAME.to_string());
        }
        references
    }

    fn custom_dlc_folders(&self) -> Vec<String> {
        self.dlc_folders.clone()
    }
}
