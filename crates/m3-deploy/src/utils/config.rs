//! Application configuration management utilities.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;

/// Application-wide configuration stored in config.toml.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub multithreaded_compression: bool,
    pub third_party_catalog: Option<Utf8PathBuf>,
    pub individual_compress_extensions: Vec<String>,
    /// Minimum time between two progress line redraws.
    pub progress_cooldown_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            multithreaded_compression: true,
            third_party_catalog: None,
            individual_compress_extensions: Vec::new(),
            progress_cooldown_ms: 125,
        }
    }
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns the default configuration file path (config.toml next to the executable).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join("config.toml"))
}

/// Loads the application configuration from config.toml.
/// Returns default configuration if file doesn't exist or cannot be parsed.
pub fn load_config() -> AppConfig {
    default_config_path()
        .map(|path| load_config_from(&path))
        .unwrap_or_default()
}

/// Loads a configuration file, falling back to defaults.
pub fn load_config_from(path: &Utf8Path) -> AppConfig {
    if !path.as_std_path().exists() {
        return AppConfig::default();
    }
    match fs::read_to_string(path.as_std_path()) {
        Ok(content) => match toml::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("Ignoring invalid config file {}: {}", path, e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}

/// Saves the application configuration to config.toml.
pub fn save_config(cfg: &AppConfig) -> io::Result<()> {
    let path = default_config_path().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Could not determine config path")
    })?;
    save_config_to(cfg, &path)
}

pub fn save_config_to(cfg: &AppConfig, path: &Utf8Path) -> io::Result<()> {
    let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
    fs::write(path.as_std_path(), content)
}
