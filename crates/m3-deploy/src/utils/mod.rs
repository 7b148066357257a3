use crate::errors::CliError;
use crate::utils::config::AppConfig;
use camino::Utf8PathBuf;
use m3_archive::{ClassificationRules, DeploymentSet};
use m3_mod_core::ModDescriptor;
use m3_mod_project::FsMod;
use miette::Result;
use std::sync::Arc;

pub mod config;
pub mod progress;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// Load every mod folder, in the order given, into a deployment set.
pub fn load_deployment_set(mod_dirs: &[String]) -> Result<DeploymentSet> {
    let mut mods: Vec<Arc<dyn ModDescriptor>> = Vec::with_capacity(mod_dirs.len());
    for dir in mod_dirs {
        let path = Utf8PathBuf::from(dir);
        if !path.as_std_path().is_dir() {
            return Err(CliError::ModFolderNotFound { path }.into());
        }
        let loaded =
            FsMod::load(&path).map_err(|e| CliError::mod_load_failed(path.clone(), e))?;
        mods.push(Arc::new(loaded));
    }
    Ok(DeploymentSet::new(mods))
}

/// Individual compression extensions from the command line, or the config when none were given.
pub fn classification_rules(cli_extensions: &[String], cfg: &AppConfig) -> ClassificationRules {
    if cli_extensions.is_empty() {
        ClassificationRules::with_individual_extensions(&cfg.individual_compress_extensions)
    } else {
        ClassificationRules::with_individual_extensions(cli_extensions)
    }
}

/// Human readable byte size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.2} {unit}")
}
