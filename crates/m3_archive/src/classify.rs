//! Compression classification.
//!
//! Every file mapping gets exactly one [`CompressionClass`]. Rules are checked
//! in order and the first match wins:
//!
//! 1. `NoCompress` for already-compressed or frequently patched content:
//!    `.tfc`, `.bik`, `.m3m` and `.xml` files, anything below `M3Images`, the
//!    `moddesc.ini` manifest, and the embedded TLK folder of mods targeting
//!    manifest version 8.0 or later.
//! 2. `IndividualCompress` for extensions listed in
//!    [`ClassificationRules::individual_extensions`].
//! 3. `SolidCompress` for everything else.
//!
//! Directory entries are never classified.

use m3_mod_core::paths::{extension_lower, starts_with_ignore_case};
use m3_mod_core::{
    EMBEDDED_TLK_MERGE_MIN_VERSION, GAME1_EMBEDDED_TLK_FOLDER, M3_IMAGES_FOLDER, MODDESC_FILENAME,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Extensions that are stored without compression.
pub const NO_COMPRESS_EXTENSIONS: [&str; 4] = [".tfc", ".bik", ".m3m", ".xml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompressionClass {
    /// Stored as is.
    NoCompress,
    /// Compressed on its own, outside the solid block.
    IndividualCompress,
    /// Compressed together with every other solid file in one block.
    SolidCompress,
}

impl fmt::Display for CompressionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompressionClass::NoCompress => "store",
            CompressionClass::IndividualCompress => "individual",
            CompressionClass::SolidCompress => "solid",
        };
        f.write_str(s)
    }
}

/// Configurable part of the classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationRules {
    /// Lower-case extensions with leading dot that are compressed individually.
    individual_extensions: BTreeSet<String>,
}

impl ClassificationRules {
    /// Build rules from user supplied extensions (`pcc`, `.PCC` and `.pcc` are equivalent).
    pub fn with_individual_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let individual_extensions = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref().trim().to_ascii_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .filter(|ext| ext.len() > 1)
            .collect();
        Self {
            individual_extensions,
        }
    }

    pub fn individual_extensions(&self) -> impl Iterator<Item = &str> {
        self.individual_extensions.iter().map(String::as_str)
    }

    /// Classify a file by its path relative to the owning mod's root.
    pub fn classify(&self, mod_relative_path: &str, moddesc_target_version: f64) -> CompressionClass {
        let extension = extension_lower(mod_relative_path);

        let no_compress = extension
            .as_deref()
            .is_some_and(|ext| NO_COMPRESS_EXTENSIONS.contains(&ext))
            || starts_with_ignore_case(mod_relative_path, M3_IMAGES_FOLDER)
            || mod_relative_path == MODDESC_FILENAME
            || (moddesc_target_version >= EMBEDDED_TLK_MERGE_MIN_VERSION
                && starts_with_ignore_case(mod_relative_path, GAME1_EMBEDDED_TLK_FOLDER));
        if no_compress {
            return CompressionClass::NoCompress;
        }

        if extension
            .as_ref()
            .is_some_and(|ext| self.individual_extensions.contains(ext))
        {
            return CompressionClass::IndividualCompress;
        }

        CompressionClass::SolidCompress
    }
}
