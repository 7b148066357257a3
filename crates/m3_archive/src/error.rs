//! Error types for the deployment pipeline.
//!
//! Every failure aborts the whole deployment. A partially written archive is
//! left on disk as is.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A mapped source file disappeared between planning and the pass that writes it.
    #[error("Source file is missing: {0}")]
    SourceFileMissing(Utf8PathBuf),

    /// The archive engine failed. The engine's own message is kept verbatim.
    #[error("Archive engine error: {0}")]
    ArchiveEngine(String),

    /// Building the compressed TLK merge data failed.
    #[error("TLK merge error: {0}")]
    MergeCodec(#[from] m3_tlk_merge::Error),

    /// Two mods in a multipack sanitize to the same folder name.
    #[error("Mods '{first}' and '{second}' would both be packed into folder '{token}'")]
    ModNameCollision {
        first: String,
        second: String,
        token: String,
    },

    /// A mod name sanitizes to an empty folder name.
    #[error("Mod name '{0}' does not produce a usable folder name")]
    InvalidModName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl From<sevenz_rust::Error> for Error {
    fn from(e: sevenz_rust::Error) -> Self {
        Error::ArchiveEngine(e.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::ArchiveEngine(e.to_string())
    }
}
