//! Error types for loading mod descriptors.

use camino::Utf8PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `moddesc.ini` exists but is not valid INI.
    #[error("moddesc.ini parse error: {0}")]
    Ini(#[from] ini::Error),

    /// The mod folder has no `moddesc.ini`.
    #[error("moddesc.ini not found in {0}")]
    MissingModDesc(Utf8PathBuf),

    #[error("Invalid game in moddesc.ini: {0}")]
    InvalidGame(String),

    /// `cmmver` is present but not a number.
    #[error("Invalid cmmver in moddesc.ini: {0}")]
    InvalidCmmVer(String),

    /// `[ModInfo] modname` is missing or empty.
    #[error("moddesc.ini has no modname")]
    MissingModName,

    /// An `altfiles` or `altdlc` struct list is malformed.
    #[error("Invalid struct in moddesc.ini ({reason}): {value}")]
    InvalidStruct { value: String, reason: String },

    /// A job's source list and target list differ in length.
    #[error("[{header}] {list} lists {sources} sources for {targets} targets")]
    MismatchedJobLists {
        header: String,
        list: String,
        sources: usize,
        targets: usize,
    },

    /// A job header sets `moddir` but lists no files to install.
    #[error("[{0}] has a moddir but no files to install")]
    EmptyJob(String),

    /// An alternate refers to a `multilistN` key the job does not define.
    #[error("[{header}] alternate refers to undefined multilist{id}")]
    UnknownMultiList { header: String, id: u32 },
}
