use camino::Utf8PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid magic: expected CTMD, found {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("unsupported CTMD version: {0}")]
    UnsupportedVersion(u8),

    /// The requested file is not listed in the header.
    #[error("file not found in merge data: {0}")]
    FileNotFound(String),

    /// A size or offset does not fit the 32-bit fields of the format.
    #[error("{0} is too large for compressed TLK merge data")]
    TooLarge(String),

    #[error("TLK folder does not exist: {0}")]
    MissingFolder(Utf8PathBuf),

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}
