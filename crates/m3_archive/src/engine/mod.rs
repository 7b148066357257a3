//! Archive engines.
//!
//! The writer drives an [`ArchiveEngine`] through strictly ordered passes. Each
//! pass uses one [`PassSettings`] and ends with [`ArchiveEngine::end_pass`],
//! after which everything written so far must be durable in the output.

mod sevenz;
mod zipfile;

pub use self::sevenz::SevenZipEngine;
pub use self::zipfile::ZipEngine;

use crate::error::Result;
use crate::progress::WritePass;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// LZMA2 dictionary size used for compressed passes (256 MiB).
pub const LZMA2_DICTIONARY_SIZE: u32 = 1 << 28;

/// Compression level used for compressed passes.
pub const COMPRESSION_LEVEL: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    /// No compression.
    Store,
    /// All files of the batch share one compressed block.
    Solid,
    /// Every file is compressed on its own.
    Individual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSettings {
    pub pass: WritePass,
    pub mode: CompressionMode,
    /// Compressor threads the pass may use.
    pub threads: usize,
}

/// A payload handed to the engine.
pub struct PassFile {
    /// In-archive path, `\` separated.
    pub name: String,
    pub source: Utf8PathBuf,
    pub reader: Box<dyn Read + Send>,
}

impl fmt::Debug for PassFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassFile")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Append-only archive writer driven pass by pass.
pub trait ArchiveEngine {
    fn begin_pass(&mut self, settings: &PassSettings) -> Result<()>;

    /// Add a directory entry.
    fn add_directory(&mut self, name: &str) -> Result<()>;

    /// Add a batch of files. In solid mode the batch forms one block.
    fn add_files(&mut self, files: Vec<PassFile>) -> Result<()>;

    /// Flush the pass.
    fn end_pass(&mut self) -> Result<()>;

    /// Finalize the archive. No other call is valid afterwards.
    fn finish(&mut self) -> Result<()>;
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    #[default]
    SevenZip,
    Zip,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => "7z",
            ArchiveFormat::Zip => "zip",
        }
    }

    /// Create an engine writing to `output`.
    pub fn open(&self, output: &Utf8Path) -> Result<Box<dyn ArchiveEngine>> {
        Ok(match self {
            ArchiveFormat::SevenZip => Box::new(SevenZipEngine::create(output)?),
            ArchiveFormat::Zip => Box::new(ZipEngine::new(output)),
        })
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArchiveFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7z" | "7zip" | "sevenzip" => Ok(ArchiveFormat::SevenZip),
            "zip" => Ok(ArchiveFormat::Zip),
            other => Err(format!("unknown archive format '{other}'")),
        }
    }
}

/// Convert an in-archive path to the `/` separated form archive formats store.
pub(crate) fn entry_name(name: &str) -> String {
    name.replace('\\', "/")
}
