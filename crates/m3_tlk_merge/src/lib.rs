//! Compressed TLK merge data (`.m3za`).
//!
//! Game 1 mods ship localized string patches as loose XML files in their
//! `GAME1_EMBEDDED_TLK` folder. For deployment these are packed into a single
//! `CombinedTLKMergeData.m3za` file:
//!
//! ```text
//! "CTMD"            magic
//! u8                version (1)
//! u32               header decompressed size
//! u32               header compressed size
//! [u8]              LZMA compressed header
//! i32               data block size
//! [u8]              data block (one LZMA stream per file)
//! ```
//!
//! The header holds an `i32` file count followed by, per file, a NUL
//! terminated UTF-16LE name, the `u32` offset of its stream in the data block
//! and its `i32` decompressed and compressed sizes.
//!
//! Use [`write_compressed_tlk_merge_data`] to build a file and
//! [`CompressedTlkMergeData::read`] to inspect one.

pub mod error;
mod lzma;
mod read;
mod write;

pub use error::{Error, Result};
pub use read::{CompressedTlkMergeData, TlkMergeEntryInfo};
pub use write::write_compressed_tlk_merge_data;

/// File magic.
pub const CTMD_MAGIC: [u8; 4] = *b"CTMD";

/// Format version written by this crate.
pub const CTMD_VERSION: u8 = 1;

/// Name of a pre-built merge data file inside a TLK folder.
pub const COMPRESSED_FILENAME: &str = "CombinedTLKMergeData.m3za";
