use crate::error::{Error, Result};
use crate::{lzma, COMPRESSED_FILENAME, CTMD_MAGIC, CTMD_VERSION};
use byteorder::{WriteBytesExt, LE};
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use std::io::{self, Write};

struct CompressedXml {
    name: String,
    decompressed_size: usize,
    data: Vec<u8>,
}

/// Build compressed TLK merge data from the XML files in `folder` and write it to `out`.
///
/// Only top-level `*.xml` files are packed, in file name order. If the folder
/// already contains a pre-built `CombinedTLKMergeData.m3za`, that file is
/// copied verbatim instead.
///
/// Returns the number of bytes written.
pub fn write_compressed_tlk_merge_data<W: Write>(folder: &Utf8Path, out: &mut W) -> Result<u64> {
    if !folder.as_std_path().is_dir() {
        return Err(Error::MissingFolder(folder.to_path_buf()));
    }

    let existing = folder.join(COMPRESSED_FILENAME);
    if existing.as_std_path().is_file() {
        tracing::info!("Using pre-built TLK merge data: {}", existing);
        let mut file = std::fs::File::open(existing.as_std_path())?;
        return Ok(io::copy(&mut file, out)?);
    }

    let files = list_xml_files(folder)?;
    tracing::info!("Compressing {} TLK XML files from {}", files.len(), folder);

    let compressed = files
        .par_iter()
        .map(|path| -> Result<CompressedXml> {
            let contents = std::fs::read(path.as_std_path())?;
            let data = lzma::compress(&contents)?;
            tracing::debug!(
                "Compressed {} ({} -> {} bytes)",
                path,
                contents.len(),
                data.len()
            );
            Ok(CompressedXml {
                name: path.file_name().unwrap_or_default().to_string(),
                decompressed_size: contents.len(),
                data,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let header = build_header(&compressed)?;
    let compressed_header = lzma::compress(&header)?;
    let data_size: usize = compressed.iter().map(|c| c.data.len()).sum();

    let mut written = 0u64;
    out.write_all(&CTMD_MAGIC)?;
    out.write_u8(CTMD_VERSION)?;
    out.write_u32::<LE>(to_u32(header.len(), "header")?)?;
    out.write_u32::<LE>(to_u32(compressed_header.len(), "compressed header")?)?;
    out.write_all(&compressed_header)?;
    out.write_i32::<LE>(to_i32(data_size, "data block")?)?;
    written += 4 + 1 + 4 + 4 + compressed_header.len() as u64 + 4;

    for entry in &compressed {
        out.write_all(&entry.data)?;
    }
    written += data_size as u64;

    Ok(written)
}

fn list_xml_files(folder: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder.as_std_path())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            tracing::warn!("Skipping non-UTF-8 TLK file: {}", entry.path().display());
            continue;
        };
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn build_header(files: &[CompressedXml]) -> Result<Vec<u8>> {
    let mut header = Vec::new();
    header.write_i32::<LE>(to_i32(files.len(), "file count")?)?;

    let mut offset = 0usize;
    for file in files {
        for unit in file.name.encode_utf16() {
            header.write_u16::<LE>(unit)?;
        }
        header.write_u16::<LE>(0)?;
        header.write_u32::<LE>(to_u32(offset, "data offset")?)?;
        header.write_i32::<LE>(to_i32(file.decompressed_size, &file.name)?)?;
        header.write_i32::<LE>(to_i32(file.data.len(), &file.name)?)?;
        offset += file.data.len();
    }

    Ok(header)
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::TooLarge(what.to_string()))
}

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::TooLarge(what.to_string()))
}
