//! LZMA-alone helpers shared by the writer and reader.

use sevenz_rust::lzma::{CountingWriter, LZMA2Options, LZMAReader, LZMAWriter};
use std::io::{self, Read, Write};

const PRESET: u32 = 6;

/// Decoder memory limit in KiB, far above what preset 6 needs.
const MEM_LIMIT_KB: u32 = 256 * 1024;

/// Compress `data` into an LZMA-alone stream with a known uncompressed size.
pub(crate) fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    let options = LZMA2Options::with_preset(PRESET);
    {
        let mut writer = LZMAWriter::new_use_header(
            CountingWriter::new(&mut out),
            &options,
            Some(data.len() as u64),
        )?;
        writer.write_all(data)?;
        writer.finish()?;
    }
    Ok(out)
}

/// Decompress an LZMA-alone stream.
pub(crate) fn decompress(data: &[u8], expected_len: usize) -> io::Result<Vec<u8>> {
    let reader = LZMAReader::new_mem_limit(data, MEM_LIMIT_KB, None)?;
    let mut out = Vec::with_capacity(expected_len.min(data.len().saturating_mul(16)));
    reader.take(expected_len as u64 + 1).read_to_end(&mut out)?;
    if out.len() != expected_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "decompressed {} bytes, expected {}",
                out.len(),
                expected_len
            ),
        ));
    }
    Ok(out)
}
