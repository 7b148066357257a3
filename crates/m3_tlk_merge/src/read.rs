use crate::error::{Error, Result};
use crate::{lzma, CTMD_MAGIC, CTMD_VERSION};
use byteorder::{ReadBytesExt, LE};
use camino::Utf8Path;
use std::io::{Cursor, Read};

/// Location of one file's LZMA stream inside the data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlkMergeEntryInfo {
    pub data_offset: u32,
    pub decompressed_size: i32,
    pub compressed_size: i32,
}

/// Parsed compressed TLK merge data.
#[derive(Debug, Clone)]
pub struct CompressedTlkMergeData {
    version: u8,
    entries: Vec<(String, TlkMergeEntryInfo)>,
    data: Option<Vec<u8>>,
}

impl CompressedTlkMergeData {
    /// Read the header, and the data block when `load_data` is set.
    pub fn read<R: Read>(reader: &mut R, load_data: bool) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != CTMD_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let version = reader.read_u8()?;
        if version != CTMD_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let header_size = reader.read_u32::<LE>()? as usize;
        let compressed_header_size = reader.read_u32::<LE>()?;
        let compressed_header = read_block(reader, compressed_header_size as u64, "header")?;
        let header = lzma::decompress(&compressed_header, header_size)?;
        let entries = parse_header(&header)?;

        let data_size = reader.read_i32::<LE>()?;
        let data = if load_data {
            let data_size = u64::try_from(data_size)
                .map_err(|_| Error::InvalidHeader(format!("negative data size {data_size}")))?;
            Some(read_block(reader, data_size, "data block")?)
        } else {
            None
        };

        Ok(Self {
            version,
            entries,
            data,
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// File names in the order they are stored.
    pub fn file_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn entry_info(&self, name: &str) -> Option<TlkMergeEntryInfo> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, info)| *info)
    }

    /// Decompress one file. Requires the data block to have been loaded.
    pub fn decompress_file(&self, name: &str) -> Result<Vec<u8>> {
        let info = self
            .entry_info(name)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?;
        let data = self
            .data
            .as_deref()
            .ok_or_else(|| Error::InvalidHeader("data block was not loaded".to_string()))?;

        let start = info.data_offset as usize;
        let end = start + info.compressed_size.max(0) as usize;
        let compressed = data.get(start..end).ok_or_else(|| {
            Error::InvalidHeader(format!("entry {name} lies outside the data block"))
        })?;

        Ok(lzma::decompress(
            compressed,
            info.decompressed_size.max(0) as usize,
        )?)
    }

    /// Decompress one file as text, dropping a UTF-8 byte order mark.
    pub fn decompress_text_file(&self, name: &str) -> Result<String> {
        let bytes = self.decompress_file(name)?;
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Extract every file into `output_dir`, creating it if needed.
    pub fn decompress_to_folder(&self, output_dir: &Utf8Path) -> Result<usize> {
        std::fs::create_dir_all(output_dir.as_std_path())?;
        for (name, _) in &self.entries {
            let target = output_dir.join(name);
            tracing::info!("Decompressing {} to {}", name, target);
            std::fs::write(target.as_std_path(), self.decompress_file(name)?)?;
        }
        Ok(self.entries.len())
    }
}

/// Read exactly `len` bytes, growing the buffer only as data arrives.
fn read_block<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<Vec<u8>> {
    let mut block = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut block)?;
    if block.len() as u64 != len {
        return Err(Error::InvalidHeader(format!(
            "{what} is truncated: expected {len} bytes, found {}",
            block.len()
        )));
    }
    Ok(block)
}

fn parse_header(header: &[u8]) -> Result<Vec<(String, TlkMergeEntryInfo)>> {
    let mut cursor = Cursor::new(header);
    let count = cursor.read_i32::<LE>()?;
    let count = usize::try_from(count)
        .map_err(|_| Error::InvalidHeader(format!("negative file count {count}")))?;

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let mut units = Vec::new();
        loop {
            match cursor.read_u16::<LE>()? {
                0 => break,
                unit => units.push(unit),
            }
        }
        let name = String::from_utf16(&units)
            .map_err(|_| Error::InvalidHeader("file name is not valid UTF-16".to_string()))?;

        let info = TlkMergeEntryInfo {
            data_offset: cursor.read_u32::<LE>()?,
            decompressed_size: cursor.read_i32::<LE>()?,
            compressed_size: cursor.read_i32::<LE>()?,
        };
        entries.push((name, info));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{write_compressed_tlk_merge_data, COMPRESSED_FILENAME};
    use std::fs;
    use tempfile::tempdir;

    fn write_fixture(dir: &Utf8Path) {
        fs::write(
            dir.join("BIOG_Zeta.Strings_tlk.xml"),
            "<TlkFile><String id=\"1\">Zeta</String></TlkFile>",
        )
        .unwrap();
        fs::write(
            dir.join("BIOG_Alpha.Strings_tlk.xml"),
            "<TlkFile><String id=\"2\">Alpha</String></TlkFile>".repeat(50),
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.join("nested")).unwrap();
        fs::write(dir.join("nested").join("deep.xml"), "<ignored/>").unwrap();
    }

    #[test]
    fn test_write_then_read_lists_sorted_xml_files() {
        let temp = tempdir().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        write_fixture(dir);

        let mut bytes = Vec::new();
        let written = write_compressed_tlk_merge_data(dir, &mut bytes).unwrap();
        assert_eq!(written as usize, bytes.len());
        assert_eq!(&bytes[..4], b"CTMD");

        let data = CompressedTlkMergeData::read(&mut Cursor::new(&bytes), true).unwrap();
        assert_eq!(data.version(), 1);
        assert_eq!(
            data.file_names(),
            vec!["BIOG_Alpha.Strings_tlk.xml", "BIOG_Zeta.Strings_tlk.xml"]
        );

        let zeta = data.decompress_text_file("BIOG_Zeta.Strings_tlk.xml").unwrap();
        assert_eq!(zeta, "<TlkFile><String id=\"1\">Zeta</String></TlkFile>");

        let alpha = data.entry_info("BIOG_Alpha.Strings_tlk.xml").unwrap();
        assert_eq!(alpha.data_offset, 0);
        assert!(alpha.compressed_size < alpha.decompressed_size);
        let zeta = data.entry_info("BIOG_Zeta.Strings_tlk.xml").unwrap();
        assert_eq!(zeta.data_offset as i32, alpha.compressed_size);
    }

    #[test]
    fn test_prebuilt_file_is_copied_verbatim() {
        let temp = tempdir().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        write_fixture(dir);
        fs::write(dir.join(COMPRESSED_FILENAME), b"prebuilt").unwrap();

        let mut bytes = Vec::new();
        write_compressed_tlk_merge_data(dir, &mut bytes).unwrap();
        assert_eq!(bytes, b"prebuilt");
    }

    #[test]
    fn test_empty_folder_produces_empty_listing() {
        let temp = tempdir().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();

        let mut bytes = Vec::new();
        write_compressed_tlk_merge_data(dir, &mut bytes).unwrap();
        let data = CompressedTlkMergeData::read(&mut Cursor::new(&bytes), false).unwrap();
        assert!(data.file_names().is_empty());
    }

    #[test]
    fn test_missing_folder() {
        let mut bytes = Vec::new();
        let result =
            write_compressed_tlk_merge_data(Utf8Path::new("/nonexistent/GAME1_EMBEDDED_TLK"), &mut bytes);
        assert!(matches!(result, Err(Error::MissingFolder(_))));
    }

    #[test]
    fn test_invalid_magic() {
        let result = CompressedTlkMergeData::read(&mut Cursor::new(b"NOPE\x01"), false);
        assert!(matches!(result, Err(Error::InvalidMagic(_))));
    }

    #[test]
    fn test_oversized_header_length_is_rejected() {
        let mut bytes = b"CTMD\x01".to_vec();
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(b"tiny");

        let result = CompressedTlkMergeData::read(&mut Cursor::new(&bytes), true);
        assert!(matches!(result, Err(Error::InvalidHeader(msg)) if msg.contains("truncated")));
    }

    #[test]
    fn test_truncated_data_block_is_rejected() {
        let temp = tempdir().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        write_fixture(dir);

        let mut bytes = Vec::new();
        write_compressed_tlk_merge_data(dir, &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 1);

        assert!(CompressedTlkMergeData::read(&mut Cursor::new(&bytes), false).is_ok());
        let result = CompressedTlkMergeData::read(&mut Cursor::new(&bytes), true);
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_unknown_file_and_unloaded_data() {
        let temp = tempdir().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        write_fixture(dir);

        let mut bytes = Vec::new();
        write_compressed_tlk_merge_data(dir, &mut bytes).unwrap();
        let data = CompressedTlkMergeData::read(&mut Cursor::new(&bytes), false).unwrap();

        assert!(matches!(
            data.decompress_file("missing.xml"),
            Err(Error::FileNotFound(_))
        ));
        assert!(matches!(
            data.decompress_file("BIOG_Zeta.Strings_tlk.xml"),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_decompress_to_folder() {
        let temp = tempdir().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        write_fixture(dir);

        let mut bytes = Vec::new();
        write_compressed_tlk_merge_data(dir, &mut bytes).unwrap();
        let data = CompressedTlkMergeData::read(&mut Cursor::new(&bytes), true).unwrap();

        let out = tempdir().unwrap();
        let out_dir = Utf8Path::from_path(out.path()).unwrap();
        assert_eq!(data.decompress_to_folder(out_dir).unwrap(), 2);
        assert_eq!(
            fs::read(out_dir.join("BIOG_Alpha.Strings_tlk.xml")).unwrap(),
            fs::read(dir.join("BIOG_Alpha.Strings_tlk.xml")).unwrap()
        );
    }
}
