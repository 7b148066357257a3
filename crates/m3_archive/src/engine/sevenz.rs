use super::{
    entry_name, ArchiveEngine, CompressionMode, PassFile, PassSettings, COMPRESSION_LEVEL,
    LZMA2_DICTIONARY_SIZE,
};
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use sevenz_rust::lzma::LZMA2Options;
use sevenz_rust::{
    MethodOptions, SevenZArchiveEntry, SevenZMethod, SevenZMethodConfiguration, SevenZWriter,
    SourceReader,
};
use std::fs::File;
use std::io::Read;

/// 7z engine.
///
/// One writer stays open for the whole write; every pass switches the content
/// method. The archive header is written by [`finish`](ArchiveEngine::finish).
pub struct SevenZipEngine {
    output: Utf8PathBuf,
    writer: Option<SevenZWriter<File>>,
    mode: CompressionMode,
}

impl SevenZipEngine {
    pub fn create(output: &Utf8Path) -> Result<Self> {
        let writer = SevenZWriter::create(output.as_std_path())?;
        tracing::info!("Created 7z archive {}", output);
        Ok(Self {
            output: output.to_path_buf(),
            writer: Some(writer),
            mode: CompressionMode::Store,
        })
    }

    fn writer(&mut self) -> Result<&mut SevenZWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| Error::ArchiveEngine(format!("{} is already finished", self.output)))
    }
}

/// LZMA2 preset for the store pass. The writer has no COPY encoder, so stored
/// files go through the fastest LZMA2 preset, which emits incompressible data
/// as uncompressed LZMA2 chunks.
const STORE_PRESET: u32 = 0;

fn content_methods(mode: CompressionMode) -> Vec<SevenZMethodConfiguration> {
    let options = match mode {
        CompressionMode::Store => LZMA2Options::with_preset(STORE_PRESET),
        CompressionMode::Solid | CompressionMode::Individual => {
            let mut options = LZMA2Options::with_preset(COMPRESSION_LEVEL);
            options.dict_size = LZMA2_DICTIONARY_SIZE;
            options
        }
    };
    vec![SevenZMethodConfiguration::new(SevenZMethod::LZMA2)
        .with_options(MethodOptions::LZMA2(options))]
}

impl ArchiveEngine for SevenZipEngine {
    fn begin_pass(&mut self, settings: &PassSettings) -> Result<()> {
        tracing::debug!(
            "7z pass={:?} mode={:?} threads={} (encoder runs single-threaded)",
            settings.pass,
            settings.mode,
            settings.threads
        );
        self.mode = settings.mode;
        self.writer()?.set_content_methods(content_methods(settings.mode));
        Ok(())
    }

    fn add_directory(&mut self, name: &str) -> Result<()> {
        let mut entry = SevenZArchiveEntry::new();
        entry.name = entry_name(name);
        entry.is_directory = true;
        entry.has_stream = false;
        self.writer()?.push_archive_entry::<&[u8]>(entry, None)?;
        Ok(())
    }

    fn add_files(&mut self, files: Vec<PassFile>) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        if self.mode == CompressionMode::Solid {
            let mut entries = Vec::with_capacity(files.len());
            let mut readers: Vec<SourceReader<Box<dyn Read + Send>>> =
                Vec::with_capacity(files.len());
            for file in files {
                entries.push(SevenZArchiveEntry::from_path(
                    file.source.as_std_path(),
                    entry_name(&file.name),
                ));
                readers.push(SourceReader::new(file.reader));
            }
            self.writer()?.push_archive_entries(entries, readers.into())?;
        } else {
            for file in files {
                let entry =
                    SevenZArchiveEntry::from_path(file.source.as_std_path(), entry_name(&file.name));
                self.writer()?.push_archive_entry(entry, Some(file.reader))?;
            }
        }
        Ok(())
    }

    fn end_pass(&mut self) -> Result<()> {
        // Streams are written as they are pushed; only the header is deferred.
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| Error::ArchiveEngine(format!("{} is already finished", self.output)))?;
        writer.finish()?;
        tracing::info!("Finished 7z archive {}", self.output);
        Ok(())
    }
}
