use super::{entry_name, ArchiveEngine, CompressionMode, PassFile, PassSettings, COMPRESSION_LEVEL};
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{File, OpenOptions};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip engine.
///
/// Every pass opens the archive in append mode and finishes it when the pass
/// ends, so each pass leaves a complete, readable zip behind. Zip has no solid
/// blocks: solid and individual passes both deflate each file on its own.
pub struct ZipEngine {
    output: Utf8PathBuf,
    writer: Option<ZipWriter<File>>,
    options: SimpleFileOptions,
    created: bool,
}

impl ZipEngine {
    pub fn new(output: &Utf8Path) -> Self {
        Self {
            output: output.to_path_buf(),
            writer: None,
            options: SimpleFileOptions::default(),
            created: false,
        }
    }

    fn open(&mut self) -> Result<ZipWriter<File>> {
        if !self.created {
            self.created = true;
            let file = File::create(self.output.as_std_path())?;
            return Ok(ZipWriter::new(file));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.output.as_std_path())?;
        Ok(ZipWriter::new_append(file)?)
    }

    fn writer(&mut self) -> Result<&mut ZipWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| Error::ArchiveEngine("zip pass was not started".to_string()))
    }
}

impl ArchiveEngine for ZipEngine {
    fn begin_pass(&mut self, settings: &PassSettings) -> Result<()> {
        self.options = match settings.mode {
            CompressionMode::Store => {
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
            }
            CompressionMode::Solid | CompressionMode::Individual => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(COMPRESSION_LEVEL as i64)),
        };
        let writer = self.open()?;
        self.writer = Some(writer);
        tracing::debug!(
            "zip pass={:?} mode={:?} output={}",
            settings.pass,
            settings.mode,
            self.output
        );
        Ok(())
    }

    fn add_directory(&mut self, name: &str) -> Result<()> {
        let options = self.options;
        self.writer()?.add_directory(entry_name(name), options)?;
        Ok(())
    }

    fn add_files(&mut self, files: Vec<PassFile>) -> Result<()> {
        for mut file in files {
            let size = std::fs::metadata(file.source.as_std_path())
                .map(|m| m.len())
                .unwrap_or(0);
            let options = self.options.large_file(size >= u32::MAX as u64);
            let writer = self.writer()?;
            writer.start_file(entry_name(&file.name), options)?;
            std::io::copy(&mut file.reader, writer).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::SourceFileMissing(file.source.clone()),
                _ => Error::Io(e),
            })?;
        }
        Ok(())
    }

    fn end_pass(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finish()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if !self.created {
            self.created = true;
            ZipWriter::new(File::create(self.output.as_std_path())?).finish()?;
        }
        self.end_pass()?;
        tracing::info!("Finished zip archive {}", self.output);
        Ok(())
    }
}
