//! Multi-pass archive writer.
//!
//! # Passes
//!
//! The archive is written append-only, in strictly ordered passes. Each pass
//! ends with [`ArchiveEngine::end_pass`] before the next one starts.
//!
//! 1. Directory entries, stored.
//! 2. Solid files, LZMA2 level 9 with a 256 MiB dictionary, as one block.
//! 3. Individually compressed files, same settings, one stream each.
//! 4. Uncompressed files, stored, in reverse planning order.
//! 5. For every game 1 mod that merges its embedded TLK folder: the
//!    synthesized `CombinedTLKMergeData.m3za`, compressed individually, plus
//!    any directory entries it needs.
//!
//! Passes without payload are skipped. Source files are checked at the start
//! of the pass that writes them. Any failure aborts the write and leaves the
//! partial archive on disk. A running write cannot be cancelled.

use crate::classify::CompressionClass;
use crate::engine::{ArchiveEngine, CompressionMode, PassFile, PassSettings};
use crate::error::{Error, Result};
use crate::planner::{DeploymentPlan, FileMapping};
use crate::progress::{NoProgress, PassTracker, ProgressReader, ProgressSink, WritePass};
use crate::report::{submission_candidates, SubmissionCandidate};
use crate::set::DeploymentSet;
use camino::{Utf8Path, Utf8PathBuf};
use m3_mod_core::paths::{ancestor_dirs, join, path_key};
use m3_mod_core::{ThirdPartyModLookup, GAME1_EMBEDDED_TLK_COMPRESSED_FILENAME};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Total size above which compression threads are capped (1.25 GiB).
pub const LARGE_DEPLOYMENT_THRESHOLD: u64 = 5 * (1 << 30) / 4;

/// Thread cap for large deployments, bounding compressor memory.
pub const LARGE_DEPLOYMENT_MAX_THREADS: usize = 5;

/// Number of compressor threads for a deployment of `total_size` bytes.
pub fn compression_threads(multithreaded: bool, total_size: u64, cores: usize) -> usize {
    let cores = cores.max(1);
    if !multithreaded {
        1
    } else if total_size > LARGE_DEPLOYMENT_THRESHOLD {
        cores.min(LARGE_DEPLOYMENT_MAX_THREADS)
    } else {
        cores
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub multithreaded: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            multithreaded: true,
        }
    }
}

/// Summary of a finished write.
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    /// Entries written, including synthesized ones.
    pub entries_written: usize,
    pub total_size: u64,
    pub threads: usize,
    pub passes: Vec<WritePass>,
    /// Mods with custom DLC folders unknown to the catalog. Empty without a catalog.
    pub submission_candidates: Vec<SubmissionCandidate>,
    pub elapsed: Duration,
}

/// Drives an [`ArchiveEngine`] through the write passes of a [`DeploymentPlan`].
pub struct ArchiveWriter {
    options: WriteOptions,
    progress: Arc<dyn ProgressSink>,
    catalog: Option<Arc<dyn ThirdPartyModLookup>>,
}

impl ArchiveWriter {
    pub fn new(options: WriteOptions) -> Self {
        Self {
            options,
            progress: Arc::new(NoProgress),
            catalog: None,
        }
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// Catalog used for the submission report after a successful write.
    pub fn with_catalog(mut self, catalog: Arc<dyn ThirdPartyModLookup>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Write `plan` through `engine`. Blocks until the archive is finished.
    pub fn write(
        &self,
        set: &DeploymentSet,
        plan: &DeploymentPlan,
        engine: &mut dyn ArchiveEngine,
    ) -> Result<DeploymentReport> {
        let start = Instant::now();
        let threads =
            compression_threads(self.options.multithreaded, plan.total_size, num_cpus::get());
        tracing::info!(
            "Writing archive mods={} entries={} total_size={} threads={}",
            set.len(),
            plan.mappings.len(),
            plan.total_size,
            threads
        );

        let mut passes = Vec::new();
        let mut entries_written = 0;

        // Pass 1
        let directories: Vec<&str> = plan
            .directories()
            .map(|d| d.in_archive_path.as_str())
            .collect();
        if !directories.is_empty() {
            PassTracker::start(self.progress.clone(), WritePass::Directories, 0);
            engine.begin_pass(&PassSettings {
                pass: WritePass::Directories,
                mode: CompressionMode::Store,
                threads,
            })?;
            for directory in &directories {
                engine.add_directory(directory)?;
            }
            engine.end_pass()?;
            entries_written += directories.len();
            passes.push(WritePass::Directories);
            tracing::info!("Wrote {} directory entries", directories.len());
        }

        // Passes 2 to 4
        let file_passes = [
            (
                WritePass::Solid,
                CompressionMode::Solid,
                plan.files_of_class(CompressionClass::SolidCompress),
            ),
            (
                WritePass::Individual,
                CompressionMode::Individual,
                plan.files_of_class(CompressionClass::IndividualCompress),
            ),
            (
                WritePass::Uncompressed,
                CompressionMode::Store,
                plan.files_of_class(CompressionClass::NoCompress)
                    .into_iter()
                    .rev()
                    .collect(),
            ),
        ];
        for (pass, mode, files) in file_passes {
            if files.is_empty() {
                tracing::debug!("Skipping empty pass {:?}", pass);
                continue;
            }
            entries_written += self.write_file_pass(
                engine,
                PassSettings {
                    pass,
                    mode,
                    threads,
                },
                &files,
            )?;
            passes.push(pass);
        }

        // Pass 5
        if !plan.embedded_tlk.is_empty() {
            entries_written += self.write_embedded_tlk_pass(engine, plan, threads)?;
            passes.push(WritePass::EmbeddedTlkMerge);
        }

        engine.finish()?;

        let submission_candidates = match &self.catalog {
            Some(catalog) => submission_candidates(set, catalog.as_ref()),
            None => Vec::new(),
        };

        let elapsed = start.elapsed();
        tracing::info!(
            "Archive written entries={} passes={} in {:.2?}",
            entries_written,
            passes.len(),
            elapsed
        );

        Ok(DeploymentReport {
            entries_written,
            total_size: plan.total_size,
            threads,
            passes,
            submission_candidates,
            elapsed,
        })
    }

    fn write_file_pass(
        &self,
        engine: &mut dyn ArchiveEngine,
        settings: PassSettings,
        files: &[&FileMapping],
    ) -> Result<usize> {
        let mut sources = Vec::with_capacity(files.len());
        let mut total = 0u64;
        for mapping in files {
            let Some(source) = &mapping.source else {
                continue;
            };
            let metadata = std::fs::metadata(source.as_std_path())
                .map_err(|_| Error::SourceFileMissing(source.clone()))?;
            if !metadata.is_file() {
                return Err(Error::SourceFileMissing(source.clone()));
            }
            total += metadata.len();
            sources.push((mapping.in_archive_path.as_str(), source));
        }

        tracing::info!(
            "Pass {:?}: {} files, {} bytes",
            settings.pass,
            sources.len(),
            total
        );

        let tracker = PassTracker::start(self.progress.clone(), settings.pass, total);
        let pass_files = sources
            .iter()
            .map(|(name, source)| pass_file(name, source, &tracker))
            .collect();

        engine.begin_pass(&settings)?;
        if let Err(e) = engine.add_files(pass_files) {
            // Sources removed mid-pass surface as SourceFileMissing.
            return Err(match sources.iter().find(|(_, s)| !s.as_std_path().is_file()) {
                Some((_, source)) => Error::SourceFileMissing((*source).clone()),
                None => e,
            });
        }
        engine.end_pass()?;

        Ok(sources.len())
    }

    fn write_embedded_tlk_pass(
        &self,
        engine: &mut dyn ArchiveEngine,
        plan: &DeploymentPlan,
        threads: usize,
    ) -> Result<usize> {
        // Every merge file is built before the pass starts so its size is known.
        let mut merged = Vec::with_capacity(plan.embedded_tlk.len());
        let mut total = 0u64;
        for merge in &plan.embedded_tlk {
            tracing::info!(
                "Merging embedded TLK files mod='{}' folder={}",
                merge.mod_name,
                merge.source_folder
            );

            // Removed when dropped, on success and on error alike.
            let temp = tempfile::NamedTempFile::new()?;
            {
                let mut out = BufWriter::new(temp.as_file());
                m3_tlk_merge::write_compressed_tlk_merge_data(&merge.source_folder, &mut out)?;
                out.flush()?;
            }
            let temp_path = Utf8PathBuf::try_from(temp.path().to_path_buf())
                .map_err(|e| Error::Io(e.into_io_error()))?;
            total += temp.as_file().metadata()?.len();
            merged.push((merge, temp, temp_path));
        }

        let tracker = PassTracker::start(self.progress.clone(), WritePass::EmbeddedTlkMerge, total);
        engine.begin_pass(&PassSettings {
            pass: WritePass::EmbeddedTlkMerge,
            mode: CompressionMode::Individual,
            threads,
        })?;

        let mut written_directories: HashSet<String> = plan
            .directories()
            .map(|d| path_key(&d.in_archive_path))
            .collect();
        let mut entries = 0;

        for (merge, _temp, temp_path) in &merged {
            let folder = merge.archive_folder();
            for directory in ancestor_dirs(&folder).into_iter().chain([folder.clone()]) {
                if written_directories.insert(path_key(&directory)) {
                    engine.add_directory(&directory)?;
                    entries += 1;
                }
            }

            let name = join(&folder, GAME1_EMBEDDED_TLK_COMPRESSED_FILENAME);
            engine.add_files(vec![pass_file(&name, temp_path, &tracker)])?;
            entries += 1;
        }

        engine.end_pass()?;
        Ok(entries)
    }
}

fn pass_file(name: &str, source: &Utf8Path, tracker: &Arc<PassTracker>) -> PassFile {
    PassFile {
        name: name.to_string(),
        source: source.to_path_buf(),
        reader: Box::new(ProgressReader::new(
            LazyFile::new(source),
            tracker.clone(),
            name,
        )),
    }
}

/// File opened on first read, so a solid batch does not hold every handle at once.
struct LazyFile {
    path: Utf8PathBuf,
    file: Option<File>,
    done: bool,
}

impl LazyFile {
    fn new(path: &Utf8Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: None,
            done: false,
        }
    }
}

impl Read for LazyFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.done {
            return Ok(0);
        }
        if self.file.is_none() {
            self.file = Some(File::open(self.path.as_std_path())?);
        }
        let n = match self.file.as_mut() {
            Some(file) => file.read(buf)?,
            None => 0,
        };
        if n == 0 && !buf.is_empty() {
            self.done = true;
            self.file = None;
        }
        Ok(n)
    }
}
