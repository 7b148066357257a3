//! Installing files into an existing DLC container.
//!
//! Some DLC ship their content inside a single container file with a flat path
//! table (SFAR). The container format itself lives behind [`DlcContainer`];
//! this module only decides, per file, whether to replace an existing entry or
//! add a new one.

use crate::error::{Error, Result};
use crate::planner::FileMapping;
use crate::progress::ProgressSink;

/// Opaque container with a flat path table.
pub trait DlcContainer {
    /// Index of the entry stored at `path`, if any.
    fn find_entry(&self, path: &str) -> Option<usize>;

    fn replace_entry(&mut self, index: usize, data: &[u8]) -> Result<()>;

    fn add_entry(&mut self, path: &str, data: &[u8]) -> Result<()>;

    /// Persist pending changes.
    fn flush(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub replaced: usize,
    pub added: usize,
}

/// Install every file mapping into `container`. Directory mappings are ignored.
///
/// All sources are checked before the container is touched.
pub fn install_into_container(
    container: &mut dyn DlcContainer,
    mappings: &[FileMapping],
    progress: &dyn ProgressSink,
) -> Result<InstallSummary> {
    let mut files = Vec::new();
    let mut total = 0u64;
    for mapping in mappings {
        let Some(source) = &mapping.source else {
            continue;
        };
        let metadata = std::fs::metadata(source.as_std_path())
            .map_err(|_| Error::SourceFileMissing(source.clone()))?;
        total += metadata.len();
        files.push((mapping.in_archive_path.as_str(), source));
    }

    let mut summary = InstallSummary::default();
    let mut done = 0u64;
    for (path, source) in files {
        let data = std::fs::read(source.as_std_path())?;
        match container.find_entry(path) {
            Some(index) => {
                tracing::debug!("Replacing container entry {}", path);
                container.replace_entry(index, &data)?;
                summary.replaced += 1;
            }
            None => {
                tracing::debug!("Adding container entry {}", path);
                container.add_entry(path, &data)?;
                summary.added += 1;
            }
        }
        done += data.len() as u64;
        progress.on_progress(done, total);
        progress.on_file_completed(path);
    }

    container.flush()?;
    tracing::info!(
        "Installed into container replaced={} added={}",
        summary.replaced,
        summary.added
    );
    Ok(summary)
}
