//! Progress reporting for archive writes.
//!
//! The writer reports through a [`ProgressSink`]. Byte progress is measured by
//! wrapping every payload in a [`ProgressReader`], so the numbers reflect what
//! the archive engine actually consumed. Counters reset at the start of every
//! pass.

use serde::Serialize;
use std::fmt;
use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The passes of an archive write, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WritePass {
    Directories,
    Solid,
    Individual,
    Uncompressed,
    EmbeddedTlkMerge,
}

impl WritePass {
    pub fn label(&self) -> &'static str {
        match self {
            WritePass::Directories => "Directories",
            WritePass::Solid => "Solid compression",
            WritePass::Individual => "Individual compression",
            WritePass::Uncompressed => "Uncompressed files",
            WritePass::EmbeddedTlkMerge => "Embedded TLK merge",
        }
    }
}

impl fmt::Display for WritePass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Receives progress events. Purely observational.
pub trait ProgressSink: Send + Sync {
    /// A pass is about to write `total_bytes` of payload.
    fn on_pass_started(&self, pass: WritePass, total_bytes: u64);

    /// Payload bytes consumed so far in the current pass.
    fn on_progress(&self, done: u64, total: u64);

    /// A payload has been fully consumed.
    fn on_file_completed(&self, in_archive_path: &str);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_pass_started(&self, _pass: WritePass, _total_bytes: u64) {}
    fn on_progress(&self, _done: u64, _total: u64) {}
    fn on_file_completed(&self, _in_archive_path: &str) {}
}

/// Byte counter of the pass currently being written.
pub struct PassTracker {
    sink: Arc<dyn ProgressSink>,
    done: AtomicU64,
    total: u64,
}

impl PassTracker {
    /// Start a pass and notify the sink.
    pub fn start(sink: Arc<dyn ProgressSink>, pass: WritePass, total: u64) -> Arc<Self> {
        sink.on_pass_started(pass, total);
        Arc::new(Self {
            sink,
            done: AtomicU64::new(0),
            total,
        })
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    fn advance(&self, bytes: u64) {
        let done = self.done.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.sink.on_progress(done, self.total);
    }

    fn complete(&self, in_archive_path: &str) {
        self.sink.on_file_completed(in_archive_path);
    }
}

/// Reader that reports consumed bytes to a [`PassTracker`].
///
/// The file-completed event fires once, on the first read that hits EOF.
pub struct ProgressReader<R> {
    inner: R,
    tracker: Arc<PassTracker>,
    in_archive_path: String,
    completed: bool,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, tracker: Arc<PassTracker>, in_archive_path: impl Into<String>) -> Self {
        Self {
            inner,
            tracker,
            in_archive_path: in_archive_path.into(),
            completed: false,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.tracker.advance(n as u64);
        } else if !buf.is_empty() && !self.completed {
            self.completed = true;
            self.tracker.complete(&self.in_archive_path);
        }
        Ok(n)
    }
}
