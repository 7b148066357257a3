//! Terminal progress output for archive writes.

use crate::utils::format_size;
use colored::Colorize;
use m3_archive::{ProgressSink, WritePass};
use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Decides whether a progress update is worth drawing.
#[derive(Debug)]
pub struct Throttle {
    cooldown: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    /// Completion always passes, anything else at most once per cooldown.
    pub fn should_emit(&mut self, now: Instant, done: u64, total: u64) -> bool {
        let due = match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
            None => true,
        };
        if due || done >= total {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

struct State {
    throttle: Throttle,
    pass: Option<WritePass>,
    files_completed: usize,
}

/// Draws a single status line on stderr, redrawn at most once per cooldown.
pub struct TerminalProgress {
    state: Mutex<State>,
}

impl TerminalProgress {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(State {
                throttle: Throttle::new(cooldown),
                pass: None,
                files_completed: 0,
            }),
        }
    }
}

pub fn percent(done: u64, total: u64) -> u64 {
    if total == 0 {
        100
    } else {
        done.min(total) * 100 / total
    }
}

impl ProgressSink for TerminalProgress {
    fn on_pass_started(&self, pass: WritePass, total_bytes: u64) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.pass.is_some() {
            eprintln!();
        }
        state.pass = Some(pass);
        state.files_completed = 0;
        state.throttle.reset();
        eprintln!(
            "{} {} {}",
            "▶".bright_blue().bold(),
            pass.label().bright_cyan().bold(),
            format!("({})", format_size(total_bytes)).bright_black()
        );
    }

    fn on_progress(&self, done: u64, total: u64) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if !state.throttle.should_emit(Instant::now(), done, total) {
            return;
        }
        eprint!(
            "\r  {:>3}% {} / {}  {} files",
            percent(done, total),
            format_size(done),
            format_size(total),
            state.files_completed
        );
        let _ = std::io::stderr().flush();
    }

    fn on_file_completed(&self, in_archive_path: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.files_completed += 1;
        }
        tracing::debug!("Compressed {}", in_archive_path);
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        if self.state.get_mut().is_ok_and(|state| state.pass.is_some()) {
            eprintln!();
        }
    }
}
