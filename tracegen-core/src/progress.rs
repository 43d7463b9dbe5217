//! Progress signal for long exports
//!
//! The generating thread bumps a [`ProgressHandle`]; a [`ProgressReporter`]
//! thread polls it and redraws a bar on stderr. The reporter is advisory
//! only and must be finished (joined) before final totals are printed.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Width of the rendered bar, in columns.
pub const BAR_WIDTH: usize = 60;

/// Shared completed/total counter
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    completed: Arc<AtomicU64>,
    total: u64,
}

impl ProgressHandle {
    pub fn new(total: u64) -> Self {
        Self { completed: Arc::new(AtomicU64::new(0)), total }
    }

    pub fn advance(&self, n: u64) {
        self.completed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Completed share in `[0, 1]`; an empty job counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed() as f64 / self.total as f64).min(1.0)
    }
}

/// Render `fraction` as `"\r 42.00% [||||    ]"`.
pub fn render_bar(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = ((fraction * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
    format!(
        "\r{:6.2}% [{}{}]",
        fraction * 100.0,
        "|".repeat(filled),
        " ".repeat(BAR_WIDTH - filled)
    )
}

/// Background thread drawing a [`ProgressHandle`]
pub struct ProgressReporter {
    handle: ProgressHandle,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Start redrawing every `interval`.
    pub fn spawn(handle: ProgressHandle, interval: Duration) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let handle = handle.clone();
            let stop = stop.clone();
            thread::Builder::new().name("progress".into()).spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    draw(handle.fraction());
                    thread::sleep(interval);
                }
            })?
        };

        Ok(Self { handle, stop, thread: Some(thread) })
    }

    /// Stop and join the display thread, then draw the final line.
    pub fn finish(mut self) {
        self.shutdown();
        draw(self.handle.fraction());
        eprintln!();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("progress thread panicked");
            }
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn draw(fraction: f64) {
    let mut stderr = io::stderr().lock();
    // Display only; a closed stderr must not fail the export.
    let _ = write!(stderr, "{}", render_bar(fraction));
    let _ = stderr.flush();
}
