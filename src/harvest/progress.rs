// src/harvest/progress.rs
// =============================================================================
// Progress reporting for long harvests.
//
// A large harvest runs for many hours, so the driver tells an observer how
// far along it is after every record. The default observer logs a line every
// `every` records instead of drawing a progress bar.
// =============================================================================

use tracing::info;

pub trait Progress {
    fn advance(&mut self, done: usize, total: usize);

    fn finish(&mut self, _done: usize, _total: usize) {}
}

/// Logs `done/total` through tracing at a fixed interval.
#[derive(Debug, Clone)]
pub struct LogProgress {
    every: usize,
}

impl LogProgress {
    pub fn new(every: usize) -> Self {
        Self { every: every.max(1) }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(500)
    }
}

impl Progress for LogProgress {
    fn advance(&mut self, done: usize, total: usize) {
        if done % self.every == 0 {
            info!("Transactions: {}/{}", done, total);
        }
    }

    fn finish(&mut self, done: usize, total: usize) {
        info!("Transactions: {}/{} (done)", done, total);
    }
}

/// Ignores all progress updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&mut self, _done: usize, _total: usize) {}
}
