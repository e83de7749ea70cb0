use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::models::scan_result::ScanStats;

/// Concurrency-safe scan counters shared by every worker.
pub struct StatsTracker {
    processed_dirs: AtomicU64,
    processed_files: AtomicU64,
    skipped_paths: AtomicU64,
    errors: AtomicU64,
    games_found: AtomicU64,
    start_time: Instant,
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            processed_dirs: AtomicU64::new(0),
            processed_files: AtomicU64::new(0),
            skipped_paths: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            games_found: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn increment_dirs(&self) {
        self.processed_dirs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_files(&self) {
        self.processed_files.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_skipped(&self, count: u64) {
        self.skipped_paths.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self) {
        self.add_skipped(1);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_games(&self) {
        self.games_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn files_per_second(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < f64::EPSILON {
            return 0.0;
        }
        self.processed_files.load(Ordering::Relaxed) as f64 / elapsed
    }

    pub fn snapshot(&self) -> ScanStats {
        ScanStats {
            processed_dirs: self.processed_dirs.load(Ordering::Relaxed),
            processed_files: self.processed_files.load(Ordering::Relaxed),
            skipped_paths: self.skipped_paths.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            games_found: self.games_found.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn concurrent_increments_are_not_lost() {
        let tracker = Arc::new(StatsTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        tracker.increment_files();
                        tracker.increment_skipped();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = tracker.snapshot();
        assert_eq!(stats.processed_files, 8000);
        assert_eq!(stats.skipped_paths, 8000);
        assert_eq!(stats.entries_visited(), 16000);
    }
}
