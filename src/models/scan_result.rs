use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::file_info::FileInfo;

/// Lifecycle of a scan session. Everything but `Idle` and `Scanning` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Scanning,
    Completed,
    Stopped,
    TimedOut,
    Errored,
}

impl ScanState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ScanState::Idle | ScanState::Scanning)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub processed_dirs: u64,
    pub processed_files: u64,
    pub skipped_paths: u64,
    pub errors: u64,
    pub games_found: u64,
}

impl ScanStats {
    /// Number of filesystem entries accounted for by the counters.
    pub fn entries_visited(&self) -> u64 {
        self.processed_dirs + self.processed_files + self.skipped_paths + self.errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub games: Vec<FileInfo>,
    pub stats: ScanStats,
    pub duration: Duration,
    pub success: bool,
    pub state: ScanState,
    pub scanned_paths: Vec<PathBuf>,
    pub timestamp: SystemTime,
}
