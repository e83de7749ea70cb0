use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::settings::ScanOptions;
use crate::models::file_info::FileInfo;
use crate::models::scan_result::{ScanResult, ScanStats};

/// Timestamped scan event.
#[derive(Debug, Clone, Serialize)]
pub struct ScanEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ScanEventKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScanEventKind {
    // Session lifecycle
    ScanStarted { paths: Vec<PathBuf>, options: Box<ScanOptions> },
    ScanCompleted { result: Box<ScanResult> },
    ScanStopped,
    ScanError { error: String },

    // Per-root lifecycle, emitted immediately
    PathStarted { path: PathBuf },
    PathCompleted { path: PathBuf },
    GameFound { file_info: FileInfo },

    // Throttled on `event_batch_interval`
    StatsUpdate { stats: ScanStats },

    // Highest frequency, only when enabled in the options
    FileProcessed { file_info: FileInfo },
}

impl ScanEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScanEventKind::ScanStarted { .. } => "scanStarted",
            ScanEventKind::ScanCompleted { .. } => "scanCompleted",
            ScanEventKind::ScanStopped => "scanStopped",
            ScanEventKind::ScanError { .. } => "scanError",
            ScanEventKind::PathStarted { .. } => "pathStarted",
            ScanEventKind::PathCompleted { .. } => "pathCompleted",
            ScanEventKind::GameFound { .. } => "gameFound",
            ScanEventKind::StatsUpdate { .. } => "statsUpdate",
            ScanEventKind::FileProcessed { .. } => "fileProcessed",
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<ScanEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ScanEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Queues an event without waiting; a dropped receiver is not an error.
pub fn emit(tx: &EventSender, kind: ScanEventKind) {
    let _ = tx.send(ScanEvent {
        timestamp: Utc::now(),
        kind,
    });
}
