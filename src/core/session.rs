//! Scan session orchestration.
//!
//! A [`GameLocator`] is the long-lived, caller-owned entry point. Each call to
//! [`GameLocator::scan`] runs one session through
//! `Idle -> Scanning -> {Completed | Stopped | TimedOut | Errored}` and at most
//! one session may be active per locator.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::game_dirs;
use crate::config::settings::{ScanOptions, ScanOptionsPatch};
use crate::error::LocatorError;
use crate::models::scan_result::{ScanResult, ScanState};

use super::events::{emit, EventSender, ScanEventKind};
use super::scanner::PathScanner;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct GameLocator {
    options: RwLock<ScanOptions>,
    active: Mutex<Option<CancellationToken>>,
    state: Mutex<ScanState>,
    event_tx: EventSender,
}

/// Releases the active-session slot even if the scan future is dropped early.
struct ActiveSession<'a> {
    locator: &'a GameLocator,
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.locator.state);
        if *state == ScanState::Scanning {
            *state = ScanState::Stopped;
        }
        *lock(&self.locator.active) = None;
    }
}

impl GameLocator {
    pub fn new(options: ScanOptions, event_tx: EventSender) -> Result<Self, LocatorError> {
        options.validate()?;
        Ok(Self {
            options: RwLock::new(options),
            active: Mutex::new(None),
            state: Mutex::new(ScanState::Idle),
            event_tx,
        })
    }

    /// Runs one scan session and returns once it reaches a terminal state.
    ///
    /// `paths` falls back to [`Self::common_game_directories`] when empty and
    /// `options` to the locator's stored options. Only invalid options and a
    /// concurrently running session are reported as errors.
    pub async fn scan(
        &self,
        paths: Vec<PathBuf>,
        options: Option<ScanOptions>,
    ) -> Result<ScanResult, LocatorError> {
        let options = options.unwrap_or_else(|| self.options());
        options.validate()?;

        let cancel = {
            let mut active = lock(&self.active);
            if active.is_some() {
                return Err(LocatorError::AlreadyScanning);
            }
            let token = CancellationToken::new();
            *active = Some(token.clone());
            token
        };
        let _session = ActiveSession { locator: self };
        *lock(&self.state) = ScanState::Scanning;

        let roots = if paths.is_empty() {
            Self::common_game_directories()
        } else {
            paths
        };
        info!(roots = roots.len(), concurrency = options.concurrency, "scan started");

        let options = Arc::new(options);
        emit(
            &self.event_tx,
            ScanEventKind::ScanStarted {
                paths: roots.clone(),
                options: Box::new(ScanOptions::clone(&options)),
            },
        );

        let scanner = PathScanner::new(Arc::clone(&options), self.event_tx.clone(), cancel);
        let outcome = scanner.run(roots.clone()).await;

        match outcome.state {
            ScanState::Errored => {
                let message = outcome
                    .fatal_error
                    .clone()
                    .unwrap_or_else(|| String::from("scan aborted"));
                error!("scan aborted: {}", message);
                emit(&self.event_tx, ScanEventKind::ScanError { error: message });
            }
            ScanState::Stopped | ScanState::TimedOut => {
                emit(&self.event_tx, ScanEventKind::ScanStopped);
            }
            _ => {}
        }

        let result = ScanResult {
            success: outcome.state == ScanState::Completed,
            games: outcome.games,
            stats: outcome.stats,
            duration: outcome.duration,
            state: outcome.state,
            scanned_paths: roots,
            timestamp: SystemTime::now(),
        };

        info!(
            state = ?result.state,
            games = result.stats.games_found,
            dirs = result.stats.processed_dirs,
            files = result.stats.processed_files,
            errors = result.stats.errors,
            "scan finished in {:?}",
            result.duration
        );

        emit(&self.event_tx, ScanEventKind::StatsUpdate { stats: result.stats });
        emit(
            &self.event_tx,
            ScanEventKind::ScanCompleted {
                result: Box::new(result.clone()),
            },
        );
        *lock(&self.state) = result.state;

        Ok(result)
    }

    /// Requests cooperative cancellation of the active session. No-op when idle.
    pub fn stop(&self) {
        if let Some(token) = lock(&self.active).as_ref() {
            if !token.is_cancelled() {
                info!("scan stop requested");
                token.cancel();
            }
        }
    }

    pub fn is_scanning(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// State of the current or most recent session.
    pub fn state(&self) -> ScanState {
        *lock(&self.state)
    }

    /// Updates the options used by the next session; a running session keeps
    /// the options it started with.
    pub fn update_options(&self, patch: ScanOptionsPatch) -> Result<(), LocatorError> {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        *options = options.merged(patch)?;
        Ok(())
    }

    pub fn options(&self) -> ScanOptions {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn common_game_directories() -> Vec<PathBuf> {
        game_dirs::common_game_directories()
    }
}
