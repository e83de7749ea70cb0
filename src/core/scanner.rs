use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use dashmap::DashSet;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::settings::ScanOptions;
use crate::models::file_info::{entry_name, FileInfo};
use crate::models::scan_result::{ScanState, ScanStats};

use super::events::{emit, EventSender, ScanEventKind};
use super::filter::{FileKind, PathFilterPolicy};
use super::progress::StatsTracker;
use super::queue::WorkQueue;

/// Directory name whose expansion panics, to exercise the fatal-fault path.
#[cfg(test)]
pub(crate) const FAULT_DIR_NAME: &str = "__gamescout_fault__";

/// What a finished traversal hands back to the session.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub state: ScanState,
    pub stats: ScanStats,
    pub games: Vec<FileInfo>,
    pub duration: Duration,
    pub fatal_error: Option<String>,
}

/// Tracks outstanding directories of one root so `PathCompleted` fires once
/// its whole subtree has been processed.
struct RootProgress {
    path: PathBuf,
    pending: AtomicUsize,
}

struct WorkItem {
    path: PathBuf,
    depth: usize,
    modified: Option<SystemTime>,
    root: Arc<RootProgress>,
}

struct ScanContext {
    options: Arc<ScanOptions>,
    policy: PathFilterPolicy,
    event_tx: EventSender,
    stats: StatsTracker,
    games: Mutex<Vec<FileInfo>>,
    visited: DashSet<PathBuf>,
    queue: WorkQueue<WorkItem>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    timed_out: AtomicBool,
}

/// Bounded worker pool walking one or more roots.
pub struct PathScanner {
    ctx: Arc<ScanContext>,
}

impl PathScanner {
    pub fn new(options: Arc<ScanOptions>, event_tx: EventSender, cancel: CancellationToken) -> Self {
        let policy = PathFilterPolicy::from_options(&options);
        let deadline = options.timeout().map(|t| Instant::now() + t);
        Self {
            ctx: Arc::new(ScanContext {
                options,
                policy,
                event_tx,
                stats: StatsTracker::new(),
                games: Mutex::new(Vec::new()),
                visited: DashSet::new(),
                queue: WorkQueue::new(),
                cancel,
                deadline,
                timed_out: AtomicBool::new(false),
            }),
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.ctx.stats.snapshot()
    }

    /// Walks `roots` until every directory is processed, the token is
    /// cancelled, or the deadline passes.
    pub async fn run(&self, roots: Vec<PathBuf>) -> ScanOutcome {
        let ctx = &self.ctx;
        let done = CancellationToken::new();

        let ticker = tokio::spawn(stats_ticker(Arc::clone(ctx), done.clone()));
        let timer = ctx
            .deadline
            .map(|deadline| tokio::spawn(deadline_timer(Arc::clone(ctx), deadline, done.clone())));

        for root in roots {
            ctx.seed_root(root).await;
        }

        let mut workers = JoinSet::new();
        for worker_id in 0..ctx.options.concurrency {
            let ctx = Arc::clone(ctx);
            workers.spawn(async move { ctx.worker_loop(worker_id).await });
        }

        let mut fatal_error = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("scan worker failed: {}", e);
                if fatal_error.is_none() {
                    fatal_error = Some(format!("scan worker failed: {e}"));
                }
                ctx.cancel.cancel();
            }
        }

        done.cancel();
        let _ = ticker.await;
        if let Some(timer) = timer {
            let _ = timer.await;
        }

        let state = if fatal_error.is_some() {
            ScanState::Errored
        } else if ctx.timed_out.load(Ordering::SeqCst) {
            ScanState::TimedOut
        } else if ctx.cancel.is_cancelled() {
            ScanState::Stopped
        } else {
            ScanState::Completed
        };

        let mut games = std::mem::take(&mut *ctx.games.lock().unwrap_or_else(PoisonError::into_inner));
        games.sort_by(|a, b| a.path.cmp(&b.path));

        let duration = ctx.stats.elapsed();
        info!(
            state = ?state,
            games = games.len(),
            files_per_second = ctx.stats.files_per_second(),
            "traversal finished in {:?}",
            duration
        );

        ScanOutcome {
            state,
            stats: ctx.stats.snapshot(),
            games,
            duration,
            fatal_error,
        }
    }
}

async fn stats_ticker(ctx: Arc<ScanContext>, done: CancellationToken) {
    let mut interval = tokio::time::interval(ctx.options.event_batch_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        tokio::select! {
            _ = done.cancelled() => return,
            _ = interval.tick() => {
                emit(&ctx.event_tx, ScanEventKind::StatsUpdate { stats: ctx.stats.snapshot() });
            }
        }
    }
}

/// Forces the session out even if every worker is idle-waiting.
async fn deadline_timer(ctx: Arc<ScanContext>, deadline: Instant, done: CancellationToken) {
    tokio::select! {
        _ = done.cancelled() => {}
        _ = tokio::time::sleep_until(deadline.into()) => ctx.expire(),
    }
}

/// Collected directory entry from batch I/O.
struct DirEntryData {
    path: PathBuf,
    name: String,
    metadata: std::fs::Metadata,
}

/// Read all entries and their metadata from a directory in one blocking call.
/// Returns (entries, entry_errors) or an error if the directory itself can't be read.
fn read_dir_batch(dir_path: &Path) -> std::io::Result<(Vec<DirEntryData>, Vec<(PathBuf, String)>)> {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for entry_result in std::fs::read_dir(dir_path)? {
        match entry_result {
            Ok(entry) => {
                let entry_path = entry.path();
                let entry_name = entry.file_name().to_string_lossy().to_string();
                match std::fs::symlink_metadata(&entry_path) {
                    Ok(meta) => entries.push(DirEntryData {
                        path: entry_path,
                        name: entry_name,
                        metadata: meta,
                    }),
                    Err(e) => errors.push((entry_path, e.to_string())),
                }
            }
            Err(e) => errors.push((dir_path.to_path_buf(), e.to_string())),
        }
    }

    Ok((entries, errors))
}

#[cfg(unix)]
fn has_executable_bit(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_executable_bit(_metadata: &std::fs::Metadata) -> bool {
    false
}

/// Per-directory findings that decide which candidates it yields.
#[derive(Default)]
struct Listing {
    game_signal: bool,
    subdirs: Vec<DirEntryData>,
    installers: Vec<FileInfo>,
    loose_executables: Vec<FileInfo>,
}

impl ScanContext {
    fn should_stop(&self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.expire();
            }
        }
        self.cancel.is_cancelled()
    }

    fn expire(&self) {
        if !self.cancel.is_cancelled() {
            self.timed_out.store(true, Ordering::SeqCst);
            warn!("scan timed out");
            self.cancel.cancel();
        }
    }

    async fn seed_root(&self, root: PathBuf) {
        emit(&self.event_tx, ScanEventKind::PathStarted { path: root.clone() });

        let real = match tokio::fs::canonicalize(&root).await {
            Ok(real) => real,
            Err(e) => {
                debug!(path = %root.display(), error = %e, "cannot resolve root");
                self.stats.increment_errors();
                emit(&self.event_tx, ScanEventKind::PathCompleted { path: root });
                return;
            }
        };

        if !self.visited.insert(real.clone()) {
            // Overlaps a root that was seeded earlier.
            self.stats.increment_skipped();
            emit(&self.event_tx, ScanEventKind::PathCompleted { path: root });
            return;
        }

        let progress = Arc::new(RootProgress {
            path: root,
            pending: AtomicUsize::new(0),
        });
        self.enqueue(WorkItem {
            path: real,
            depth: 0,
            modified: None,
            root: progress,
        });
    }

    fn enqueue(&self, item: WorkItem) {
        item.root.pending.fetch_add(1, Ordering::SeqCst);
        self.queue.push(item);
    }

    fn finish(&self, item: WorkItem) {
        if item.root.pending.fetch_sub(1, Ordering::SeqCst) == 1 && !self.cancel.is_cancelled() {
            emit(
                &self.event_tx,
                ScanEventKind::PathCompleted {
                    path: item.root.path.clone(),
                },
            );
        }
        self.queue.complete();
    }

    async fn worker_loop(&self, worker_id: usize) {
        debug!(worker_id, "scan worker started");
        while let Some(item) = self.queue.next(&self.cancel).await {
            if !self.should_stop() {
                self.expand(&item).await;
            }
            self.finish(item);
        }
        debug!(worker_id, "scan worker exiting");
    }

    fn record_game(&self, info: FileInfo) {
        debug!(path = %info.path.display(), "game candidate found");
        self.stats.increment_games();
        emit(&self.event_tx, ScanEventKind::GameFound { file_info: info.clone() });
        self.games
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(info);
    }

    /// Lists one directory, classifies its entries and schedules subdirectories.
    async fn expand(&self, item: &WorkItem) {
        #[cfg(test)]
        if item.path.file_name().is_some_and(|n| n == FAULT_DIR_NAME) {
            panic!("injected fault in {}", item.path.display());
        }

        let path = item.path.clone();
        let io_result = tokio::task::spawn_blocking(move || read_dir_batch(&path)).await;

        let (entries, entry_errors) = match io_result {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                debug!(path = %item.path.display(), error = %e, "cannot read directory");
                self.stats.increment_errors();
                return;
            }
            Err(e) => {
                warn!(path = %item.path.display(), "directory listing task failed: {}", e);
                self.stats.increment_errors();
                return;
            }
        };
        self.stats.increment_dirs();

        for (err_path, err_msg) in entry_errors {
            debug!(path = %err_path.display(), error = %err_msg, "cannot stat entry");
            self.stats.increment_errors();
        }

        let mut listing = Listing::default();
        for entry in entries {
            if self.should_stop() {
                return;
            }
            self.classify_entry(item, entry, &mut listing).await;
        }

        let is_game = item.depth > 0 && listing.game_signal;
        if is_game {
            self.record_game(FileInfo::from_directory(
                item.path.clone(),
                entry_name(&item.path),
                item.modified,
            ));
        } else {
            for info in listing.installers.into_iter().chain(listing.loose_executables) {
                self.record_game(info);
            }
        }

        let child_depth = item.depth + 1;
        for dir in listing.subdirs {
            if (is_game && !self.policy.descend_into_games())
                || !self.policy.can_expand(child_depth)
                || !self.visited.insert(dir.path.clone())
            {
                self.stats.increment_skipped();
                continue;
            }
            self.enqueue(WorkItem {
                path: dir.path,
                depth: child_depth,
                modified: dir.metadata.modified().ok(),
                root: Arc::clone(&item.root),
            });
        }
    }

    async fn classify_entry(&self, item: &WorkItem, entry: DirEntryData, listing: &mut Listing) {
        let entry = if entry.metadata.file_type().is_symlink() {
            if !self.options.follow_symlinks {
                self.stats.increment_skipped();
                return;
            }
            match self.resolve_symlink(entry).await {
                Some(resolved) => resolved,
                None => return,
            }
        } else {
            entry
        };

        let file_type = entry.metadata.file_type();
        if file_type.is_dir() {
            if self.policy.is_skipped_folder(&entry.name) {
                self.stats.increment_skipped();
            } else if self.policy.is_bundle(&entry.name) {
                self.stats.increment_dirs();
                let modified = entry.metadata.modified().ok();
                self.record_game(FileInfo::from_directory(entry.path, entry.name, modified));
            } else {
                listing.subdirs.push(entry);
            }
        } else if file_type.is_file() {
            self.classify_file(item, entry, listing);
        } else {
            self.stats.increment_skipped();
        }
    }

    fn classify_file(&self, item: &WorkItem, entry: DirEntryData, listing: &mut Listing) {
        let size = entry.metadata.len();
        if !self.policy.size_within_bounds(size) {
            self.stats.increment_skipped();
            return;
        }
        self.stats.increment_files();

        let kind = self
            .policy
            .classify_file(&entry.name, has_executable_bit(&entry.metadata));
        let info = FileInfo::from_file(entry.path, entry.name, size, entry.metadata.modified().ok());

        if self.options.emit_file_events {
            emit(&self.event_tx, ScanEventKind::FileProcessed { file_info: info.clone() });
        }

        match kind {
            FileKind::Executable if item.depth == 0 => listing.loose_executables.push(info),
            FileKind::Executable | FileKind::Marker => listing.game_signal = true,
            FileKind::Installer => listing.installers.push(info),
            FileKind::Ignored | FileKind::Other => {}
        }
    }

    /// Follows a symlink; returns `None` after recording the failure.
    async fn resolve_symlink(&self, entry: DirEntryData) -> Option<DirEntryData> {
        let real_path = match tokio::fs::canonicalize(&entry.path).await {
            Ok(p) => p,
            Err(e) => {
                debug!(path = %entry.path.display(), error = %e, "dangling symlink");
                self.stats.increment_errors();
                return None;
            }
        };
        match tokio::fs::metadata(&real_path).await {
            Ok(metadata) => {
                // Directories are tracked by their real path so cycles hit the visited set.
                let path = if metadata.is_dir() { real_path } else { entry.path };
                Some(DirEntryData {
                    path,
                    name: entry.name,
                    metadata,
                })
            }
            Err(e) => {
                debug!(path = %entry.path.display(), error = %e, "cannot stat symlink target");
                self.stats.increment_errors();
                None
            }
        }
    }
}
