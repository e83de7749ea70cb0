use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LocatorError;

pub const DEFAULT_EVENT_BATCH_INTERVAL_MS: u64 = 250;

/// Options for one scan session. Validated once, read-only while the session runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Folder names skipped in addition to the built-in list (case-insensitive).
    pub extra_skip_folders: Vec<String>,
    pub min_file_size: Option<u64>,
    pub max_file_size: Option<u64>,
    /// Deepest directory level that is listed; roots are level 0.
    pub max_depth: Option<usize>,
    /// Wall-clock budget for the whole session.
    pub timeout_ms: Option<u64>,
    pub concurrency: usize,
    pub event_batch_interval_ms: u64,
    pub follow_symlinks: bool,
    /// Emit a `FileProcessed` event for every regular file.
    pub emit_file_events: bool,
    pub candidates: CandidateRules,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extra_skip_folders: Vec::new(),
            min_file_size: None,
            max_file_size: None,
            max_depth: None,
            timeout_ms: None,
            concurrency: default_concurrency(),
            event_batch_interval_ms: DEFAULT_EVENT_BATCH_INTERVAL_MS,
            follow_symlinks: false,
            emit_file_events: false,
            candidates: CandidateRules::default(),
        }
    }
}

impl ScanOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn event_batch_interval(&self) -> Duration {
        Duration::from_millis(self.event_batch_interval_ms)
    }

    pub fn validate(&self) -> Result<(), LocatorError> {
        if self.concurrency == 0 {
            return Err(LocatorError::InvalidOptions(
                "concurrency must be at least 1".into(),
            ));
        }
        if let (Some(min), Some(max)) = (self.min_file_size, self.max_file_size) {
            if min > max {
                return Err(LocatorError::InvalidOptions(format!(
                    "min_file_size ({min}) is greater than max_file_size ({max})"
                )));
            }
        }
        if self.timeout_ms == Some(0) {
            return Err(LocatorError::InvalidOptions(
                "timeout must be greater than zero".into(),
            ));
        }
        if self.event_batch_interval_ms == 0 {
            return Err(LocatorError::InvalidOptions(
                "event_batch_interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: ScanOptionsPatch) {
        if let Some(folders) = patch.extra_skip_folders {
            self.extra_skip_folders = folders;
        }
        if patch.min_file_size.is_some() {
            self.min_file_size = patch.min_file_size;
        }
        if patch.max_file_size.is_some() {
            self.max_file_size = patch.max_file_size;
        }
        if patch.max_depth.is_some() {
            self.max_depth = patch.max_depth;
        }
        if patch.timeout_ms.is_some() {
            self.timeout_ms = patch.timeout_ms;
        }
        if let Some(concurrency) = patch.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(interval) = patch.event_batch_interval_ms {
            self.event_batch_interval_ms = interval;
        }
        if let Some(follow) = patch.follow_symlinks {
            self.follow_symlinks = follow;
        }
        if let Some(emit) = patch.emit_file_events {
            self.emit_file_events = emit;
        }
        if let Some(candidates) = patch.candidates {
            self.candidates = candidates;
        }
    }

    /// Returns a copy with `patch` applied, rejecting contradictory results.
    pub fn merged(&self, patch: ScanOptionsPatch) -> Result<Self, LocatorError> {
        let mut options = self.clone();
        options.apply(patch);
        options.validate()?;
        Ok(options)
    }
}

/// Partial update of [`ScanOptions`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptionsPatch {
    pub extra_skip_folders: Option<Vec<String>>,
    pub min_file_size: Option<u64>,
    pub max_file_size: Option<u64>,
    pub max_depth: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub event_batch_interval_ms: Option<u64>,
    pub follow_symlinks: Option<bool>,
    pub emit_file_events: Option<bool>,
    pub candidates: Option<CandidateRules>,
}

/// Heuristic deciding which entries are game candidates. Extensions are
/// given without the leading dot; all comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateRules {
    pub executable_extensions: Vec<String>,
    pub installer_extensions: Vec<String>,
    /// Substrings of an executable's stem that make it an installer.
    pub installer_markers: Vec<String>,
    /// Executable stems that are never a game signal.
    pub ignored_executables: Vec<String>,
    pub marker_files: Vec<String>,
    pub marker_prefixes: Vec<String>,
    /// Directory extensions that denote a self-contained application bundle.
    pub bundle_extensions: Vec<String>,
    pub descend_into_games: bool,
}

impl Default for CandidateRules {
    fn default() -> Self {
        Self {
            executable_extensions: strings(&[
                "exe", "sh", "x86_64", "x86", "appimage", "bat", "cmd", "command",
            ]),
            installer_extensions: strings(&["msi", "iso", "dmg", "pkg"]),
            installer_markers: strings(&["setup", "install"]),
            ignored_executables: strings(&[
                "unins000",
                "uninstall",
                "unitycrashhandler64",
                "unitycrashhandler32",
                "crashreporter",
                "vc_redist.x64",
                "vc_redist.x86",
                "dxsetup",
                "dotnetfx",
            ]),
            marker_files: strings(&["steam_appid.txt", "gameinfo.txt"]),
            marker_prefixes: strings(&["goggame-"]),
            bundle_extensions: strings(&["app"]),
            descend_into_games: false,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    cap_by_fd_limit((cpus * 2).clamp(4, 32))
}

/// Cap concurrency based on the system's file descriptor soft limit.
/// Every worker keeps at most one directory handle open; half of the
/// descriptors stay reserved for the rest of the process.
fn cap_by_fd_limit(workers: usize) -> usize {
    #[cfg(unix)]
    {
        let mut rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: getrlimit only writes into the provided struct.
        let ret = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
        if ret == 0 && rlim.rlim_cur != libc::RLIM_INFINITY {
            let usable = (rlim.rlim_cur as usize) / 2;
            return workers.min(usable).max(1);
        }
    }
    workers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = ScanOptions::default();
        assert!(options.validate().is_ok());
        assert!(options.concurrency >= 1);
        assert_eq!(options.event_batch_interval(), Duration::from_millis(250));
        assert!(options.timeout().is_none());
    }

    #[test]
    fn inverted_size_bounds_are_rejected() {
        let options = ScanOptions {
            min_file_size: Some(10),
            max_file_size: Some(5),
            ..ScanOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(LocatorError::InvalidOptions(_))
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let options = ScanOptions {
            concurrency: 0,
            ..ScanOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let base = ScanOptions {
            max_depth: Some(3),
            ..ScanOptions::default()
        };
        let merged = base
            .merged(ScanOptionsPatch {
                concurrency: Some(2),
                ..ScanOptionsPatch::default()
            })
            .unwrap();
        assert_eq!(merged.concurrency, 2);
        assert_eq!(merged.max_depth, Some(3));
    }

    #[test]
    fn patch_deserializes_from_partial_json() {
        let patch: ScanOptionsPatch =
            serde_json::from_str(r#"{"max_depth": 2, "extra_skip_folders": ["Mods"]}"#).unwrap();
        assert_eq!(patch.max_depth, Some(2));
        assert_eq!(patch.extra_skip_folders, Some(vec!["Mods".to_string()]));
        assert!(patch.concurrency.is_none());
    }
}
