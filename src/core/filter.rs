use std::collections::HashSet;
use std::path::Path;

use crate::config::settings::ScanOptions;

/// Folder names never descended into, compared case-insensitively.
pub const DEFAULT_SKIP_FOLDERS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    "$recycle.bin",
    "system volume information",
    "windows",
    "temp",
    "tmp",
    "__macosx",
    ".trash",
    ".cache",
    "shadercache",
    "compatdata",
];

/// What a single file contributes to the game-candidate heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Marks its directory as a game.
    Executable,
    /// Marks its directory as a game without being launchable.
    Marker,
    /// A standalone candidate on its own.
    Installer,
    /// Executable that carries no signal (uninstallers, redistributables).
    Ignored,
    Other,
}

/// Stateless per-path predicates consulted by the scanner.
#[derive(Debug, Clone)]
pub struct PathFilterPolicy {
    skip_folders: HashSet<String>,
    min_file_size: Option<u64>,
    max_file_size: Option<u64>,
    max_depth: Option<usize>,
    executable_extensions: HashSet<String>,
    installer_extensions: HashSet<String>,
    installer_markers: Vec<String>,
    ignored_executables: HashSet<String>,
    marker_files: HashSet<String>,
    marker_prefixes: Vec<String>,
    bundle_extensions: HashSet<String>,
    descend_into_games: bool,
}

fn lowercase_all<'a>(values: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    values.into_iter().map(|v| v.to_lowercase()).collect()
}

impl PathFilterPolicy {
    pub fn from_options(options: &ScanOptions) -> Self {
        let rules = &options.candidates;
        let skip_folders = DEFAULT_SKIP_FOLDERS
            .iter()
            .map(|s| s.to_string())
            .chain(lowercase_all(&options.extra_skip_folders))
            .collect();

        Self {
            skip_folders,
            min_file_size: options.min_file_size,
            max_file_size: options.max_file_size,
            max_depth: options.max_depth,
            executable_extensions: lowercase_all(&rules.executable_extensions).into_iter().collect(),
            installer_extensions: lowercase_all(&rules.installer_extensions).into_iter().collect(),
            installer_markers: lowercase_all(&rules.installer_markers),
            ignored_executables: lowercase_all(&rules.ignored_executables).into_iter().collect(),
            marker_files: lowercase_all(&rules.marker_files).into_iter().collect(),
            marker_prefixes: lowercase_all(&rules.marker_prefixes),
            bundle_extensions: lowercase_all(&rules.bundle_extensions).into_iter().collect(),
            descend_into_games: rules.descend_into_games,
        }
    }

    pub fn is_skipped_folder(&self, name: &str) -> bool {
        self.skip_folders.contains(&name.to_lowercase())
    }

    pub fn size_within_bounds(&self, size: u64) -> bool {
        self.min_file_size.map_or(true, |min| size >= min)
            && self.max_file_size.map_or(true, |max| size <= max)
    }

    /// Whether a directory at `depth` (roots are 0) may be listed.
    pub fn can_expand(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth <= max)
    }

    pub fn descend_into_games(&self) -> bool {
        self.descend_into_games
    }

    /// Directory names such as `Game.app` that are candidates by themselves.
    pub fn is_bundle(&self, name: &str) -> bool {
        extension_lower(name).is_some_and(|ext| self.bundle_extensions.contains(&ext))
    }

    /// Classifies a file by name; `executable_bit` covers extension-less
    /// launchers on unix.
    pub fn classify_file(&self, name: &str, executable_bit: bool) -> FileKind {
        let lower = name.to_lowercase();
        if self.marker_files.contains(&lower)
            || self.marker_prefixes.iter().any(|p| lower.starts_with(p.as_str()))
        {
            return FileKind::Marker;
        }

        let path = Path::new(&lower);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(lower.as_str());

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if self.installer_extensions.contains(ext) => FileKind::Installer,
            Some(ext) if self.executable_extensions.contains(ext) => self.classify_executable(stem),
            None if executable_bit => self.classify_executable(stem),
            _ => FileKind::Other,
        }
    }

    fn classify_executable(&self, stem: &str) -> FileKind {
        if self.ignored_executables.contains(stem) || is_uninstaller(stem) {
            FileKind::Ignored
        } else if self.installer_markers.iter().any(|m| stem.contains(m.as_str())) {
            FileKind::Installer
        } else {
            FileKind::Executable
        }
    }
}

/// `unins000`, `uninstall_game`, `Uninstall Hades` and the like.
fn is_uninstaller(stem: &str) -> bool {
    stem.starts_with("unins") || stem.contains("uninstall")
}

fn extension_lower(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}
