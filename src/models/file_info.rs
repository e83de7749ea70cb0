use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A filesystem entry surfaced by the scanner, either as a processed file or
/// as a game candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: CompactString,
    pub path: PathBuf,
    pub is_directory: bool,
    pub size: Option<u64>,
    pub last_modified: Option<SystemTime>,
}

impl FileInfo {
    pub fn from_file(
        path: PathBuf,
        name: impl Into<CompactString>,
        size: u64,
        last_modified: Option<SystemTime>,
    ) -> Self {
        Self {
            name: name.into(),
            path,
            is_directory: false,
            size: Some(size),
            last_modified,
        }
    }

    pub fn from_directory(
        path: PathBuf,
        name: impl Into<CompactString>,
        last_modified: Option<SystemTime>,
    ) -> Self {
        Self {
            name: name.into(),
            path,
            is_directory: true,
            size: None,
            last_modified,
        }
    }

    /// Name used for matching: the file stem for files, the full name for
    /// directories.
    pub fn display_name(&self) -> &str {
        if self.is_directory {
            return &self.name;
        }
        Path::new(self.name.as_str())
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    pub fn human_readable_size(&self) -> String {
        match self.size {
            Some(size) => human_readable_size(size),
            None => String::from("-"),
        }
    }
}

/// Final path component, falling back to the whole path for roots.
pub fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub fn human_readable_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    const TB: u64 = 1024 * GB;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
