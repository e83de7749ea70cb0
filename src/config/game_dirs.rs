use std::path::PathBuf;

/// Platform-specific directories where games are commonly installed.
///
/// Only directories that exist are returned, without duplicates, in a stable
/// order. Extra Steam libraries listed in `libraryfolders.vdf` are included.
pub fn common_game_directories() -> Vec<PathBuf> {
    let mut candidates = platform_directories();

    for steam_root in steam_roots() {
        candidates.push(steam_root.join("steamapps").join("common"));
        let vdf = steam_root.join("steamapps").join("libraryfolders.vdf");
        if let Ok(contents) = std::fs::read_to_string(&vdf) {
            candidates.extend(
                parse_library_folders(&contents)
                    .into_iter()
                    .map(|library| library.join("steamapps").join("common")),
            );
        }
    }

    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|dir| dir.is_dir())
        .filter(|dir| seen.insert(dir.clone()))
        .collect()
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}

#[cfg(target_os = "windows")]
fn platform_directories() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for var in ["ProgramFiles", "ProgramFiles(x86)"] {
        if let Some(base) = std::env::var_os(var).map(PathBuf::from) {
            dirs.push(base.join("Steam").join("steamapps").join("common"));
            dirs.push(base.join("GOG Galaxy").join("Games"));
            dirs.push(base.join("Epic Games"));
            dirs.push(base);
        }
    }
    let drive = std::env::var("SystemDrive").unwrap_or_else(|_| String::from("C:"));
    dirs.push(PathBuf::from(format!("{drive}\\Games")));
    dirs.push(PathBuf::from(format!("{drive}\\GOG Games")));
    if let Some(home) = home_dir() {
        dirs.push(home.join("Games"));
    }
    dirs
}

#[cfg(target_os = "macos")]
fn platform_directories() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("/Applications")];
    if let Some(home) = home_dir() {
        dirs.push(home.join("Applications"));
        dirs.push(home.join("Games"));
    }
    dirs
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_directories() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = home_dir() {
        dirs.push(home.join("Games"));
        dirs.push(home.join("GOG Games"));
        dirs.push(home.join(".local").join("share").join("lutris").join("games"));
    }
    dirs.push(PathBuf::from("/opt/games"));
    dirs
}

fn steam_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    #[cfg(target_os = "windows")]
    {
        if let Some(base) = std::env::var_os("ProgramFiles(x86)").map(PathBuf::from) {
            roots.push(base.join("Steam"));
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home_dir() {
            roots.push(home.join("Library/Application Support/Steam"));
        }
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(home) = home_dir() {
            roots.push(home.join(".steam/steam"));
            roots.push(home.join(".local/share/Steam"));
            roots.push(home.join(".var/app/com.valvesoftware.Steam/.local/share/Steam"));
        }
    }
    roots.into_iter().filter(|p| p.is_dir()).collect()
}

/// Extracts the `"path"` values from a Steam `libraryfolders.vdf` file.
pub fn parse_library_folders(contents: &str) -> Vec<PathBuf> {
    contents
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("\"path\"")?;
            let value = quoted_value(rest)?;
            Some(PathBuf::from(value.replace("\\\\", "\\")))
        })
        .collect()
}

fn quoted_value(s: &str) -> Option<&str> {
    let start = s.find('"')? + 1;
    let len = s[start..].find('"')?;
    Some(&s[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_library_folder_paths() {
        let vdf = r#"
"libraryfolders"
{
	"0"
	{
		"path"		"/home/deck/.local/share/Steam"
		"label"		""
	}
	"1"
	{
		"path"		"D:\\SteamLibrary"
	}
}
"#;
        let paths = parse_library_folders(vdf);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/home/deck/.local/share/Steam"),
                PathBuf::from("D:\\SteamLibrary"),
            ]
        );
    }

    #[test]
    fn ignores_malformed_lines() {
        assert!(parse_library_folders("\"path\"").is_empty());
        assert!(parse_library_folders("\"label\" \"x\"").is_empty());
    }

    #[test]
    fn common_directories_exist() {
        for dir in common_game_directories() {
            assert!(dir.is_dir());
        }
    }
}
