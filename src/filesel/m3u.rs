//! M3U play-list files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::PLAYLIST_EXTENSIONS;

pub fn is_playlist(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PLAYLIST_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Entries of an M3U file, resolved against `base`. Comments and `#EXT`
/// directives are skipped, as are URLs other than `file://`.
pub fn parse(contents: &str, base: &Path) -> Vec<PathBuf> {
    contents
        .lines()
        .map(|line| line.trim().trim_start_matches('\u{feff}'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("file://").unwrap_or(line);
            if line.contains("://") {
                log::debug!("Skipping remote play-list entry {line}");
                return None;
            }
            let path = Path::new(line);
            Some(if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            })
        })
        .collect()
}

pub fn read(path: &Path) -> io::Result<Vec<PathBuf>> {
    let contents = fs::read_to_string(path)?;
    let base = path.parent().unwrap_or(Path::new("."));
    Ok(parse(&contents, base))
}
