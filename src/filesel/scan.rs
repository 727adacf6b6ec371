//! Directory scanning for enqueueing whole trees.
//!
//! Subdirectories are walked in parallel with rayon and detection runs in
//! parallel over the collected files. Results are sorted by path so a
//! directory always enqueues in the same order.

use rayon::prelude::*;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::SKIP_DIRECTORIES;
use crate::mdb::Detector;
use crate::module_info::ModuleInfo;

/// Check if a file or directory is hidden (starts with '.')
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

pub fn should_skip_directory(name: &str) -> bool {
    SKIP_DIRECTORIES.contains(&name)
}

/// Files under `dir` whose extension the detector knows. Unreadable
/// subdirectories are logged and skipped.
pub fn collect_module_files(
    dir: &Path,
    detector: &Detector,
    recursive: bool,
) -> Result<Vec<PathBuf>, Box<dyn Error + Send + Sync>> {
    let mut files = Vec::new();
    let mut directories = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if is_hidden_file(&path) {
            continue;
        }

        if path.is_dir() {
            let Some(name) = path.file_name() else {
                continue;
            };
            if recursive && !should_skip_directory(&name.to_string_lossy()) {
                directories.push(path);
            }
        } else if path.is_file() && detector.knows_extension(&path.to_string_lossy()) {
            files.push(path);
        }
    }

    let nested: Vec<Vec<PathBuf>> = directories
        .par_iter()
        .filter_map(|subdir| match collect_module_files(subdir, detector, recursive) {
            Ok(found) => Some(found),
            Err(e) => {
                log::warn!("Failed to scan directory '{}': {e}", subdir.display());
                None
            }
        })
        .collect();

    files.extend(nested.into_iter().flatten());
    files.sort();
    Ok(files)
}

/// Run detection over `paths` in parallel, dropping files that cannot be read.
pub fn detect_all(paths: &[PathBuf], detector: &Detector) -> Vec<(PathBuf, ModuleInfo)> {
    paths
        .par_iter()
        .filter_map(|path| match detector.detect_path(path) {
            Ok(info) => Some((path.clone(), info)),
            Err(e) => {
                log::warn!("Cannot read {}: {e}", path.display());
                None
            }
        })
        .collect()
}
