use crate::error::AppError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collects files under `root` whose extension is allowed. An
/// unreadable root yields no files.
pub fn discover_images(
    root: &Path,
    allowed_extensions: &HashSet<String>,
) -> Result<Vec<PathBuf>, AppError> {
    log::info!("Starting file discovery in {:?}", root);
    match collect(WalkDir::new(root), allowed_extensions) {
        Err(AppError::Walkdir(e)) => {
            log::warn!("Cannot read {:?}, nothing to scan: {}", root, e);
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Collects the allowed files directly inside `dir`, without descending.
/// Fails when `dir` cannot be read.
pub fn list_images(
    dir: &Path,
    allowed_extensions: &HashSet<String>,
) -> Result<Vec<PathBuf>, AppError> {
    log::info!("Listing images in {:?}", dir);
    collect(WalkDir::new(dir).max_depth(1), allowed_extensions)
}

fn collect(
    walker: WalkDir,
    allowed_extensions: &HashSet<String>,
) -> Result<Vec<PathBuf>, AppError> {
    log::debug!("Configured allowed extensions: {:?}", allowed_extensions);

    let mut paths = Vec::new();
    for entry in walker.sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself being unreadable means there is nothing to walk.
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file entry: {:?}", entry.path());
            continue;
        }

        let path = entry.path();
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if allowed_extensions.contains(&ext.to_lowercase()) => {
                log::debug!("Discovered image file: {:?}", path);
                paths.push(path.to_path_buf());
            }
            Some(_) => log::trace!("Skipping file due to unsupported extension: {:?}", path),
            None => log::trace!("Skipping file with no extension: {:?}", path),
        }
    }

    log::info!("File discovery complete, {} image(s) found.", paths.len());
    Ok(paths)
}
