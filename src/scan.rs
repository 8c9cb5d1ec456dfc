//! Directory scanning utilities for discovering image files.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::Error;

const SUPPORTED_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Return `true` if `path` has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTS.iter().any(|e| *e == ext)
        })
}

/// Recursively scan `root` for images.
///
/// # Errors
/// Returns [`Error::BadDir`] if `root` is missing or not a directory.
pub fn scan_images(root: &Path) -> Result<Vec<PathBuf>, Error> {
    if !root.exists() || !root.is_dir() {
        return Err(Error::BadDir(root.to_string_lossy().into_owned()));
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        // Skip hidden dot-directories *below* the root only.
        .filter_entry(|e| !should_skip_dir(e))
        .flatten()
    {
        let path = entry.path();
        if path.is_file() && is_supported_image(path) {
            out.push(path.to_path_buf());
        }
    }

    Ok(out)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 {
        return false;
    }
    if !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
