//! Output path collision handling.
//!
//! A convenience layer around the pipeline, not part of its correctness story: when a
//! target path already exists we append an incrementing number to the filename stem
//! until a free path is found, rather than overwriting a previous run's output.

use std::path::{Path, PathBuf};

/// Return `path` unchanged when free, otherwise the first `stem<N>.ext` sibling that
/// doesn't exist yet (`review.csv` -> `review1.csv` -> `review2.csv` ...).
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let candidate = parent.join(format!("{stem}{counter}{extension}"));
        if !candidate.exists() {
            tracing::warn!(
                requested = %path.display(),
                using = %candidate.display(),
                "output file already exists; using a numbered sibling"
            );
            return candidate;
        }
        counter += 1;
    }
}

/// Default output path for an edited file: `{stem}{suffix}{ext}` next to the source
/// (e.g. `book.m4b` -> `book_edited.m4b`).
pub fn suffixed_sibling(path: &Path, suffix: &str) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    parent.join(format!("{stem}{suffix}{extension}"))
}
