//! Tag-database root discovery.
//!
//! Walks upward from a starting directory until a directory containing the
//! marker file (`GTAGS` by default) is found.  The nearest match wins.

use std::fs;
use std::path::{Path, PathBuf};

/// Marker file written by `gtags` at the root of a tag database.
pub const DEFAULT_MARKER: &str = "GTAGS";

/// Find the nearest ancestor of `start` (including `start` itself) that
/// contains `marker`.
///
/// Returns `None` once the filesystem root has been checked without a hit.
/// Only existence checks are performed; the marker's content is never read.
pub fn find_tag_root(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    // Canonicalize so `..` components and symlinks cannot make the walk
    // revisit a directory, but tolerate failure (e.g. a dangling path).
    if let Ok(canon) = fs::canonicalize(&current) {
        current = canon;
    }
    loop {
        if current.join(marker).is_file() {
            return Some(current);
        }
        let parent = match current.parent() {
            Some(p) if p != current => p.to_path_buf(),
            _ => return None,
        };
        current = parent;
    }
}
