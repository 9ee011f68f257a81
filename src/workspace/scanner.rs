//! Project directory scanning.
//!
//! Uses `ignore::WalkBuilder` so `.gitignore` files are honoured at every
//! level, plus a fixed set of directories that never belong to the editable
//! project (dependencies, build output, our own preview directory).

use ignore::{DirEntry, WalkBuilder};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Directory names skipped wherever they appear.
pub const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", ".livepad"];

/// Project-local ignore file, same syntax as `.gitignore`.
pub const IGNORE_FILE: &str = ".livepadignore";

/// Files larger than this are not loaded into the editor.
pub const MAX_READABLE_FILE_SIZE: u64 = 1024 * 1024;

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().map_or(false, |t| t.is_dir())
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| IGNORED_DIRS.contains(&name))
}

fn build_walker(root: &Path) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(true);
    builder.require_git(false);
    builder.follow_links(false);
    builder.add_custom_ignore_filename(IGNORE_FILE);
    builder.filter_entry(|entry| !is_ignored_dir(entry));
    builder
}

/// Every readable text file under `root` as `(relative path, content)`,
/// sorted by path. Paths use forward slashes and no leading slash.
pub fn scan_project(root: &Path) -> Vec<(String, String)> {
    debug!("Scanning project: {}", root.display());

    let mut files: Vec<(String, String)> = build_walker(root)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Error walking directory: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().map_or(false, |t| t.is_file()))
        .filter_map(|entry| read_text_file(entry.path(), root))
        .collect();

    files.sort_by(|a, b| a.0.cmp(&b.0));
    debug!("Found {} files in {}", files.len(), root.display());
    files
}

/// Read one file, skipping oversized and binary files.
fn read_text_file(path: &Path, root: &Path) -> Option<(String, String)> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            warn!("Failed to get metadata for {}: {}", path.display(), e);
            return None;
        }
    };

    if metadata.len() > MAX_READABLE_FILE_SIZE {
        debug!(
            "Skipping large file ({} bytes): {}",
            metadata.len(),
            path.display()
        );
        return None;
    }

    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!("Failed to read file {}: {}", path.display(), e);
            return None;
        }
    };

    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => {
            debug!("Skipping binary file: {}", path.display());
            return None;
        }
    };

    match path.strip_prefix(root) {
        Ok(relative) => Some((relative.to_string_lossy().replace('\\', "/"), content)),
        Err(_) => {
            warn!("Failed to get relative path for {}", path.display());
            None
        }
    }
}
