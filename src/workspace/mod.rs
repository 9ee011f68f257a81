//! Project directories on disk.
//!
//! The directory is the canonical copy of a project: it is scanned into the
//! virtual file map when a project is opened, and every applied file
//! operation is written back to it.

mod scanner;
mod storage;

pub use scanner::{scan_project, IGNORED_DIRS, IGNORE_FILE, MAX_READABLE_FILE_SIZE};
pub use storage::LocalProjectStorage;
