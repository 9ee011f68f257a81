use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Preview page location inside a project.
pub const PREVIEW_DIR: &str = ".livepad";
pub const PREVIEW_FILE: &str = "preview.html";

/// Canonical path of an existing project directory.
pub fn resolve_project_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        anyhow::bail!("Project directory does not exist: {}", dir.display());
    }
    dir.canonicalize()
        .with_context(|| format!("Failed to canonicalize project directory: {}", dir.display()))
}

/// Project name derived from the directory name.
pub fn project_name(dir: &Path) -> String {
    dir.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("livepad-project")
        .to_string()
}

/// `<dir>/.livepad/preview.html`
pub fn default_preview_path(dir: &Path) -> PathBuf {
    dir.join(PREVIEW_DIR).join(PREVIEW_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name() {
        assert_eq!(project_name(Path::new("/work/todo-app")), "todo-app");
        assert_eq!(project_name(Path::new("/")), "livepad-project");
    }

    #[test]
    fn test_resolve_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_project_dir(dir.path()).unwrap(),
            dir.path().canonicalize().unwrap()
        );
        assert!(resolve_project_dir(&dir.path().join("missing")).is_err());
    }
}
