//! Local project storage: a directory on disk is the canonical copy of the
//! project.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::CollaboratorError;
use crate::ports::FileStorage;
use crate::vfs::paths::normalize;

use super::scanner::scan_project;

/// Stores project files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalProjectStorage {
    root: PathBuf,
}

impl LocalProjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a project-relative path. `..` segments cannot
    /// climb out of the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, CollaboratorError> {
        let canonical =
            normalize(path).map_err(|e| CollaboratorError::Storage(e.to_string()))?;
        Ok(self.root.join(canonical.trim_start_matches('/')))
    }
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> CollaboratorError {
    CollaboratorError::Storage(format!("Failed to {} {}: {}", action, path.display(), e))
}

impl FileStorage for LocalProjectStorage {
    fn save<'a>(
        &'a self,
        path: &'a str,
        content: &'a str,
    ) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        async move {
            let target = self.resolve(path)?;
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| storage_error("create", parent, e))?;
            }
            tokio::fs::write(&target, content)
                .await
                .map_err(|e| storage_error("write", &target, e))?;
            debug!("Saved {}", target.display());
            Ok(())
        }
        .boxed()
    }

    fn remove<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        async move {
            let target = self.resolve(path)?;
            match tokio::fs::remove_file(&target).await {
                Ok(()) => {
                    debug!("Removed {}", target.display());
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(storage_error("remove", &target, e)),
            }
        }
        .boxed()
    }

    fn list_files(&self) -> BoxFuture<'_, Result<Vec<(String, String)>, CollaboratorError>> {
        async move {
            let root = self.root.clone();
            tokio::task::spawn_blocking(move || scan_project(&root))
                .await
                .map_err(|e| CollaboratorError::Storage(format!("Project scan failed: {}", e)))
        }
        .boxed()
    }
}
