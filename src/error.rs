//! Error taxonomy.
//!
//! Parser-level problems never surface as errors: they are logged and the
//! offending block is skipped. Everything that can reach the user lives here.

use thiserror::Error;

use crate::bundler::Diagnostic;

/// Errors raised by the virtual file store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Cannot delete the last file: {0}")]
    LastFile(String),
}

/// The bundler could not produce an artifact.
///
/// No partial artifact exists when this is returned; the previously rendered
/// preview stays visible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Build failed with {} error(s)", .diagnostics.len())]
pub struct BuildFailure {
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildFailure {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn single(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

/// A call to an external collaborator (storage, command runner, chat
/// completion) failed. Single attempt, reported to the user as a notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Command `{command}` failed: {message}")]
    Exec { command: String, message: String },
    #[error("Command `{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },
    #[error("{0}")]
    Completion(String),
}

/// Errors raised by a preview surface while mounting a sandbox document.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Failed to write preview document to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the session registry and session handles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Project {0} is already open")]
    AlreadyOpen(String),
    #[error("Project {0} is not open")]
    NotOpen(String),
    #[error("Session for project {0} has shut down")]
    Closed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}
