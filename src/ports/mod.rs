//! Collaborator ports.
//!
//! Persistence, command execution and chat completion are outside the core.
//! Each is a single-attempt fallible async call; failures come back as
//! [`CollaboratorError`] and are reported, never retried.

#[cfg(test)]
mod fakes;

use futures_util::future::BoxFuture;
use std::path::Path;

use crate::domain::ChatMessage;
use crate::error::CollaboratorError;

#[cfg(test)]
pub use fakes::{MemoryStorage, ScriptedChat, ScriptedRunner};

/// Canonical project storage.
///
/// Paths are project-relative without a leading slash.
pub trait FileStorage: Send + Sync {
    fn save<'a>(&'a self, path: &'a str, content: &'a str)
        -> BoxFuture<'a, Result<(), CollaboratorError>>;

    fn remove<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), CollaboratorError>>;

    /// Every stored file as `(path, content)`, sorted by path.
    fn list_files(&self) -> BoxFuture<'_, Result<Vec<(String, String)>, CollaboratorError>>;
}

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Non-blank lines of stdout, or of stderr when stdout is empty.
    pub fn lines(&self) -> Vec<String> {
        let text = if self.stdout.trim().is_empty() {
            &self.stderr
        } else {
            &self.stdout
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Runs terminal commands requested by the assistant.
pub trait CommandRunner: Send + Sync {
    fn exec<'a>(
        &'a self,
        command: &'a str,
        cwd: &'a Path,
    ) -> BoxFuture<'a, Result<CommandOutput, CollaboratorError>>;
}

/// Chat-completion backend.
pub trait ChatCompletion: Send + Sync {
    fn complete<'a>(
        &'a self,
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
    ) -> BoxFuture<'a, Result<String, CollaboratorError>>;
}
