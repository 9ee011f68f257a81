//! In-memory collaborators for tests.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{ChatCompletion, CommandOutput, CommandRunner, FileStorage};
use crate::domain::ChatMessage;
use crate::error::CollaboratorError;

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<BTreeMap<String, String>>>,
    fail: Arc<Mutex<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let storage = Self::new();
        {
            let mut map = storage.files.lock().unwrap();
            for (path, content) in files {
                map.insert(path.to_string(), content.to_string());
            }
        }
        storage
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    fn check(&self) -> Result<(), CollaboratorError> {
        if *self.fail.lock().unwrap() {
            Err(CollaboratorError::Storage("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

impl FileStorage for MemoryStorage {
    fn save<'a>(
        &'a self,
        path: &'a str,
        content: &'a str,
    ) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        async move {
            self.check()?;
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), content.to_string());
            Ok(())
        }
        .boxed()
    }

    fn remove<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        async move {
            self.check()?;
            self.files.lock().unwrap().remove(path);
            Ok(())
        }
        .boxed()
    }

    fn list_files(&self) -> BoxFuture<'_, Result<Vec<(String, String)>, CollaboratorError>> {
        async move {
            self.check()?;
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        }
        .boxed()
    }
}

/// Returns canned results per command and records every call in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    results: Arc<Mutex<HashMap<String, Result<CommandOutput, CollaboratorError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, command: &str, result: Result<CommandOutput, CollaboratorError>) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(command.to_string(), result);
        self
    }

    pub fn stdout(self, command: &str, stdout: &str) -> Self {
        self.on(
            command,
            Ok(CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        )
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn exec<'a>(
        &'a self,
        command: &'a str,
        _cwd: &'a Path,
    ) -> BoxFuture<'a, Result<CommandOutput, CollaboratorError>> {
        async move {
            self.calls.lock().unwrap().push(command.to_string());
            self.results
                .lock()
                .unwrap()
                .get(command)
                .cloned()
                .unwrap_or_else(|| Ok(CommandOutput::default()))
        }
        .boxed()
    }
}

/// Replies from a queue; records the prompt and history of every request.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChat {
    replies: Arc<Mutex<VecDeque<Result<String, CollaboratorError>>>>,
    requests: Arc<Mutex<Vec<(String, Vec<ChatMessage>)>>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: CollaboratorError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl ChatCompletion for ScriptedChat {
    fn complete<'a>(
        &'a self,
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
    ) -> BoxFuture<'a, Result<String, CollaboratorError>> {
        async move {
            self.requests
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), messages.to_vec()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CollaboratorError::Completion("no reply queued".to_string())))
        }
        .boxed()
    }
}
