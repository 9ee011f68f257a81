//! Per-project orchestration actor.
//!
//! One tokio task owns the project's store, build scheduler, renderer and
//! conversation. Everything else talks to it through a [`SessionHandle`].
//! Builds run on the blocking pool against a snapshot of the store, so the
//! actor keeps accepting edits while a build is in flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bundler::{bundle, BuildArtifact, Diagnostic};
use crate::domain::{ChatMessage, ParsedResponse};
use crate::error::{BuildFailure, SessionError, StoreError};
use crate::ports::{ChatCompletion, CommandRunner, FileStorage};
use crate::protocol::ResponseParser;
use crate::sandbox::{PreviewSurface, RuntimeError, SandboxHandle, SandboxRenderer};
use crate::vfs::template::react_starter_files;
use crate::vfs::{apply_operations, AppliedKind, ApplyReport, OperationPolicy, VirtualFileStore};

use super::prompts::{
    analysis_prompt, build_error_seed, failure_output, runtime_output, success_output,
    system_prompt, terminal_seed, AnalyzeAction, ANALYSIS_SYSTEM_PROMPT, PROTOCOL_INSTRUCTIONS,
};
use super::scheduler::{BuildScheduler, BuildState, Completion};
use super::terminal::{run_commands, TerminalRun};

/// Turns a store snapshot into an artifact.
pub type Builder =
    Arc<dyn Fn(&VirtualFileStore) -> Result<BuildArtifact, BuildFailure> + Send + Sync>;

const COMMAND_BUFFER: usize = 64;

/// File opened in the editor when a project is loaded, if present.
const DEFAULT_ACTIVE_FILE: &str = "/src/App.tsx";

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub project_name: String,
    /// Project directory; working directory for terminal commands.
    pub root: PathBuf,
    pub debounce: Duration,
    pub policy: OperationPolicy,
    pub apply_suggested_code: bool,
    /// Protocol instructions placed before the context section.
    pub instructions: String,
}

impl SessionConfig {
    pub fn new(project_name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            project_name: project_name.into(),
            root: root.into(),
            debounce: Duration::from_millis(1000),
            policy: OperationPolicy::default(),
            apply_suggested_code: false,
            instructions: PROTOCOL_INSTRUCTIONS.to_string(),
        }
    }
}

/// The external collaborators a session uses.
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn FileStorage>,
    pub runner: Arc<dyn CommandRunner>,
    pub chat: Arc<dyn ChatCompletion>,
}

/// Result of a build that was not superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success {
        generation: u64,
        /// `None` when the preview surface failed to mount.
        sandbox: Option<SandboxHandle>,
        warnings: Vec<Diagnostic>,
    },
    Failed {
        generation: u64,
        failure: BuildFailure,
    },
}

impl BuildOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            BuildOutcome::Success { generation, .. } | BuildOutcome::Failed { generation, .. } => {
                *generation
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success { .. })
    }
}

/// What one assistant response did to the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub parsed: ParsedResponse,
    pub apply: ApplyReport,
    /// Whether the suggested code replaced the active file.
    pub applied_suggestion: bool,
    /// Collaborator failures raised while applying the response.
    pub notices: Vec<String>,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub project_id: Uuid,
    pub project_name: String,
    pub state: BuildState,
    pub generation: u64,
    /// Text shown in the output panel.
    pub output: String,
    pub last_failure: Option<String>,
    pub runtime_error: Option<RuntimeError>,
    pub sandbox: Option<SandboxHandle>,
    pub active_file: Option<String>,
    pub files: Vec<String>,
    pub history: Vec<ChatMessage>,
    pub terminal: Vec<String>,
    pub notices: Vec<String>,
}

struct TurnContext {
    system_prompt: String,
    /// The conversation so far plus the new user message.
    messages: Vec<ChatMessage>,
}

enum Command {
    Edit {
        path: String,
        content: String,
        reply: oneshot::Sender<Result<String, StoreError>>,
    },
    SetActiveFile {
        path: String,
        reply: oneshot::Sender<Result<String, StoreError>>,
    },
    ReadFile {
        path: Option<String>,
        reply: oneshot::Sender<Result<(String, String), StoreError>>,
    },
    Rebuild {
        reply: oneshot::Sender<BuildOutcome>,
    },
    Settle {
        reply: oneshot::Sender<Option<BuildOutcome>>,
    },
    BeginTurn {
        message: ChatMessage,
        reply: oneshot::Sender<TurnContext>,
    },
    ApplyResponse {
        /// User message that produced the response, recorded with it.
        prompt: Option<ChatMessage>,
        raw: String,
        reply: oneshot::Sender<TurnReport>,
    },
    RecordTerminal {
        lines: Vec<String>,
        reply: oneshot::Sender<()>,
    },
    RuntimeMessage {
        sandbox: SandboxHandle,
        payload: String,
        reply: oneshot::Sender<Option<RuntimeError>>,
    },
    FixSeed {
        reply: oneshot::Sender<Option<String>>,
    },
    TerminalSeed {
        reply: oneshot::Sender<Option<String>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    project_id: Uuid,
    root: PathBuf,
    commands: mpsc::Sender<Command>,
    collaborators: Collaborators,
}

impl SessionHandle {
    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| self.closed())?;
        response.await.map_err(|_| self.closed())
    }

    fn closed(&self) -> SessionError {
        SessionError::Closed(self.project_id.to_string())
    }

    /// A user edit. Rebuilds after the debounce delay.
    pub async fn edit(&self, path: &str, content: &str) -> Result<String, SessionError> {
        let path = path.to_string();
        let content = content.to_string();
        Ok(self
            .call(|reply| Command::Edit {
                path,
                content,
                reply,
            })
            .await??)
    }

    pub async fn set_active_file(&self, path: &str) -> Result<String, SessionError> {
        let path = path.to_string();
        Ok(self
            .call(|reply| Command::SetActiveFile { path, reply })
            .await??)
    }

    /// Content of `path`, or of the active file. Returns `(path, content)`.
    pub async fn read_file(&self, path: Option<&str>) -> Result<(String, String), SessionError> {
        let path = path.map(str::to_string);
        Ok(self.call(|reply| Command::ReadFile { path, reply }).await??)
    }

    /// Explicit rebuild; resolves once a build that saw this request ends.
    pub async fn rebuild(&self) -> Result<BuildOutcome, SessionError> {
        self.call(|reply| Command::Rebuild { reply }).await
    }

    /// Wait for pending and in-flight builds to finish, then return the
    /// latest outcome.
    pub async fn settle(&self) -> Result<Option<BuildOutcome>, SessionError> {
        self.call(|reply| Command::Settle { reply }).await
    }

    /// Apply an assistant response that was produced elsewhere.
    pub async fn apply_response(&self, raw: &str) -> Result<TurnReport, SessionError> {
        let raw = raw.to_string();
        self.call(|reply| Command::ApplyResponse {
            prompt: None,
            raw,
            reply,
        })
        .await
    }

    /// One AI turn: send `message` with the conversation so far, then apply
    /// the response.
    ///
    /// The message joins the history only together with its reply; a failed
    /// completion leaves the history unchanged.
    pub async fn chat(&self, message: &str) -> Result<TurnReport, SessionError> {
        let prompt = ChatMessage::user(message);
        let turn = prompt.clone();
        let context = self
            .call(|reply| Command::BeginTurn {
                message: turn,
                reply,
            })
            .await?;
        let raw = self
            .collaborators
            .chat
            .complete(&context.system_prompt, &context.messages)
            .await
            .map_err(|e| {
                warn!("Chat completion failed: {}", e);
                e
            })?;
        self.call(|reply| Command::ApplyResponse {
            prompt: Some(prompt),
            raw,
            reply,
        })
        .await
    }

    /// Run a response's terminal commands in order and log their output.
    pub async fn run_commands(&self, commands: &[String]) -> Result<TerminalRun, SessionError> {
        let run = run_commands(self.collaborators.runner.as_ref(), &self.root, commands).await;
        let lines = run.lines.clone();
        self.call(|reply| Command::RecordTerminal { lines, reply })
            .await?;
        Ok(run)
    }

    /// Deliver a message posted by a sandbox.
    pub async fn runtime_message(
        &self,
        sandbox: &SandboxHandle,
        payload: &str,
    ) -> Result<Option<RuntimeError>, SessionError> {
        let sandbox = sandbox.clone();
        let payload = payload.to_string();
        self.call(|reply| Command::RuntimeMessage {
            sandbox,
            payload,
            reply,
        })
        .await
    }

    /// Seed for asking the assistant about the current build or runtime
    /// error, if there is one.
    pub async fn fix_seed(&self) -> Result<Option<String>, SessionError> {
        self.call(|reply| Command::FixSeed { reply }).await
    }

    pub async fn terminal_seed(&self) -> Result<Option<String>, SessionError> {
        self.call(|reply| Command::TerminalSeed { reply }).await
    }

    /// Single-turn analysis of `path` (or the active file). Not part of the
    /// conversation history.
    pub async fn analyze(
        &self,
        action: AnalyzeAction,
        path: Option<&str>,
        selection: Option<&str>,
    ) -> Result<String, SessionError> {
        let (_, code) = self.read_file(path).await?;
        let prompt = analysis_prompt(action, &code, selection);
        let reply = self
            .collaborators
            .chat
            .complete(ANALYSIS_SYSTEM_PROMPT, &[ChatMessage::user(prompt)])
            .await?;
        Ok(reply)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.call(|reply| Command::Snapshot { reply }).await
    }

    /// Stop the actor and tear down its sandbox.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.call(|reply| Command::Shutdown { reply }).await
    }
}

/// Session actor state.
pub struct Session {
    project_id: Uuid,
    config: SessionConfig,
    storage: Arc<dyn FileStorage>,
    builder: Builder,
    store: VirtualFileStore,
    active_file: Option<String>,
    scheduler: BuildScheduler,
    renderer: SandboxRenderer,
    build_results: mpsc::UnboundedSender<(u64, Result<BuildArtifact, BuildFailure>)>,
    last_outcome: Option<BuildOutcome>,
    rebuild_waiters: Vec<oneshot::Sender<BuildOutcome>>,
    settle_waiters: Vec<oneshot::Sender<Option<BuildOutcome>>>,
    output: String,
    runtime_error: Option<RuntimeError>,
    history: Vec<ChatMessage>,
    terminal: Vec<String>,
    notices: Vec<String>,
}

impl Session {
    /// Load the project from storage and start its actor.
    ///
    /// An empty project is seeded with the starter template. The first
    /// build is requested immediately.
    pub async fn spawn(
        project_id: Uuid,
        config: SessionConfig,
        collaborators: Collaborators,
        surface: Box<dyn PreviewSurface>,
    ) -> Result<(SessionHandle, JoinHandle<()>), SessionError> {
        Self::spawn_with_builder(project_id, config, collaborators, surface, Arc::new(bundle)).await
    }

    pub async fn spawn_with_builder(
        project_id: Uuid,
        config: SessionConfig,
        collaborators: Collaborators,
        surface: Box<dyn PreviewSurface>,
        builder: Builder,
    ) -> Result<(SessionHandle, JoinHandle<()>), SessionError> {
        let storage = collaborators.storage.clone();
        let mut files = storage.list_files().await?;
        if files.is_empty() {
            info!("Project {} is empty, seeding starter template", config.project_name);
            for (path, content) in react_starter_files(&config.project_name) {
                let relative = path.trim_start_matches('/');
                storage.save(relative, &content).await?;
                files.push((relative.to_string(), content));
            }
        }

        let store = VirtualFileStore::from_files(files)?;
        let active_file = if store.contains(DEFAULT_ACTIVE_FILE) {
            Some(DEFAULT_ACTIVE_FILE.to_string())
        } else {
            store.first_path().map(str::to_string)
        };
        info!(
            "Opened project {} ({}) with {} file(s)",
            config.project_name,
            project_id,
            store.len()
        );

        let (build_results, results_rx) = mpsc::unbounded_channel();
        let (commands, commands_rx) = mpsc::channel(COMMAND_BUFFER);

        let mut scheduler = BuildScheduler::new(config.debounce);
        scheduler.request(Instant::now());

        let handle = SessionHandle {
            project_id,
            root: config.root.clone(),
            commands,
            collaborators,
        };

        let session = Session {
            project_id,
            config,
            storage,
            builder,
            store,
            active_file,
            scheduler,
            renderer: SandboxRenderer::new(surface),
            build_results,
            last_outcome: None,
            rebuild_waiters: Vec::new(),
            settle_waiters: Vec::new(),
            output: String::new(),
            runtime_error: None,
            history: Vec::new(),
            terminal: Vec::new(),
            notices: Vec::new(),
        };

        let task = tokio::spawn(session.run(commands_rx, results_rx));
        Ok((handle, task))
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut results: mpsc::UnboundedReceiver<(u64, Result<BuildArtifact, BuildFailure>)>,
    ) {
        loop {
            let deadline = self
                .scheduler
                .deadline()
                .filter(|_| !self.scheduler.is_building());
            let wake = deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.renderer.teardown();
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                Some((generation, result)) = results.recv() => self.complete(generation, result),
                _ = sleep_until(wake), if deadline.is_some() => self.start_build(),
            }
        }

        self.renderer.teardown();
        info!("Session for {} stopped", self.config.project_name);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Edit {
                path,
                content,
                reply,
            } => {
                let result = self.store.put(&path, content);
                if let Ok(canonical) = &result {
                    self.persist_save(canonical).await;
                    self.scheduler.edit(Instant::now());
                }
                let _ = reply.send(result);
            }
            Command::SetActiveFile { path, reply } => {
                let result = crate::vfs::paths::normalize(&path).and_then(|canonical| {
                    if self.store.contains(&canonical) {
                        self.active_file = Some(canonical.clone());
                        Ok(canonical)
                    } else {
                        Err(StoreError::NotFound(canonical))
                    }
                });
                let _ = reply.send(result);
            }
            Command::ReadFile { path, reply } => {
                let _ = reply.send(self.read_file(path));
            }
            Command::Rebuild { reply } => {
                info!("Rebuild requested");
                self.scheduler.request(Instant::now());
                self.rebuild_waiters.push(reply);
            }
            Command::Settle { reply } => {
                if self.scheduler.is_building() || self.scheduler.deadline().is_some() {
                    self.settle_waiters.push(reply);
                } else {
                    let _ = reply.send(self.last_outcome.clone());
                }
            }
            Command::BeginTurn { message, reply } => {
                let active_content = self
                    .active_file
                    .as_deref()
                    .and_then(|path| self.store.content(path));
                let context = TurnContext {
                    system_prompt: system_prompt(
                        &self.config.instructions,
                        &self.config.project_name,
                        self.active_file.as_deref(),
                        active_content,
                    ),
                    messages: self.history.iter().cloned().chain([message]).collect(),
                };
                let _ = reply.send(context);
            }
            Command::ApplyResponse { prompt, raw, reply } => {
                if let Some(prompt) = prompt {
                    self.history.push(prompt);
                }
                let report = self.apply_response(&raw).await;
                let _ = reply.send(report);
            }
            Command::RecordTerminal { lines, reply } => {
                self.terminal.extend(lines);
                let _ = reply.send(());
            }
            Command::RuntimeMessage {
                sandbox,
                payload,
                reply,
            } => {
                let error = self.renderer.receive(&sandbox, &payload);
                if let Some(error) = &error {
                    warn!("Runtime error in sandbox {}: {}", sandbox, error.message);
                    self.output = runtime_output(error);
                    self.runtime_error = Some(error.clone());
                }
                let _ = reply.send(error);
            }
            Command::FixSeed { reply } => {
                let seed = match (self.scheduler.last_failure(), &self.runtime_error) {
                    (Some(failure), _) => Some(build_error_seed(failure)),
                    (None, Some(error)) => Some(build_error_seed(&runtime_output(error))),
                    (None, None) => None,
                };
                let _ = reply.send(seed);
            }
            Command::TerminalSeed { reply } => {
                let _ = reply.send(terminal_seed(&self.terminal));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn read_file(&self, path: Option<String>) -> Result<(String, String), StoreError> {
        let path = match path {
            Some(path) => crate::vfs::paths::normalize(&path)?,
            None => self
                .active_file
                .clone()
                .ok_or_else(|| StoreError::NotFound("(no active file)".to_string()))?,
        };
        match self.store.content(&path) {
            Some(content) => Ok((path.clone(), content.to_string())),
            None => Err(StoreError::NotFound(path)),
        }
    }

    async fn apply_response(&mut self, raw: &str) -> TurnReport {
        let parser = ResponseParser::with_active_file(self.active_file.as_deref());
        let parsed = parser.parse(raw);
        self.history
            .push(ChatMessage::assistant(parsed.display_text.clone()));

        let notices_before = self.notices.len();
        let mut applied_suggestion = false;

        if self.config.apply_suggested_code {
            if let (Some(code), Some(active)) = (&parsed.suggested_code, self.active_file.clone()) {
                if self.store.set_content(&active, code.clone()).is_ok() {
                    debug!("Applied suggested code to {}", active);
                    self.persist_save(&active).await;
                    applied_suggestion = true;
                }
            }
        }

        let report = apply_operations(
            &mut self.store,
            &parsed.file_operations,
            &self.config.policy,
            &mut self.active_file,
        );

        for applied in &report.applied {
            match applied.kind {
                AppliedKind::Created | AppliedKind::Updated => self.persist_save(&applied.path).await,
                AppliedKind::Deleted => self.persist_remove(&applied.path).await,
            }
        }

        if report.changed() || applied_suggestion {
            info!(
                "Applied {} operation(s), skipped {}; rebuilding",
                report.applied.len(),
                report.skipped.len()
            );
            self.scheduler.request(Instant::now());
        }

        TurnReport {
            parsed,
            apply: report,
            applied_suggestion,
            notices: self.notices[notices_before..].to_vec(),
        }
    }

    async fn persist_save(&mut self, path: &str) {
        let Some(content) = self.store.content(path) else {
            return;
        };
        let relative = path.trim_start_matches('/');
        if let Err(e) = self.storage.save(relative, content).await {
            self.notice(format!("Failed to save {}: {}", relative, e));
        }
    }

    async fn persist_remove(&mut self, path: &str) {
        let relative = path.trim_start_matches('/');
        if let Err(e) = self.storage.remove(relative).await {
            self.notice(format!("Failed to delete {}: {}", relative, e));
        }
    }

    fn notice(&mut self, message: String) {
        warn!("{}", message);
        self.notices.push(message);
    }

    fn start_build(&mut self) {
        let generation = self.scheduler.start();
        let snapshot = self.store.clone();
        let builder = self.builder.clone();
        let results = self.build_results.clone();
        info!("Build {} started ({} file(s))", generation, snapshot.len());

        tokio::spawn(async move {
            let result = match tokio::task::spawn_blocking(move || builder(&snapshot)).await {
                Ok(result) => result,
                Err(e) => Err(BuildFailure::single(Diagnostic::error(
                    format!("Bundler task failed: {}", e),
                    None,
                ))),
            };
            let _ = results.send((generation, result));
        });
    }

    fn complete(&mut self, generation: u64, result: Result<BuildArtifact, BuildFailure>) {
        let failure_text = result.as_ref().err().map(failure_output);
        if self.scheduler.finish(generation, failure_text.clone()) == Completion::Stale {
            info!("Dropping stale build {}", generation);
            return;
        }

        let outcome = match result {
            Ok(artifact) => {
                let sandbox = match self
                    .renderer
                    .render(generation, &artifact.code, &artifact.stylesheets)
                {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        self.notice(format!("Failed to mount preview: {}", e));
                        None
                    }
                };
                info!("Build {} succeeded", generation);
                self.output = success_output(&artifact.diagnostics);
                self.runtime_error = None;
                BuildOutcome::Success {
                    generation,
                    sandbox,
                    warnings: artifact.diagnostics,
                }
            }
            Err(failure) => {
                warn!("Build {} failed: {}", generation, failure);
                self.output = failure_text.unwrap_or_default();
                BuildOutcome::Failed {
                    generation,
                    failure,
                }
            }
        };

        for waiter in self.rebuild_waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }
        if self.scheduler.deadline().is_none() {
            for waiter in self.settle_waiters.drain(..) {
                let _ = waiter.send(Some(outcome.clone()));
            }
        }
        self.last_outcome = Some(outcome);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            project_id: self.project_id,
            project_name: self.config.project_name.clone(),
            state: self.scheduler.state(),
            generation: self.scheduler.generation(),
            output: self.output.clone(),
            last_failure: self.scheduler.last_failure().map(str::to_string),
            runtime_error: self.runtime_error.clone(),
            sandbox: self.renderer.current().cloned(),
            active_file: self.active_file.clone(),
            files: self.store.paths().map(str::to_string).collect(),
            history: self.history.clone(),
            terminal: self.terminal.clone(),
            notices: self.notices.clone(),
        }
    }
}

