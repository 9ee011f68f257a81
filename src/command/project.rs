//! Opening a project directory as a live session.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::api::AnthropicClient;
use crate::cli::{default_preview_path, project_name, resolve_project_dir};
use crate::config::Config;
use crate::exec::ShellRunner;
use crate::orchestrator::{Collaborators, SessionHandle, SessionRegistry, SessionSnapshot, TurnReport};
use crate::sandbox::FileSurface;
use crate::vfs::AppliedKind;
use crate::workspace::LocalProjectStorage;

/// An open project and the registry that owns its session.
pub struct Project {
    registry: SessionRegistry,
    pub handle: SessionHandle,
    pub root: PathBuf,
    pub preview: PathBuf,
}

impl Project {
    /// Load `dir` into a session that renders to `preview`
    /// (default `<dir>/.livepad/preview.html`).
    pub async fn open(
        config: &Config,
        dir: &Path,
        preview: Option<PathBuf>,
        open_browser: bool,
    ) -> Result<Self> {
        let root = resolve_project_dir(dir)?;
        let preview = preview.unwrap_or_else(|| default_preview_path(&root));
        let name = project_name(&root);
        debug!("Opening {} from {}", name, root.display());

        let chat = AnthropicClient::new(
            config.api_url.clone(),
            config.api_key.clone().unwrap_or_default(),
            config.model.clone(),
            config.max_tokens,
        )?;
        let collaborators = Collaborators {
            storage: Arc::new(LocalProjectStorage::new(&root)),
            runner: Arc::new(ShellRunner::new(config.command_timeout())),
            chat: Arc::new(chat),
        };
        let surface = FileSurface::new(&preview).open_in_browser(open_browser);

        let mut registry = SessionRegistry::new();
        let handle = registry
            .open(
                config.session_config(&name, &root)?,
                collaborators,
                Box::new(surface),
            )
            .await
            .with_context(|| format!("Failed to open project {}", root.display()))?;

        Ok(Self {
            registry,
            handle,
            root,
            preview,
        })
    }

    /// Wait for pending builds and return the session state.
    pub async fn settle(&self) -> Result<SessionSnapshot> {
        self.handle.settle().await?;
        Ok(self.handle.snapshot().await?)
    }

    pub async fn close(mut self) {
        self.registry.close_all().await;
    }
}

pub fn print_report(report: &TurnReport) {
    if !report.parsed.display_text.is_empty() {
        println!("{}\n", report.parsed.display_text);
    }
    if report.applied_suggestion {
        println!("Applied suggested code to the active file");
    }
    for applied in &report.apply.applied {
        let verb = match applied.kind {
            AppliedKind::Created => "Created",
            AppliedKind::Updated => "Updated",
            AppliedKind::Deleted => "Deleted",
        };
        println!("{} {}", verb, applied.path);
    }
    for skipped in &report.apply.skipped {
        println!("Skipped {}: {}", skipped.operation.path(), skipped.reason);
    }
    for notice in &report.notices {
        eprintln!("⚠️  {}", notice);
    }
}

/// Print the output panel. Fails when the latest build failed.
pub fn print_build(snapshot: &SessionSnapshot, preview: &Path) -> Result<()> {
    println!("{}", snapshot.output);
    if snapshot.last_failure.is_some() {
        anyhow::bail!("Build failed");
    }
    if snapshot.sandbox.is_some() {
        println!("Preview: {}", preview.display());
    }
    Ok(())
}
