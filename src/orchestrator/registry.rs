//! Registry of open project sessions.
//!
//! Sessions are created when a project is opened and torn down when it is
//! closed or when the user switches to another project.

use std::collections::HashMap;
use std::path::Path;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::sandbox::PreviewSurface;

use super::session::{Collaborators, Session, SessionConfig, SessionHandle};

/// Namespace for project ids derived from directory paths.
const PROJECT_NAMESPACE: Uuid = Uuid::from_bytes([
    0x3c, 0x1f, 0x5e, 0x62, 0x8a, 0x40, 0x4d, 0x2b, 0x9e, 0x11, 0x7d, 0x53, 0xa0, 0xc4, 0x6e, 0x98,
]);

/// Deterministic project id for a project directory.
pub fn project_id(root: &Path) -> Uuid {
    let normalized = root.to_string_lossy().replace('\\', "/");
    Uuid::new_v5(&PROJECT_NAMESPACE, normalized.trim_end_matches('/').as_bytes())
}

struct Entry {
    handle: SessionHandle,
    task: JoinHandle<()>,
}

/// Open sessions keyed by project id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<Uuid, Entry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a project and start its session.
    pub async fn open(
        &mut self,
        config: SessionConfig,
        collaborators: Collaborators,
        surface: Box<dyn PreviewSurface>,
    ) -> Result<SessionHandle, SessionError> {
        let id = project_id(&config.root);
        if self.sessions.contains_key(&id) {
            return Err(SessionError::AlreadyOpen(id.to_string()));
        }

        let (handle, task) = Session::spawn(id, config, collaborators, surface).await?;
        self.sessions.insert(
            id,
            Entry {
                handle: handle.clone(),
                task,
            },
        );
        Ok(handle)
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.handle.clone())
    }

    pub fn is_open(&self, id: &Uuid) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close a project: stop its actor and destroy its sandbox.
    pub async fn close(&mut self, id: &Uuid) -> Result<(), SessionError> {
        let entry = self
            .sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotOpen(id.to_string()))?;

        if let Err(e) = entry.handle.shutdown().await {
            warn!("Session {} was already stopped: {}", id, e);
        }
        if let Err(e) = entry.task.await {
            warn!("Session task for {} ended abnormally: {}", id, e);
        }
        info!("Closed project {}", id);
        Ok(())
    }

    /// Make `config.root` the only open project, closing every other one.
    pub async fn switch(
        &mut self,
        config: SessionConfig,
        collaborators: Collaborators,
        surface: Box<dyn PreviewSurface>,
    ) -> Result<SessionHandle, SessionError> {
        let target = project_id(&config.root);
        let others: Vec<Uuid> = self
            .sessions
            .keys()
            .filter(|id| **id != target)
            .copied()
            .collect();
        for id in others {
            self.close(&id).await?;
        }

        match self.get(&target) {
            Some(handle) => Ok(handle),
            None => self.open(config, collaborators, surface).await,
        }
    }

    pub async fn close_all(&mut self) {
        let ids: Vec<Uuid> = self.sessions.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.close(&id).await {
                warn!("Failed to close {}: {}", id, e);
            }
        }
    }
}
