//! Sandbox renderer.
//!
//! Turns a bundle plus its stylesheets into a self-contained document and
//! mounts it on a preview surface. Every render destroys the previous
//! execution context first and mounts into a brand new one, identified by a
//! fresh [`SandboxHandle`].

mod bridge;
mod document;
mod surface;

use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SurfaceError;

pub use bridge::{decode_message, RuntimeError, BRIDGE_SCRIPT, RUNTIME_ERROR_TYPE};
pub use document::{escape_script, escape_style, SandboxDocument, RUNTIME_SCRIPTS};
pub use surface::{host_page, FileSurface, PreviewSurface};

#[cfg(test)]
pub use surface::{MemorySurface, SurfaceEvent};

/// Identity of one mounted execution context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandboxHandle {
    id: Uuid,
    build: u64,
}

impl SandboxHandle {
    /// A new handle for the artifact of `build`.
    pub fn new(build: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            build,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Build generation whose artifact this context runs.
    pub fn build(&self) -> u64 {
        self.build
    }
}

impl fmt::Display for SandboxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.id, self.build)
    }
}

struct Mounted {
    handle: SandboxHandle,
    document: SandboxDocument,
}

/// Owns the preview surface and the currently mounted context.
pub struct SandboxRenderer {
    surface: Box<dyn PreviewSurface>,
    current: Option<Mounted>,
}

impl SandboxRenderer {
    pub fn new(surface: Box<dyn PreviewSurface>) -> Self {
        Self {
            surface,
            current: None,
        }
    }

    /// Replace the running context with one executing `code`.
    ///
    /// The previous context is destroyed even if mounting the new one fails.
    pub fn render(
        &mut self,
        build: u64,
        code: &str,
        stylesheets: &[String],
    ) -> Result<SandboxHandle, SurfaceError> {
        self.teardown();

        let document = SandboxDocument::assemble(code, stylesheets);
        let handle = SandboxHandle::new(build);
        self.surface.mount(&handle, &document)?;
        info!(
            "Rendered build {} into sandbox {} ({} bytes)",
            build,
            handle,
            document.html.len()
        );

        self.current = Some(Mounted {
            handle: handle.clone(),
            document,
        });
        Ok(handle)
    }

    /// Destroy the running context, if any.
    pub fn teardown(&mut self) {
        if let Some(mounted) = self.current.take() {
            self.surface.destroy(&mounted.handle);
        }
    }

    pub fn current(&self) -> Option<&SandboxHandle> {
        self.current.as_ref().map(|m| &m.handle)
    }

    pub fn document(&self) -> Option<&SandboxDocument> {
        self.current.as_ref().map(|m| &m.document)
    }

    /// Accept a message posted by the sandbox identified by `handle`.
    ///
    /// Messages from destroyed contexts and messages of any other shape are
    /// dropped.
    pub fn receive(&self, handle: &SandboxHandle, payload: &str) -> Option<RuntimeError> {
        match self.current() {
            Some(current) if current == handle => decode_message(payload),
            _ => {
                debug!("Dropping message from inactive sandbox {}", handle);
                None
            }
        }
    }
}

impl Drop for SandboxRenderer {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERROR: &str = r#"{"type":"runtime-error","error":{"message":"boom"}}"#;

    #[test]
    fn test_render_replaces_context() {
        let surface = MemorySurface::new();
        let mut renderer = SandboxRenderer::new(Box::new(surface.clone()));

        let first = renderer.render(1, "1", &[]).unwrap();
        let second = renderer.render(2, "2", &[]).unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(renderer.current(), Some(&second));

        let events = surface.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], SurfaceEvent::Mounted { handle, .. } if *handle == first));
        assert_eq!(events[1], SurfaceEvent::Destroyed(first.clone()));
        assert!(matches!(&events[2], SurfaceEvent::Mounted { handle, .. } if *handle == second));
    }

    #[test]
    fn test_same_code_gets_fresh_context() {
        let surface = MemorySurface::new();
        let mut renderer = SandboxRenderer::new(Box::new(surface.clone()));
        let a = renderer.render(1, "same", &[]).unwrap();
        let b = renderer.render(1, "same", &[]).unwrap();
        assert_ne!(a, b);
        let docs = surface.documents();
        assert_eq!(docs[0].fingerprint, docs[1].fingerprint);
    }

    #[test]
    fn test_receive_only_from_current() {
        let mut renderer = SandboxRenderer::new(Box::new(MemorySurface::new()));
        let old = renderer.render(1, "1", &[]).unwrap();
        let current = renderer.render(2, "2", &[]).unwrap();

        assert_eq!(renderer.receive(&old, ERROR), None);
        assert_eq!(renderer.receive(&current, ERROR).unwrap().message, "boom");
        assert_eq!(renderer.receive(&current, r#"{"type":"ready"}"#), None);
    }

    #[test]
    fn test_drop_destroys_context() {
        let surface = MemorySurface::new();
        let handle = {
            let mut renderer = SandboxRenderer::new(Box::new(surface.clone()));
            renderer.render(1, "1", &[]).unwrap()
        };
        assert_eq!(surface.events().last(), Some(&SurfaceEvent::Destroyed(handle)));
    }
}
