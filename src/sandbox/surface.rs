//! Preview surfaces: where a sandbox document is mounted.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::bridge::RUNTIME_ERROR_TYPE;
use super::document::SandboxDocument;
use super::SandboxHandle;
use crate::error::SurfaceError;

/// An isolated execution context host.
///
/// `mount` receives a freshly created handle every time; a surface never
/// reuses a context across handles.
pub trait PreviewSurface: Send {
    fn mount(&mut self, handle: &SandboxHandle, document: &SandboxDocument)
        -> Result<(), SurfaceError>;

    fn destroy(&mut self, handle: &SandboxHandle);
}

/// Writes a host page that runs the document in a script-only sandboxed
/// iframe and shows runtime errors posted through the bridge.
pub struct FileSurface {
    path: PathBuf,
    open_in_browser: bool,
    opened: bool,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            open_in_browser: false,
            opened: false,
        }
    }

    /// Open the page in the default browser after the first mount.
    pub fn open_in_browser(mut self, open: bool) -> Self {
        self.open_in_browser = open;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreviewSurface for FileSurface {
    fn mount(
        &mut self,
        handle: &SandboxHandle,
        document: &SandboxDocument,
    ) -> Result<(), SurfaceError> {
        let write_error = |source| SurfaceError::Write {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(&self.path, host_page(handle, document)).map_err(write_error)?;
        info!("Mounted sandbox {} at {}", handle, self.path.display());

        if self.open_in_browser && !self.opened {
            self.opened = true;
            if let Err(e) = open::that(&self.path) {
                warn!("Could not open {} in a browser: {}", self.path.display(), e);
            }
        }
        Ok(())
    }

    fn destroy(&mut self, handle: &SandboxHandle) {
        // The next mount overwrites the page; nothing to tear down on disk.
        debug!("Destroyed sandbox {}", handle);
    }
}

/// Host page embedding the document as a `data:` URL.
///
/// The iframe only gets `allow-scripts`, so the document runs in an opaque
/// origin. The host listens for messages from that frame only.
pub fn host_page(handle: &SandboxHandle, document: &SandboxDocument) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="sandbox-handle" content="{handle}" />
    <meta name="sandbox-fingerprint" content="{fingerprint}" />
    <title>livepad preview</title>
    <style>
      html, body {{ margin: 0; height: 100%; }}
      iframe {{ border: 0; width: 100%; height: 100%; }}
      #runtime-error {{ position: fixed; bottom: 0; left: 0; right: 0; margin: 0; padding: 12px; background: #fee; color: #900; white-space: pre-wrap; font: 12px monospace; }}
    </style>
  </head>
  <body>
    <iframe id="sandbox" sandbox="allow-scripts" src="{url}"></iframe>
    <pre id="runtime-error" hidden></pre>
    <script>
      (function () {{
        var frame = document.getElementById("sandbox");
        var banner = document.getElementById("runtime-error");
        window.addEventListener("message", function (event) {{
          if (event.source !== frame.contentWindow) return;
          var data = event.data;
          if (!data || data.type !== "{kind}" || !data.error) return;
          var text = "Runtime error: " + data.error.message;
          if (data.error.stack) text += "\n\nStack trace:\n" + data.error.stack;
          banner.textContent = text;
          banner.hidden = false;
        }});
      }})();
    </script>
  </body>
</html>
"#,
        handle = handle,
        fingerprint = document.fingerprint,
        url = document.data_url(),
        kind = RUNTIME_ERROR_TYPE,
    )
}

#[cfg(test)]
pub use memory::{MemorySurface, SurfaceEvent};
