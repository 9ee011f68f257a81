mod args;
mod paths;

pub use args::{Cli, Commands};
pub use paths::{default_preview_path, project_name, resolve_project_dir, PREVIEW_DIR, PREVIEW_FILE};
