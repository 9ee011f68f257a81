use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::project_name;
use crate::ports::FileStorage;
use crate::vfs::template::{react_starter_files, sanitize_project_name};
use crate::workspace::{scan_project, LocalProjectStorage};

pub async fn run_init(dir: &Path, name: Option<String>) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create project directory: {}", dir.display()))?;

    let root = dir.to_path_buf();
    let existing = tokio::task::spawn_blocking(move || scan_project(&root)).await?;
    if !existing.is_empty() {
        anyhow::bail!(
            "Project directory is not empty: {} ({} file(s))",
            dir.display(),
            existing.len()
        );
    }

    let name = sanitize_project_name(&name.unwrap_or_else(|| project_name(dir)));
    let storage = LocalProjectStorage::new(dir);
    for (path, content) in react_starter_files(&name) {
        storage.save(path, &content).await?;
        println!("  {}", path.trim_start_matches('/'));
    }

    println!("\n✅ Created {} in {}", name, dir.display());
    println!("   Run 'livepad build {}' to preview it.", dir.display());
    Ok(())
}
