use anyhow::Result;
use std::path::Path;

use super::apply::apply_turn;
use super::project::Project;
use crate::config::Config;

/// Build; if the build failed, send the failure to the assistant as a fix
/// request and apply its answer.
pub async fn run_fix(config: &Config, dir: &Path) -> Result<()> {
    config.require_api_key()?;
    let project = Project::open(config, dir, None, false).await?;
    let result = fix(&project).await;
    project.close().await;
    result
}

async fn fix(project: &Project) -> Result<()> {
    project.settle().await?;
    let Some(seed) = project.handle.fix_seed().await? else {
        println!("Build successful! Nothing to fix.");
        return Ok(());
    };

    println!("{}\n", seed);
    apply_turn(project, None, false, |project| async move {
        project.handle.chat(&seed).await.map_err(anyhow::Error::from)
    })
    .await
}
