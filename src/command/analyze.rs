use anyhow::Result;
use std::path::Path;

use super::project::Project;
use crate::config::Config;
use crate::orchestrator::AnalyzeAction;

pub async fn run_analyze(
    config: &Config,
    dir: &Path,
    action: AnalyzeAction,
    file: Option<&str>,
) -> Result<()> {
    config.require_api_key()?;
    let project = Project::open(config, dir, None, false).await?;
    let result = project.handle.analyze(action, file, None).await;
    project.close().await;

    println!("{}", result?);
    Ok(())
}
