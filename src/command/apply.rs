use anyhow::Result;
use std::path::Path;

use super::parse::read_input;
use super::project::{print_build, print_report, Project};
use crate::config::Config;
use crate::orchestrator::TurnReport;

pub async fn run_apply(
    config: &Config,
    dir: &Path,
    file: Option<&Path>,
    active_file: Option<&str>,
    run_commands: bool,
) -> Result<()> {
    let raw = read_input(file)?;
    let project = Project::open(config, dir, None, false).await?;
    let result = apply_turn(&project, active_file, run_commands, |project| async move {
        project.handle.apply_response(&raw).await.map_err(anyhow::Error::from)
    })
    .await;
    project.close().await;
    result
}

pub async fn run_chat(
    config: &Config,
    dir: &Path,
    message: &str,
    active_file: Option<&str>,
    run_commands: bool,
) -> Result<()> {
    config.require_api_key()?;
    let project = Project::open(config, dir, None, false).await?;
    let result = apply_turn(&project, active_file, run_commands, |project| async move {
        project.handle.chat(message).await.map_err(anyhow::Error::from)
    })
    .await;
    project.close().await;
    result
}

/// Run one turn against an open project, then its terminal commands, then
/// wait for the rebuild.
pub(super) async fn apply_turn<'a, F, Fut>(
    project: &'a Project,
    active_file: Option<&str>,
    run_commands: bool,
    turn: F,
) -> Result<()>
where
    F: FnOnce(&'a Project) -> Fut,
    Fut: std::future::Future<Output = Result<TurnReport>>,
{
    if let Some(path) = active_file {
        project.handle.set_active_file(path).await?;
    }

    let report = turn(project).await?;
    print_report(&report);

    if !report.parsed.terminal_commands.is_empty() {
        if run_commands {
            let run = project
                .handle
                .run_commands(&report.parsed.terminal_commands)
                .await?;
            for line in &run.lines {
                println!("{}", line);
            }
        } else {
            println!("Terminal commands (pass --run-commands to run them):");
            for command in &report.parsed.terminal_commands {
                println!("  $ {}", command);
            }
        }
    }

    let snapshot = project.settle().await?;
    print_build(&snapshot, &project.preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::run_init;

    #[tokio::test]
    async fn test_apply_writes_files_and_rebuilds() {
        let dir = tempfile::tempdir().unwrap();
        run_init(dir.path(), Some("demo".to_string())).await.unwrap();
        let response = dir.path().join("response.txt");
        std::fs::write(
            &response,
            "Adding a greeting.\n\
             <create_file>\n\
             <path>src/Greeting.tsx</path>\n\
             <content>\n\
             export const Greeting = () => <p>Hello</p>;\n\
             </content>\n\
             </create_file>",
        )
        .unwrap();

        let config = Config::default();
        run_apply(&config, dir.path(), Some(&response), None, false)
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("src/Greeting.tsx")).unwrap();
        assert_eq!(written, "export const Greeting = () => <p>Hello</p>;");
        assert!(dir.path().join(".livepad/preview.html").exists());
    }

    #[tokio::test]
    async fn test_chat_requires_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let err = run_chat(&config, dir.path(), "hi", None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }
}
