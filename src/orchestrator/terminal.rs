//! Terminal relay for assistant-requested commands.

use std::path::Path;
use tracing::{info, warn};

use crate::error::CollaboratorError;
use crate::ports::CommandRunner;

/// Result of running one response's commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalRun {
    /// Terminal log lines, in execution order.
    pub lines: Vec<String>,
    pub failures: Vec<CollaboratorError>,
}

/// Run `commands` one after another in `cwd`.
///
/// Each command is awaited before the next starts; a failure is recorded
/// and the remaining commands still run.
pub async fn run_commands(runner: &dyn CommandRunner, cwd: &Path, commands: &[String]) -> TerminalRun {
    let mut run = TerminalRun::default();

    for command in commands {
        run.lines.push(format!("$ {} (executed by AI)", command));
        match runner.exec(command, cwd).await {
            Ok(output) => {
                info!("Command `{}` finished", command);
                run.lines.extend(output.lines());
            }
            Err(e) => {
                warn!("Command `{}` failed: {}", command, e);
                run.lines.push(format!("Error: {}", e));
                run.failures.push(e);
            }
        }
    }

    run
}
