use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::orchestrator::AnalyzeAction;

/// livepad - live in-browser preview for AI-edited front-end projects
#[derive(Debug, Parser)]
#[command(name = "livepad")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ~/.livepad/config.json)
    #[arg(long, global = true, env = "LIVEPAD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write the React starter template to a project directory
    Init {
        dir: PathBuf,

        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Bundle a project and write its preview page
    Build {
        dir: PathBuf,

        /// Preview page path (defaults to <dir>/.livepad/preview.html)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Open the preview page in the browser
        #[arg(long)]
        open: bool,
    },
    /// Parse an assistant response and print it as JSON
    Parse {
        /// Response file (reads stdin if absent)
        file: Option<PathBuf>,

        /// File the editor is viewing; used to resolve bare fenced code
        #[arg(long)]
        active_file: Option<String>,
    },
    /// Apply an assistant response to a project, then rebuild
    Apply {
        dir: PathBuf,

        /// Response file (reads stdin if absent)
        file: Option<PathBuf>,

        #[arg(long)]
        active_file: Option<String>,

        /// Run the response's terminal commands
        #[arg(long)]
        run_commands: bool,
    },
    /// Send one message to the assistant and apply its response
    Chat {
        dir: PathBuf,

        #[arg(short, long)]
        message: String,

        #[arg(long)]
        active_file: Option<String>,

        #[arg(long)]
        run_commands: bool,
    },
    /// Build, and ask the assistant to fix the build error if there is one
    Fix { dir: PathBuf },
    /// Ask the assistant to analyze a file
    Analyze {
        dir: PathBuf,

        #[arg(long, value_enum)]
        action: AnalyzeAction,

        /// File to analyze (defaults to the active file)
        #[arg(long)]
        file: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat() {
        let cli = Cli::parse_from([
            "livepad",
            "--verbose",
            "chat",
            "app",
            "-m",
            "add a button",
            "--run-commands",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Chat {
                dir,
                message,
                active_file,
                run_commands,
            } => {
                assert_eq!(dir, PathBuf::from("app"));
                assert_eq!(message, "add a button");
                assert_eq!(active_file, None);
                assert!(run_commands);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_analyze_action() {
        let cli = Cli::parse_from(["livepad", "analyze", ".", "--action", "improve"]);
        assert!(matches!(
            cli.command,
            Commands::Analyze {
                action: AnalyzeAction::Improve,
                ..
            }
        ));
    }
}
