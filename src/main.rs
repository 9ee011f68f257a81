use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use livepad::cli::{Cli, Commands};
use livepad::command::{
    run_analyze, run_apply, run_build, run_chat, run_fix, run_init, run_parse,
};
use livepad::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { dir, name } => run_init(&dir, name).await,
        Commands::Build { dir, out, open } => run_build(&config, &dir, out, open).await,
        Commands::Parse { file, active_file } => {
            run_parse(file.as_deref(), active_file.as_deref())
        }
        Commands::Apply {
            dir,
            file,
            active_file,
            run_commands,
        } => {
            run_apply(
                &config,
                &dir,
                file.as_deref(),
                active_file.as_deref(),
                run_commands,
            )
            .await
        }
        Commands::Chat {
            dir,
            message,
            active_file,
            run_commands,
        } => run_chat(&config, &dir, &message, active_file.as_deref(), run_commands).await,
        Commands::Fix { dir } => run_fix(&config, &dir).await,
        Commands::Analyze { dir, action, file } => {
            run_analyze(&config, &dir, action, file.as_deref()).await
        }
    }
}
