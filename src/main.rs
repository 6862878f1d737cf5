// src/main.rs

use anyhow::Result;
use clap::Parser;
use respin::config::RespinConfig;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = RespinConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Init) => commands::cmd_init(&config),
        Some(Commands::Run) => commands::cmd_run(&config),
        Some(Commands::Daemon) => commands::cmd_daemon(&config),
        Some(Commands::RequestRepo { repo_id }) => commands::cmd_request_repo(&config, repo_id),
        Some(Commands::AddPackage { name, priority }) => {
            commands::cmd_add_package(&config, &name, priority)
        }
        Some(Commands::AddBuild {
            name,
            repo_id,
            version,
            release,
            epoch,
            failed,
        }) => commands::cmd_add_build(&config, &name, repo_id, (epoch, version, release), failed),
        Some(Commands::Ignore { name, undo }) => commands::cmd_set_ignored(&config, &name, !undo),
        Some(Commands::Status { name }) => commands::cmd_status(&config, &name),
        None => {
            println!("respin v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'respin --help' for usage information");
            Ok(())
        }
    }
}
