// src/commands/service.rs

//! Resolver service commands

use super::open_resolver;
use anyhow::{Context, Result};
use respin::config::RespinConfig;
use respin::db::models::RepoGenerationRequest;
use respin::lock::ProcessLock;
use tracing::{error, info};

/// Create and migrate the database
pub fn cmd_init(config: &RespinConfig) -> Result<()> {
    let db_path = config.db_path()?;
    respin::db::init(db_path)?;
    println!("Database initialized at: {}", db_path);
    Ok(())
}

/// Queue a repo snapshot for resolution
pub fn cmd_request_repo(config: &RespinConfig, repo_id: i64) -> Result<()> {
    let conn = respin::db::open(config.db_path()?)?;
    if RepoGenerationRequest::request(&conn, repo_id)? {
        println!("Requested resolution of repo {}", repo_id);
    } else {
        println!("Repo {} is already requested", repo_id);
    }
    Ok(())
}

/// One resolver pass
pub fn cmd_run(config: &RespinConfig) -> Result<()> {
    let lock_path = &config.service.lock_path;
    let Some(_lock) = ProcessLock::try_acquire(lock_path)? else {
        anyhow::bail!(
            "Another resolver holds {}{}",
            lock_path.display(),
            ProcessLock::holder_pid(lock_path)
                .map(|pid| format!(" (pid {pid})"))
                .unwrap_or_default()
        );
    };

    let mut resolver = open_resolver(config)?;
    let builds = resolver.process_builds()?;
    let repo = resolver.process_repo_generation_requests()?;

    println!("Processed {} builds", builds);
    match repo {
        Some(repo_id) => println!("Resolved repo {}", repo_id),
        None => println!("No repo resolved"),
    }
    Ok(())
}

/// Run the resolver periodically
///
/// Errors of a single pass are logged and the next pass retries.
pub fn cmd_daemon(config: &RespinConfig) -> Result<()> {
    let lock = ProcessLock::acquire(&config.service.lock_path)
        .context("Failed to acquire the resolver lock")?;
    lock.write_pid()?;

    let mut resolver = open_resolver(config)?;
    let interval = config.service.interval();
    info!("Resolver running, polling every {:?}", interval);

    loop {
        if let Err(e) = resolver.run_once() {
            error!("Resolver pass failed: {}", e);
        }
        std::thread::sleep(interval);
    }
}
