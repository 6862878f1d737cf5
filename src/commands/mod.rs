// src/commands/mod.rs
//! Command handlers for the respin CLI

mod package;
mod service;

pub use package::{cmd_add_build, cmd_add_package, cmd_set_ignored, cmd_status};
pub use service::{cmd_daemon, cmd_init, cmd_request_repo, cmd_run};

use respin::config::RespinConfig;
use respin::event::LogListener;
use respin::resolver::{Collaborators, Resolver, ResolverConfig, StaticBuildGroup};
use respin::solver::BuiltinSolver;
use respin::universe::{FsRepoCache, FsSourceCache};

/// Resolver wired to the filesystem caches named in the configuration
fn open_resolver(config: &RespinConfig) -> anyhow::Result<Resolver> {
    let conn = respin::db::open(config.db_path()?)?;

    let collaborators = Collaborators {
        repo_cache: Box::new(FsRepoCache::new(&config.cache.repo_dir)),
        source_cache: Box::new(FsSourceCache::new(&config.cache.srpm_dir)),
        solver: Box::new(BuiltinSolver),
        build_group: Box::new(StaticBuildGroup::new(config.dependency.build_group.clone())),
        listeners: vec![Box::new(LogListener)],
    };

    Ok(Resolver::new(conn, ResolverConfig::from(config), collaborators))
}
