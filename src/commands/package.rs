// src/commands/package.rs

//! Package and build commands

use anyhow::{Result, anyhow};
use respin::config::RespinConfig;
use respin::db::models::{Build, BuildState, DependencyChange, Package};
use respin::universe::{FsSourceCache, SourcePackageCache};
use tracing::info;

/// Include or exclude a package from resolution
pub fn cmd_set_ignored(config: &RespinConfig, name: &str, ignored: bool) -> Result<()> {
    let conn = respin::db::open(config.db_path()?)?;
    let mut package = Package::find_by_name(&conn, name)?
        .ok_or_else(|| anyhow!("Package {} is not tracked", name))?;

    package.set_ignored(&conn, ignored)?;
    if ignored {
        println!("Package {} is now ignored", name);
    } else {
        println!("Package {} takes part in resolution again", name);
    }
    Ok(())
}

/// Start tracking a package
pub fn cmd_add_package(config: &RespinConfig, name: &str, priority: i32) -> Result<()> {
    let conn = respin::db::open(config.db_path()?)?;

    if Package::find_by_name(&conn, name)?.is_some() {
        return Err(anyhow!("Package {} is already tracked", name));
    }

    let mut package = Package::new(name.to_string());
    package.static_priority = priority;
    let id = package.insert(&conn)?;
    info!("Added package {} with id {}", name, id);
    println!("Added package: {}", name);
    Ok(())
}

/// Record a finished build
pub fn cmd_add_build(
    config: &RespinConfig,
    name: &str,
    repo_id: i64,
    evr: (Option<i64>, Option<String>, Option<String>),
    failed: bool,
) -> Result<()> {
    let mut conn = respin::db::open(config.db_path()?)?;
    let package = Package::find_by_name(&conn, name)?
        .ok_or_else(|| anyhow!("Package {} is not tracked", name))?;
    let package_id = package
        .id
        .ok_or_else(|| anyhow!("Package {} has no ID", name))?;

    let (epoch, version, release) = evr;
    let build_id = respin::db::transaction(&mut conn, |tx| {
        let mut build = Build::new(package_id);
        build.state = if failed {
            BuildState::Failed
        } else {
            BuildState::Complete
        };
        build.epoch = epoch;
        build.version = version;
        build.release = release;
        build.repo_id = Some(repo_id);
        build.real = true;
        build.insert(tx)
    })?;

    println!("Recorded build {} of {} against repo {}", build_id, name, repo_id);
    Ok(())
}

/// Print the resolution state of a package
pub fn cmd_status(config: &RespinConfig, name: &str) -> Result<()> {
    let conn = respin::db::open(config.db_path()?)?;
    let package = Package::find_by_name(&conn, name)?
        .ok_or_else(|| anyhow!("Package {} is not tracked", name))?;
    let package_id = package
        .id
        .ok_or_else(|| anyhow!("Package {} has no ID", name))?;

    println!("{}: {}", package.name, package.state(&conn)?);

    if let Some(build_id) = package.last_complete_build_id
        && let Some(build) = Build::find_by_id(&conn, build_id)?
    {
        print!("  Last build: {} ({})", build_id, build.state.as_str());
        if let Some(evr) = build.evr() {
            print!(" {}", evr);
        }
        if let Some(repo_id) = build.repo_id {
            print!(" in repo {}", repo_id);
        }
        println!();
    }

    let sources = FsSourceCache::new(&config.cache.srpm_dir);
    match sources.get_source_package(&package.name, None)? {
        Some(srpm) => println!("  Source package: {}", srpm.nevra()),
        None => println!("  Source package: not cached"),
    }

    let problems = package.resolution_problems(&conn)?;
    if !problems.is_empty() {
        println!("  Problems:");
        for problem in &problems {
            println!("    {}", problem);
        }
    }

    let changes = DependencyChange::find_unapplied(&conn, package_id)?;
    if !changes.is_empty() {
        println!("  Pending dependency changes:");
        for change in &changes {
            match change.distance {
                Some(distance) => println!(
                    "    {} ({}, distance {})",
                    change,
                    change.kind().as_str(),
                    distance
                ),
                None => println!("    {} ({})", change, change.kind().as_str()),
            }
        }
    }

    Ok(())
}
