// src/resolver/orchestrator.rs

//! Resolution orchestrator
//!
//! Two trigger paths feed the engine:
//!
//! - **Repo generation requests**: a new repo snapshot became ready. Every
//!   active package is resolved against it and diffed against the
//!   dependencies of its last build. These changes are observational and
//!   not attributed to any build.
//! - **Builds**: a build finished against some snapshot. Its package is
//!   resolved against that snapshot, the dependencies are stored and
//!   diffed against the previous build's, and the changes are attributed
//!   to the build (`applied_in`).
//!
//! Every unit of work (one package, one build) runs in its own
//! transaction, so a crash leaves at most the unit in flight unfinished
//! and the next run picks it up again.

use crate::config::RespinConfig;
use crate::db::{
    self,
    models::{Build, Dependency, Package, RepoGenerationRequest, ResolutionResult},
};
use crate::error::Result;
use crate::event::{EventListener, EventQueue};
use crate::solver::UniverseSolver;
use crate::universe::{RepoDataCache, SourcePackageCache, UniverseBuilder};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

use super::cache::UniverseCache;
use super::diff::generate_dependency_differences;
use super::engine::ResolutionEngine;

/// Supplies the packages every build root starts with
pub trait BuildGroupProvider {
    fn get_build_group(&self) -> Result<Vec<String>>;
}

/// Build group taken from configuration
#[derive(Debug, Clone)]
pub struct StaticBuildGroup {
    packages: Vec<String>,
}

impl StaticBuildGroup {
    pub fn new(packages: Vec<String>) -> Self {
        Self { packages }
    }
}

impl BuildGroupProvider for StaticBuildGroup {
    fn get_build_group(&self) -> Result<Vec<String>> {
        Ok(self.packages.clone())
    }
}

/// External collaborators of the resolver
pub struct Collaborators {
    pub repo_cache: Box<dyn RepoDataCache>,
    pub source_cache: Box<dyn SourcePackageCache>,
    pub solver: Box<dyn UniverseSolver>,
    pub build_group: Box<dyn BuildGroupProvider>,
    pub listeners: Vec<Box<dyn EventListener>>,
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Architecture builds run on
    pub for_arch: String,
}

impl From<&RespinConfig> for ResolverConfig {
    fn from(config: &RespinConfig) -> Self {
        Self {
            for_arch: config.dependency.for_arch.clone(),
        }
    }
}

/// Drives dependency resolution for repo snapshots and builds
pub struct Resolver {
    conn: Connection,
    config: ResolverConfig,
    collaborators: Collaborators,
    cache: UniverseCache,
    events: EventQueue,
}

impl Resolver {
    pub fn new(conn: Connection, config: ResolverConfig, collaborators: Collaborators) -> Self {
        Self {
            conn,
            config,
            collaborators,
            cache: UniverseCache::new(),
            events: EventQueue::new(),
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn universe_cache(&self) -> &UniverseCache {
        &self.cache
    }

    /// One full pass: builds first, then the newest repo snapshot
    pub fn run_once(&mut self) -> Result<()> {
        self.process_builds()?;
        self.process_repo_generation_requests()?;
        Ok(())
    }

    /// Handle the newest pending repo generation request
    ///
    /// Returns the repo id whose requests were consumed, or `None` if there
    /// was nothing to do or the snapshot is not available yet.
    pub fn process_repo_generation_requests(&mut self) -> Result<Option<i64>> {
        let Some(request) = RepoGenerationRequest::find_latest(&self.conn)? else {
            return Ok(None);
        };
        let repo_id = request.repo_id;

        if ResolutionResult::exists_for_repo(&self.conn, repo_id)? {
            info!("Repo {} was already resolved, skipping", repo_id);
        } else if !self.generate_repo(repo_id)? {
            return Ok(None);
        }

        let deleted = db::transaction(&mut self.conn, |tx| {
            RepoGenerationRequest::delete_up_to(tx, repo_id)
        })?;
        debug!("Discarded {} repo generation requests", deleted);
        Ok(Some(repo_id))
    }

    /// Resolve every active package against repo snapshot `repo_id`
    ///
    /// Returns false if the snapshot is not available yet.
    pub fn generate_repo(&mut self, repo_id: i64) -> Result<bool> {
        let Self {
            conn,
            config,
            collaborators,
            events,
            ..
        } = self;

        let packages = Package::list_active(conn)?;
        let last_builds = Build::last_builds_by_package(conn)?;
        let names: Vec<String> = packages.iter().map(|p| p.name.clone()).collect();

        info!("Generating repo {} for {} packages", repo_id, packages.len());
        collaborators.source_cache.ensure_latest(&names)?;

        let builder = UniverseBuilder::new(
            collaborators.repo_cache.as_ref(),
            collaborators.source_cache.as_ref(),
            &config.for_arch,
        );
        let Some(universe) = builder.build(repo_id)? else {
            return Ok(false);
        };

        let group = collaborators.build_group.get_build_group()?;
        let engine = ResolutionEngine::new(&universe, collaborators.solver.as_ref(), &group);

        info!("Resolving dependencies");
        for package in &packages {
            let Some(package_id) = package.id else {
                continue;
            };
            let srpm = universe.source_package(&package.name, None);
            let last_build = last_builds.get(&package_id);

            let result = db::transaction(conn, |tx| {
                let Some(curr) = engine.resolve_dependencies(tx, events, package, srpm)? else {
                    return Ok(0);
                };

                match last_build.and_then(|b| b.repo_id) {
                    Some(prev_repo) => {
                        let prev = Dependency::find_for(tx, package_id, prev_repo)?;
                        generate_dependency_differences(tx, &prev, &curr, package_id, None)
                    }
                    None => Ok(0),
                }
            });

            match result {
                Ok(changes) => {
                    if changes > 0 {
                        debug!("{}: {} dependency changes", package.name, changes);
                    }
                    events.flush(&collaborators.listeners);
                }
                Err(e) => {
                    events.rollback();
                    return Err(e);
                }
            }
        }

        info!("Repo {} done", repo_id);
        Ok(true)
    }

    /// Process every finished build whose dependencies were not handled yet
    ///
    /// Returns the number of builds processed. Builds whose repo snapshot is
    /// not available yet stay pending.
    pub fn process_builds(&mut self) -> Result<usize> {
        let builds = Build::find_unprocessed(&self.conn)?;
        if builds.is_empty() {
            return Ok(0);
        }

        let Self {
            conn,
            config,
            collaborators,
            cache,
            events,
        } = self;

        let group = collaborators.build_group.get_build_group()?;
        let active: HashMap<i64, String> = Package::list_active(conn)?
            .into_iter()
            .filter_map(|p| p.id.map(|id| (id, p.name)))
            .collect();

        // Fetch all source packages before resolving anything
        let names: BTreeSet<&String> = builds
            .iter()
            .filter_map(|build| active.get(&build.package_id))
            .collect();
        let names: Vec<String> = names.into_iter().cloned().collect();
        collaborators.source_cache.ensure_latest(&names)?;

        let builder = UniverseBuilder::new(
            collaborators.repo_cache.as_ref(),
            collaborators.source_cache.as_ref(),
            &config.for_arch,
        );

        let mut processed = 0;
        for build in &builds {
            let (Some(build_id), Some(repo_id)) = (build.id, build.repo_id) else {
                continue;
            };

            let Some(package) = Package::find_by_id(conn, build.package_id)? else {
                warn!("Build {} refers to missing package {}", build_id, build.package_id);
                continue;
            };

            if package.ignored {
                debug!("Package {} is ignored, skipping build {}", package.name, build_id);
                db::transaction(conn, |tx| Build::mark_deps_processed(tx, build_id, false))?;
                processed += 1;
                continue;
            }

            let Some(universe) = cache.get_or_build(repo_id, || builder.build(repo_id))? else {
                info!("Repo {} not available, build {} deferred", repo_id, build_id);
                continue;
            };

            info!("Processing build {} of {}", build_id, package.name);
            let srpm = universe.source_package(&package.name, build.evr().as_ref());
            let engine = ResolutionEngine::new(universe, collaborators.solver.as_ref(), &group);

            let result = db::transaction(conn, |tx| {
                let package_id = build.package_id;
                let prev_deps = match build.find_previous_resolved(tx)?.and_then(|b| b.repo_id) {
                    Some(prev_repo) => Dependency::find_for(tx, package_id, prev_repo)?,
                    None => Vec::new(),
                };

                let curr = engine.resolve_dependencies(tx, events, &package, srpm)?;
                let resolved = curr.is_some();
                let curr_deps = curr.unwrap_or_default();

                // A failed resolution keeps what earlier builds stored
                if resolved {
                    Dependency::delete_for(tx, package_id, repo_id)?;
                    Dependency::insert_bulk(tx, &curr_deps)?;
                    Dependency::delete_older_than(tx, package_id, repo_id)?;
                }

                generate_dependency_differences(
                    tx,
                    &prev_deps,
                    &curr_deps,
                    package_id,
                    Some(build_id),
                )?;

                Build::mark_deps_processed(tx, build_id, resolved)?;
                Ok(())
            });

            match result {
                Ok(()) => {
                    events.flush(&collaborators.listeners);
                    processed += 1;
                }
                Err(e) => {
                    events.rollback();
                    return Err(e);
                }
            }
        }

        Ok(processed)
    }
}
