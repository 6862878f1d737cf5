// src/resolver/engine.rs

//! Resolution of one package's build dependencies
//!
//! The engine asks the solver to install the build group together with
//! the package's source package, persists the outcome and, on success,
//! returns the binary packages of the build environment annotated with
//! their distances.

use crate::db::models::{Dependency, Package, ResolutionProblem, ResolutionResult};
use crate::error::{Error, Result};
use crate::event::EventQueue;
use crate::solver::{Goal, SolveOutcome, UniverseSolver};
use crate::universe::{SolvableId, Universe};
use crate::watch::StateWatch;
use rusqlite::Connection;
use tracing::{debug, info};

use super::distance::compute_dependency_distances;

/// Resolves packages against one universe
pub struct ResolutionEngine<'a> {
    universe: &'a Universe,
    solver: &'a dyn UniverseSolver,
    group: &'a [String],
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(universe: &'a Universe, solver: &'a dyn UniverseSolver, group: &'a [String]) -> Self {
        Self {
            universe,
            solver,
            group,
        }
    }

    pub fn repo_id(&self) -> i64 {
        self.universe.repo_id()
    }

    /// Resolve the build dependencies of `package`
    ///
    /// `srpm` is the package's source package in the universe; `None` is
    /// recorded as a failed resolution. Returns the resolved dependencies,
    /// or `None` if resolution failed. The outcome is persisted either way.
    pub fn resolve_dependencies(
        &self,
        conn: &Connection,
        events: &mut EventQueue,
        package: &Package,
        srpm: Option<SolvableId>,
    ) -> Result<Option<Vec<Dependency>>> {
        let package_id = package
            .id
            .ok_or_else(|| Error::InitError(format!("Package {} has no ID", package.name)))?;

        let mut watch = StateWatch::new(events, package_id, package);

        let Some(srpm) = srpm else {
            info!("Source package of {} not found", package.name);
            let problems = vec![format!("source package {} not found", package.name)];
            self.record_failure(conn, package_id, &problems)?;
            watch.record(false);
            return Ok(None);
        };

        let goal = Goal::for_build(srpm, self.group);
        debug!(
            "Resolving {} against repo {} with {} group packages",
            package.name,
            self.repo_id(),
            self.group.len()
        );

        match self.solver.solve(self.universe, &goal)? {
            SolveOutcome::Success { installs } => {
                let resolution_id =
                    ResolutionResult::record(conn, self.repo_id(), package_id, true)?;
                Package::set_resolved(conn, package_id, resolution_id, true)?;
                watch.record(true);

                let mut deps = self.to_dependencies(package_id, &installs)?;
                compute_dependency_distances(self.universe, srpm, &mut deps);
                Ok(Some(deps))
            }
            SolveOutcome::Failure { problems } => {
                info!(
                    "Dependencies of {} cannot be resolved: {} problems",
                    package.name,
                    problems.len()
                );
                self.record_failure(conn, package_id, &problems)?;
                watch.record(false);
                Ok(None)
            }
        }
    }

    fn record_failure(&self, conn: &Connection, package_id: i64, problems: &[String]) -> Result<()> {
        let resolution_id = ResolutionResult::record(conn, self.repo_id(), package_id, false)?;
        for problem in problems {
            ResolutionProblem::new(resolution_id, problem.clone()).insert(conn)?;
        }
        Package::set_resolved(conn, package_id, resolution_id, false)?;
        Ok(())
    }

    /// Installed binary packages as dependency rows, ordered by name
    fn to_dependencies(&self, package_id: i64, installs: &[SolvableId]) -> Result<Vec<Dependency>> {
        let mut deps = Vec::with_capacity(installs.len());
        for &id in installs {
            let solvable = self.universe.get(id).ok_or_else(|| {
                Error::SolverError(format!("Solver returned unknown package {}", id.0))
            })?;
            let record = &solvable.record;
            if record.is_source() {
                continue;
            }
            deps.push(Dependency::new(
                self.repo_id(),
                package_id,
                record.name.clone(),
                Some(record.epoch as i64),
                record.version.clone(),
                record.release.clone(),
                record.arch.clone(),
            ));
        }
        deps.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.arch.cmp(&b.arch)));
        Ok(deps)
    }
}
