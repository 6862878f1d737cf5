// src/solver/builtin.rs

//! Bundled solver
//!
//! A greedy pass expands requirements breadth-first, picking the
//! highest-EVR provider for anything not already satisfied. When that
//! pass gets stuck, a depth-first search revisits every provider choice
//! in the same preference order before the goal is declared
//! unsatisfiable; the problems of the greedy pass are then reported. At
//! most one version of each package name is installed.

use super::{Goal, SolveOutcome, UniverseSolver};
use crate::error::{Error, Result};
use crate::universe::{Requirement, SolvableId, Universe};
use std::collections::{HashMap, HashSet, VecDeque};

/// Branch points explored before the search gives up
const MAX_BRANCHES: usize = 10_000;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSolver;

impl BuiltinSolver {
    pub fn new() -> Self {
        Self
    }
}

/// Working state of one solver run
struct Transaction<'u> {
    universe: &'u Universe,
    /// Install order
    installs: Vec<SolvableId>,
    installed: HashSet<SolvableId>,
    /// Package name -> installed solvable
    names: HashMap<String, SolvableId>,
    queue: VecDeque<SolvableId>,
    problems: Vec<String>,
}

impl<'u> Transaction<'u> {
    fn new(universe: &'u Universe) -> Self {
        Self {
            universe,
            installs: Vec::new(),
            installed: HashSet::new(),
            names: HashMap::new(),
            queue: VecDeque::new(),
            problems: Vec::new(),
        }
    }

    fn nevra(&self, id: SolvableId) -> String {
        self.universe
            .get(id)
            .map_or_else(|| format!("#{}", id.0), |s| s.record.nevra())
    }

    fn problem(&mut self, problem: String) {
        if !self.problems.contains(&problem) {
            debug!("Solver problem: {}", problem);
            self.problems.push(problem);
        }
    }

    /// Install `id`; returns false if another version of the name is in
    fn install(&mut self, id: SolvableId) -> Result<bool> {
        if self.installed.contains(&id) {
            return Ok(true);
        }

        let solvable = self
            .universe
            .get(id)
            .ok_or_else(|| Error::SolverError(format!("Unknown solvable {}", id.0)))?;
        if self.names.contains_key(&solvable.record.name) {
            return Ok(false);
        }

        self.names.insert(solvable.record.name.clone(), id);
        self.installed.insert(id);
        self.installs.push(id);
        self.queue.push_back(id);
        Ok(true)
    }

    fn select(&mut self, name: &str) -> Result<()> {
        let candidates = self.universe.by_name(name);
        let Some(&best) = candidates.first() else {
            self.problem(format!("package {} does not exist", name));
            return Ok(());
        };

        if !self.install(best)? {
            let installed = self.names[name];
            if !candidates.contains(&installed) {
                self.problem(format!(
                    "cannot install both {} and {}",
                    self.nevra(best),
                    self.nevra(installed)
                ));
            }
        }
        Ok(())
    }

    fn require(&mut self, req: &Requirement, needed_by: SolvableId) -> Result<()> {
        let providers = self.universe.providers(req);
        if providers.iter().any(|id| self.installed.contains(id)) {
            return Ok(());
        }

        if providers.is_empty() {
            let problem = format!(
                "nothing provides {} needed by {}",
                req,
                self.nevra(needed_by)
            );
            self.problem(problem);
            return Ok(());
        }

        for &candidate in &providers {
            if self.install(candidate)? {
                return Ok(());
            }
        }

        // Every provider clashes with an installed version of its name
        let blocked = providers[0];
        let installed = self
            .universe
            .get(blocked)
            .and_then(|s| self.names.get(&s.record.name).copied());
        let problem = match installed {
            Some(installed) => format!(
                "package {} requires {}, but none of the providers can be installed \
                 ({} is installed)",
                self.nevra(needed_by),
                req,
                self.nevra(installed)
            ),
            None => format!(
                "package {} requires {}, but none of the providers can be installed",
                self.nevra(needed_by),
                req
            ),
        };
        self.problem(problem);
        Ok(())
    }

    fn run(mut self, goal: &Goal) -> Result<SolveOutcome> {
        for &id in &goal.install {
            if !self.install(id)? {
                let problem = format!("conflicting requests for {}", self.nevra(id));
                self.problem(problem);
            }
        }
        for name in &goal.select {
            self.select(name)?;
        }

        while let Some(id) = self.queue.pop_front() {
            let requires = self
                .universe
                .get(id)
                .map(|s| s.record.requires.clone())
                .unwrap_or_default();

            for req in requires.iter().filter(|r| !r.is_rpmlib()) {
                self.require(req, id)?;
            }
        }

        if self.problems.is_empty() {
            Ok(SolveOutcome::Success {
                installs: self.installs,
            })
        } else {
            Ok(SolveOutcome::Failure {
                problems: self.problems,
            })
        }
    }
}

/// Partial install set explored by [`Search`]
#[derive(Clone)]
struct Assignment {
    installs: Vec<SolvableId>,
    names: HashMap<String, SolvableId>,
    /// Next group name to select
    next_select: usize,
    /// Next installed package and requirement to check
    next_package: usize,
    next_requirement: usize,
}

impl Assignment {
    fn new() -> Self {
        Self {
            installs: Vec::new(),
            names: HashMap::new(),
            next_select: 0,
            next_package: 0,
            next_requirement: 0,
        }
    }

    fn is_installed(&self, universe: &Universe, id: SolvableId) -> bool {
        universe
            .get(id)
            .is_some_and(|s| self.names.get(&s.record.name) == Some(&id))
    }

    /// Whether `id` fits next to the packages installed so far
    fn admits(&self, universe: &Universe, id: SolvableId) -> bool {
        universe
            .get(id)
            .is_some_and(|s| !self.names.contains_key(&s.record.name))
    }

    fn install(&mut self, universe: &Universe, id: SolvableId) -> Result<()> {
        let solvable = universe
            .get(id)
            .ok_or_else(|| Error::SolverError(format!("Unknown solvable {}", id.0)))?;
        self.names.insert(solvable.record.name.clone(), id);
        self.installs.push(id);
        Ok(())
    }
}

/// Backtracking search over provider choices
struct Search<'u> {
    universe: &'u Universe,
    select: &'u [String],
    branches: usize,
}

impl<'u> Search<'u> {
    fn new(universe: &'u Universe, select: &'u [String]) -> Self {
        Self {
            universe,
            select,
            branches: 0,
        }
    }

    fn run(mut self, goal: &Goal) -> Result<Option<Vec<SolvableId>>> {
        let mut start = Assignment::new();
        for &id in &goal.install {
            if start.is_installed(self.universe, id) {
                continue;
            }
            if !start.admits(self.universe, id) {
                return Ok(None);
            }
            start.install(self.universe, id)?;
        }
        self.extend(start)
    }

    /// Candidates for the next open obligation, or `None` once complete
    fn next_open(&self, state: &mut Assignment) -> Option<Vec<SolvableId>> {
        while state.next_select < self.select.len() {
            let name = &self.select[state.next_select];
            if !state.names.contains_key(name) {
                return Some(self.universe.by_name(name));
            }
            state.next_select += 1;
        }

        while state.next_package < state.installs.len() {
            let id = state.installs[state.next_package];
            let requires = self
                .universe
                .get(id)
                .map(|s| s.record.requires.as_slice())
                .unwrap_or_default();

            while state.next_requirement < requires.len() {
                let req = &requires[state.next_requirement];
                if !req.is_rpmlib() {
                    let providers = self.universe.providers(req);
                    if !providers
                        .iter()
                        .any(|&p| state.is_installed(self.universe, p))
                    {
                        return Some(providers);
                    }
                }
                state.next_requirement += 1;
            }

            state.next_package += 1;
            state.next_requirement = 0;
        }

        None
    }

    fn extend(&mut self, mut state: Assignment) -> Result<Option<Vec<SolvableId>>> {
        loop {
            let Some(candidates) = self.next_open(&mut state) else {
                return Ok(Some(state.installs));
            };
            let candidates: Vec<SolvableId> = candidates
                .into_iter()
                .filter(|&id| state.admits(self.universe, id))
                .collect();

            match candidates.as_slice() {
                [] => return Ok(None),
                [only] => state.install(self.universe, *only)?,
                _ => {
                    for &candidate in &candidates {
                        self.branches += 1;
                        if self.branches > MAX_BRANCHES {
                            debug!("Giving up after {} branches", MAX_BRANCHES);
                            return Ok(None);
                        }

                        let mut next = state.clone();
                        next.install(self.universe, candidate)?;
                        if let Some(installs) = self.extend(next)? {
                            return Ok(Some(installs));
                        }
                    }
                    return Ok(None);
                }
            }
        }
    }
}

impl UniverseSolver for BuiltinSolver {
    fn solve(&self, universe: &Universe, goal: &Goal) -> Result<SolveOutcome> {
        let problems = match Transaction::new(universe).run(goal)? {
            SolveOutcome::Failure { problems } => problems,
            success => return Ok(success),
        };

        match Search::new(universe, &goal.select).run(goal)? {
            Some(installs) => {
                debug!("Search found an install set the greedy pass missed");
                Ok(SolveOutcome::Success { installs })
            }
            None => Ok(SolveOutcome::Failure { problems }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::{Origin, PackageRecord, RepoData};

    fn universe() -> Universe {
        let binaries = RepoData::new(vec![
            PackageRecord::new("gcc", "14.1", "1", "x86_64")
                .requires("glibc-devel")
                .unwrap(),
            PackageRecord::new("glibc-devel", "2.39", "1", "x86_64"),
            PackageRecord::new("libbar", "1.0", "1", "x86_64"),
            PackageRecord::new("libbar", "1.1", "1", "x86_64"),
            PackageRecord::new("libbar-devel", "1.1", "1", "x86_64")
                .requires("libbar = 1.1-1")
                .unwrap()
                .provides("pkgconfig(bar) = 1.1")
                .unwrap(),
            PackageRecord::new("old-tool", "1.0", "1", "noarch")
                .requires("libbar < 1.1")
                .unwrap(),
        ]);
        let sources = RepoData::new(vec![
            PackageRecord::new("foo", "1.0", "1", "src")
                .requires("pkgconfig(bar) >= 1.0")
                .unwrap()
                .requires("rpmlib(CompressedFileNames) <= 3.0.4-1")
                .unwrap(),
            PackageRecord::new("broken", "1.0", "1", "src")
                .requires("libmissing")
                .unwrap(),
            PackageRecord::new("clash", "1.0", "1", "src")
                .requires("libbar-devel")
                .unwrap()
                .requires("old-tool")
                .unwrap(),
        ]);

        let mut universe = Universe::new(1, "x86_64");
        universe.add_repo(&binaries, Origin::Binary);
        universe.add_repo(&sources, Origin::Source);
        universe
    }

    fn names(universe: &Universe, ids: &[SolvableId]) -> Vec<String> {
        let mut names: Vec<_> = ids
            .iter()
            .map(|id| universe.get(*id).unwrap().record.nevra())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_resolves_build_environment() {
        let universe = universe();
        let srpm = universe.source_package("foo", None).unwrap();
        let goal = Goal::for_build(srpm, &["gcc".to_string()]);

        let outcome = BuiltinSolver::new().solve(&universe, &goal).unwrap();
        let SolveOutcome::Success { installs } = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(
            names(&universe, &installs),
            vec![
                "foo-1.0-1.src",
                "gcc-14.1-1.x86_64",
                "glibc-devel-2.39-1.x86_64",
                "libbar-1.1-1.x86_64",
                "libbar-devel-1.1-1.x86_64",
            ]
        );
    }

    #[test]
    fn test_missing_provider() {
        let universe = universe();
        let srpm = universe.source_package("broken", None).unwrap();
        let goal = Goal::for_build(srpm, &["gcc".to_string(), "nosuch".to_string()]);

        let outcome = BuiltinSolver::new().solve(&universe, &goal).unwrap();
        assert_eq!(
            outcome,
            SolveOutcome::Failure {
                problems: vec![
                    "package nosuch does not exist".to_string(),
                    "nothing provides libmissing needed by broken-1.0-1.src".to_string(),
                ]
            }
        );
    }

    #[test]
    fn test_one_version_per_name() {
        let universe = universe();
        let srpm = universe.source_package("clash", None).unwrap();
        let goal = Goal::for_build(srpm, &[]);

        let outcome = BuiltinSolver::new().solve(&universe, &goal).unwrap();
        let SolveOutcome::Failure { problems } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("old-tool-1.0-1.noarch requires libbar < 1.1"));
    }

    #[test]
    fn test_backtracks_over_provider_choice() {
        let binaries = RepoData::new(vec![
            PackageRecord::new("libbar", "1.0", "1", "x86_64"),
            PackageRecord::new("libbar", "1.1", "1", "x86_64"),
            PackageRecord::new("libbar-devel", "1.0", "1", "x86_64")
                .requires("libbar = 1.0-1")
                .unwrap(),
        ]);
        let sources = RepoData::new(vec![
            PackageRecord::new("foo", "1.0", "1", "src")
                .requires("libbar")
                .unwrap()
                .requires("libbar-devel")
                .unwrap(),
        ]);
        let mut universe = Universe::new(1, "x86_64");
        universe.add_repo(&binaries, Origin::Binary);
        universe.add_repo(&sources, Origin::Source);

        let srpm = universe.source_package("foo", None).unwrap();
        let outcome = BuiltinSolver::new()
            .solve(&universe, &Goal::for_build(srpm, &[]))
            .unwrap();
        let SolveOutcome::Success { installs } = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(
            names(&universe, &installs),
            vec![
                "foo-1.0-1.src",
                "libbar-1.0-1.x86_64",
                "libbar-devel-1.0-1.x86_64",
            ]
        );
    }

    #[test]
    fn test_backtracks_over_group_choice() {
        let binaries = RepoData::new(vec![
            PackageRecord::new("gcc", "14.1", "1", "x86_64")
                .requires("binutils >= 2.42")
                .unwrap(),
            PackageRecord::new("gcc", "13.2", "1", "x86_64")
                .requires("binutils")
                .unwrap(),
            PackageRecord::new("binutils", "2.41", "1", "x86_64"),
        ]);
        let sources = RepoData::new(vec![PackageRecord::new("foo", "1.0", "1", "src")]);
        let mut universe = Universe::new(1, "x86_64");
        universe.add_repo(&binaries, Origin::Binary);
        universe.add_repo(&sources, Origin::Source);

        let srpm = universe.source_package("foo", None).unwrap();
        let goal = Goal::for_build(srpm, &["gcc".to_string()]);
        let outcome = BuiltinSolver::new().solve(&universe, &goal).unwrap();
        let SolveOutcome::Success { installs } = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(
            names(&universe, &installs),
            vec![
                "binutils-2.41-1.x86_64",
                "foo-1.0-1.src",
                "gcc-13.2-1.x86_64",
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let universe = universe();
        let srpm = universe.source_package("foo", None).unwrap();
        let goal = Goal::for_build(srpm, &["gcc".to_string()]);

        let solver = BuiltinSolver::new();
        let first = solver.solve(&universe, &goal).unwrap();
        let second = solver.solve(&universe, &goal).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_solvable_is_an_error() {
        let universe = universe();
        let goal = Goal {
            install: vec![SolvableId(999)],
            select: Vec::new(),
        };
        assert!(BuiltinSolver::new().solve(&universe, &goal).is_err());
    }
}
