// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use respin::db;
use respin::db::models::{Build, BuildState, Package};
use respin::event::{Event, EventListener};
use respin::resolver::{Collaborators, Resolver, ResolverConfig, StaticBuildGroup};
use respin::solver::{BuiltinSolver, Goal, SolveOutcome, UniverseSolver};
use respin::universe::{PackageRecord, RepoData, RepoDataCache, SourcePackageCache, Universe};
use respin::version::RpmVersion;
use respin::{Error, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create an initialized database in a temporary directory.
///
/// Returns (TempDir, Connection) - keep the TempDir alive to prevent cleanup.
pub fn create_test_db() -> (TempDir, Connection) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir
        .path()
        .join("respin.db")
        .to_str()
        .unwrap()
        .to_string();

    db::init(&db_path).unwrap();
    let conn = db::open(&db_path).unwrap();
    (temp_dir, conn)
}

/// Binary repositories keyed by repo id, shared with the test body
#[derive(Clone, Default)]
pub struct MemoryRepoCache {
    repos: Arc<Mutex<HashMap<i64, RepoData>>>,
    lookups: Arc<AtomicUsize>,
}

impl MemoryRepoCache {
    pub fn insert(&self, repo_id: i64, data: RepoData) {
        self.repos.lock().unwrap().insert(repo_id, data);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl RepoDataCache for MemoryRepoCache {
    fn get_repo_data(&self, repo_id: i64) -> Result<Option<RepoData>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.repos.lock().unwrap().get(&repo_id).cloned())
    }
}

/// Source packages held in memory
#[derive(Clone, Default)]
pub struct MemorySourceCache {
    packages: Arc<Mutex<Vec<PackageRecord>>>,
    ensured: Arc<Mutex<Vec<String>>>,
}

impl MemorySourceCache {
    pub fn new(packages: Vec<PackageRecord>) -> Self {
        Self {
            packages: Arc::new(Mutex::new(packages)),
            ensured: Arc::default(),
        }
    }

    pub fn ensured(&self) -> Vec<String> {
        self.ensured.lock().unwrap().clone()
    }
}

impl SourcePackageCache for MemorySourceCache {
    fn ensure_latest(&self, names: &[String]) -> Result<()> {
        self.ensured.lock().unwrap().extend(names.iter().cloned());
        Ok(())
    }

    fn get_repodata(&self) -> Result<RepoData> {
        Ok(RepoData::new(self.packages.lock().unwrap().clone()))
    }

    fn get_source_package(
        &self,
        name: &str,
        evr: Option<&RpmVersion>,
    ) -> Result<Option<PackageRecord>> {
        let packages = self.packages.lock().unwrap();
        Ok(packages
            .iter()
            .filter(|p| p.name == name)
            .filter(|p| evr.is_none_or(|evr| p.evr().compare(evr).is_eq()))
            .max_by(|a, b| a.evr().compare(&b.evr()))
            .cloned())
    }
}

/// Counts solver invocations, delegating to the builtin solver
#[derive(Clone, Default)]
pub struct CountingSolver {
    calls: Arc<AtomicUsize>,
}

impl CountingSolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UniverseSolver for CountingSolver {
    fn solve(&self, universe: &Universe, goal: &Goal) -> Result<SolveOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        BuiltinSolver.solve(universe, goal)
    }
}

/// Fails every solve
pub struct BrokenSolver;

impl UniverseSolver for BrokenSolver {
    fn solve(&self, _universe: &Universe, _goal: &Goal) -> Result<SolveOutcome> {
        Err(Error::SolverError("solver crashed".to_string()))
    }
}

/// Records every delivered event
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl EventListener for RecordingListener {
    fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Handles to the fakes wired into a [`Resolver`]
pub struct Harness {
    pub _temp_dir: TempDir,
    pub resolver: Resolver,
    pub repos: MemoryRepoCache,
    pub sources: MemorySourceCache,
    pub solver: CountingSolver,
    pub listener: RecordingListener,
}

impl Harness {
    /// Resolver over an empty database with `foo` and `broken` as source packages
    pub fn new() -> Self {
        Self::with_solver(None)
    }

    pub fn with_solver(solver: Option<Box<dyn UniverseSolver>>) -> Self {
        let (temp_dir, conn) = create_test_db();
        let repos = MemoryRepoCache::default();
        let sources = MemorySourceCache::new(source_packages());
        let counting = CountingSolver::default();
        let listener = RecordingListener::default();

        let collaborators = Collaborators {
            repo_cache: Box::new(repos.clone()),
            source_cache: Box::new(sources.clone()),
            solver: solver.unwrap_or_else(|| Box::new(counting.clone())),
            build_group: Box::new(StaticBuildGroup::new(vec!["gcc".to_string()])),
            listeners: vec![Box::new(listener.clone())],
        };
        let config = ResolverConfig {
            for_arch: "x86_64".to_string(),
        };

        Self {
            _temp_dir: temp_dir,
            resolver: Resolver::new(conn, config, collaborators),
            repos,
            sources,
            solver: counting,
            listener,
        }
    }

    pub fn conn(&self) -> &Connection {
        self.resolver.conn()
    }

    pub fn add_package(&self, name: &str) -> i64 {
        Package::new(name.to_string()).insert(self.conn()).unwrap()
    }

    /// Record a complete build of version 1-1 against `repo_id`
    pub fn add_build(&self, package_id: i64, repo_id: i64) -> i64 {
        self.add_build_of(package_id, repo_id, "1")
    }

    /// Record a complete build of `version`-1 against `repo_id`
    pub fn add_build_of(&self, package_id: i64, repo_id: i64, version: &str) -> i64 {
        let mut build = Build::new(package_id);
        build.state = BuildState::Complete;
        build.version = Some(version.to_string());
        build.release = Some("1".to_string());
        build.repo_id = Some(repo_id);
        build.insert(self.conn()).unwrap()
    }

    pub fn ignore(&self, package_id: i64) {
        let mut package = Package::find_by_id(self.conn(), package_id).unwrap().unwrap();
        package.set_ignored(self.conn(), true).unwrap();
    }
}

/// foo needs libbar-devel, which needs libbar; broken needs something missing
pub fn source_packages() -> Vec<PackageRecord> {
    vec![
        PackageRecord::new("foo", "1", "1", "src")
            .requires("libbar-devel")
            .unwrap(),
        PackageRecord::new("broken", "1", "1", "src")
            .requires("libmissing")
            .unwrap(),
    ]
}

/// Binary snapshot with the given libbar version
pub fn binary_repo(libbar_version: &str) -> RepoData {
    RepoData::new(vec![
        PackageRecord::new("gcc", "14.2", "1", "x86_64"),
        PackageRecord::new("libbar", libbar_version, "1", "x86_64"),
        PackageRecord::new("libbar-devel", "1.0", "1", "x86_64")
            .requires("libbar")
            .unwrap(),
        PackageRecord::new("unrelated", "2", "1", "x86_64"),
    ])
}
