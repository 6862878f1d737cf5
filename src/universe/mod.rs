// src/universe/mod.rs

//! Package universe
//!
//! A [`Universe`] is the indexed set of binary and source packages
//! available for resolution against one repo snapshot. It is built from
//! the repository-data cache (binary packages) and the source-package
//! cache (source packages) and never touches the database.

mod cache;
mod repodata;

pub use cache::{FsRepoCache, FsSourceCache, RepoDataCache, SourcePackageCache};
pub use repodata::{Capability, PackageRecord, RepoData, Requirement};

use crate::error::Result;
use crate::version::RpmVersion;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Index of a package within a [`Universe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolvableId(pub u32);

/// Which repository a package came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Binary,
    Source,
}

/// A package inside a universe
#[derive(Debug, Clone)]
pub struct Solvable {
    pub record: PackageRecord,
    pub evr: RpmVersion,
    pub origin: Origin,
}

/// Indexed package set for one repo snapshot
#[derive(Debug)]
pub struct Universe {
    repo_id: i64,
    arch: String,
    solvables: Vec<Solvable>,
    /// Package name -> solvables with that name
    by_name: HashMap<String, Vec<SolvableId>>,
    /// Capability name -> solvables providing it (self-provides included)
    provides: HashMap<String, Vec<SolvableId>>,
}

impl Universe {
    pub fn new(repo_id: i64, arch: &str) -> Self {
        Self {
            repo_id,
            arch: arch.to_string(),
            solvables: Vec::new(),
            by_name: HashMap::new(),
            provides: HashMap::new(),
        }
    }

    pub fn repo_id(&self) -> i64 {
        self.repo_id
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn len(&self) -> usize {
        self.solvables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solvables.is_empty()
    }

    /// Add the packages of a repository
    ///
    /// Binary repositories contribute packages of the target arch and
    /// `noarch`; source repositories contribute `src` packages only.
    /// Returns the number of packages added.
    pub fn add_repo(&mut self, data: &RepoData, origin: Origin) -> usize {
        let mut added = 0;
        for record in &data.packages {
            let accepted = match origin {
                Origin::Binary => record.arch == self.arch || record.arch == "noarch",
                Origin::Source => record.is_source(),
            };
            if !accepted {
                continue;
            }
            self.add(record.clone(), origin);
            added += 1;
        }
        added
    }

    fn add(&mut self, record: PackageRecord, origin: Origin) -> SolvableId {
        let id = SolvableId(self.solvables.len() as u32);

        self.by_name.entry(record.name.clone()).or_default().push(id);

        // Source packages are never providers; they only enter a goal explicitly
        if origin == Origin::Binary {
            self.provides.entry(record.name.clone()).or_default().push(id);
            for cap in &record.provides {
                let providers = self.provides.entry(cap.name.clone()).or_default();
                if providers.last() != Some(&id) {
                    providers.push(id);
                }
            }
        }

        let evr = record.evr();
        self.solvables.push(Solvable {
            record,
            evr,
            origin,
        });
        id
    }

    pub fn get(&self, id: SolvableId) -> Option<&Solvable> {
        self.solvables.get(id.0 as usize)
    }

    /// Binary packages with the given name, highest EVR first
    pub fn by_name(&self, name: &str) -> Vec<SolvableId> {
        let mut ids: Vec<SolvableId> = self
            .by_name
            .get(name)
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| self.solvables[id.0 as usize].origin == Origin::Binary)
            .collect();
        self.sort_best_first(&mut ids);
        ids
    }

    /// Binary packages satisfying `req`, highest EVR first
    pub fn providers(&self, req: &Requirement) -> Vec<SolvableId> {
        let mut ids: Vec<SolvableId> = self
            .provides
            .get(&req.name)
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| self.solvables[id.0 as usize].record.satisfies(req))
            .collect();
        self.sort_best_first(&mut ids);
        ids
    }

    /// Every package providing at least one of `reqs`
    pub fn what_provides_any(&self, reqs: &[Requirement]) -> BTreeSet<SolvableId> {
        reqs.iter().flat_map(|req| self.providers(req)).collect()
    }

    /// Look up a source package
    ///
    /// Without an EVR the highest version wins; with one, epoch, version
    /// and release must all match.
    pub fn source_package(&self, name: &str, evr: Option<&RpmVersion>) -> Option<SolvableId> {
        let candidates = self
            .by_name
            .get(name)?
            .iter()
            .copied()
            .filter(|id| self.solvables[id.0 as usize].origin == Origin::Source);

        match evr {
            Some(evr) => candidates
                .filter(|id| {
                    let s = &self.solvables[id.0 as usize];
                    s.evr.epoch == evr.epoch
                        && s.evr.version == evr.version
                        && s.evr.release == evr.release
                })
                .min(),
            None => candidates.max_by(|a, b| {
                let sa = &self.solvables[a.0 as usize];
                let sb = &self.solvables[b.0 as usize];
                sa.evr.cmp(&sb.evr).then_with(|| b.cmp(a))
            }),
        }
    }

    /// Highest EVR first, ties broken by insertion order
    fn sort_best_first(&self, ids: &mut [SolvableId]) {
        ids.sort_by(|a, b| {
            let sa = &self.solvables[a.0 as usize];
            let sb = &self.solvables[b.0 as usize];
            sb.evr.cmp(&sa.evr).then_with(|| a.cmp(b))
        });
    }
}

/// Builds a [`Universe`] for a repo snapshot from the two caches
pub struct UniverseBuilder<'a> {
    repo_cache: &'a dyn RepoDataCache,
    source_cache: &'a dyn SourcePackageCache,
    arch: &'a str,
}

impl<'a> UniverseBuilder<'a> {
    pub fn new(
        repo_cache: &'a dyn RepoDataCache,
        source_cache: &'a dyn SourcePackageCache,
        arch: &'a str,
    ) -> Self {
        Self {
            repo_cache,
            source_cache,
            arch,
        }
    }

    /// Build the universe for `repo_id`
    ///
    /// Returns `None` when the repository data is not available yet.
    pub fn build(&self, repo_id: i64) -> Result<Option<Universe>> {
        let Some(repo_data) = self.repo_cache.get_repo_data(repo_id)? else {
            info!("Repo {} is not available yet, deferring", repo_id);
            return Ok(None);
        };

        let mut universe = Universe::new(repo_id, self.arch);
        let binaries = universe.add_repo(&repo_data, Origin::Binary);

        let source_data = self.source_cache.get_repodata()?;
        let sources = universe.add_repo(&source_data, Origin::Source);

        debug!(
            "Universe for repo {}: {} binary and {} source packages",
            repo_id, binaries, sources
        );
        Ok(Some(universe))
    }
}
