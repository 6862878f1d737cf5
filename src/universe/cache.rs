// src/universe/cache.rs

//! Repository-data and source-package caches
//!
//! Fetching repository metadata and source packages from the build farm
//! happens elsewhere; the resolver only sees these traits. The filesystem
//! implementations read what the fetcher left on disk.

use super::repodata::{PackageRecord, RepoData};
use crate::error::{Error, Result};
use crate::version::RpmVersion;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Binary repository metadata per repo snapshot
pub trait RepoDataCache {
    /// Repository data for `repo_id`, or `None` if it is not available yet
    fn get_repo_data(&self, repo_id: i64) -> Result<Option<RepoData>>;
}

/// Source packages and the repository built from them
pub trait SourcePackageCache {
    /// Make sure the latest source package of each name is present
    fn ensure_latest(&self, names: &[String]) -> Result<()>;

    /// Repository data describing every cached source package
    fn get_repodata(&self) -> Result<RepoData>;

    /// A cached source package; latest when `evr` is `None`
    fn get_source_package(
        &self,
        name: &str,
        evr: Option<&RpmVersion>,
    ) -> Result<Option<PackageRecord>>;
}

/// Reads `<dir>/<repo_id>/repodata.json`
#[derive(Debug, Clone)]
pub struct FsRepoCache {
    dir: PathBuf,
}

impl FsRepoCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn repodata_path(&self, repo_id: i64) -> PathBuf {
        self.dir.join(repo_id.to_string()).join("repodata.json")
    }
}

impl RepoDataCache for FsRepoCache {
    fn get_repo_data(&self, repo_id: i64) -> Result<Option<RepoData>> {
        let path = self.repodata_path(repo_id);
        read_repodata(&path)
    }
}

/// Reads `<dir>/repodata.json`
#[derive(Debug, Clone)]
pub struct FsSourceCache {
    dir: PathBuf,
}

impl FsSourceCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn repodata_path(&self) -> PathBuf {
        self.dir.join("repodata.json")
    }
}

impl SourcePackageCache for FsSourceCache {
    fn ensure_latest(&self, names: &[String]) -> Result<()> {
        let data = self.get_repodata()?;
        let missing = names
            .iter()
            .filter(|name| !data.packages.iter().any(|p| p.is_source() && &p.name == *name))
            .count();
        if missing > 0 {
            warn!("{} of {} source packages are not cached", missing, names.len());
        }
        Ok(())
    }

    fn get_repodata(&self) -> Result<RepoData> {
        Ok(read_repodata(&self.repodata_path())?.unwrap_or_default())
    }

    fn get_source_package(
        &self,
        name: &str,
        evr: Option<&RpmVersion>,
    ) -> Result<Option<PackageRecord>> {
        let data = self.get_repodata()?;
        let mut candidates = data
            .packages
            .into_iter()
            .filter(|p| p.is_source() && p.name == name);

        let found = match evr {
            Some(evr) => candidates
                .find(|p| {
                    p.epoch == evr.epoch
                        && p.version == evr.version
                        && Some(&p.release) == evr.release.as_ref()
                }),
            None => candidates.max_by(|a, b| a.evr().cmp(&b.evr())),
        };

        if found.is_none() {
            debug!("Source package {} not in cache", name);
        }
        Ok(found)
    }
}

/// Missing file means "not available yet"
fn read_repodata(path: &Path) -> Result<Option<RepoData>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No repository data at {}", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(Error::IoError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )));
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::RepoDataError(format!("{}: {}", path.display(), e)))
}
