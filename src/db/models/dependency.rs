// src/db/models/dependency.rs

//! Resolved build dependencies
//!
//! One row per binary package that ended up in the install set of a
//! package's build environment for a given repo snapshot.

use crate::error::Result;
use crate::version::RpmVersion;
use rusqlite::{Connection, Row, params};
use std::fmt;

/// Identity of a dependency for diffing purposes
pub type DependencyKey = (String, Option<i64>, String, String);

/// A resolved build dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub id: Option<i64>,
    pub repo_id: i64,
    pub package_id: i64,
    pub name: String,
    pub epoch: Option<i64>,
    pub version: String,
    pub release: String,
    pub arch: String,
    /// Shortest path length from the source package, None beyond the limit
    pub distance: Option<u32>,
}

impl Dependency {
    pub fn new(
        repo_id: i64,
        package_id: i64,
        name: String,
        epoch: Option<i64>,
        version: String,
        release: String,
        arch: String,
    ) -> Self {
        Self {
            id: None,
            repo_id,
            package_id,
            name,
            epoch,
            version,
            release,
            arch,
            distance: None,
        }
    }

    /// (name, epoch, version, release); arch and distance do not count
    pub fn key(&self) -> DependencyKey {
        (
            self.name.clone(),
            self.epoch,
            self.version.clone(),
            self.release.clone(),
        )
    }

    pub fn evr(&self) -> RpmVersion {
        RpmVersion::new(
            self.epoch.unwrap_or(0).max(0) as u64,
            self.version.clone(),
            Some(self.release.clone()),
        )
    }

    /// Insert many dependencies with a single prepared statement
    pub fn insert_bulk(conn: &Connection, deps: &[Dependency]) -> Result<usize> {
        let mut stmt = conn.prepare(
            "INSERT INTO dependencies (repo_id, package_id, name, epoch, version, release, arch, distance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        for dep in deps {
            stmt.execute(params![
                dep.repo_id,
                dep.package_id,
                &dep.name,
                dep.epoch,
                &dep.version,
                &dep.release,
                &dep.arch,
                dep.distance,
            ])?;
        }

        Ok(deps.len())
    }

    /// Dependencies of a package as resolved in one repo snapshot
    pub fn find_for(conn: &Connection, package_id: i64, repo_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, package_id, name, epoch, version, release, arch, distance
             FROM dependencies
             WHERE package_id = ?1 AND repo_id = ?2
             ORDER BY name",
        )?;

        let deps = stmt
            .query_map(params![package_id, repo_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(deps)
    }

    /// Repo snapshots for which dependencies of a package are stored
    pub fn stored_repo_ids(conn: &Connection, package_id: i64) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT repo_id FROM dependencies WHERE package_id = ?1 ORDER BY repo_id",
        )?;

        let ids = stmt
            .query_map([package_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    /// Delete the dependencies of a package stored for one snapshot
    pub fn delete_for(conn: &Connection, package_id: i64, repo_id: i64) -> Result<usize> {
        let deleted = conn.execute(
            "DELETE FROM dependencies WHERE package_id = ?1 AND repo_id = ?2",
            params![package_id, repo_id],
        )?;
        Ok(deleted)
    }

    /// Delete dependencies of a package resolved in snapshots older than `repo_id`
    pub fn delete_older_than(conn: &Connection, package_id: i64, repo_id: i64) -> Result<usize> {
        let deleted = conn.execute(
            "DELETE FROM dependencies WHERE package_id = ?1 AND repo_id < ?2",
            params![package_id, repo_id],
        )?;
        Ok(deleted)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            repo_id: row.get(1)?,
            package_id: row.get(2)?,
            name: row.get(3)?,
            epoch: row.get(4)?,
            version: row.get(5)?,
            release: row.get(6)?,
            arch: row.get(7)?,
            distance: row.get(8)?,
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.evr(), self.arch)
    }
}
