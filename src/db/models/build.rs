// src/db/models/build.rs

//! Build model - builds reported by the build farm
//!
//! Builds are written by the poller that talks to the build farm. The
//! resolver only reads them and flips `deps_processed` / `deps_resolved`.

use crate::error::{Error, Result};
use crate::version::RpmVersion;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use std::str::FromStr;

const BUILD_COLUMNS: &str = "id, package_id, state, task_id, started_at, finished_at, epoch,
     version, release, repo_id, deps_processed, deps_resolved, real";

/// Build state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Running,
    Complete,
    Canceled,
    Failed,
}

impl BuildState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildState::Running => "running",
            BuildState::Complete => "complete",
            BuildState::Canceled => "canceled",
            BuildState::Failed => "failed",
        }
    }
}

impl FromStr for BuildState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "running" => Ok(BuildState::Running),
            "complete" => Ok(BuildState::Complete),
            "canceled" => Ok(BuildState::Canceled),
            "failed" => Ok(BuildState::Failed),
            _ => Err(format!("Invalid build state: {s}")),
        }
    }
}

/// A build of a package
#[derive(Debug, Clone)]
pub struct Build {
    pub id: Option<i64>,
    pub package_id: i64,
    pub state: BuildState,
    pub task_id: Option<i64>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub epoch: Option<i64>,
    pub version: Option<String>,
    pub release: Option<String>,
    /// Repo snapshot the build ran against
    pub repo_id: Option<i64>,
    /// Dependencies of this build have been handled by the resolver
    pub deps_processed: bool,
    /// Resolution of this build's dependencies succeeded
    pub deps_resolved: bool,
    /// Built by a packager rather than scheduled by us
    pub real: bool,
}

impl Build {
    /// Create a new running Build
    pub fn new(package_id: i64) -> Self {
        Self {
            id: None,
            package_id,
            state: BuildState::Running,
            task_id: None,
            started_at: None,
            finished_at: None,
            epoch: None,
            version: None,
            release: None,
            repo_id: None,
            deps_processed: false,
            deps_resolved: false,
            real: false,
        }
    }

    /// Insert this build into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO builds (package_id, state, task_id, started_at, finished_at, epoch,
                                 version, release, repo_id, deps_processed, deps_resolved, real)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.package_id,
                self.state.as_str(),
                self.task_id,
                &self.started_at,
                &self.finished_at,
                self.epoch,
                &self.version,
                &self.release,
                self.repo_id,
                self.deps_processed,
                self.deps_resolved,
                self.real,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a build by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {BUILD_COLUMNS} FROM builds WHERE id = ?1"
        ))?;
        let build = stmt.query_row([id], Self::from_row).optional()?;
        Ok(build)
    }

    /// Builds whose dependencies still need processing, oldest first
    pub fn find_unprocessed(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {BUILD_COLUMNS} FROM builds
             WHERE deps_processed = 0 AND repo_id IS NOT NULL
             ORDER BY id"
        ))?;

        let builds = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(builds)
    }

    /// The newest earlier build of the same package whose dependencies resolved
    pub fn find_previous_resolved(&self, conn: &Connection) -> Result<Option<Self>> {
        let id = self.id.ok_or_else(|| {
            Error::InitError("Cannot look up previous build without ID".to_string())
        })?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {BUILD_COLUMNS} FROM builds
             WHERE package_id = ?1 AND id < ?2 AND deps_resolved = 1
             ORDER BY id DESC LIMIT 1"
        ))?;
        let build = stmt
            .query_row(params![self.package_id, id], Self::from_row)
            .optional()?;
        Ok(build)
    }

    /// Newest build of every package, keyed by package id
    pub fn last_builds_by_package(conn: &Connection) -> Result<HashMap<i64, Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {BUILD_COLUMNS} FROM builds
             WHERE id IN (SELECT MAX(id) FROM builds GROUP BY package_id)"
        ))?;

        let builds = stmt
            .query_map([], Self::from_row)?
            .map(|build| build.map(|b| (b.package_id, b)))
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;

        Ok(builds)
    }

    /// Record that the resolver has handled this build
    pub fn mark_deps_processed(conn: &Connection, id: i64, resolved: bool) -> Result<()> {
        conn.execute(
            "UPDATE builds SET deps_processed = 1, deps_resolved = ?1 WHERE id = ?2",
            params![resolved, id],
        )?;
        Ok(())
    }

    /// EVR of the built source package, if the build farm reported one
    pub fn evr(&self) -> Option<RpmVersion> {
        let version = self.version.as_ref()?;
        let release = self.release.as_ref()?;
        Some(RpmVersion::new(
            self.epoch.unwrap_or(0).max(0) as u64,
            version.clone(),
            Some(release.clone()),
        ))
    }

    /// Convert a database row to a Build
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let state_str: String = row.get(2)?;
        let state = state_str.parse::<BuildState>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?;

        Ok(Self {
            id: Some(row.get(0)?),
            package_id: row.get(1)?,
            state,
            task_id: row.get(3)?,
            started_at: row.get(4)?,
            finished_at: row.get(5)?,
            epoch: row.get(6)?,
            version: row.get(7)?,
            release: row.get(8)?,
            repo_id: row.get(9)?,
            deps_processed: row.get(10)?,
            deps_resolved: row.get(11)?,
            real: row.get(12)?,
        })
    }
}
