// src/db/models/package.rs

//! Package model - source packages whose build dependencies are tracked

use super::build::{Build, BuildState};
use super::resolution::ResolutionProblem;
use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fmt;

const PACKAGE_COLUMNS: &str = "id, name, static_priority, manual_priority, added_at, arch_override,
     current_priority, last_complete_build_id, resolved, ignored, last_resolution_id";

/// Externally visible package status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    /// Excluded from resolution
    Ignored,
    /// Build dependencies cannot be installed
    Unresolved,
    /// Last complete build succeeded
    Ok,
    /// Last complete build failed
    Failing,
    /// Never built or never resolved
    Unknown,
}

impl PackageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageState::Ignored => "ignored",
            PackageState::Unresolved => "unresolved",
            PackageState::Ok => "ok",
            PackageState::Failing => "failing",
            PackageState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked source package
#[derive(Debug, Clone)]
pub struct Package {
    pub id: Option<i64>,
    pub name: String,
    pub static_priority: i32,
    pub manual_priority: i32,
    pub added_at: Option<String>,
    pub arch_override: Option<String>,
    /// Cached by the scheduler, never written here
    pub current_priority: Option<i32>,
    /// Newest build in state complete or failed (maintained by triggers)
    pub last_complete_build_id: Option<i64>,
    /// None until the first resolution
    pub resolved: Option<bool>,
    pub ignored: bool,
    /// Resolution result that last set `resolved`
    pub last_resolution_id: Option<i64>,
}

impl Package {
    /// Create a new Package
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            static_priority: 0,
            manual_priority: 0,
            added_at: None,
            arch_override: None,
            current_priority: None,
            last_complete_build_id: None,
            resolved: None,
            ignored: false,
            last_resolution_id: None,
        }
    }

    /// Insert this package into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO packages (name, static_priority, manual_priority, arch_override, ignored)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &self.name,
                self.static_priority,
                self.manual_priority,
                &self.arch_override,
                self.ignored,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a package by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE id = ?1"
        ))?;
        let package = stmt.query_row([id], Self::from_row).optional()?;
        Ok(package)
    }

    /// Find a package by name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE name = ?1"
        ))?;
        let package = stmt.query_row([name], Self::from_row).optional()?;
        Ok(package)
    }

    /// List all packages, ignored ones included
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages ORDER BY name"
        ))?;

        let packages = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(packages)
    }

    /// List packages taking part in resolution, in id order
    pub fn list_active(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE ignored = 0 ORDER BY id"
        ))?;

        let packages = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(packages)
    }

    /// Persist the outcome of the latest resolution
    ///
    /// `resolution_id` is the result the outcome came from; its problems are
    /// the ones reported for the package.
    pub fn set_resolved(
        conn: &Connection,
        id: i64,
        resolution_id: i64,
        resolved: bool,
    ) -> Result<()> {
        conn.execute(
            "UPDATE packages SET resolved = ?1, last_resolution_id = ?2 WHERE id = ?3",
            params![resolved, resolution_id, id],
        )?;
        Ok(())
    }

    /// Include or exclude this package from resolution
    pub fn set_ignored(&mut self, conn: &Connection, ignored: bool) -> Result<()> {
        let id = self.id.ok_or_else(|| {
            Error::InitError("Cannot update package without ID".to_string())
        })?;

        conn.execute(
            "UPDATE packages SET ignored = ?1 WHERE id = ?2",
            params![ignored, id],
        )?;
        self.ignored = ignored;
        Ok(())
    }

    /// Compute the externally visible state
    pub fn state(&self, conn: &Connection) -> Result<PackageState> {
        if self.ignored {
            return Ok(PackageState::Ignored);
        }
        if self.resolved == Some(false) {
            return Ok(PackageState::Unresolved);
        }

        let Some(build_id) = self.last_complete_build_id else {
            return Ok(PackageState::Unknown);
        };

        let state = Build::find_by_id(conn, build_id)?.map(|build| build.state);
        Ok(match state {
            Some(BuildState::Complete) => PackageState::Ok,
            Some(BuildState::Failed) => PackageState::Failing,
            _ => PackageState::Unknown,
        })
    }

    /// Problems of the resolution that last set `resolved`
    pub fn resolution_problems(&self, conn: &Connection) -> Result<Vec<String>> {
        match self.id {
            Some(id) => ResolutionProblem::find_for_package(conn, id),
            None => Ok(Vec::new()),
        }
    }

    /// Convert a database row to a Package
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            static_priority: row.get(2)?,
            manual_priority: row.get(3)?,
            added_at: row.get(4)?,
            arch_override: row.get(5)?,
            current_priority: row.get(6)?,
            last_complete_build_id: row.get(7)?,
            resolved: row.get(8)?,
            ignored: row.get(9)?,
            last_resolution_id: row.get(10)?,
        })
    }
}
