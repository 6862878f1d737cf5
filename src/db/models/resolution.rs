// src/db/models/resolution.rs

//! Resolution results and the solver problems attached to failed ones
//!
//! At most one result exists per (repo snapshot, package). The schema
//! enforces this with a UNIQUE constraint; [`ResolutionResult::record`]
//! replaces an existing result in place together with its problems.

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone)]
pub struct ResolutionResult {
    pub id: Option<i64>,
    pub repo_id: i64,
    pub package_id: i64,
    pub resolved: bool,
    pub resolved_at: Option<String>,
}

impl ResolutionResult {
    /// Insert or replace the result for (repo_id, package_id)
    ///
    /// Problems of a replaced result are deleted. Returns the result id.
    pub fn record(conn: &Connection, repo_id: i64, package_id: i64, resolved: bool) -> Result<i64> {
        let id: i64 = conn.query_row(
            "INSERT INTO resolution_results (repo_id, package_id, resolved)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(repo_id, package_id) DO UPDATE SET
                 resolved = excluded.resolved,
                 resolved_at = CURRENT_TIMESTAMP
             RETURNING id",
            params![repo_id, package_id, resolved],
            |row| row.get(0),
        )?;

        conn.execute(
            "DELETE FROM resolution_problems WHERE resolution_id = ?1",
            [id],
        )?;

        Ok(id)
    }

    pub fn find(conn: &Connection, repo_id: i64, package_id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, package_id, resolved, resolved_at FROM resolution_results
             WHERE repo_id = ?1 AND package_id = ?2",
        )?;
        let result = stmt
            .query_row(params![repo_id, package_id], Self::from_row)
            .optional()?;
        Ok(result)
    }

    /// Whether any package has been resolved against this snapshot
    pub fn exists_for_repo(conn: &Connection, repo_id: i64) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM resolution_results WHERE repo_id = ?1)",
            [repo_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn count_for_repo(conn: &Connection, repo_id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM resolution_results WHERE repo_id = ?1",
            [repo_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            repo_id: row.get(1)?,
            package_id: row.get(2)?,
            resolved: row.get(3)?,
            resolved_at: row.get(4)?,
        })
    }
}

/// A solver diagnostic explaining why a resolution failed
#[derive(Debug, Clone)]
pub struct ResolutionProblem {
    pub id: Option<i64>,
    pub resolution_id: i64,
    pub problem: String,
}

impl ResolutionProblem {
    pub fn new(resolution_id: i64, problem: String) -> Self {
        Self {
            id: None,
            resolution_id,
            problem,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO resolution_problems (resolution_id, problem) VALUES (?1, ?2)",
            params![self.resolution_id, &self.problem],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Problems of the resolution that last set the package's resolved flag
    pub fn find_for_package(conn: &Connection, package_id: i64) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT p.problem FROM resolution_problems p
             JOIN packages pkg ON pkg.last_resolution_id = p.resolution_id
             WHERE pkg.id = ?1
             ORDER BY p.id",
        )?;

        let problems = stmt
            .query_map([package_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(problems)
    }
}
