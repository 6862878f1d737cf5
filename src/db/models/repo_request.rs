// src/db/models/repo_request.rs

//! Repo generation requests
//!
//! A request is queued whenever a new repository snapshot becomes ready.
//! Only the newest request matters: older ones are discarded once it has
//! been processed.

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone)]
pub struct RepoGenerationRequest {
    pub id: Option<i64>,
    pub repo_id: i64,
    pub requested_at: Option<String>,
}

impl RepoGenerationRequest {
    pub fn new(repo_id: i64) -> Self {
        Self {
            id: None,
            repo_id,
            requested_at: None,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO repo_generation_requests (repo_id) VALUES (?1)",
            [self.repo_id],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Queue a request for `repo_id` unless one is already pending
    ///
    /// Returns true when a new request was inserted.
    pub fn request(conn: &Connection, repo_id: i64) -> Result<bool> {
        let inserted = conn.execute(
            "INSERT INTO repo_generation_requests (repo_id)
             SELECT ?1 WHERE NOT EXISTS (
                 SELECT 1 FROM repo_generation_requests WHERE repo_id = ?1
             )",
            [repo_id],
        )?;
        Ok(inserted > 0)
    }

    /// The request with the highest repo id
    pub fn find_latest(conn: &Connection) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, requested_at FROM repo_generation_requests
             ORDER BY repo_id DESC, id DESC LIMIT 1",
        )?;
        let request = stmt.query_row([], Self::from_row).optional()?;
        Ok(request)
    }

    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, requested_at FROM repo_generation_requests ORDER BY repo_id",
        )?;

        let requests = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(requests)
    }

    /// Delete every request with `repo_id` at or below the given one
    pub fn delete_up_to(conn: &Connection, repo_id: i64) -> Result<usize> {
        let deleted = conn.execute(
            "DELETE FROM repo_generation_requests WHERE repo_id <= ?1",
            params![repo_id],
        )?;
        Ok(deleted)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            repo_id: row.get(1)?,
            requested_at: row.get(2)?,
        })
    }
}
