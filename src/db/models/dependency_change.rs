// src/db/models/dependency_change.rs

//! Dependency change log
//!
//! Each row describes how one dependency name differs between two
//! resolutions of the same package. Rows are append-only; the only column
//! ever updated is `applied_in_id`, and only from NULL to a build id.

use super::dependency::Dependency;
use crate::error::Result;
use crate::version::RpmVersion;
use rusqlite::{Connection, Row, params};
use std::fmt;

const CHANGE_COLUMNS: &str = "id, package_id, applied_in_id, dep_name, prev_epoch, prev_version,
     prev_release, curr_epoch, curr_version, curr_release, distance";

/// Kind of change derived from which sides are present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Upgraded,
    Downgraded,
    /// Same EVR ordering but different strings (e.g. epoch 0 vs none)
    Changed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Upgraded => "upgraded",
            ChangeKind::Downgraded => "downgraded",
            ChangeKind::Changed => "changed",
        }
    }
}

/// One changed dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyChange {
    pub id: Option<i64>,
    pub package_id: i64,
    /// Build that picked the change up; None for observational changes
    pub applied_in_id: Option<i64>,
    pub dep_name: String,
    pub prev_epoch: Option<i64>,
    pub prev_version: Option<String>,
    pub prev_release: Option<String>,
    pub curr_epoch: Option<i64>,
    pub curr_version: Option<String>,
    pub curr_release: Option<String>,
    pub distance: Option<u32>,
}

impl DependencyChange {
    pub fn new(package_id: i64, dep_name: String, applied_in_id: Option<i64>) -> Self {
        Self {
            id: None,
            package_id,
            applied_in_id,
            dep_name,
            prev_epoch: None,
            prev_version: None,
            prev_release: None,
            curr_epoch: None,
            curr_version: None,
            curr_release: None,
            distance: None,
        }
    }

    /// Fill the previous side from a dependency
    pub fn set_prev(&mut self, dep: &Dependency) {
        self.prev_epoch = dep.epoch;
        self.prev_version = Some(dep.version.clone());
        self.prev_release = Some(dep.release.clone());
    }

    /// Fill the current side from a dependency
    pub fn set_curr(&mut self, dep: &Dependency) {
        self.curr_epoch = dep.epoch;
        self.curr_version = Some(dep.version.clone());
        self.curr_release = Some(dep.release.clone());
    }

    pub fn prev_evr(&self) -> Option<RpmVersion> {
        side_evr(self.prev_epoch, &self.prev_version, &self.prev_release)
    }

    pub fn curr_evr(&self) -> Option<RpmVersion> {
        side_evr(self.curr_epoch, &self.curr_version, &self.curr_release)
    }

    pub fn kind(&self) -> ChangeKind {
        match (self.prev_evr(), self.curr_evr()) {
            (None, _) => ChangeKind::Added,
            (_, None) => ChangeKind::Removed,
            (Some(prev), Some(curr)) => match prev.cmp(&curr) {
                std::cmp::Ordering::Less => ChangeKind::Upgraded,
                std::cmp::Ordering::Greater => ChangeKind::Downgraded,
                std::cmp::Ordering::Equal => ChangeKind::Changed,
            },
        }
    }

    /// Insert many changes with a single prepared statement
    pub fn insert_bulk(conn: &Connection, changes: &[DependencyChange]) -> Result<usize> {
        let mut stmt = conn.prepare(
            "INSERT INTO dependency_changes (package_id, applied_in_id, dep_name,
                 prev_epoch, prev_version, prev_release,
                 curr_epoch, curr_version, curr_release, distance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;

        for change in changes {
            stmt.execute(params![
                change.package_id,
                change.applied_in_id,
                &change.dep_name,
                change.prev_epoch,
                &change.prev_version,
                &change.prev_release,
                change.curr_epoch,
                &change.curr_version,
                &change.curr_release,
                change.distance,
            ])?;
        }

        Ok(changes.len())
    }

    /// All changes recorded for a package, oldest first
    pub fn find_by_package(conn: &Connection, package_id: i64) -> Result<Vec<Self>> {
        Self::query(
            conn,
            &format!("SELECT {CHANGE_COLUMNS} FROM dependency_changes WHERE package_id = ?1 ORDER BY id"),
            package_id,
        )
    }

    /// Changes not yet picked up by any build, nearest first
    pub fn find_unapplied(conn: &Connection, package_id: i64) -> Result<Vec<Self>> {
        Self::query(
            conn,
            &format!(
                "SELECT {CHANGE_COLUMNS} FROM dependency_changes
                 WHERE package_id = ?1 AND applied_in_id IS NULL
                 ORDER BY distance IS NULL, distance, id"
            ),
            package_id,
        )
    }

    /// Changes a build picked up, nearest first
    pub fn find_applied_in(conn: &Connection, build_id: i64) -> Result<Vec<Self>> {
        Self::query(
            conn,
            &format!(
                "SELECT {CHANGE_COLUMNS} FROM dependency_changes
                 WHERE applied_in_id = ?1
                 ORDER BY distance IS NULL, distance, id"
            ),
            build_id,
        )
    }

    /// Attach unapplied changes to a build; already applied rows are left alone
    pub fn mark_applied(conn: &Connection, change_ids: &[i64], build_id: i64) -> Result<usize> {
        let mut stmt = conn.prepare(
            "UPDATE dependency_changes SET applied_in_id = ?1
             WHERE id = ?2 AND applied_in_id IS NULL",
        )?;

        let mut updated = 0;
        for id in change_ids {
            updated += stmt.execute(params![build_id, id])?;
        }
        Ok(updated)
    }

    fn query(conn: &Connection, sql: &str, param: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(sql)?;
        let changes = stmt
            .query_map([param], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(changes)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            package_id: row.get(1)?,
            applied_in_id: row.get(2)?,
            dep_name: row.get(3)?,
            prev_epoch: row.get(4)?,
            prev_version: row.get(5)?,
            prev_release: row.get(6)?,
            curr_epoch: row.get(7)?,
            curr_version: row.get(8)?,
            curr_release: row.get(9)?,
            distance: row.get(10)?,
        })
    }
}

fn side_evr(
    epoch: Option<i64>,
    version: &Option<String>,
    release: &Option<String>,
) -> Option<RpmVersion> {
    let version = version.as_ref()?;
    Some(RpmVersion::new(
        epoch.unwrap_or(0).max(0) as u64,
        version.clone(),
        release.clone(),
    ))
}

impl fmt::Display for DependencyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |evr: Option<RpmVersion>| evr.map_or_else(|| "(none)".to_string(), |v| v.to_string());
        write!(
            f,
            "{} {} -> {}",
            self.dep_name,
            side(self.prev_evr()),
            side(self.curr_evr())
        )
    }
}
