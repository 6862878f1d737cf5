// src/resolver/diff.rs

//! Dependency diffs
//!
//! Two resolutions of the same package are compared as sets keyed by
//! (name, epoch, version, release). Every name whose key differs yields
//! one [`DependencyChange`]: only a previous side (removed), only a
//! current side (added) or both (changed).

use crate::db::models::{Dependency, DependencyChange, DependencyKey};
use crate::error::Result;
use rusqlite::Connection;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Compute the changes between `prev` and `curr`
///
/// Nothing is reported when either side is empty: a package without
/// dependency history cannot be diffed yet. Changes come out ordered by
/// dependency name.
pub fn compute_dependency_changes(
    prev: &[Dependency],
    curr: &[Dependency],
    package_id: i64,
    applied_in: Option<i64>,
) -> Vec<DependencyChange> {
    if prev.is_empty() || curr.is_empty() {
        return Vec::new();
    }

    let prev_keys: HashSet<DependencyKey> = prev.iter().map(Dependency::key).collect();
    let curr_keys: HashSet<DependencyKey> = curr.iter().map(Dependency::key).collect();

    let mut changes: BTreeMap<String, DependencyChange> = BTreeMap::new();

    for dep in prev.iter().filter(|d| !curr_keys.contains(&d.key())) {
        let change = changes
            .entry(dep.name.clone())
            .or_insert_with(|| DependencyChange::new(package_id, dep.name.clone(), applied_in));
        change.set_prev(dep);
        change.distance = dep.distance;
    }

    // The newer side's distance wins when it has one
    for dep in curr.iter().filter(|d| !prev_keys.contains(&d.key())) {
        let change = changes
            .entry(dep.name.clone())
            .or_insert_with(|| DependencyChange::new(package_id, dep.name.clone(), applied_in));
        change.set_curr(dep);
        change.distance = dep.distance.or(change.distance);
    }

    changes.into_values().collect()
}

/// Diff `prev` against `curr` and store the changes in one bulk insert
///
/// Runs inside the caller's transaction. Returns the number of changes.
pub fn generate_dependency_differences(
    conn: &Connection,
    prev: &[Dependency],
    curr: &[Dependency],
    package_id: i64,
    applied_in: Option<i64>,
) -> Result<usize> {
    let changes = compute_dependency_changes(prev, curr, package_id, applied_in);
    if changes.is_empty() {
        return Ok(0);
    }

    debug!(
        "Recording {} dependency changes for package {}",
        changes.len(),
        package_id
    );
    DependencyChange::insert_bulk(conn, &changes)
}
