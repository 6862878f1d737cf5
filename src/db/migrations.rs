// src/db/migrations.rs
//! Database migration implementations
//!
//! This module contains the individual migration functions for evolving
//! the respin database schema. Each migration function handles a specific
//! version upgrade.

use crate::error::Result;
use rusqlite::Connection;
use tracing::{debug, info};

/// Initial schema - Version 1
///
/// Creates the core tables:
/// - packages: Tracked source packages
/// - builds: Builds reported by the build farm
/// - repo_generation_requests: Queue of repo snapshots ready for resolution
/// - dependencies: Resolved build dependencies per repo snapshot
/// - dependency_changes: Per-dependency differences between resolutions
/// - resolution_results / resolution_problems: Outcome of each resolution
pub fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        -- Packages: source packages whose build dependencies are tracked
        CREATE TABLE packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            static_priority INTEGER NOT NULL DEFAULT 0,
            manual_priority INTEGER NOT NULL DEFAULT 0,
            added_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            arch_override TEXT,
            current_priority INTEGER,
            last_complete_build_id INTEGER
                REFERENCES builds(id) ON DELETE SET NULL,
            resolved INTEGER,
            ignored INTEGER NOT NULL DEFAULT 0
        );

        -- Builds: written by the build-farm poller, read here
        CREATE TABLE builds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package_id INTEGER NOT NULL,
            state TEXT NOT NULL DEFAULT 'running'
                CHECK(state IN ('running', 'complete', 'canceled', 'failed')),
            task_id INTEGER UNIQUE,
            started_at TEXT,
            finished_at TEXT,
            epoch INTEGER,
            version TEXT,
            release TEXT,
            repo_id INTEGER,
            deps_processed INTEGER NOT NULL DEFAULT 0,
            deps_resolved INTEGER NOT NULL DEFAULT 0,
            real INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_builds_package_id ON builds(package_id, id DESC);
        CREATE INDEX idx_builds_deps_processed ON builds(deps_processed);

        -- Repo generation requests: one per repo snapshot that became ready
        CREATE TABLE repo_generation_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            repo_id INTEGER NOT NULL,
            requested_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX idx_repo_generation_requests_repo_id
            ON repo_generation_requests(repo_id);

        -- Dependencies: resolved build dependencies of a package in a repo
        CREATE TABLE dependencies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            repo_id INTEGER NOT NULL,
            package_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            epoch INTEGER,
            version TEXT NOT NULL,
            release TEXT NOT NULL,
            arch TEXT NOT NULL,
            distance INTEGER,
            FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_dependencies_package_repo ON dependencies(package_id, repo_id);

        -- Dependency changes: one row per changed dependency name
        CREATE TABLE dependency_changes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package_id INTEGER NOT NULL,
            applied_in_id INTEGER,
            dep_name TEXT NOT NULL,
            prev_epoch INTEGER,
            prev_version TEXT,
            prev_release TEXT,
            curr_epoch INTEGER,
            curr_version TEXT,
            curr_release TEXT,
            distance INTEGER,
            FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE,
            FOREIGN KEY (applied_in_id) REFERENCES builds(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_dependency_changes_package ON dependency_changes(package_id);
        CREATE INDEX idx_dependency_changes_applied_in ON dependency_changes(applied_in_id);

        -- Resolution results: at most one per (repo snapshot, package)
        CREATE TABLE resolution_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            repo_id INTEGER NOT NULL,
            package_id INTEGER NOT NULL,
            resolved INTEGER NOT NULL,
            resolved_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(repo_id, package_id),
            FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
        );

        -- Resolution problems: solver diagnostics of a failed resolution
        CREATE TABLE resolution_problems (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            resolution_id INTEGER NOT NULL,
            problem TEXT NOT NULL,
            FOREIGN KEY (resolution_id) REFERENCES resolution_results(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_resolution_problems_resolution ON resolution_problems(resolution_id);
        ",
    )?;

    info!("Schema version 1 created successfully");
    Ok(())
}

/// Schema Version 2: Maintain packages.last_complete_build_id
///
/// The build-farm poller only writes to `builds`; these triggers keep the
/// denormalized pointer to the newest complete-or-failed build current.
/// Deletions are handled by the ON DELETE SET NULL foreign key.
pub fn migrate_v2(conn: &Connection) -> Result<()> {
    debug!("Migrating to schema version 2");

    conn.execute_batch(
        "
        CREATE TRIGGER update_last_complete_build_on_insert
        AFTER INSERT ON builds
        WHEN NEW.state IN ('complete', 'failed')
        BEGIN
            UPDATE packages
            SET last_complete_build_id = (
                SELECT id FROM builds
                WHERE package_id = NEW.package_id
                  AND state IN ('complete', 'failed')
                ORDER BY id DESC LIMIT 1
            )
            WHERE id = NEW.package_id;
        END;

        CREATE TRIGGER update_last_complete_build_on_update
        AFTER UPDATE OF state ON builds
        WHEN OLD.state != NEW.state
        BEGIN
            UPDATE packages
            SET last_complete_build_id = (
                SELECT id FROM builds
                WHERE package_id = NEW.package_id
                  AND state IN ('complete', 'failed')
                ORDER BY id DESC LIMIT 1
            )
            WHERE id = NEW.package_id;
        END;
        ",
    )?;

    info!("Schema version 2 applied successfully");
    Ok(())
}

/// Version 3: packages point at the resolution that set `resolved`
///
/// The resolved flag and the reported problems must describe the same
/// resolution, even when an older snapshot is resolved after a newer one.
pub fn migrate_v3(conn: &Connection) -> Result<()> {
    debug!("Migrating to schema version 3");

    conn.execute_batch(
        "
        ALTER TABLE packages ADD COLUMN last_resolution_id INTEGER
            REFERENCES resolution_results(id) ON DELETE SET NULL;
        ",
    )?;

    info!("Schema version 3 applied successfully");
    Ok(())
}
