// src/db/models/mod.rs

//! Data models for respin database entities
//!
//! This module defines Rust structs that correspond to database tables
//! and provides methods for creating, reading and updating records.

mod build;
mod dependency;
mod dependency_change;
mod package;
mod repo_request;
mod resolution;

pub use build::{Build, BuildState};
pub use dependency::{Dependency, DependencyKey};
pub use dependency_change::{ChangeKind, DependencyChange};
pub use package::{Package, PackageState};
pub use repo_request::RepoGenerationRequest;
pub use resolution::{ResolutionProblem, ResolutionResult};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use rusqlite::Connection;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        schema::migrate(&conn).unwrap();
        (temp_file, conn)
    }

    fn add_package(conn: &Connection, name: &str) -> i64 {
        Package::new(name.to_string()).insert(conn).unwrap()
    }

    fn add_build(conn: &Connection, package_id: i64, state: BuildState, repo_id: Option<i64>) -> i64 {
        let mut build = Build::new(package_id);
        build.state = state;
        build.repo_id = repo_id;
        build.insert(conn).unwrap()
    }

    #[test]
    fn test_package_crud() {
        let (_temp, conn) = create_test_db();

        let mut pkg = Package::new("rnv".to_string());
        pkg.static_priority = 5;
        let id = pkg.insert(&conn).unwrap();
        assert_eq!(pkg.id, Some(id));

        let found = Package::find_by_name(&conn, "rnv").unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.static_priority, 5);
        assert_eq!(found.resolved, None);
        assert!(!found.ignored);
        assert!(found.added_at.is_some());

        assert!(Package::find_by_name(&conn, "missing").unwrap().is_none());

        // Duplicate names are rejected
        assert!(Package::new("rnv".to_string()).insert(&conn).is_err());
    }

    #[test]
    fn test_list_active_skips_ignored() {
        let (_temp, conn) = create_test_db();

        add_package(&conn, "a");
        let mut b = Package::new("b".to_string());
        b.insert(&conn).unwrap();
        b.set_ignored(&conn, true).unwrap();
        add_package(&conn, "c");

        let names: Vec<_> = Package::list_active(&conn)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(Package::list_all(&conn).unwrap().len(), 3);
    }

    #[test]
    fn test_package_state() {
        let (_temp, conn) = create_test_db();
        let id = add_package(&conn, "foo");

        let pkg = Package::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(pkg.state(&conn).unwrap(), PackageState::Unknown);

        add_build(&conn, id, BuildState::Complete, Some(1));
        let pkg = Package::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(pkg.state(&conn).unwrap(), PackageState::Ok);

        add_build(&conn, id, BuildState::Failed, Some(2));
        let pkg = Package::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(pkg.state(&conn).unwrap(), PackageState::Failing);

        let rid = ResolutionResult::record(&conn, 1, id, false).unwrap();
        Package::set_resolved(&conn, id, rid, false).unwrap();
        let mut pkg = Package::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(pkg.state(&conn).unwrap(), PackageState::Unresolved);

        pkg.set_ignored(&conn, true).unwrap();
        assert_eq!(pkg.state(&conn).unwrap(), PackageState::Ignored);
    }

    #[test]
    fn test_last_complete_build_trigger() {
        let (_temp, conn) = create_test_db();
        let id = add_package(&conn, "foo");

        let complete = add_build(&conn, id, BuildState::Complete, Some(1));
        let mut running = Build::new(id);
        running.insert(&conn).unwrap();

        let pkg = Package::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(pkg.last_complete_build_id, Some(complete));

        conn.execute(
            "UPDATE builds SET state = 'failed' WHERE id = ?1",
            [running.id.unwrap()],
        )
        .unwrap();
        let pkg = Package::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(pkg.last_complete_build_id, running.id);
    }

    #[test]
    fn test_unprocessed_builds() {
        let (_temp, conn) = create_test_db();
        let id = add_package(&conn, "foo");

        let first = add_build(&conn, id, BuildState::Complete, Some(1));
        add_build(&conn, id, BuildState::Running, None);
        let third = add_build(&conn, id, BuildState::Complete, Some(2));

        let ids: Vec<_> = Build::find_unprocessed(&conn)
            .unwrap()
            .into_iter()
            .filter_map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![first, third]);

        Build::mark_deps_processed(&conn, first, true).unwrap();
        let build = Build::find_by_id(&conn, first).unwrap().unwrap();
        assert!(build.deps_processed);
        assert!(build.deps_resolved);
        assert_eq!(Build::find_unprocessed(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_previous_build() {
        let (_temp, conn) = create_test_db();
        let foo = add_package(&conn, "foo");
        let bar = add_package(&conn, "bar");

        let first = add_build(&conn, foo, BuildState::Complete, Some(1));
        add_build(&conn, bar, BuildState::Complete, Some(1));
        let unresolved = add_build(&conn, foo, BuildState::Complete, Some(1));
        let second = add_build(&conn, foo, BuildState::Complete, Some(2));
        Build::mark_deps_processed(&conn, first, true).unwrap();
        Build::mark_deps_processed(&conn, unresolved, false).unwrap();

        // Builds whose dependencies did not resolve are passed over
        let build = Build::find_by_id(&conn, second).unwrap().unwrap();
        let prev = build.find_previous_resolved(&conn).unwrap().unwrap();
        assert_eq!(prev.id, Some(first));

        let build = Build::find_by_id(&conn, first).unwrap().unwrap();
        assert!(build.find_previous_resolved(&conn).unwrap().is_none());

        let last = Build::last_builds_by_package(&conn).unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[&foo].id, Some(second));
    }

    #[test]
    fn test_repo_generation_requests() {
        let (_temp, conn) = create_test_db();

        assert!(RepoGenerationRequest::find_latest(&conn).unwrap().is_none());

        assert!(RepoGenerationRequest::request(&conn, 5).unwrap());
        assert!(!RepoGenerationRequest::request(&conn, 5).unwrap());
        RepoGenerationRequest::request(&conn, 9).unwrap();
        RepoGenerationRequest::request(&conn, 7).unwrap();

        let latest = RepoGenerationRequest::find_latest(&conn).unwrap().unwrap();
        assert_eq!(latest.repo_id, 9);

        assert_eq!(RepoGenerationRequest::delete_up_to(&conn, 7).unwrap(), 2);
        let remaining = RepoGenerationRequest::list_all(&conn).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].repo_id, 9);
    }

    #[test]
    fn test_dependency_bulk_insert_and_retention() {
        let (_temp, conn) = create_test_db();
        let id = add_package(&conn, "foo");

        let dep = |repo_id: i64, name: &str| {
            Dependency::new(
                repo_id,
                id,
                name.to_string(),
                None,
                "1.0".to_string(),
                "1".to_string(),
                "x86_64".to_string(),
            )
        };

        Dependency::insert_bulk(&conn, &[dep(1, "gcc"), dep(1, "make")]).unwrap();
        Dependency::insert_bulk(&conn, &[dep(2, "gcc")]).unwrap();

        assert_eq!(Dependency::find_for(&conn, id, 1).unwrap().len(), 2);
        assert_eq!(Dependency::stored_repo_ids(&conn, id).unwrap(), vec![1, 2]);

        assert_eq!(Dependency::delete_older_than(&conn, id, 2).unwrap(), 2);
        assert_eq!(Dependency::stored_repo_ids(&conn, id).unwrap(), vec![2]);
        assert_eq!(dep(2, "gcc").to_string(), "gcc-1.0-1.x86_64");
    }

    #[test]
    fn test_dependency_changes_ordering() {
        let (_temp, conn) = create_test_db();
        let id = add_package(&conn, "foo");
        let build = add_build(&conn, id, BuildState::Complete, Some(2));

        let change = |name: &str, distance: Option<u32>, applied: Option<i64>| {
            let mut c = DependencyChange::new(id, name.to_string(), applied);
            c.curr_version = Some("1.0".to_string());
            c.curr_release = Some("1".to_string());
            c.distance = distance;
            c
        };

        DependencyChange::insert_bulk(
            &conn,
            &[
                change("far", None, None),
                change("mid", Some(3), None),
                change("near", Some(1), None),
                change("x", None, Some(build)),
                change("y", Some(2), Some(build)),
            ],
        )
        .unwrap();

        let unapplied: Vec<_> = DependencyChange::find_unapplied(&conn, id)
            .unwrap()
            .into_iter()
            .map(|c| c.dep_name)
            .collect();
        assert_eq!(unapplied, vec!["near", "mid", "far"]);

        let applied: Vec<_> = DependencyChange::find_applied_in(&conn, build)
            .unwrap()
            .into_iter()
            .map(|c| c.dep_name)
            .collect();
        assert_eq!(applied, vec!["y", "x"]);
    }

    #[test]
    fn test_mark_applied_never_overwrites() {
        let (_temp, conn) = create_test_db();
        let id = add_package(&conn, "foo");
        let b1 = add_build(&conn, id, BuildState::Complete, Some(1));
        let b2 = add_build(&conn, id, BuildState::Complete, Some(2));

        DependencyChange::insert_bulk(&conn, &[DependencyChange::new(id, "gcc".to_string(), None)])
            .unwrap();
        let change_id = DependencyChange::find_by_package(&conn, id).unwrap()[0]
            .id
            .unwrap();

        assert_eq!(DependencyChange::mark_applied(&conn, &[change_id], b1).unwrap(), 1);
        assert_eq!(DependencyChange::mark_applied(&conn, &[change_id], b2).unwrap(), 0);
        assert_eq!(DependencyChange::find_applied_in(&conn, b1).unwrap().len(), 1);
    }

    #[test]
    fn test_change_kind() {
        let mut change = DependencyChange::new(1, "libbar".to_string(), None);
        change.curr_version = Some("1.1".to_string());
        change.curr_release = Some("1".to_string());
        assert_eq!(change.kind(), ChangeKind::Added);

        change.prev_version = Some("1.0".to_string());
        change.prev_release = Some("1".to_string());
        assert_eq!(change.kind(), ChangeKind::Upgraded);
        assert_eq!(change.to_string(), "libbar 1.0-1 -> 1.1-1");

        change.curr_version = None;
        change.curr_release = None;
        assert_eq!(change.kind(), ChangeKind::Removed);
    }

    #[test]
    fn test_resolution_record_replaces_problems() {
        let (_temp, conn) = create_test_db();
        let id = add_package(&conn, "foo");

        assert!(!ResolutionResult::exists_for_repo(&conn, 3).unwrap());

        let rid = ResolutionResult::record(&conn, 3, id, false).unwrap();
        ResolutionProblem::new(rid, "nothing provides libbar".to_string())
            .insert(&conn)
            .unwrap();
        Package::set_resolved(&conn, id, rid, false).unwrap();
        assert!(ResolutionResult::exists_for_repo(&conn, 3).unwrap());
        assert_eq!(
            ResolutionProblem::find_for_package(&conn, id).unwrap(),
            vec!["nothing provides libbar".to_string()]
        );

        let rid2 = ResolutionResult::record(&conn, 3, id, true).unwrap();
        assert_eq!(rid, rid2);
        assert_eq!(ResolutionResult::count_for_repo(&conn, 3).unwrap(), 1);
        assert!(ResolutionResult::find(&conn, 3, id).unwrap().unwrap().resolved);
        assert!(ResolutionProblem::find_for_package(&conn, id).unwrap().is_empty());
    }

    #[test]
    fn test_problems_follow_resolved_flag() {
        let (_temp, conn) = create_test_db();
        let id = add_package(&conn, "foo");

        // Newer snapshot fails first
        let newer = ResolutionResult::record(&conn, 11, id, false).unwrap();
        ResolutionProblem::new(newer, "nothing provides libbar".to_string())
            .insert(&conn)
            .unwrap();
        Package::set_resolved(&conn, id, newer, false).unwrap();

        let pkg = Package::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(pkg.last_resolution_id, Some(newer));
        assert_eq!(
            pkg.resolution_problems(&conn).unwrap(),
            vec!["nothing provides libbar".to_string()]
        );

        // Then an older snapshot resolves
        let older = ResolutionResult::record(&conn, 10, id, true).unwrap();
        Package::set_resolved(&conn, id, older, true).unwrap();

        let pkg = Package::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(pkg.resolved, Some(true));
        assert!(pkg.resolution_problems(&conn).unwrap().is_empty());
    }
}
