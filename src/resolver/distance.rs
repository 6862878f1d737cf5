// src/resolver/distance.rs

//! Dependency distances
//!
//! The distance of a dependency is the smallest number of
//! requires -> provides hops from the source package: direct build
//! requirements are at distance 1, their requirements at 2, and so on.

use crate::db::models::Dependency;
use crate::universe::{Requirement, SolvableId, Universe};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Levels beyond this are not recorded
pub const MAX_DISTANCE: u32 = 7;

/// Annotate `deps` with distances from `srpm`
///
/// Dependencies not reached within [`MAX_DISTANCE`] keep `distance: None`.
/// A distance already set is never overwritten. Returns the distance of
/// every dependency name that was reached.
pub fn compute_dependency_distances(
    universe: &Universe,
    srpm: SolvableId,
    deps: &mut [Dependency],
) -> HashMap<String, u32> {
    let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, dep) in deps.iter().enumerate() {
        by_name.entry(dep.name.clone()).or_default().push(idx);
    }

    let mut distances = HashMap::new();
    let mut visited: HashSet<SolvableId> = HashSet::new();
    let mut frontier: Vec<Requirement> = universe
        .get(srpm)
        .map(|s| s.record.requires.clone())
        .unwrap_or_default();

    let mut level = 1;
    while level <= MAX_DISTANCE && !frontier.is_empty() {
        let on_level = universe.what_provides_any(&frontier);

        // Only packages seen for the first time are expanded further
        let mut next: BTreeMap<String, Requirement> = BTreeMap::new();
        for id in on_level.iter().filter(|id| !visited.contains(id)) {
            if let Some(solvable) = universe.get(*id) {
                for req in &solvable.record.requires {
                    next.entry(req.to_string()).or_insert_with(|| req.clone());
                }
            }
        }
        visited.extend(on_level.iter().copied());

        for id in &on_level {
            let Some(solvable) = universe.get(*id) else {
                continue;
            };
            let Some(indices) = by_name.get(&solvable.record.name) else {
                continue;
            };
            for &idx in indices {
                if deps[idx].distance.is_none() {
                    deps[idx].distance = Some(level);
                }
            }
            distances
                .entry(solvable.record.name.clone())
                .or_insert(level);
        }

        frontier = next.into_values().collect();
        level += 1;
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::{Origin, PackageRecord, RepoData};

    fn dep(name: &str) -> Dependency {
        Dependency::new(
            1,
            1,
            name.to_string(),
            Some(0),
            "1".to_string(),
            "1".to_string(),
            "x86_64".to_string(),
        )
    }

    /// Chain srpm -> p1 -> p2 -> ... -> p{len}
    fn chain_universe(len: usize) -> (Universe, SolvableId) {
        let mut binaries = Vec::new();
        for i in 1..=len {
            let mut pkg = PackageRecord::new(&format!("p{i}"), "1", "1", "x86_64");
            if i < len {
                pkg = pkg.requires(&format!("p{}", i + 1)).unwrap();
            }
            binaries.push(pkg);
        }
        let srpm = PackageRecord::new("root", "1", "1", "src")
            .requires("p1")
            .unwrap();

        let mut universe = Universe::new(1, "x86_64");
        universe.add_repo(&RepoData::new(binaries), Origin::Binary);
        universe.add_repo(&RepoData::new(vec![srpm]), Origin::Source);
        let id = universe.source_package("root", None).unwrap();
        (universe, id)
    }

    #[test]
    fn test_chain_levels_and_cutoff() {
        let (universe, srpm) = chain_universe(9);
        let mut deps: Vec<_> = (1..=9).map(|i| dep(&format!("p{i}"))).collect();

        let distances = compute_dependency_distances(&universe, srpm, &mut deps);

        for i in 1..=7 {
            assert_eq!(deps[i - 1].distance, Some(i as u32));
        }
        assert_eq!(deps[7].distance, None);
        assert_eq!(deps[8].distance, None);
        assert_eq!(distances.len(), 7);
    }

    #[test]
    fn test_minimum_distance_wins() {
        // root requires a and c; a requires b; b requires c
        let binaries = RepoData::new(vec![
            PackageRecord::new("a", "1", "1", "x86_64").requires("b").unwrap(),
            PackageRecord::new("b", "1", "1", "x86_64").requires("c").unwrap(),
            PackageRecord::new("c", "1", "1", "x86_64").requires("a").unwrap(),
        ]);
        let srpm = PackageRecord::new("root", "1", "1", "src")
            .requires("a")
            .unwrap()
            .requires("c")
            .unwrap();

        let mut universe = Universe::new(1, "x86_64");
        universe.add_repo(&binaries, Origin::Binary);
        universe.add_repo(&RepoData::new(vec![srpm]), Origin::Source);
        let srpm = universe.source_package("root", None).unwrap();

        let mut deps = vec![dep("a"), dep("b"), dep("c")];
        let distances = compute_dependency_distances(&universe, srpm, &mut deps);

        assert_eq!(deps[0].distance, Some(1));
        assert_eq!(deps[1].distance, Some(2));
        assert_eq!(deps[2].distance, Some(1));
        assert_eq!(distances["c"], 1);
    }

    #[test]
    fn test_preset_distance_is_kept() {
        let (universe, srpm) = chain_universe(2);
        let mut deps = vec![dep("p1"), dep("p2")];
        deps[1].distance = Some(5);

        compute_dependency_distances(&universe, srpm, &mut deps);
        assert_eq!(deps[1].distance, Some(5));
    }

    #[test]
    fn test_virtual_provides_are_followed() {
        let binaries = RepoData::new(vec![
            PackageRecord::new("libbar-devel", "1", "1", "x86_64")
                .provides("pkgconfig(bar) = 1")
                .unwrap()
                .requires("libbar.so.1()(64bit)")
                .unwrap(),
            PackageRecord::new("libbar", "1", "1", "x86_64")
                .provides("libbar.so.1()(64bit)")
                .unwrap(),
        ]);
        let srpm = PackageRecord::new("foo", "1", "1", "src")
            .requires("pkgconfig(bar)")
            .unwrap();

        let mut universe = Universe::new(1, "x86_64");
        universe.add_repo(&binaries, Origin::Binary);
        universe.add_repo(&RepoData::new(vec![srpm]), Origin::Source);
        let srpm = universe.source_package("foo", None).unwrap();

        let mut deps = vec![dep("libbar"), dep("libbar-devel"), dep("gcc")];
        compute_dependency_distances(&universe, srpm, &mut deps);
        assert_eq!(deps[0].distance, Some(2));
        assert_eq!(deps[1].distance, Some(1));
        assert_eq!(deps[2].distance, None);
    }
}
