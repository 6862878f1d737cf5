// src/resolver/mod.rs

//! Build dependency resolution
//!
//! Resolves the build environment of every tracked package against repo
//! snapshots, records the outcome and tracks how dependencies change
//! between builds and snapshots.

pub mod cache;
pub mod diff;
pub mod distance;
pub mod engine;
pub mod orchestrator;

pub use cache::UniverseCache;
pub use diff::{compute_dependency_changes, generate_dependency_differences};
pub use distance::{MAX_DISTANCE, compute_dependency_distances};
pub use engine::ResolutionEngine;
pub use orchestrator::{
    BuildGroupProvider, Collaborators, Resolver, ResolverConfig, StaticBuildGroup,
};
