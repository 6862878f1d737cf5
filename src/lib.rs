// src/lib.rs

//! Respin build dependency tracker
//!
//! Resolves the build environment of distribution packages against
//! successive repository snapshots and records which build dependencies
//! changed, and which rebuild picked the changes up.
//!
//! # Architecture
//!
//! - Database-first: packages, builds, resolution results and dependency
//!   changes all live in SQLite
//! - Universe: the binary and source package metadata of one repo snapshot
//! - Solver: computes the install set of a build root behind a trait
//! - Resolver: drives resolution for new snapshots and finished builds,
//!   one transaction per package or build

pub mod config;
pub mod db;
mod error;
pub mod event;
pub mod lock;
pub mod resolver;
pub mod solver;
pub mod universe;
pub mod version;
pub mod watch;

pub use config::RespinConfig;
pub use error::{Error, Result};
pub use resolver::{Collaborators, Resolver, ResolverConfig};
