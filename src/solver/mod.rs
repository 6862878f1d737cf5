// src/solver/mod.rs

//! Universe solver interface
//!
//! The resolver hands a [`Goal`] to a [`UniverseSolver`] and gets back
//! either the full install set or a list of human-readable problems.
//! Solvers must be deterministic: the same universe and goal always give
//! the same outcome, otherwise dependency diffs become noise.

mod builtin;

pub use builtin::BuiltinSolver;

use crate::error::Result;
use crate::universe::{SolvableId, Universe};

/// What to install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Goal {
    /// Packages installed exactly as given
    pub install: Vec<SolvableId>,
    /// Names resolved by the solver to their best candidate
    pub select: Vec<String>,
}

impl Goal {
    /// Goal for a build environment: the build group plus the source package
    pub fn for_build(srpm: SolvableId, group: &[String]) -> Self {
        Self {
            install: vec![srpm],
            select: group.to_vec(),
        }
    }
}

/// Result of one solver run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Success { installs: Vec<SolvableId> },
    Failure { problems: Vec<String> },
}

pub trait UniverseSolver {
    fn solve(&self, universe: &Universe, goal: &Goal) -> Result<SolveOutcome>;
}
