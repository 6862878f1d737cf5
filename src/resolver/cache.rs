// src/resolver/cache.rs

//! Single-slot universe cache
//!
//! Consecutive builds usually ran against the same repo snapshot, so the
//! universe of the last snapshot is kept around. Only one universe is ever
//! held; a different repo id replaces it.

use crate::error::Result;
use crate::universe::Universe;

#[derive(Debug, Default)]
pub struct UniverseCache {
    slot: Option<Universe>,
    constructions: usize,
}

impl UniverseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Universe for `repo_id`, constructing it with `build` on a miss
    ///
    /// A miss always evicts the cached universe, even when `build` comes
    /// back empty or fails.
    pub fn get_or_build<F>(&mut self, repo_id: i64, build: F) -> Result<Option<&Universe>>
    where
        F: FnOnce() -> Result<Option<Universe>>,
    {
        let hit = self
            .slot
            .as_ref()
            .is_some_and(|universe| universe.repo_id() == repo_id);

        if !hit {
            self.slot = None;
            self.constructions += 1;
            self.slot = build()?;
        }

        Ok(self.slot.as_ref())
    }

    /// Repo id of the cached universe
    pub fn cached_repo_id(&self) -> Option<i64> {
        self.slot.as_ref().map(Universe::repo_id)
    }

    /// How many times a universe had to be built
    pub fn constructions(&self) -> usize {
        self.constructions
    }
}
