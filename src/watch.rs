// src/watch.rs

//! Package state watch
//!
//! A [`StateWatch`] wraps one resolution of a package. It remembers the
//! resolved flag the package had when the watch started and, when the
//! watch is dropped, queues a [`Event::PackageStateChanged`] if the
//! recorded outcome differs. Dropping happens on every exit path, so an
//! outcome recorded before a later failure is still reported (and then
//! discarded together with the rolled back unit of work).

use crate::db::models::Package;
use crate::event::{Event, EventQueue};

pub struct StateWatch<'q> {
    queue: &'q mut EventQueue,
    package_id: i64,
    name: String,
    previous: Option<bool>,
    current: Option<bool>,
}

impl<'q> StateWatch<'q> {
    pub fn new(queue: &'q mut EventQueue, package_id: i64, package: &Package) -> Self {
        Self {
            queue,
            package_id,
            name: package.name.clone(),
            previous: package.resolved,
            current: None,
        }
    }

    /// Record the outcome of the resolution
    pub fn record(&mut self, resolved: bool) {
        self.current = Some(resolved);
    }
}

impl Drop for StateWatch<'_> {
    fn drop(&mut self) {
        if let Some(resolved) = self.current
            && self.previous != Some(resolved)
        {
            self.queue.add(Event::PackageStateChanged {
                package_id: self.package_id,
                name: std::mem::take(&mut self.name),
                previous: self.previous,
                resolved,
            });
        }
    }
}
