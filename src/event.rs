// src/event.rs

//! Deferred events
//!
//! Events raised while a unit of work runs are queued and only reach the
//! listeners after that unit's transaction committed. A rolled back unit
//! discards its events.

use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The resolved flag of a package changed
    PackageStateChanged {
        package_id: i64,
        name: String,
        previous: Option<bool>,
        resolved: bool,
    },
}

/// Receives committed events
pub trait EventListener {
    fn on_event(&self, event: &Event);
}

/// Logs every event
#[derive(Debug, Default)]
pub struct LogListener;

impl EventListener for LogListener {
    fn on_event(&self, event: &Event) {
        match event {
            Event::PackageStateChanged {
                name,
                previous,
                resolved,
                ..
            } => {
                let describe = |r: Option<bool>| match r {
                    Some(true) => "resolved",
                    Some(false) => "unresolved",
                    None => "new",
                };
                info!(
                    "Package {} changed state: {} -> {}",
                    name,
                    describe(*previous),
                    describe(Some(*resolved))
                );
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EventQueue {
    queue: Vec<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Dispatch queued events to every listener, in order
    pub fn flush(&mut self, listeners: &[Box<dyn EventListener>]) {
        for event in self.queue.drain(..) {
            for listener in listeners {
                listener.on_event(&event);
            }
        }
    }

    /// Drop queued events without dispatching
    pub fn rollback(&mut self) {
        self.queue.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
