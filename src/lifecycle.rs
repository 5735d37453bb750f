//! Neutral lifecycle dispatcher.
//!
//! Handlers are plain values registered against an event name. Emitting an
//! event moves its handlers, in registration order, onto a ready queue that the
//! host drains. A handler registered for an event that already fired becomes
//! ready immediately, so late registration still runs exactly once.

use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

pub const ORM_LOADED: &str = "hook:orm:loaded";
pub const PERMISSIONS_LOADED: &str = "hook:permissions:loaded";

/// Events raised by the host runner or the hook itself. The runner never
/// synthesizes these on behalf of a companion hook.
pub fn is_hook_event(event: &str) -> bool { event == ORM_LOADED || event == PERMISSIONS_LOADED }

#[derive(Debug)]
pub struct Lifecycle<T> {
    pending: Vec<(String, T)>,
    ready: VecDeque<T>,
    emitted: BTreeMap<String, usize>,
}

impl<T> Default for Lifecycle<T> {
    fn default() -> Self { Self { pending: Vec::new(), ready: VecDeque::new(), emitted: BTreeMap::new() } }
}

impl<T> Lifecycle<T> {
    pub fn new() -> Self { Self::default() }

    /// Register a one-shot handler for `event`.
    pub fn after(&mut self, event: &str, handler: T) {
        if self.has_fired(event) {
            self.ready.push_back(handler);
        } else {
            self.pending.push((event.to_string(), handler));
        }
    }

    /// Record an emission and queue its handlers. Returns how many became ready.
    pub fn emit(&mut self, event: &str) -> usize {
        *self.emitted.entry(event.to_string()).or_insert(0) += 1;
        let mut moved = 0usize;
        let mut keep = Vec::with_capacity(self.pending.len());
        for (ev, handler) in self.pending.drain(..) {
            if ev == event {
                self.ready.push_back(handler);
                moved += 1;
            } else {
                keep.push((ev, handler));
            }
        }
        self.pending = keep;
        debug!(target: "permissions", event, handlers = moved, "lifecycle emit");
        moved
    }

    pub fn next_ready(&mut self) -> Option<T> { self.ready.pop_front() }

    pub fn has_fired(&self, event: &str) -> bool { self.emitted.contains_key(event) }

    pub fn emitted(&self, event: &str) -> usize { self.emitted.get(event).copied().unwrap_or(0) }

    pub fn pending(&self) -> usize { self.pending.len() }
}
