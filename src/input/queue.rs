//! Event queue — ordered, append-only-until-drained storage.
//!
//! One queue belongs to exactly one [`InputContext`](super::InputContext).
//! Insertion order is preserved; the drain removes a contiguous prefix, at
//! most once per frame. Push-time filtering lives in the context (it needs
//! both the queue tail and the settled state); this module only stores.

use super::event::InputEvent;

/// Ordered sequence of pending input events.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending events in arrival order.
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    pub(crate) fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Latest queued value for an axis, scanning from the tail. Returns the
    /// first `Some` produced by `extract`, i.e. the most recent event that
    /// touches the axis the caller is filtering for.
    pub(crate) fn latest<T>(&self, extract: impl Fn(&InputEvent) -> Option<T>) -> Option<T> {
        self.events.iter().rev().find_map(|e| extract(e))
    }

    /// Remove the drained prefix.
    pub(crate) fn remove_prefix(&mut self, count: usize) {
        debug_assert!(count <= self.events.len());
        self.events.drain(..count);
    }

    /// Drop pending events that only make sense while focused. Used when a
    /// focus loss is pushed behind them.
    pub(crate) fn discard_focus_sensitive(&mut self) {
        self.events.retain(|e| !e.requires_focus());
    }

    /// Drop everything without applying. The explicit-flush escape hatch.
    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }
}
