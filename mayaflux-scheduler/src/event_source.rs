//! Named event signalling for [`EventAwaiter`](crate::awaiter::EventAwaiter).
//!
//! The original's `EventAwaiter` resumes a routine when an external system
//! (input, network, a user callback) calls into the scheduler with an event
//! name. Here that call-in is a shared generation counter per event name:
//! signalling bumps the counter, awaiters remember the counter value they
//! last observed and resume once it has advanced. This avoids needing a
//! waker-driven channel per awaiter — the scheduler already re-polls every
//! `EVENT_DRIVEN` routine once per `process_token(EVENT)` tick.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Cheaply cloneable handle onto a shared table of named event generations.
#[derive(Clone, Default)]
pub struct EventSource {
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl EventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the named event's generation, waking any awaiter whose baseline
    /// predates it on their next poll.
    pub fn signal(&self, name: &str) {
        let mut guard = self.generations.lock();
        *guard.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Current generation for `name`, `0` if never signalled.
    pub fn generation(&self, name: &str) -> u64 {
        *self.generations.lock().get(name).unwrap_or(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsignalled_event_has_generation_zero() {
        let source = EventSource::new();
        assert_eq!(source.generation("never"), 0);
    }

    #[test]
    fn signal_advances_generation_monotonically() {
        let source = EventSource::new();
        source.signal("tick");
        source.signal("tick");
        assert_eq!(source.generation("tick"), 2);
        assert_eq!(source.generation("other"), 0);
    }

    #[test]
    fn clones_share_the_same_table() {
        let source = EventSource::new();
        let clone = source.clone();
        source.signal("shared");
        assert_eq!(clone.generation("shared"), 1);
    }
}
