//! `WindowManager`: the mutex-protected event queue a window backend feeds
//! and routines/consumers drain, plus the `EventSource` signalling that
//! lets routines `await` a named input channel instead of polling.
//!
//! A window backend may run a dedicated event-polling thread (non-macOS)
//! or poll on the main thread (macOS). This crate specifies the queue and
//! signalling contract only — which thread calls `push_event` is a
//! backend/host decision, not something this type enforces.

use parking_lot::Mutex;

use mayaflux_scheduler::event_source::EventSource;

use crate::event::WindowEvent;

/// Backend-facing window identity. Opaque: a concrete windowing backend
/// (GLFW-equivalent) attaches whatever native handle it needs out-of-band,
/// keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

pub struct WindowManager {
    queue: Mutex<Vec<WindowEvent>>,
    events: EventSource,
    next_window_id: Mutex<u64>,
}

impl WindowManager {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            events: EventSource::new(),
            next_window_id: Mutex::new(1),
        }
    }

    /// A cheaply cloneable handle onto this manager's named-event table,
    /// for routines to `EventAwaiter::new(manager.events(), "key.pressed")`.
    pub fn events(&self) -> EventSource {
        self.events.clone()
    }

    pub fn create_window(&self) -> WindowId {
        let mut guard = self.next_window_id.lock();
        let id = WindowId(*guard);
        *guard += 1;
        id
    }

    /// Called by the backend's polling thread (or main thread, on macOS)
    /// with every event it observes this tick. Enqueues it and signals the
    /// matching named event so awaiting routines resume on their next
    /// poll.
    pub fn push_event(&self, event: WindowEvent) {
        self.events.signal(event.event_name());
        self.queue.lock().push(event);
    }

    /// Drain every queued event, in arrival order, for a consumer that
    /// wants the whole batch rather than awaiting individual names.
    pub fn drain_events(&self) -> Vec<WindowEvent> {
        std::mem::take(&mut *self.queue.lock())
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyData, WindowEventKind};
    use crate::key::Key;

    #[test]
    fn push_then_drain_preserves_arrival_order() {
        let manager = WindowManager::new();
        manager.push_event(WindowEvent::new(WindowEventKind::WindowClosed, 0.0));
        manager.push_event(WindowEvent::new(
            WindowEventKind::KeyPressed(KeyData {
                key: Key::SPACE,
                scancode: 57,
                mods: 0,
            }),
            1.0,
        ));
        let drained = manager.drain_events();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind, WindowEventKind::WindowClosed);
        assert!(manager.pending_count() == 0);
    }

    #[test]
    fn push_event_signals_the_matching_named_event() {
        let manager = WindowManager::new();
        let events = manager.events();
        assert_eq!(events.generation("window.closed"), 0);
        manager.push_event(WindowEvent::new(WindowEventKind::WindowClosed, 0.0));
        assert_eq!(events.generation("window.closed"), 1);
    }

    #[test]
    fn create_window_hands_out_increasing_ids() {
        let manager = WindowManager::new();
        let a = manager.create_window();
        let b = manager.create_window();
        assert_ne!(a, b);
    }
}
