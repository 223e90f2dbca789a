//! The per-routine promise state bag and the clock positions it reads to
//! decide when to resume.
//!
//! In the C++ source
//! (`examples/original_source/src/MayaFlux/Core/Scheduler/Scheduler.hpp`)
//! this data lives inside the compiler-generated coroutine frame
//! (`SoundRoutine::promise_type`), reachable only through the coroutine
//! handle. Rust's `async`/`.await` has no equivalent promise object, so this
//! crate makes the promise an explicit, shared (`Arc`) value that both the
//! routine body and its awaiters hold a handle to — the idiomatic
//! "stackless coroutine with explicit state" shape.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use mayaflux_core::{DelayContext, RoutineToken};

/// Atomically published clock positions, shared by the scheduler and every
/// live promise. Awaiters read these directly rather than requiring a waker
/// round-trip: the scheduler ticks the relevant clock, then polls every
/// routine queued on that domain once.
#[derive(Default)]
pub struct ClockPositions {
    pub sample: AtomicU64,
    pub frame: AtomicU64,
    pub buffer_cycle: AtomicU64,
}

/// Per-routine mutable record the scheduler and its awaiters read and write
/// across suspensions.
pub struct Promise {
    pub next_sample: AtomicU64,
    pub next_frame: AtomicU64,
    pub next_buffer_cycle: AtomicU64,
    pub token: RoutineToken,
    pub active_delay_context: Mutex<DelayContext>,
    pub auto_resume: AtomicBool,
    pub should_terminate: AtomicBool,
    state: Mutex<HashMap<String, Box<dyn Any + Send>>>,
    pub clocks: Arc<ClockPositions>,
}

impl Promise {
    pub fn new(token: RoutineToken, clocks: Arc<ClockPositions>) -> Arc<Self> {
        Arc::new(Self {
            next_sample: AtomicU64::new(0),
            next_frame: AtomicU64::new(0),
            next_buffer_cycle: AtomicU64::new(0),
            token,
            active_delay_context: Mutex::new(DelayContext::None),
            auto_resume: AtomicBool::new(true),
            should_terminate: AtomicBool::new(false),
            state: Mutex::new(HashMap::new()),
            clocks,
        })
    }

    /// Store a value under `key` in the routine's opaque state bag, used by
    /// generic routines (`line`, `metro`, `pattern`) to expose live values to
    /// the outside world.
    pub fn set_state<T: Send + 'static>(&self, key: impl Into<String>, value: T) {
        self.state.lock().insert(key.into(), Box::new(value));
    }

    /// Read a copy of a `Copy` value from the state bag.
    pub fn get_state<T: Copy + Send + 'static>(&self, key: &str) -> Option<T> {
        self.state
            .lock()
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .copied()
    }

    /// Run a closure with a shared reference to a stored value, for types
    /// that aren't cheaply `Copy`.
    pub fn with_state<T: Send + 'static, R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.state.lock().get(key).and_then(|v| v.downcast_ref::<T>()).map(f)
    }

    pub fn request_termination(&self) {
        self.should_terminate.store(true, Ordering::SeqCst);
    }
}
