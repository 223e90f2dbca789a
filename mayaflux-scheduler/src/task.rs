//! A scheduled routine: a pinned, boxed future paired with the promise its
//! awaiters read and write.
//!
//! Grounded on `SoundRoutine`/`FrameRoutine` in
//! `examples/original_source/src/MayaFlux/Core/Scheduler/Scheduler.hpp`,
//! which bundle a coroutine handle with its token and termination flag. Rust
//! has no first-class coroutine handle to store, so `Task` stores the boxed
//! future directly and polls it in place.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use mayaflux_core::RoutineToken;

use crate::promise::{ClockPositions, Promise};

pub type RoutineFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Monotonically increasing identity assigned by the scheduler at
/// `add_task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Observable lifecycle state of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Queued but never polled.
    Pending,
    /// Polled at least once, not yet finished.
    Running,
    /// Returned `Poll::Ready` on its last poll.
    Completed,
    /// `request_termination` was observed and the task was dropped without a
    /// final poll reaching completion.
    Cancelled,
}

pub struct Task {
    pub id: TaskId,
    pub promise: Arc<Promise>,
    future: Option<RoutineFuture>,
    state: TaskState,
}

impl Task {
    pub fn new(id: TaskId, token: RoutineToken, clocks: Arc<ClockPositions>, future: RoutineFuture) -> Self {
        Self {
            id,
            promise: Promise::new(token, clocks),
            future: Some(future),
            state: TaskState::Pending,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn token(&self) -> RoutineToken {
        self.promise.token
    }

    /// Poll the routine once. Returns `true` if the task is finished
    /// (completed or cancelled) and should be removed from the scheduler's
    /// queue.
    pub fn poll_once(&mut self, cx: &mut TaskContext<'_>) -> bool {
        if self.promise.should_terminate.load(Ordering::SeqCst) {
            self.future = None;
            self.state = TaskState::Cancelled;
            return true;
        }

        let Some(future) = self.future.as_mut() else {
            return true;
        };

        self.state = TaskState::Running;
        match future.as_mut().poll(cx) {
            Poll::Ready(()) => {
                self.future = None;
                self.state = TaskState::Completed;
                true
            }
            Poll::Pending => false,
        }
    }
}

/// Lightweight handle a caller keeps to query or cancel a task without
/// holding the scheduler's internal task table.
#[derive(Clone)]
pub struct TaskHandle {
    pub id: TaskId,
    pub promise: Arc<Promise>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.promise.request_termination();
    }
}
