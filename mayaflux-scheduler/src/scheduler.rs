//! The routine scheduler: owns every live task, advances the shared clock
//! positions, and repolls the routines whose domain just ticked.
//!
//! `add_task`/`process_token`/`register_token_processor` restructured
//! around a plain `Vec<Task>` scan rather than an intrusive linked list,
//! matching how `graal::frame::FrameGraph` walks a flat pass list each
//! submission.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures::task::noop_waker;
use mayaflux_core::RoutineToken;
use tracing::{debug, trace};

use crate::promise::ClockPositions;
use crate::task::{RoutineFuture, Task, TaskHandle, TaskId, TaskState};

/// A custom resumption rule installed for a [`RoutineToken::MultiRate`]
/// routine, deciding whether a tick on `token` should repoll it this cycle.
/// Mirrors `Scheduler::register_token_processor` in the original.
pub type TokenProcessor = Box<dyn Fn(&ClockPositions) -> bool + Send + Sync>;

/// Which clock domain a call to [`TaskScheduler::process_token`] advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDomain {
    Sample,
    Frame,
    BufferCycle,
    Event,
}

pub struct TaskScheduler {
    clocks: Arc<ClockPositions>,
    tasks: Vec<Task>,
    next_id: u64,
    sample_rate: u32,
    units_per_buffer: u32,
    token_processors: HashMap<RoutineToken, TokenProcessor>,
}

impl TaskScheduler {
    pub fn new(sample_rate: u32, units_per_buffer: u32) -> Self {
        Self {
            clocks: Arc::new(ClockPositions::default()),
            tasks: Vec::new(),
            next_id: 0,
            sample_rate,
            units_per_buffer,
            token_processors: HashMap::new(),
        }
    }

    pub fn clocks(&self) -> Arc<ClockPositions> {
        self.clocks.clone()
    }

    /// Register a resumption predicate a `MultiRate` routine should use
    /// instead of the default frame-clock comparison.
    pub fn register_token_processor(&mut self, token: RoutineToken, processor: TokenProcessor) {
        self.token_processors.insert(token, processor);
    }

    /// Queue `future` under `token` and poll it once immediately, against the
    /// clock positions at the moment of scheduling. Mirrors the original's
    /// `initial_suspend = suspend_never`: a routine runs synchronously up to
    /// its first `.await`, which then arms against the creation-time clock
    /// rather than whatever position the next `process_token` call leaves
    /// behind.
    pub fn add_task(&mut self, token: RoutineToken, future: RoutineFuture) -> TaskHandle {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let mut task = Task::new(id, token, self.clocks.clone(), future);
        let handle = TaskHandle {
            id,
            promise: task.promise.clone(),
        };
        debug!(task_id = id.0, ?token, "routine scheduled");

        let waker = noop_waker();
        let mut cx = TaskContext::from_waker(&waker);
        if !task.poll_once(&mut cx) {
            self.tasks.push(task);
        }
        handle
    }

    pub fn cancel_task(&self, id: TaskId) {
        if let Some(task) = self.tasks.iter().find(|t| t.id == id) {
            task.promise.request_termination();
        }
    }

    pub fn get_task_state(&self, id: TaskId) -> Option<TaskState> {
        self.tasks.iter().find(|t| t.id == id).map(|t| t.state())
    }

    pub fn has_active_tasks(&self, token: RoutineToken) -> bool {
        self.tasks
            .iter()
            .any(|t| t.token() == token && t.state() != TaskState::Completed && t.state() != TaskState::Cancelled)
    }

    pub fn get_tasks_for_token(&self, token: RoutineToken) -> Vec<TaskId> {
        self.tasks.iter().filter(|t| t.token() == token).map(|t| t.id).collect()
    }

    pub fn seconds_to_samples(&self, seconds: f64) -> u64 {
        (seconds * self.sample_rate as f64).round() as u64
    }

    pub fn seconds_to_units(&self, seconds: f64) -> u64 {
        let samples = self.seconds_to_samples(seconds);
        samples / self.units_per_buffer.max(1) as u64
    }

    /// Repoll every routine whose resumption predicate is satisfied at the
    /// current (pre-tick) clock position, then advance `domain`'s clock by
    /// one unit (or `amount` for sample/frame domains). Corresponds to the
    /// original's `Scheduler::process_token`: a routine suspended waiting for
    /// sample N resumes on the call whose *entry* position already reaches N,
    /// not the call that first ticks past it — ticking before polling would
    /// make every delay-based awaiter resolve one position late.
    pub fn process_token(&mut self, domain: TickDomain, amount: u64) {
        let waker = noop_waker();
        let mut cx = TaskContext::from_waker(&waker);

        let mut finished = Vec::new();
        for task in self.tasks.iter_mut() {
            if !Self::should_poll(task, domain, &self.token_processors, &self.clocks) {
                continue;
            }
            trace!(task_id = task.id.0, "polling routine");
            if task.poll_once(&mut cx) {
                finished.push(task.id);
            }
        }
        if !finished.is_empty() {
            self.tasks.retain(|t| !finished.contains(&t.id));
        }

        match domain {
            TickDomain::Sample => {
                self.clocks.sample.fetch_add(amount, Ordering::SeqCst);
            }
            TickDomain::Frame => {
                self.clocks.frame.fetch_add(amount, Ordering::SeqCst);
            }
            TickDomain::BufferCycle => {
                self.clocks.buffer_cycle.fetch_add(amount, Ordering::SeqCst);
            }
            TickDomain::Event => {}
        }
    }

    fn should_poll(
        task: &Task,
        domain: TickDomain,
        processors: &HashMap<RoutineToken, TokenProcessor>,
        clocks: &ClockPositions,
    ) -> bool {
        if let Some(processor) = processors.get(&task.token()) {
            return processor(clocks);
        }
        match task.token() {
            RoutineToken::SampleAccurate => domain == TickDomain::Sample,
            RoutineToken::FrameAccurate => domain == TickDomain::Frame,
            RoutineToken::EventDriven => domain == TickDomain::Event,
            RoutineToken::MultiRate => domain == TickDomain::Frame || domain == TickDomain::Sample,
            RoutineToken::OnDemand => false,
        }
    }

    /// Directly poll every `OnDemand` routine once, bypassing clock
    /// resumption predicates entirely.
    pub fn drive_on_demand(&mut self) {
        let waker = noop_waker();
        let mut cx = TaskContext::from_waker(&waker);
        let mut finished = Vec::new();
        for task in self.tasks.iter_mut() {
            if task.token() != RoutineToken::OnDemand {
                continue;
            }
            if task.poll_once(&mut cx) {
                finished.push(task.id);
            }
        }
        self.tasks.retain(|t| !finished.contains(&t.id));
    }
}
