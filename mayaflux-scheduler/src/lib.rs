//! Cooperative routine scheduler: clock-driven coroutine resumption, delay
//! awaiters, and the `metro`/`sequence`/`line`/`pattern` task factories.
//!
//! Layered directly on [`mayaflux_core`]'s clocks and tokens; nothing below
//! this crate knows about routines at all, matching how `graal` sits below
//! `mlr` without `mlr` leaking back down.

pub mod awaiter;
pub mod event_source;
pub mod promise;
pub mod scheduler;
pub mod task;
pub mod tasks;
pub mod timer;

pub use awaiter::{BufferDelay, EventAwaiter, FrameDelay, GetPromise, MultiRateDelay, SampleDelay};
pub use event_source::EventSource;
pub use promise::{ClockPositions, Promise};
pub use scheduler::{TaskScheduler, TickDomain, TokenProcessor};
pub use task::{RoutineFuture, Task, TaskHandle, TaskId, TaskState};
