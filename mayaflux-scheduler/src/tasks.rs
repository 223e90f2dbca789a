//! Reusable routine factories: `metro`, `sequence`, `line`, `pattern`.
//!
//! Grounded on the generator coroutines in
//! `examples/original_source/src/MayaFlux/Kriya/Tasks.hpp`
//! (`metro`, `sequence`, `line`, `pattern`), each of which loops forever,
//! awaits a delay, and publishes its current value through the promise so
//! a node or external caller can read it without polling the coroutine
//! directly. Here that publication is `Promise::set_state("current_value",
//! ...)`.

use std::sync::Arc;

use mayaflux_core::RoutineToken;

use crate::awaiter::SampleDelay;
use crate::promise::Promise;
use crate::scheduler::TaskScheduler;
use crate::task::TaskHandle;

const CURRENT_VALUE: &str = "current_value";
const STEP_INDEX: &str = "step_index";
const RESTART_REQUESTED: &str = "restart_requested";
const START_VALUE: &str = "start_value";

/// A steady pulse every `period_samples`, exposing a toggling `bool` under
/// `current_value` in the routine's state bag.
pub fn metro(scheduler: &mut TaskScheduler, period_samples: u64) -> TaskHandle {
    let clocks = scheduler.clocks();
    let promise = Promise::new(RoutineToken::SampleAccurate, clocks);
    promise.set_state(CURRENT_VALUE, false);
    let loop_promise = promise.clone();

    scheduler.add_task(
        RoutineToken::SampleAccurate,
        Box::pin(async move {
            loop {
                if loop_promise.should_terminate.load(std::sync::atomic::Ordering::SeqCst) {
                    return;
                }
                SampleDelay::new(loop_promise.clone(), period_samples).await;
                let next = !loop_promise.get_state::<bool>(CURRENT_VALUE).unwrap_or(false);
                loop_promise.set_state(CURRENT_VALUE, next);
            }
        }),
    )
}

/// Steps through `values` in order, holding each for `hold_samples` before
/// advancing, stopping after the last value (no wraparound).
pub fn sequence(scheduler: &mut TaskScheduler, values: Vec<f32>, hold_samples: u64) -> TaskHandle {
    let clocks = scheduler.clocks();
    let promise = Promise::new(RoutineToken::SampleAccurate, clocks);
    if let Some(first) = values.first() {
        promise.set_state(CURRENT_VALUE, *first);
    }
    promise.set_state(STEP_INDEX, 0u32);
    let loop_promise = promise.clone();

    scheduler.add_task(
        RoutineToken::SampleAccurate,
        Box::pin(async move {
            for value in values.into_iter().skip(1) {
                if loop_promise.should_terminate.load(std::sync::atomic::Ordering::SeqCst) {
                    return;
                }
                SampleDelay::new(loop_promise.clone(), hold_samples).await;
                loop_promise.set_state(CURRENT_VALUE, value);
                let index = loop_promise.get_state::<u32>(STEP_INDEX).unwrap_or(0);
                loop_promise.set_state(STEP_INDEX, index + 1);
            }
        }),
    )
}

/// Linear interpolation between `start` and `end` over `duration_samples`,
/// sampled once per `step_samples`, publishing the interpolated value each
/// step. Corresponds to the original's line-segment envelope generator.
///
/// If `restartable` is set, [`restart`] can be called on the returned
/// handle's promise to jump back to `start` and replay the ramp from the
/// beginning, without rescheduling a new task.
pub fn line(
    scheduler: &mut TaskScheduler,
    start: f32,
    end: f32,
    duration_samples: u64,
    step_samples: u64,
    restartable: bool,
) -> TaskHandle {
    let clocks = scheduler.clocks();
    let promise = Promise::new(RoutineToken::SampleAccurate, clocks);
    promise.set_state(CURRENT_VALUE, start);
    promise.set_state(START_VALUE, start);
    promise.set_state(RESTART_REQUESTED, false);
    let loop_promise = promise.clone();

    scheduler.add_task(
        RoutineToken::SampleAccurate,
        Box::pin(async move {
            if duration_samples == 0 || step_samples == 0 {
                loop_promise.set_state(CURRENT_VALUE, end);
                return;
            }
            let steps = (duration_samples / step_samples).max(1);
            loop {
                loop_promise.set_state(RESTART_REQUESTED, false);
                let mut restarted = false;
                for step in 1..=steps {
                    if loop_promise.should_terminate.load(std::sync::atomic::Ordering::SeqCst) {
                        return;
                    }
                    SampleDelay::new(loop_promise.clone(), step_samples).await;
                    if restartable && loop_promise.get_state::<bool>(RESTART_REQUESTED).unwrap_or(false) {
                        restarted = true;
                        break;
                    }
                    let t = (step as f64 / steps as f64) as f32;
                    let value = start + (end - start) * t;
                    loop_promise.set_state(CURRENT_VALUE, value);
                }
                if !restartable || !restarted {
                    return;
                }
            }
        }),
    )
}

/// Request that a restartable `line` routine jump back to its start value
/// and replay from the beginning. Takes effect immediately: `current_value`
/// resets to the ramp's start value as soon as this is called, rather than
/// waiting for the in-flight delay to resolve.
pub fn restart(promise: &Arc<Promise>) {
    if let Some(start) = promise.get_state::<f32>(START_VALUE) {
        promise.set_state(CURRENT_VALUE, start);
    }
    promise.set_state(RESTART_REQUESTED, true);
}

/// Cycles through `(value, hold_samples)` pairs indefinitely, wrapping back
/// to the first after the last.
pub fn pattern(scheduler: &mut TaskScheduler, steps: Vec<(f32, u64)>) -> TaskHandle {
    let clocks = scheduler.clocks();
    let promise = Promise::new(RoutineToken::SampleAccurate, clocks);
    if let Some((first_value, _)) = steps.first() {
        promise.set_state(CURRENT_VALUE, *first_value);
    }
    promise.set_state(STEP_INDEX, 0u32);
    let loop_promise = promise.clone();

    scheduler.add_task(
        RoutineToken::SampleAccurate,
        Box::pin(async move {
            if steps.is_empty() {
                return;
            }
            let mut index = 0usize;
            loop {
                if loop_promise.should_terminate.load(std::sync::atomic::Ordering::SeqCst) {
                    return;
                }
                let (value, hold) = steps[index];
                SampleDelay::new(loop_promise.clone(), hold).await;
                index = (index + 1) % steps.len();
                let (next_value, _) = steps[index];
                loop_promise.set_state(CURRENT_VALUE, next_value);
                loop_promise.set_state(STEP_INDEX, index as u32);
                let _ = value;
            }
        }),
    )
}

/// Read the published `current_value` of any routine-factory task.
pub fn current_value(promise: &Arc<Promise>) -> Option<f32> {
    promise.get_state::<f32>(CURRENT_VALUE)
}
