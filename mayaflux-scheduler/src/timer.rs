//! One-shot and repeating callback scheduling on top of [`TaskScheduler`].
//!
//! Grounded on `MayaFlux::Kriya::Timer` in
//! `examples/original_source/src/MayaFlux/Kriya/Tasks.hpp`, which wraps a
//! coroutine loop around a user callback. Here the loop is an `async` block
//! built from [`SampleDelay`]/[`FrameDelay`], so cancellation reuses the
//! scheduler's ordinary `TaskHandle::cancel` path rather than a bespoke
//! timer-cancellation flag.

use std::sync::Arc;

use mayaflux_core::RoutineToken;

use crate::awaiter::{FrameDelay, SampleDelay};
use crate::promise::Promise;
use crate::scheduler::TaskScheduler;
use crate::task::TaskHandle;

/// Schedules `callback` to run once after `delay_units` have elapsed on the
/// clock implied by `token` (sample clock for `SampleAccurate`, frame clock
/// otherwise).
pub fn schedule_once<F>(scheduler: &mut TaskScheduler, token: RoutineToken, delay_units: u64, callback: F) -> TaskHandle
where
    F: FnOnce() + Send + 'static,
{
    let clocks = scheduler.clocks();
    let promise = Promise::new(token, clocks);
    let awaiter_promise = promise.clone();
    let sample_accurate = token == RoutineToken::SampleAccurate;

    scheduler.add_task(
        token,
        Box::pin(async move {
            if sample_accurate {
                SampleDelay::new(awaiter_promise, delay_units).await;
            } else {
                FrameDelay::new(awaiter_promise, delay_units).await;
            }
            callback();
        }),
    )
}

/// Schedules `callback` to run every `period_units`, indefinitely, until the
/// returned handle is cancelled or `promise.request_termination()` is
/// observed.
pub fn schedule_repeating<F>(
    scheduler: &mut TaskScheduler,
    token: RoutineToken,
    period_units: u64,
    mut callback: F,
) -> TaskHandle
where
    F: FnMut() + Send + 'static,
{
    let clocks = scheduler.clocks();
    let promise = Promise::new(token, clocks);
    let loop_promise = promise.clone();
    let sample_accurate = token == RoutineToken::SampleAccurate;

    scheduler.add_task(
        token,
        Box::pin(async move {
            loop {
                if loop_promise.should_terminate.load(std::sync::atomic::Ordering::SeqCst) {
                    return;
                }
                if sample_accurate {
                    SampleDelay::new(loop_promise.clone(), period_units).await;
                } else {
                    FrameDelay::new(loop_promise.clone(), period_units).await;
                }
                callback();
            }
        }),
    )
}

/// Cancel a previously scheduled one-shot or repeating timer.
pub fn cancel(handle: &TaskHandle) {
    handle.cancel();
}

/// `true` if the promise behind `handle` has not yet been asked to
/// terminate and hasn't completed.
pub fn is_pending(promise: &Arc<Promise>) -> bool {
    !promise.should_terminate.load(std::sync::atomic::Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TickDomain;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn one_shot_timer_fires_exactly_once() {
        let mut sched = TaskScheduler::new(48_000, 512);
        let fired = Arc::new(AtomicU32::new(0));
        let flag = fired.clone();
        schedule_once(&mut sched, RoutineToken::SampleAccurate, 5, move || {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..5 {
            sched.process_token(TickDomain::Sample, 1);
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        sched.process_token(TickDomain::Sample, 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        sched.process_token(TickDomain::Sample, 100);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repeating_timer_can_be_cancelled() {
        let mut sched = TaskScheduler::new(48_000, 512);
        let count = Arc::new(AtomicU32::new(0));
        let flag = count.clone();
        let handle = schedule_repeating(&mut sched, RoutineToken::SampleAccurate, 2, move || {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        sched.process_token(TickDomain::Sample, 2);
        sched.process_token(TickDomain::Sample, 2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        sched.process_token(TickDomain::Sample, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        cancel(&handle);
        sched.process_token(TickDomain::Sample, 2);
        sched.process_token(TickDomain::Sample, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
