//! Delay and event awaiters — the suspension points routines `.await`.
//!
//! Each awaiter is a small `Future` whose first poll records a resumption
//! target into the shared [`Promise`] (mirroring `await_suspend` writing
//! `promise().next_sample` in
//! `examples/original_source/src/MayaFlux/Core/Scheduler/Scheduler.hpp`'s
//! `SampleDelay`) and whose every poll after that just compares the
//! promise's target against the scheduler-published clock position
//! (mirroring `await_ready`/`try_resume`).

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use mayaflux_core::DelayContext;

use crate::event_source::EventSource;
use crate::promise::Promise;

/// Suspend until `clock(SAMPLE).position >= next_sample`.
pub struct SampleDelay {
    promise: Arc<Promise>,
    samples_to_wait: u64,
    armed: bool,
}

impl SampleDelay {
    pub fn new(promise: Arc<Promise>, samples_to_wait: u64) -> Self {
        Self {
            promise,
            samples_to_wait,
            armed: false,
        }
    }
}

impl Future for SampleDelay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<()> {
        if self.samples_to_wait == 0 {
            return Poll::Ready(());
        }
        if !self.armed {
            let target = self.promise.clocks.sample.load(Ordering::SeqCst) + self.samples_to_wait;
            self.promise.next_sample.store(target, Ordering::SeqCst);
            *self.promise.active_delay_context.lock() = DelayContext::SampleBased;
            self.armed = true;
        }
        if self.promise.clocks.sample.load(Ordering::SeqCst) >= self.promise.next_sample.load(Ordering::SeqCst) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Suspend until `clock(FRAME).position >= next_frame`.
pub struct FrameDelay {
    promise: Arc<Promise>,
    frames_to_wait: u64,
    armed: bool,
}

impl FrameDelay {
    pub fn new(promise: Arc<Promise>, frames_to_wait: u64) -> Self {
        Self {
            promise,
            frames_to_wait,
            armed: false,
        }
    }
}

impl Future for FrameDelay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<()> {
        if self.frames_to_wait == 0 {
            return Poll::Ready(());
        }
        if !self.armed {
            let target = self.promise.clocks.frame.load(Ordering::SeqCst) + self.frames_to_wait;
            self.promise.next_frame.store(target, Ordering::SeqCst);
            *self.promise.active_delay_context.lock() = DelayContext::FrameBased;
            self.armed = true;
        }
        if self.promise.clocks.frame.load(Ordering::SeqCst) >= self.promise.next_frame.load(Ordering::SeqCst) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Suspend until the buffer-cycle counter (one audio block processed)
/// reaches `next_buffer_cycle`.
pub struct BufferDelay {
    promise: Arc<Promise>,
    cycles_to_wait: u64,
    armed: bool,
}

impl BufferDelay {
    pub fn new(promise: Arc<Promise>, cycles_to_wait: u64) -> Self {
        Self {
            promise,
            cycles_to_wait,
            armed: false,
        }
    }
}

impl Future for BufferDelay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<()> {
        if self.cycles_to_wait == 0 {
            return Poll::Ready(());
        }
        if !self.armed {
            let target = self.promise.clocks.buffer_cycle.load(Ordering::SeqCst) + self.cycles_to_wait;
            self.promise.next_buffer_cycle.store(target, Ordering::SeqCst);
            *self.promise.active_delay_context.lock() = DelayContext::BufferBased;
            self.armed = true;
        }
        if self.promise.clocks.buffer_cycle.load(Ordering::SeqCst)
            >= self.promise.next_buffer_cycle.load(Ordering::SeqCst)
        {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// A delay expressed in seconds, resolved against whichever clock the
/// routine's token implies (sample clock for `SampleAccurate`/`MultiRate`,
/// frame clock otherwise) — the `MULTI_RATE` routine token's contract for
/// routines that move between sample rates mid-execution.
pub struct MultiRateDelay {
    inner: DelayKind,
}

enum DelayKind {
    Sample(SampleDelay),
    Frame(FrameDelay),
}

impl MultiRateDelay {
    pub fn from_seconds(promise: Arc<Promise>, seconds: f64, rate: u32, use_sample_domain: bool) -> Self {
        let units = (seconds * rate as f64).round() as u64;
        let inner = if use_sample_domain {
            DelayKind::Sample(SampleDelay::new(promise, units))
        } else {
            DelayKind::Frame(FrameDelay::new(promise, units))
        };
        Self { inner }
    }
}

impl Future for MultiRateDelay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<()> {
        // Safe: we never move `inner` out, only reborrow through the pin
        // projection below.
        let this = unsafe { self.get_unchecked_mut() };
        match &mut this.inner {
            DelayKind::Sample(d) => unsafe { Pin::new_unchecked(d) }.poll(cx),
            DelayKind::Frame(d) => unsafe { Pin::new_unchecked(d) }.poll(cx),
        }
    }
}

/// Suspend until an [`EventSource`] signals the named event.
pub struct EventAwaiter {
    source: EventSource,
    name: String,
    baseline: Option<u64>,
}

impl EventAwaiter {
    pub fn new(source: EventSource, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            baseline: None,
        }
    }
}

impl Future for EventAwaiter {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<()> {
        let current = self.source.generation(&self.name);
        match self.baseline {
            None => {
                self.baseline = Some(current);
                Poll::Pending
            }
            Some(baseline) if current > baseline => Poll::Ready(()),
            Some(_) => Poll::Pending,
        }
    }
}

/// One-shot awaiter that resolves as soon as a value is produced elsewhere,
/// without going through a typed delay. Grounded on
/// `examples/original_source/src/MayaFlux/Kriya/Awaiters/GetPromise.hpp`.
pub struct GetPromise<T> {
    slot: Arc<parking_lot::Mutex<Option<T>>>,
}

impl<T> GetPromise<T> {
    /// Returns the awaiter plus a setter closure the producer side calls
    /// once the value is ready.
    pub fn channel() -> (Self, impl Fn(T)) {
        let slot: Arc<parking_lot::Mutex<Option<T>>> = Arc::new(parking_lot::Mutex::new(None));
        let producer = slot.clone();
        (Self { slot }, move |value| {
            *producer.lock() = Some(value);
        })
    }
}

impl<T> Future for GetPromise<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<T> {
        match self.slot.lock().take() {
            Some(value) => Poll::Ready(value),
            None => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::ClockPositions;
    use futures::task::noop_waker;
    use mayaflux_core::RoutineToken;
    use std::sync::atomic::Ordering;

    fn noop_cx() -> TaskContext<'static> {
        let waker = noop_waker();
        TaskContext::from_waker(Box::leak(Box::new(waker)))
    }

    #[test]
    fn sample_delay_resumes_exactly_on_target() {
        let clocks = Arc::new(ClockPositions::default());
        let promise = Promise::new(RoutineToken::SampleAccurate, clocks.clone());
        let mut delay = SampleDelay::new(promise.clone(), 10);
        let mut cx = noop_cx();

        assert_eq!(Pin::new(&mut delay).poll(&mut cx), Poll::Pending);
        clocks.sample.store(9, Ordering::SeqCst);
        assert_eq!(Pin::new(&mut delay).poll(&mut cx), Poll::Pending);
        clocks.sample.store(10, Ordering::SeqCst);
        assert_eq!(Pin::new(&mut delay).poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn zero_delay_resolves_immediately() {
        let clocks = Arc::new(ClockPositions::default());
        let promise = Promise::new(RoutineToken::SampleAccurate, clocks);
        let mut delay = SampleDelay::new(promise, 0);
        let mut cx = noop_cx();
        assert_eq!(Pin::new(&mut delay).poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn event_awaiter_resumes_after_signal() {
        let source = EventSource::new();
        let mut awaiter = EventAwaiter::new(source.clone(), "trigger");
        let mut cx = noop_cx();

        assert_eq!(Pin::new(&mut awaiter).poll(&mut cx), Poll::Pending);
        assert_eq!(Pin::new(&mut awaiter).poll(&mut cx), Poll::Pending);
        source.signal("trigger");
        assert_eq!(Pin::new(&mut awaiter).poll(&mut cx), Poll::Ready(()));
    }
}
