//! Per-domain monotonic clocks. Mirrors `MayaFlux::Core::Scheduler::SampleClock`
//! (`examples/original_source/src/MayaFlux/Core/Scheduler/Scheduler.hpp`),
//! generalized to the frame and event domains as well as the sample domain.

/// A monotonic per-domain position counter with a fixed rate.
///
/// Overflow of the 64-bit position is not a concern: at 2 GHz it would take
/// roughly 292,000 years to wrap.
pub trait Clock {
    /// Advance the clock's position by `units`.
    fn tick(&mut self, units: u64);

    /// Current monotonic position, in clock units.
    fn current_position(&self) -> u64;

    /// Current position expressed in seconds.
    fn current_time(&self) -> f64 {
        self.current_position() as f64 / self.rate() as f64
    }

    /// Units per second.
    fn rate(&self) -> u32;

    /// Reset the position to zero. Rate is unaffected.
    fn reset(&mut self);
}

/// The audio-sample domain clock. Rate is the sample rate in Hz.
#[derive(Debug, Clone, Copy)]
pub struct SampleClock {
    sample_rate: u32,
    position: u64,
}

impl SampleClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            position: 0,
        }
    }
}

impl Default for SampleClock {
    fn default() -> Self {
        Self::new(48_000)
    }
}

impl Clock for SampleClock {
    fn tick(&mut self, units: u64) {
        self.position += units;
    }

    fn current_position(&self) -> u64 {
        self.position
    }

    fn rate(&self) -> u32 {
        self.sample_rate
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}

/// The video-frame domain clock. Rate is the target FPS.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    target_fps: u32,
    position: u64,
}

impl FrameClock {
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_fps,
            position: 0,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60)
    }
}

impl Clock for FrameClock {
    fn tick(&mut self, units: u64) {
        self.position += units;
    }

    fn current_position(&self) -> u64 {
        self.position
    }

    fn rate(&self) -> u32 {
        self.target_fps
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}

/// The discrete-event domain clock. Tickless: rate is fixed at 1 so
/// `current_time() == current_position()`, and `tick` is only ever called
/// with `units = 1` (one event processed).
#[derive(Debug, Clone, Copy, Default)]
pub struct EventClock {
    position: u64,
}

impl EventClock {
    pub fn new() -> Self {
        Self { position: 0 }
    }
}

impl Clock for EventClock {
    fn tick(&mut self, units: u64) {
        self.position += units;
    }

    fn current_position(&self) -> u64 {
        self.position
    }

    fn rate(&self) -> u32 {
        1
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}
