//! Processing tokens: the bitfield taxonomy that routes buffers, routines and
//! root units to the correct clock and aggregation strategy.
//!
//! Mirrors `MayaFlux::Buffers::ProcessingToken` in
//! `examples/original_source/src/MayaFlux/Core/ProcessingTokens.hpp`: a
//! bitfield over three orthogonal axes (rate, device, concurrency) with two
//! canonical composites.

use bitflags::bitflags;

bitflags! {
    /// Bitfield over (rate × device × concurrency). Two composites,
    /// `AUDIO_BACKEND` and `GRAPHICS_BACKEND`, are the ones almost all call
    /// sites use; the individual bits exist so buffers and processors can be
    /// checked for compatibility along a single axis.
    #[derive(Default)]
    pub struct ProcessingToken: u32 {
        /// Rate axis, frame bit. Absence of this bit means sample rate.
        const FRAME_RATE = 0x2;
        /// Device axis, CPU bit.
        const CPU_PROCESS = 0x4;
        /// Device axis, GPU bit.
        const GPU_PROCESS = 0x8;
        /// Concurrency axis, sequential bit.
        const SEQUENTIAL = 0x10;
        /// Concurrency axis, parallel bit.
        const PARALLEL = 0x20;

        /// SAMPLE_RATE | CPU_PROCESS | SEQUENTIAL — the default audio token.
        const AUDIO_BACKEND = Self::CPU_PROCESS.bits | Self::SEQUENTIAL.bits;
        /// FRAME_RATE | GPU_PROCESS | PARALLEL — the default graphics token.
        const GRAPHICS_BACKEND = Self::FRAME_RATE.bits | Self::GPU_PROCESS.bits | Self::PARALLEL.bits;
        /// SAMPLE_RATE | GPU_PROCESS | PARALLEL — GPU-accelerated audio with
        /// no CPU-side root aggregation.
        const AUDIO_PARALLEL = Self::GPU_PROCESS.bits | Self::PARALLEL.bits;
        /// FRAME_RATE | CPU_PROCESS | SEQUENTIAL — window lifecycle/input
        /// event stream, distinct from graphics rendering.
        const WINDOW_EVENTS = Self::FRAME_RATE.bits | Self::CPU_PROCESS.bits | Self::SEQUENTIAL.bits;
    }
}

impl ProcessingToken {
    /// `SAMPLE_RATE` has bit value 0x0 in the original taxonomy (the rate
    /// axis is single-bit: its absence denotes sample rate). Exposed as a
    /// named constant for readability at call sites, even though it ORs in
    /// nothing.
    pub const SAMPLE_RATE: ProcessingToken = ProcessingToken::empty();

    pub fn has_frame_rate(self) -> bool {
        self.contains(ProcessingToken::FRAME_RATE)
    }

    pub fn has_sample_rate(self) -> bool {
        !self.has_frame_rate()
    }

    pub fn has_cpu(self) -> bool {
        self.contains(ProcessingToken::CPU_PROCESS)
    }

    pub fn has_gpu(self) -> bool {
        self.contains(ProcessingToken::GPU_PROCESS)
    }

    pub fn has_sequential(self) -> bool {
        self.contains(ProcessingToken::SEQUENTIAL)
    }

    pub fn has_parallel(self) -> bool {
        self.contains(ProcessingToken::PARALLEL)
    }
}

/// Which scheduler domain owns a routine. Distinct from [`ProcessingToken`]
/// (buffers) — a routine only ever belongs to one domain at a time.
///
/// Mirrors `MayaFlux::Vruta::ProcessingToken` (same header as above, different
/// namespace in the original — renamed here to avoid confusion with the
/// buffer-side bitfield).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineToken {
    /// Resume when `clock(SAMPLE).position` reaches the routine's target.
    SampleAccurate,
    /// Resume when `clock(FRAME).position` reaches the routine's target.
    FrameAccurate,
    /// Resume when an external `EventSource` signals.
    EventDriven,
    /// Routine can handle multiple sample rates; defaults to frame-accurate
    /// dispatch unless overridden by `register_token_processor`.
    MultiRate,
    /// Not scheduled; driven explicitly by caller code.
    OnDemand,
}

/// Discriminates why a routine is currently suspended, preventing
/// cross-contamination between temporal domains sharing a routine token.
///
/// Mirrors `MayaFlux::Vruta::DelayContext`. The original header omits a
/// frame-based variant; a routine resuming on the frame clock needs one
/// (`FrameBased`), so it is added here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelayContext {
    /// No active delay; resume immediately if `auto_resume`.
    None,
    /// Resume when `clock(SAMPLE).position >= next_sample`.
    SampleBased,
    /// Resume when the buffer-cycle counter reaches `next_buffer_cycle`.
    BufferBased,
    /// Resume when `clock(FRAME).position >= next_frame`.
    FrameBased,
    /// Resumed externally by an `EventSource` signal.
    EventBased,
    /// One-shot; resumed immediately when the awaited value is ready.
    Await,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composites_match_bit_layout() {
        assert!(ProcessingToken::AUDIO_BACKEND.has_sample_rate());
        assert!(ProcessingToken::AUDIO_BACKEND.has_cpu());
        assert!(ProcessingToken::AUDIO_BACKEND.has_sequential());

        assert!(ProcessingToken::GRAPHICS_BACKEND.has_frame_rate());
        assert!(ProcessingToken::GRAPHICS_BACKEND.has_gpu());
        assert!(ProcessingToken::GRAPHICS_BACKEND.has_parallel());

        assert!(ProcessingToken::AUDIO_PARALLEL.has_sample_rate());
        assert!(ProcessingToken::AUDIO_PARALLEL.has_gpu());
        assert!(ProcessingToken::AUDIO_PARALLEL.has_parallel());
    }

    #[test]
    fn sample_rate_is_absence_of_frame_bit() {
        let t = ProcessingToken::CPU_PROCESS | ProcessingToken::SEQUENTIAL;
        assert_eq!(t, ProcessingToken::AUDIO_BACKEND);
        assert!(t.has_sample_rate());
        assert!(!t.has_frame_rate());
    }
}
