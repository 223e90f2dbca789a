//! `AudioBuffer`, `RootAudioUnit`/`RootAudioBuffer`, and the `MixProcessor`
//! default aggregator.
//!
//! Grounded on `MayaFlux::Buffers::AudioBuffer` and
//! `MayaFlux::Buffers::Managers::TokenUnitManager`'s per-token channel
//! vector in
//! `examples/original_source/src/MayaFlux/Buffers/Managers/TokenUnitManager.hpp`.

use std::any::Any;

use mayaflux_core::{ProcessingToken, Result};

use crate::chain::{incompatible_buffer, BufferProcessingChain, EnforcementStrategy, Processor};
use crate::core::BufferCore;

/// One channel's worth of sample-rate audio data.
pub struct AudioBuffer {
    pub core: BufferCore,
    pub channel_index: usize,
    pub samples: Vec<f64>,
    pub chain: BufferProcessingChain,
}

impl AudioBuffer {
    pub fn new(channel_index: usize, len: usize) -> Self {
        Self {
            core: BufferCore::new(ProcessingToken::AUDIO_BACKEND),
            channel_index,
            samples: vec![0.0; len],
            chain: BufferProcessingChain::new(ProcessingToken::AUDIO_BACKEND, EnforcementStrategy::Filtered),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.samples)
    }

    pub fn copy_from_bytes(&mut self, bytes: &[u8]) {
        let samples: &[f64] = bytemuck::cast_slice(bytes);
        self.samples.copy_from_slice(samples);
        self.core.mark_dirty_range(0, bytes.len());
    }
}

/// Sums and normalizes child audio buffers into a root's output vector.
/// `mix_j` weights default to `1.0`; a limiter clamps any output sample
/// whose magnitude exceeds `1.0`.
pub struct MixProcessor {
    pub weights: Vec<f64>,
}

impl MixProcessor {
    pub fn new() -> Self {
        Self { weights: Vec::new() }
    }

    fn weight_for(&self, index: usize) -> f64 {
        self.weights.get(index).copied().unwrap_or(1.0)
    }

    /// Mix every child into `out`, resizing `out` to the longest child.
    pub fn mix(&self, children: &[AudioBuffer], out: &mut Vec<f64>) {
        let len = children.iter().map(|c| c.samples.len()).max().unwrap_or(0);
        out.clear();
        out.resize(len, 0.0);
        for (index, child) in children.iter().enumerate() {
            let weight = self.weight_for(index);
            for (i, sample) in child.samples.iter().enumerate() {
                out[i] += weight * sample;
            }
        }
        for sample in out.iter_mut() {
            if sample.abs() > 1.0 {
                *sample = sample.signum();
            }
        }
    }
}

impl Default for MixProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for MixProcessor {
    fn token(&self) -> ProcessingToken {
        ProcessingToken::AUDIO_BACKEND
    }

    fn name(&self) -> &'static str {
        "MixProcessor"
    }

    fn is_compatible_with(&self, buffer: &dyn Any) -> bool {
        buffer.is::<RootAudioBuffer>()
    }

    fn run(&mut self, buffer: &mut dyn Any) -> Result<()> {
        let root = buffer.downcast_mut::<RootAudioBuffer>().ok_or_else(|| incompatible_buffer(self.name()))?;
        self.mix(&root.children, &mut root.output);
        Ok(())
    }
}

/// One output channel's aggregation anchor: owns a chain and mixes its
/// children through `MixProcessor` by default.
pub struct RootAudioBuffer {
    pub core: BufferCore,
    pub output: Vec<f64>,
    pub children: Vec<AudioBuffer>,
    pub mixer: MixProcessor,
    pub chain: BufferProcessingChain,
}

impl RootAudioBuffer {
    pub fn new() -> Self {
        Self {
            core: BufferCore::new(ProcessingToken::AUDIO_BACKEND),
            output: Vec::new(),
            children: Vec::new(),
            mixer: MixProcessor::new(),
            chain: BufferProcessingChain::new(ProcessingToken::AUDIO_BACKEND, EnforcementStrategy::Filtered),
        }
    }

    /// Run the default mix, then the chain's preprocessor/processors/
    /// postprocessor/final in order against `self`. Returns `false` without
    /// running anything if another call is already processing this root.
    pub fn process_cycle(&mut self) -> Result<bool> {
        let mixer = &self.mixer;
        let children = &self.children;
        let output = &mut self.output;
        let ran = self.core.process_default(true, || {
            mixer.mix(children, output);
        });
        if !ran {
            return Ok(false);
        }

        let token = self.chain.preferred_token();
        let strategy = self.chain.strategy();
        let mut chain = std::mem::replace(&mut self.chain, BufferProcessingChain::new(token, strategy));
        let result = chain.run(self);
        self.chain = chain;
        result?;
        Ok(true)
    }
}

impl Default for RootAudioBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// One `RootAudioBuffer` per output channel, per token. `resize_channels`
/// grows on demand and never shrinks, so repeated calls with a smaller
/// target are a no-op rather than losing existing channels.
pub struct RootAudioUnit {
    pub token: ProcessingToken,
    pub channels: Vec<RootAudioBuffer>,
}

impl RootAudioUnit {
    pub fn new(token: ProcessingToken) -> Self {
        Self { token, channels: Vec::new() }
    }

    /// Grow to at least `count` channels. A smaller `count` is a no-op:
    /// channel vectors only ever grow for the process's lifetime.
    pub fn ensure_audio_channels(&mut self, count: usize) {
        while self.channels.len() < count {
            self.channels.push(RootAudioBuffer::new());
        }
    }

    pub fn resize_buffers(&mut self, len: usize) {
        for channel in self.channels.iter_mut() {
            for child in channel.children.iter_mut() {
                if child.samples.len() < len {
                    child.samples.resize(len, 0.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_processor_sums_children_and_limits() {
        let mixer = MixProcessor::new();
        let mut a = AudioBuffer::new(0, 2);
        a.samples = vec![0.9, -0.9];
        let mut b = AudioBuffer::new(0, 2);
        b.samples = vec![0.9, -0.9];
        let mut out = Vec::new();
        mixer.mix(&[a, b], &mut out);
        assert_eq!(out, vec![1.0, -1.0]);
    }

    #[test]
    fn ensure_audio_channels_is_idempotent_on_shrink() {
        let mut unit = RootAudioUnit::new(ProcessingToken::AUDIO_BACKEND);
        unit.ensure_audio_channels(4);
        assert_eq!(unit.channels.len(), 4);
        unit.ensure_audio_channels(2);
        assert_eq!(unit.channels.len(), 4);
        unit.ensure_audio_channels(6);
        assert_eq!(unit.channels.len(), 6);
    }

    #[test]
    fn root_process_cycle_respects_processing_lock() {
        let mut root = RootAudioBuffer::new();
        root.core.try_acquire_processing();
        assert!(!root.process_cycle().unwrap());
        root.core.release_processing();
        assert!(root.process_cycle().unwrap());
    }

    #[test]
    fn process_cycle_runs_an_attached_chain_processor() {
        use crate::chain::incompatible_buffer;
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        struct CountingProcessor(Arc<AtomicU32>);
        impl Processor for CountingProcessor {
            fn token(&self) -> ProcessingToken {
                ProcessingToken::AUDIO_BACKEND
            }
            fn name(&self) -> &'static str {
                "CountingProcessor"
            }
            fn is_compatible_with(&self, buffer: &dyn Any) -> bool {
                buffer.is::<RootAudioBuffer>()
            }
            fn run(&mut self, buffer: &mut dyn Any) -> Result<()> {
                buffer.downcast_mut::<RootAudioBuffer>().ok_or_else(|| incompatible_buffer(self.name()))?;
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let mut root = RootAudioBuffer::new();
        let count = Arc::new(AtomicU32::new(0));
        root.chain.attach_processor(Box::new(CountingProcessor(count.clone()))).unwrap();

        assert!(root.process_cycle().unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
