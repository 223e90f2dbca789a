//! Ordered processor chain with per-chain token enforcement.
//!
//! Grounded on `ProcessingChain` in
//! `examples/original_source/src/MayaFlux/Buffers/Managers/BufferTokenDistributor.hpp`'s
//! neighboring header, which gates attach-time vs. run-time compatibility
//! the same way.

use std::any::Any;

use mayaflux_core::{Component, Context, MayaFluxError, ProcessingToken, Result};

/// Metadata and execution hook every concrete processor (`MixProcessor`,
/// `TextureProcessor`, ...) exposes so a chain can run an arbitrary mix of
/// processors without knowing what any of them actually does. The chain
/// itself is buffer-agnostic, so `run`/`is_compatible_with` go through
/// `dyn Any` the same way `mayaflux_core::registry::BackendRegistry` erases
/// its service types; each processor downcasts to the concrete buffer type
/// it was written for.
pub trait Processor: Send {
    fn token(&self) -> ProcessingToken;
    fn name(&self) -> &'static str;

    /// Whether this processor's concrete buffer type matches `buffer`.
    /// Distinct from token compatibility: a processor can be the right
    /// `ProcessingToken` and still be handed the wrong buffer type if a
    /// caller misattaches it.
    fn is_compatible_with(&self, buffer: &dyn Any) -> bool;

    /// Run this processor's cycle against `buffer`, downcast to whatever
    /// concrete type this processor expects.
    fn run(&mut self, buffer: &mut dyn Any) -> Result<()>;
}

pub(crate) fn incompatible_buffer(name: &str) -> MayaFluxError {
    MayaFluxError::incompatible(
        Component::Buffers,
        Context::BufferProcessing,
        format!("processor '{name}' was run against a buffer type it does not support"),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementStrategy {
    /// Incompatible processors are rejected at attach time.
    Strict,
    /// Incompatible processors are kept but skipped at run time.
    Filtered,
    /// All processors run regardless of token compatibility.
    Permissive,
}

pub struct BufferProcessingChain {
    preferred_token: ProcessingToken,
    strategy: EnforcementStrategy,
    preprocessor: Option<Box<dyn Processor>>,
    processors: Vec<Box<dyn Processor>>,
    postprocessor: Option<Box<dyn Processor>>,
    final_processor: Option<Box<dyn Processor>>,
}

impl BufferProcessingChain {
    pub fn new(preferred_token: ProcessingToken, strategy: EnforcementStrategy) -> Self {
        Self {
            preferred_token,
            strategy,
            preprocessor: None,
            processors: Vec::new(),
            postprocessor: None,
            final_processor: None,
        }
    }

    pub fn preferred_token(&self) -> ProcessingToken {
        self.preferred_token
    }

    pub fn strategy(&self) -> EnforcementStrategy {
        self.strategy
    }

    fn compatible(&self, processor: &dyn Processor) -> bool {
        processor.token() == self.preferred_token
    }

    fn gate(&mut self, processor: Box<dyn Processor>) -> Result<Box<dyn Processor>> {
        if self.strategy == EnforcementStrategy::Strict && !self.compatible(processor.as_ref()) {
            return Err(MayaFluxError::incompatible(
                Component::Buffers,
                Context::BufferProcessing,
                format!(
                    "processor '{}' token does not match chain's preferred token under STRICT enforcement",
                    processor.name()
                ),
            ));
        }
        Ok(processor)
    }

    pub fn set_preprocessor(&mut self, processor: Box<dyn Processor>) -> Result<()> {
        self.preprocessor = Some(self.gate(processor)?);
        Ok(())
    }

    pub fn set_postprocessor(&mut self, processor: Box<dyn Processor>) -> Result<()> {
        self.postprocessor = Some(self.gate(processor)?);
        Ok(())
    }

    pub fn set_final_processor(&mut self, processor: Box<dyn Processor>) -> Result<()> {
        self.final_processor = Some(self.gate(processor)?);
        Ok(())
    }

    pub fn attach_processor(&mut self, processor: Box<dyn Processor>) -> Result<()> {
        let processor = self.gate(processor)?;
        self.processors.push(processor);
        Ok(())
    }

    /// The processors that should actually run this cycle, in order:
    /// preprocessor, chain processors (skipping incompatible ones under
    /// `FILTERED`), postprocessor, final.
    pub fn run_order(&self) -> Vec<&dyn Processor> {
        let mut order: Vec<&dyn Processor> = Vec::new();
        if let Some(p) = &self.preprocessor {
            order.push(p.as_ref());
        }
        for p in &self.processors {
            let runs = match self.strategy {
                EnforcementStrategy::Strict | EnforcementStrategy::Permissive => true,
                EnforcementStrategy::Filtered => self.compatible(p.as_ref()),
            };
            if runs {
                order.push(p.as_ref());
            }
        }
        if let Some(p) = &self.postprocessor {
            order.push(p.as_ref());
        }
        if let Some(p) = &self.final_processor {
            order.push(p.as_ref());
        }
        order
    }

    /// Run preprocessor, chain processors (skipping incompatible ones under
    /// `FILTERED`), postprocessor and final processor, in that order,
    /// against `buffer`. A processor whose `is_compatible_with` rejects
    /// `buffer`'s concrete type is skipped rather than treated as an error —
    /// token-based filtering already keeps mismatches out under `FILTERED`,
    /// this is the last-resort guard for `STRICT`/`PERMISSIVE` chains.
    pub fn run(&mut self, buffer: &mut dyn Any) -> Result<()> {
        let strategy = self.strategy;
        let preferred = self.preferred_token;

        if let Some(p) = self.preprocessor.as_mut() {
            if p.is_compatible_with(buffer) {
                p.run(buffer)?;
            }
        }
        for p in self.processors.iter_mut() {
            let runs = match strategy {
                EnforcementStrategy::Strict | EnforcementStrategy::Permissive => true,
                EnforcementStrategy::Filtered => p.token() == preferred,
            };
            if runs && p.is_compatible_with(buffer) {
                p.run(buffer)?;
            }
        }
        if let Some(p) = self.postprocessor.as_mut() {
            if p.is_compatible_with(buffer) {
                p.run(buffer)?;
            }
        }
        if let Some(p) = self.final_processor.as_mut() {
            if p.is_compatible_with(buffer) {
                p.run(buffer)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub(ProcessingToken, &'static str);
    impl Processor for Stub {
        fn token(&self) -> ProcessingToken {
            self.0
        }
        fn name(&self) -> &'static str {
            self.1
        }
        fn is_compatible_with(&self, _buffer: &dyn Any) -> bool {
            true
        }
        fn run(&mut self, _buffer: &mut dyn Any) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn strict_rejects_incompatible_processor_at_attach_time() {
        let mut chain = BufferProcessingChain::new(ProcessingToken::AUDIO_BACKEND, EnforcementStrategy::Strict);
        let result = chain.attach_processor(Box::new(Stub(ProcessingToken::GRAPHICS_BACKEND, "gfx")));
        assert!(result.is_err());
    }

    #[test]
    fn filtered_keeps_but_skips_incompatible_processor_at_run_time() {
        let mut chain = BufferProcessingChain::new(ProcessingToken::AUDIO_BACKEND, EnforcementStrategy::Filtered);
        chain
            .attach_processor(Box::new(Stub(ProcessingToken::GRAPHICS_BACKEND, "gfx")))
            .unwrap();
        chain
            .attach_processor(Box::new(Stub(ProcessingToken::AUDIO_BACKEND, "mix")))
            .unwrap();
        let order = chain.run_order();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].name(), "mix");
    }

    #[test]
    fn permissive_runs_everything() {
        let mut chain = BufferProcessingChain::new(ProcessingToken::AUDIO_BACKEND, EnforcementStrategy::Permissive);
        chain
            .attach_processor(Box::new(Stub(ProcessingToken::GRAPHICS_BACKEND, "gfx")))
            .unwrap();
        assert_eq!(chain.run_order().len(), 1);
    }

    struct CountingStub(std::sync::Arc<std::sync::atomic::AtomicU32>);
    impl Processor for CountingStub {
        fn token(&self) -> ProcessingToken {
            ProcessingToken::AUDIO_BACKEND
        }
        fn name(&self) -> &'static str {
            "counting"
        }
        fn is_compatible_with(&self, buffer: &dyn Any) -> bool {
            buffer.is::<u32>()
        }
        fn run(&mut self, _buffer: &mut dyn Any) -> Result<()> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn run_invokes_every_attached_processor_against_a_compatible_buffer() {
        let mut chain = BufferProcessingChain::new(ProcessingToken::AUDIO_BACKEND, EnforcementStrategy::Strict);
        let count = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        chain.set_preprocessor(Box::new(CountingStub(count.clone()))).unwrap();
        chain.attach_processor(Box::new(CountingStub(count.clone()))).unwrap();
        chain.set_postprocessor(Box::new(CountingStub(count.clone()))).unwrap();

        let mut buffer: u32 = 0;
        chain.run(&mut buffer).unwrap();
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[test]
    fn run_skips_a_processor_incompatible_with_the_buffer_type() {
        let mut chain = BufferProcessingChain::new(ProcessingToken::AUDIO_BACKEND, EnforcementStrategy::Strict);
        let count = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        chain.attach_processor(Box::new(CountingStub(count.clone()))).unwrap();

        let mut buffer: f64 = 0.0;
        chain.run(&mut buffer).unwrap();
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
