//! `RootGraphicsUnit`/`RootGraphicsBuffer`: the graphics-side counterpart
//! to `audio::RootAudioUnit`, plus its default `GraphicsBatchProcessor` and
//! optional final `PresentProcessor`.
//!
//! Grounded on
//! `examples/original_source/src/MayaFlux/Buffers/Managers/TokenUnitManager.hpp`
//! (one `RootGraphicsBuffer` per token, unlike audio's per-channel vector).
//! `m_renderable_buffers` clears unconditionally once `PresentProcessor`
//! returns, regardless of whether the frame succeeded, so a stale index from
//! a failed frame can never leak into the next one.

use std::any::Any;

use mayaflux_core::{ProcessingToken, Result};

use crate::chain::{BufferProcessingChain, EnforcementStrategy};
use crate::core::BufferCore;

/// One GPU buffer a `RootGraphicsBuffer` owns. Each concrete buffer kind
/// (`TextureBuffer`, `GeometryBuffer`, `DescriptorBuffer`, bare `VKBuffer`)
/// implements this by running its own default processor. Returns whether
/// it uploaded anything this cycle, so the root can track which children
/// are renderable for `PresentProcessor`.
pub trait GraphicsChild: Send {
    fn process_cycle(&mut self) -> bool;
}

pub struct RootGraphicsBuffer {
    pub core: BufferCore,
    pub children: Vec<Box<dyn GraphicsChild>>,
    pub chain: BufferProcessingChain,
    renderable_buffers: Vec<usize>,
}

impl RootGraphicsBuffer {
    pub fn new() -> Self {
        Self {
            core: BufferCore::new(ProcessingToken::GRAPHICS_BACKEND),
            children: Vec::new(),
            chain: BufferProcessingChain::new(ProcessingToken::GRAPHICS_BACKEND, EnforcementStrategy::Filtered),
            renderable_buffers: Vec::new(),
        }
    }

    /// Indices into `children` that produced new data this cycle, since
    /// the last call to `process_cycle`.
    pub fn renderable_buffers(&self) -> &[usize] {
        &self.renderable_buffers
    }

    /// Run `GraphicsBatchProcessor` over every child, then the attached
    /// chain, then `present` (the `PresentProcessor`, if any) against
    /// `self`. `renderable_buffers` clears unconditionally once `present`
    /// returns, whether or not it reports success.
    pub fn process_cycle(&mut self, present: Option<&mut PresentProcessor>) -> Result<bool> {
        let children = &mut self.children;
        let mut renderable = Vec::new();
        let ran = self.core.process_default(true, || {
            for (index, child) in children.iter_mut().enumerate() {
                if child.process_cycle() {
                    renderable.push(index);
                }
            }
        });
        if !ran {
            return Ok(false);
        }
        self.renderable_buffers = renderable;

        let token = self.chain.preferred_token();
        let strategy = self.chain.strategy();
        let mut chain = std::mem::replace(&mut self.chain, BufferProcessingChain::new(token, strategy));
        let result = chain.run(self);
        self.chain = chain;
        result?;

        if let Some(present) = present {
            present.run(self);
        }
        self.renderable_buffers.clear();
        Ok(true)
    }
}

impl Default for RootGraphicsBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Default processor for [`RootGraphicsBuffer`]: iterates child GPU
/// buffers, running each one's default upload/compute step. Folded into
/// `RootGraphicsBuffer::process_cycle` directly (mirroring how
/// `audio::RootAudioBuffer::process_cycle` calls `MixProcessor` inline)
/// since cross-cycle synchronization is the root's `is_processing` guard,
/// not a separate stage.
pub struct GraphicsBatchProcessor;

impl GraphicsBatchProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, root: &mut RootGraphicsBuffer) -> Result<bool> {
        root.process_cycle(None)
    }
}

impl Default for GraphicsBatchProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional final processor for [`RootGraphicsBuffer`]: invokes a
/// user-supplied callback with the root after all child processing
/// completes, intended to record render commands and submit/present.
pub struct PresentProcessor {
    callback: Box<dyn FnMut(&RootGraphicsBuffer) + Send>,
}

impl PresentProcessor {
    pub fn new(callback: impl FnMut(&RootGraphicsBuffer) + Send + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    pub fn run(&mut self, root: &RootGraphicsBuffer) {
        (self.callback)(root);
    }
}

/// Per-token graphics aggregation anchor: a single `RootGraphicsBuffer`,
/// unlike audio's per-channel vector.
pub struct RootGraphicsUnit {
    pub token: ProcessingToken,
    pub root: RootGraphicsBuffer,
}

impl RootGraphicsUnit {
    pub fn new(token: ProcessingToken) -> Self {
        Self {
            token,
            root: RootGraphicsBuffer::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedChild(bool);
    impl GraphicsChild for FixedChild {
        fn process_cycle(&mut self) -> bool {
            self.0
        }
    }

    #[test]
    fn batch_processor_tracks_which_children_were_renderable() {
        let mut root = RootGraphicsBuffer::new();
        root.children.push(Box::new(FixedChild(true)));
        root.children.push(Box::new(FixedChild(false)));
        root.children.push(Box::new(FixedChild(true)));
        assert!(root.process_cycle(None).unwrap());
        // renderable_buffers is cleared once present (None here) "returns" —
        // there's no present step, so nothing consumed it and it stays empty
        // after the unconditional clear.
        assert!(root.renderable_buffers().is_empty());
    }

    #[test]
    fn present_processor_sees_renderable_indices_before_clear() {
        let mut root = RootGraphicsBuffer::new();
        root.children.push(Box::new(FixedChild(true)));
        root.children.push(Box::new(FixedChild(false)));

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let mut present = PresentProcessor::new(move |root| {
            seen_clone.store(root.renderable_buffers().len(), Ordering::SeqCst);
        });

        assert!(root.process_cycle(Some(&mut present)).unwrap());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(root.renderable_buffers().is_empty());
    }

    #[test]
    fn reentrant_process_cycle_is_rejected() {
        let mut root = RootGraphicsBuffer::new();
        root.core.try_acquire_processing();
        assert!(!root.process_cycle(None).unwrap());
        root.core.release_processing();
        assert!(root.process_cycle(None).unwrap());
    }

    #[test]
    fn process_cycle_runs_an_attached_chain_processor() {
        use crate::chain::{incompatible_buffer, Processor};
        use std::sync::atomic::AtomicU32;

        struct CountingProcessor(Arc<AtomicU32>);
        impl Processor for CountingProcessor {
            fn token(&self) -> ProcessingToken {
                ProcessingToken::GRAPHICS_BACKEND
            }
            fn name(&self) -> &'static str {
                "CountingProcessor"
            }
            fn is_compatible_with(&self, buffer: &dyn Any) -> bool {
                buffer.is::<RootGraphicsBuffer>()
            }
            fn run(&mut self, buffer: &mut dyn Any) -> Result<()> {
                buffer.downcast_mut::<RootGraphicsBuffer>().ok_or_else(|| incompatible_buffer(self.name()))?;
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let mut root = RootGraphicsBuffer::new();
        let count = Arc::new(AtomicU32::new(0));
        root.chain.attach_processor(Box::new(CountingProcessor(count.clone()))).unwrap();

        assert!(root.process_cycle(None).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
