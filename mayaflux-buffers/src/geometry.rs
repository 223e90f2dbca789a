//! `GeometryBuffer`: a VKBuffer holding procedurally generated vertices,
//! bound to a node that produces them, plus its default processor
//! `GeometryBindingsProcessor`.
//!
//! Grounded on
//! `examples/original_source/src/MayaFlux/Buffers/Geometry/GeometryBuffer.hpp`
//! and `GeometryBindingsProcessor.cpp`: vertices are generated, not loaded;
//! the bindings processor grows the buffer by 1.5x when the generated size
//! exceeds current capacity, rather than reallocating exactly to fit (which
//! would thrash on every small growth).

use std::any::Any;

use mayaflux_core::{ProcessingToken, Result};

use crate::chain::{incompatible_buffer, BufferProcessingChain, EnforcementStrategy, Processor};
use crate::vk::{Modality, Usage, VKBuffer};

/// Stamped alongside uploaded vertex bytes so a render processor downstream
/// knows how to interpret them without re-deriving it from byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride_bytes: usize,
    pub vertex_count: usize,
}

/// A node that generates vertex bytes on demand. The concrete generator
/// (particle system, procedural mesh, ...) lives in a host application;
/// this crate only needs the shape a `GeometryWriterNode` exposes.
pub trait GeometrySource: Send {
    fn needs_gpu_update(&self) -> bool;
    fn vertex_bytes(&self) -> &[u8];
    fn stride_bytes(&self) -> usize;
    fn mark_uploaded(&mut self);
}

pub struct GeometryBuffer {
    pub vk: VKBuffer,
    pub node: Box<dyn GeometrySource>,
    pub over_allocate_factor: f32,
    pub chain: BufferProcessingChain,
    layout: VertexLayout,
}

impl GeometryBuffer {
    pub fn new(node: Box<dyn GeometrySource>, over_allocate_factor: f32) -> Self {
        let initial = node.vertex_bytes().len();
        let allocated = ((initial as f32) * over_allocate_factor.max(1.0)) as usize;
        Self {
            vk: VKBuffer::new(allocated.max(initial), Usage::Vertex, Modality::VertexPositions),
            node,
            over_allocate_factor: over_allocate_factor.max(1.0),
            chain: BufferProcessingChain::new(ProcessingToken::GRAPHICS_BACKEND, EnforcementStrategy::Filtered),
            layout: VertexLayout {
                stride_bytes: 0,
                vertex_count: 0,
            },
        }
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }
}

/// Default processor for [`GeometryBuffer`]: asks the bound node whether it
/// needs a GPU update, grows the backing buffer by 1.5x if the generated
/// bytes no longer fit, re-uploads, and stamps the vertex layout.
pub struct GeometryBindingsProcessor;

impl GeometryBindingsProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` if an upload ran this cycle.
    pub fn run(&self, buffer: &mut GeometryBuffer) -> bool {
        if !buffer.node.needs_gpu_update() {
            return false;
        }

        let bytes_len = buffer.node.vertex_bytes().len();
        let stride = buffer.node.stride_bytes().max(1);

        if bytes_len > buffer.vk.size_bytes {
            let grown = ((bytes_len as f32) * 1.5) as usize;
            buffer.vk = VKBuffer::new(grown.max(bytes_len), Usage::Vertex, Modality::VertexPositions);
        }

        if buffer.vk.is_host_visible() {
            let bytes = buffer.node.vertex_bytes().to_vec();
            buffer.vk.write_mapped(0, &bytes);
        } else {
            buffer.vk.core.mark_dirty_range(0, bytes_len);
        }

        buffer.layout = VertexLayout {
            stride_bytes: stride,
            vertex_count: bytes_len / stride,
        };
        buffer.node.mark_uploaded();
        true
    }
}

impl Default for GeometryBindingsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for GeometryBindingsProcessor {
    fn token(&self) -> ProcessingToken {
        ProcessingToken::GRAPHICS_BACKEND
    }

    fn name(&self) -> &'static str {
        "GeometryBindingsProcessor"
    }

    fn is_compatible_with(&self, buffer: &dyn Any) -> bool {
        buffer.is::<GeometryBuffer>()
    }

    fn run(&mut self, buffer: &mut dyn Any) -> Result<()> {
        let geometry = buffer.downcast_mut::<GeometryBuffer>().ok_or_else(|| incompatible_buffer(self.name()))?;
        self.run(geometry);
        Ok(())
    }
}
