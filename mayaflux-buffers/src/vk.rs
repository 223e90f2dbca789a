//! `VKBuffer`: the GPU-resident buffer kind shared by textures, geometry,
//! and descriptor payloads.
//!
//! Grounded on
//! `examples/original_source/src/MayaFlux/Buffers/VKBuffer.hpp`. Concrete
//! GPU backends are an explicit external collaborator, so device resources
//! are opaque handle newtypes rather than real `ash`/Vulkan objects — a host
//! application's `BufferService` implementation is the thing that actually
//! owns a `vk::Buffer`.

use mayaflux_core::ProcessingToken;

use crate::chain::{BufferProcessingChain, EnforcementStrategy};
use crate::core::BufferCore;

/// How a GPU buffer is bound, mirroring Vulkan's usage flags at the level
/// of granularity the scheduler and processors need to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Staging,
    Device,
    Compute,
    Vertex,
    Index,
    Uniform,
}

/// What the bytes in a GPU buffer semantically represent, independent of
/// `Usage` (a vertex buffer can hold audio-1D samples being staged for a
/// GPU oscillator, for instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Audio1D,
    RgbaImage,
    VertexPositions,
    Raw,
}

/// Opaque handle to a backend's device buffer object. The backend
/// implementation (outside this crate) is the only thing that interprets
/// the bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceBufferHandle(pub u64);

/// Opaque handle to the device memory backing a [`DeviceBufferHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceMemoryHandle(pub u64);

pub struct VKBuffer {
    pub core: BufferCore,
    pub size_bytes: usize,
    pub usage: Usage,
    pub modality: Modality,
    pub device_buffer: Option<DeviceBufferHandle>,
    pub device_memory: Option<DeviceMemoryHandle>,
    /// Present only for host-visible usages (`Staging`); `None` for
    /// device-local buffers a host pointer can't reach directly.
    mapped: Option<Vec<u8>>,
    pub chain: BufferProcessingChain,
}

impl VKBuffer {
    pub fn new(size_bytes: usize, usage: Usage, modality: Modality) -> Self {
        let mapped = matches!(usage, Usage::Staging).then(|| vec![0u8; size_bytes]);
        Self {
            core: BufferCore::new(ProcessingToken::GRAPHICS_BACKEND),
            size_bytes,
            usage,
            modality,
            device_buffer: None,
            device_memory: None,
            mapped,
            chain: BufferProcessingChain::new(ProcessingToken::GRAPHICS_BACKEND, EnforcementStrategy::Filtered),
        }
    }

    pub fn is_host_visible(&self) -> bool {
        self.mapped.is_some()
    }

    pub fn mapped_bytes(&self) -> Option<&[u8]> {
        self.mapped.as_deref()
    }

    /// Write into the mapped host pointer and mark the written range dirty.
    /// No-op (the caller should stage instead) if this buffer isn't
    /// host-visible.
    pub fn write_mapped(&mut self, offset: usize, data: &[u8]) {
        if let Some(mapped) = self.mapped.as_mut() {
            mapped[offset..offset + data.len()].copy_from_slice(data);
            self.core.mark_dirty_range(offset, data.len());
        }
    }

    pub fn read_mapped(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.mapped.as_deref().map(|m| &m[offset..offset + len])
    }

    pub fn attach_device_handles(&mut self, buffer: DeviceBufferHandle, memory: DeviceMemoryHandle) {
        self.device_buffer = Some(buffer);
        self.device_memory = Some(memory);
        self.core.has_data = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_buffers_are_host_visible_device_buffers_are_not() {
        let staging = VKBuffer::new(64, Usage::Staging, Modality::Raw);
        assert!(staging.is_host_visible());
        let device = VKBuffer::new(64, Usage::Device, Modality::Raw);
        assert!(!device.is_host_visible());
    }

    #[test]
    fn write_mapped_marks_dirty_range() {
        let mut buf = VKBuffer::new(16, Usage::Staging, Modality::Raw);
        buf.write_mapped(4, &[1, 2, 3, 4]);
        let dirty = buf.core.get_and_clear_dirty_ranges();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].offset, 4);
        assert_eq!(dirty[0].size, 4);
    }
}
