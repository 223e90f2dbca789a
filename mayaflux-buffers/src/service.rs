//! `BufferService`: the interface a concrete GPU backend implements and
//! this crate's processors consume.
//!
//! Grounded on the `MAYAFLUX_API` backend call sites scattered across
//! `examples/original_source/src/MayaFlux/Buffers/VKBuffer.cpp` (`map`,
//! `unmap`, `flush_range`, `invalidate_range`) and
//! `examples/original_source/src/MayaFlux/Buffers/Staging/TransferProcessor.cpp`
//! (`execute_immediate`). The concrete Vulkan-equivalent backend is an
//! external collaborator, so this crate only specifies the trait object a
//! backend registers in `BackendRegistry`.

use crate::vk::{DeviceBufferHandle, DeviceMemoryHandle};

/// A command recorder a `BufferService` hands to `execute_immediate` /
/// `record_deferred`. Opaque to this crate; a concrete backend downcasts or
/// otherwise interprets it.
pub trait CommandRecorder {
    fn record_copy(&mut self, src: DeviceBufferHandle, dst: DeviceBufferHandle, size: usize);
}

/// The backend service every GPU-touching processor in this crate consumes
/// through `BackendRegistry::get_service::<dyn BufferService>()`-equivalent
/// lookup (object-safe trait, so callers hold `Arc<dyn BufferService>`
/// directly rather than going through the generic registry).
pub trait BufferService: Send + Sync {
    /// Allocate device memory/handles for a buffer that was constructed
    /// with metadata only. A backend service initializes device handles on
    /// first attach.
    fn initialize_buffer(&self, size_bytes: usize, usage: crate::vk::Usage) -> (DeviceBufferHandle, DeviceMemoryHandle);

    /// Release a buffer's device resources. Must be idempotent-safe to call
    /// along every exit path, including panics (Design Notes: "scoped
    /// resources").
    fn destroy_buffer(&self, buffer: DeviceBufferHandle, memory: DeviceMemoryHandle);

    fn map_buffer(&self, memory: DeviceMemoryHandle, offset: usize, size: usize) -> *mut u8;

    fn unmap_buffer(&self, memory: DeviceMemoryHandle);

    fn flush_range(&self, memory: DeviceMemoryHandle, offset: usize, size: usize);

    fn invalidate_range(&self, memory: DeviceMemoryHandle, offset: usize, size: usize);

    /// Record and submit `recorder`'s commands synchronously, returning
    /// only once the backend's fence has signalled, so a staging read that
    /// follows an `execute_immediate` call is always safe.
    fn execute_immediate(&self, recorder: &mut dyn FnMut(&mut dyn CommandRecorder));

    /// Record commands into the backend's deferred (per-frame) command
    /// buffer without waiting for submission.
    fn record_deferred(&self, recorder: &mut dyn FnMut(&mut dyn CommandRecorder));
}
