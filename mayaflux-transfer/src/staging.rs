//! Host/device staging primitives: the raw memcpy-and-flush/invalidate
//! operations `TransferProcessor` composes into directional transfers.
//!
//! Grounded on
//! `examples/original_source/src/MayaFlux/Buffers/Staging/TransferProcessor.cpp`'s
//! upload/download helpers.

use mayaflux_buffers::{BufferService, Modality, VKBuffer};
use mayaflux_core::{Component, Context, ErrorKind, MayaFluxError, Result};

/// Memcpy into `target`'s mapped pointer, mark the range dirty, and flush
/// it to the device. Errs if `target` isn't host-visible.
pub fn upload_host_visible(target: &mut VKBuffer, data: &[u8], backend: &dyn BufferService) -> Result<()> {
    if !target.is_host_visible() {
        return Err(not_host_visible());
    }
    target.write_mapped(0, data);
    if let Some(memory) = target.device_memory {
        backend.flush_range(memory, 0, data.len());
    }
    Ok(())
}

/// Memcpy into `staging`'s mapped pointer, flush it, then enqueue a
/// device-to-device copy from `staging` into `target`.
pub fn upload_device_local(
    target: &VKBuffer,
    staging: &mut VKBuffer,
    data: &[u8],
    backend: &dyn BufferService,
) -> Result<()> {
    if !staging.is_host_visible() {
        return Err(not_host_visible());
    }
    staging.write_mapped(0, data);
    if let Some(memory) = staging.device_memory {
        backend.flush_range(memory, 0, data.len());
    }
    let (Some(src), Some(dst)) = (staging.device_buffer, target.device_buffer) else {
        return Err(missing_device_handles());
    };
    backend.execute_immediate(&mut |recorder| recorder.record_copy(src, dst, data.len()));
    Ok(())
}

/// Invalidate `source`'s mapped range and copy its bytes out.
pub fn download_host_visible(source: &VKBuffer, backend: &dyn BufferService, len: usize) -> Result<Vec<u8>> {
    if !source.is_host_visible() {
        return Err(not_host_visible());
    }
    if let Some(memory) = source.device_memory {
        backend.invalidate_range(memory, 0, len);
    }
    source
        .read_mapped(0, len)
        .map(|bytes| bytes.to_vec())
        .ok_or_else(not_host_visible)
}

/// Enqueue a device copy from `source` into `staging`, invalidate
/// `staging`'s range, then copy the bytes out.
pub fn download_device_local(
    source: &VKBuffer,
    staging: &mut VKBuffer,
    backend: &dyn BufferService,
    len: usize,
) -> Result<Vec<u8>> {
    let (Some(src), Some(dst)) = (source.device_buffer, staging.device_buffer) else {
        return Err(missing_device_handles());
    };
    backend.execute_immediate(&mut |recorder| recorder.record_copy(src, dst, len));
    if let Some(memory) = staging.device_memory {
        backend.invalidate_range(memory, 0, len);
    }
    staging
        .read_mapped(0, len)
        .map(|bytes| bytes.to_vec())
        .ok_or_else(not_host_visible)
}

/// Auto-dispatches by `target.is_host_visible()`, creating/using `staging`
/// when the target is device-local. Errs if the target is device-local and
/// no staging buffer was supplied.
pub fn upload_to_gpu(
    data: &[u8],
    target: &mut VKBuffer,
    staging: Option<&mut VKBuffer>,
    backend: &dyn BufferService,
) -> Result<()> {
    if target.is_host_visible() {
        upload_host_visible(target, data, backend)
    } else {
        let staging = staging.ok_or_else(|| {
            MayaFluxError::new(
                Component::Transfer,
                Context::Transfer,
                ErrorKind::InvalidArgument("device-local target requires a staging buffer".into()),
            )
        })?;
        upload_device_local(target, staging, data, backend)
    }
}

/// Audio-specific upload: enforces double-precision (`Audio1D`) format
/// match between `data`'s expected sample layout and `target`'s modality,
/// logging a diagnostic (not an error) on mismatch.
pub fn upload_audio_to_gpu(
    data: &[u8],
    target: &mut VKBuffer,
    staging: Option<&mut VKBuffer>,
    backend: &dyn BufferService,
) -> Result<()> {
    if target.modality != Modality::Audio1D {
        tracing::warn!(
            modality = ?target.modality,
            "uploading audio samples into a buffer not tagged Audio1D (R64 format mismatch)"
        );
    }
    upload_to_gpu(data, target, staging, backend)
}

fn not_host_visible() -> MayaFluxError {
    MayaFluxError::new(
        Component::Transfer,
        Context::Transfer,
        ErrorKind::InvalidArgument("buffer is not host-visible".into()),
    )
}

fn missing_device_handles() -> MayaFluxError {
    MayaFluxError::new(
        Component::Transfer,
        Context::Transfer,
        ErrorKind::ResourceNotInitialized("buffer has no device handles attached".into()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mayaflux_buffers::{CommandRecorder, DeviceBufferHandle, DeviceMemoryHandle, Usage};

    struct StubBackend;
    impl BufferService for StubBackend {
        fn initialize_buffer(&self, _size_bytes: usize, _usage: Usage) -> (DeviceBufferHandle, DeviceMemoryHandle) {
            (DeviceBufferHandle(1), DeviceMemoryHandle(1))
        }
        fn destroy_buffer(&self, _buffer: DeviceBufferHandle, _memory: DeviceMemoryHandle) {}
        fn map_buffer(&self, _memory: DeviceMemoryHandle, _offset: usize, _size: usize) -> *mut u8 {
            std::ptr::null_mut()
        }
        fn unmap_buffer(&self, _memory: DeviceMemoryHandle) {}
        fn flush_range(&self, _memory: DeviceMemoryHandle, _offset: usize, _size: usize) {}
        fn invalidate_range(&self, _memory: DeviceMemoryHandle, _offset: usize, _size: usize) {}
        fn execute_immediate(&self, recorder: &mut dyn FnMut(&mut dyn CommandRecorder)) {
            struct NoopRecorder;
            impl CommandRecorder for NoopRecorder {
                fn record_copy(&mut self, _src: DeviceBufferHandle, _dst: DeviceBufferHandle, _size: usize) {}
            }
            recorder(&mut NoopRecorder);
        }
        fn record_deferred(&self, recorder: &mut dyn FnMut(&mut dyn CommandRecorder)) {
            self.execute_immediate(recorder);
        }
    }

    #[test]
    fn upload_host_visible_writes_bytes() {
        let mut target = VKBuffer::new(8, Usage::Staging, Modality::Raw);
        upload_host_visible(&mut target, &[1, 2, 3, 4], &StubBackend).unwrap();
        assert_eq!(target.read_mapped(0, 4).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn upload_host_visible_rejects_device_local_target() {
        let mut target = VKBuffer::new(8, Usage::Device, Modality::Raw);
        assert!(upload_host_visible(&mut target, &[1, 2, 3, 4], &StubBackend).is_err());
    }

    #[test]
    fn upload_to_gpu_dispatches_to_device_path_when_target_is_device_local() {
        let mut target = VKBuffer::new(8, Usage::Device, Modality::Raw);
        target.attach_device_handles(DeviceBufferHandle(2), DeviceMemoryHandle(2));
        let mut staging = VKBuffer::new(8, Usage::Staging, Modality::Raw);
        staging.attach_device_handles(DeviceBufferHandle(3), DeviceMemoryHandle(3));
        upload_to_gpu(&[9, 9, 9, 9], &mut target, Some(&mut staging), &StubBackend).unwrap();
        assert_eq!(staging.read_mapped(0, 4).unwrap(), &[9, 9, 9, 9]);
    }

    #[test]
    fn upload_to_gpu_without_staging_for_device_local_target_errs() {
        let mut target = VKBuffer::new(8, Usage::Device, Modality::Raw);
        assert!(upload_to_gpu(&[1], &mut target, None, &StubBackend).is_err());
    }
}
