//! `TransferProcessor`: a chain-attachable processor that snapshots one
//! domain's buffer into another across the audio/GPU boundary.
//!
//! Grounded on
//! `examples/original_source/src/MayaFlux/Buffers/Staging/TransferProcessor.cpp`'s
//! `TransferDirection` (`AUDIO_TO_GPU`/`GPU_TO_AUDIO`/`BIDIRECTIONAL`) and
//! per-buffer staging map: a `TransferProcessor` placed in an audio chain
//! snapshots audio samples into a staging buffer and enqueues a device copy;
//! a symmetric processor in the graphics chain downloads GPU results into an
//! audio buffer for subsequent audio-rate consumption.

use std::any::Any;
use std::sync::Arc;

use mayaflux_buffers::{AudioBuffer, BufferService, Processor, Usage, VKBuffer};
use mayaflux_core::{Component, Context, MayaFluxError, ProcessingToken, Result};

use crate::staging::{download_device_local, download_host_visible, upload_audio_to_gpu};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    AudioToGpu,
    GpuToAudio,
    Bidirectional,
}

/// Moves samples between an `AudioBuffer` and a `VKBuffer`, staging
/// through an owned device-local-compatible buffer when the GPU side isn't
/// host-visible.
pub struct TransferProcessor {
    direction: TransferDirection,
    backend: Arc<dyn BufferService>,
    staging: Option<VKBuffer>,
}

impl TransferProcessor {
    pub fn new(direction: TransferDirection, backend: Arc<dyn BufferService>) -> Self {
        Self {
            direction,
            backend,
            staging: None,
        }
    }

    /// Lazily allocates a host-visible staging buffer sized for `len`
    /// bytes, growing it if a larger transfer comes through later.
    fn ensure_staging(&mut self, len: usize) -> &mut VKBuffer {
        let needs_new = match &self.staging {
            Some(s) => s.size_bytes < len,
            None => true,
        };
        if needs_new {
            let mut staging = VKBuffer::new(len, Usage::Staging, mayaflux_buffers::Modality::Audio1D);
            let (buffer, memory) = self.backend.initialize_buffer(len, Usage::Staging);
            staging.attach_device_handles(buffer, memory);
            self.staging = Some(staging);
        }
        self.staging.as_mut().unwrap()
    }

    /// Snapshot `audio`'s samples into `gpu` (`AudioToGpu` leg).
    pub fn run_audio_to_gpu(&mut self, audio: &AudioBuffer, gpu: &mut VKBuffer) -> Result<()> {
        let bytes = audio.as_bytes();
        if gpu.is_host_visible() {
            upload_audio_to_gpu(bytes, gpu, None, self.backend.as_ref())
        } else {
            let len = bytes.len();
            let staging = self.ensure_staging(len);
            upload_audio_to_gpu(bytes, gpu, Some(staging), self.backend.as_ref())
        }
    }

    /// Download `gpu`'s bytes into `audio` (`GpuToAudio` leg).
    pub fn run_gpu_to_audio(&mut self, gpu: &VKBuffer, audio: &mut AudioBuffer) -> Result<()> {
        let len = audio.as_bytes().len();
        let bytes = if gpu.is_host_visible() {
            download_host_visible(gpu, self.backend.as_ref(), len)?
        } else {
            let staging = self.ensure_staging(len);
            download_device_local(gpu, staging, self.backend.as_ref(), len)?
        };
        audio.copy_from_bytes(&bytes);
        Ok(())
    }

    /// Run whichever legs `self.direction` names this cycle.
    pub fn run(&mut self, audio: &mut AudioBuffer, gpu: &mut VKBuffer) -> Result<()> {
        match self.direction {
            TransferDirection::AudioToGpu => self.run_audio_to_gpu(audio, gpu),
            TransferDirection::GpuToAudio => self.run_gpu_to_audio(gpu, audio),
            TransferDirection::Bidirectional => {
                self.run_audio_to_gpu(audio, gpu)?;
                self.run_gpu_to_audio(gpu, audio)
            }
        }
    }
}

impl Processor for TransferProcessor {
    fn token(&self) -> ProcessingToken {
        match self.direction {
            TransferDirection::AudioToGpu => ProcessingToken::AUDIO_BACKEND,
            TransferDirection::GpuToAudio => ProcessingToken::GRAPHICS_BACKEND,
            TransferDirection::Bidirectional => ProcessingToken::AUDIO_BACKEND,
        }
    }

    fn name(&self) -> &'static str {
        "TransferProcessor"
    }

    /// Attached generically (via the chain's `run`), a `TransferProcessor`
    /// acts against the `AudioBuffer` side and uses its own lazily-grown
    /// staging buffer as the GPU-side counterpart — the same staging buffer
    /// `run_audio_to_gpu`/`run_gpu_to_audio` fall back to when handed a
    /// device-local destination directly.
    fn is_compatible_with(&self, buffer: &dyn Any) -> bool {
        buffer.is::<AudioBuffer>()
    }

    fn run(&mut self, buffer: &mut dyn Any) -> Result<()> {
        let audio = buffer.downcast_mut::<AudioBuffer>().ok_or_else(|| {
            MayaFluxError::incompatible(
                Component::Buffers,
                Context::BufferProcessing,
                "TransferProcessor requires an AudioBuffer".to_string(),
            )
        })?;
        let len = audio.as_bytes().len();
        self.ensure_staging(len);
        let mut gpu = self.staging.take().expect("ensure_staging just populated this");
        let result = match self.direction {
            TransferDirection::AudioToGpu => self.run_audio_to_gpu(audio, &mut gpu),
            TransferDirection::GpuToAudio => self.run_gpu_to_audio(&gpu, audio),
            TransferDirection::Bidirectional => self
                .run_audio_to_gpu(audio, &mut gpu)
                .and_then(|_| self.run_gpu_to_audio(&gpu, audio)),
        };
        self.staging = Some(gpu);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mayaflux_buffers::{CommandRecorder, DeviceBufferHandle, DeviceMemoryHandle};

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
    fn round_trips_audio_through_a_host_visible_gpu_buffer() {
        let mut processor = TransferProcessor::new(TransferDirection::Bidirectional, Arc::new(StubBackend));
        let mut audio = AudioBuffer::new(0, 4);
        audio.samples = vec![0.1, 0.2, 0.3, 0.4];
        let mut gpu = VKBuffer::new(audio.as_bytes().len(), Usage::Staging, mayaflux_buffers::Modality::Audio1D);

        processor.run_audio_to_gpu(&audio, &mut gpu).unwrap();

        let mut roundtrip = AudioBuffer::new(0, 4);
        processor.run_gpu_to_audio(&gpu, &mut roundtrip).unwrap();
        assert_eq!(roundtrip.samples, audio.samples);
    }

    #[test]
    fn device_local_gpu_buffer_transfers_through_lazily_allocated_staging() {
        let mut processor = TransferProcessor::new(TransferDirection::AudioToGpu, Arc::new(StubBackend));
        let mut audio = AudioBuffer::new(0, 2);
        audio.samples = vec![1.0, -1.0];
        let mut gpu = VKBuffer::new(audio.as_bytes().len(), Usage::Device, mayaflux_buffers::Modality::Audio1D);
        gpu.attach_device_handles(DeviceBufferHandle(5), DeviceMemoryHandle(5));

        assert!(processor.run_audio_to_gpu(&audio, &mut gpu).is_ok());
    }
}
