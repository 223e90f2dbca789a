//! `TextureBuffer`: a VKBuffer-as-vertex-quad plus separate CPU pixel
//! storage, and its default processor `TextureProcessor`.
//!
//! Grounded on
//! `examples/original_source/src/MayaFlux/Buffers/Textures/TextureBuffer.hpp`
//! and `TextureProcessor.cpp`: on first attach the processor creates a GPU
//! image via the backend, uploads pixel data if `texture_dirty`, and clears
//! the flag; geometry dirty (position/scale/rotation) triggers a separate
//! vertex-buffer re-upload.

use std::any::Any;

use mayaflux_core::{ProcessingToken, Result};

use crate::chain::{incompatible_buffer, BufferProcessingChain, EnforcementStrategy, Processor};
use crate::core::BufferCore;
use crate::service::BufferService;
use crate::vk::{DeviceBufferHandle, Modality, Usage, VKBuffer};

/// A 2D screen-space transform applied to the quad's vertex positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub position: (f32, f32),
    pub scale: (f32, f32),
    pub rotation_radians: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: (0.0, 0.0),
            scale: (1.0, 1.0),
            rotation_radians: 0.0,
        }
    }
}

pub struct TextureBuffer {
    pub vk: VKBuffer,
    pub width: u32,
    pub height: u32,
    pixel_data: Vec<u8>,
    texture_dirty: bool,
    geometry_dirty: bool,
    transform: Transform2D,
    gpu_texture: Option<DeviceBufferHandle>,
    pub chain: BufferProcessingChain,
}

impl TextureBuffer {
    /// `width`/`height` are in pixels; pixel data is 4 bytes/pixel (RGBA8).
    /// The backing `VKBuffer` holds a fullscreen quad's vertex bytes
    /// (position + UV, 4 vertices).
    pub fn new(width: u32, height: u32, initial_pixels: Option<Vec<u8>>) -> Self {
        let quad_bytes = Self::quad_vertex_bytes(&Transform2D::default());
        let mut vk = VKBuffer::new(quad_bytes.len(), Usage::Vertex, Modality::VertexPositions);
        if vk.is_host_visible() {
            vk.write_mapped(0, &quad_bytes);
        }
        let pixel_count = (width as usize) * (height as usize) * 4;
        let pixel_data = initial_pixels.unwrap_or_else(|| vec![0u8; pixel_count]);
        Self {
            vk,
            width,
            height,
            pixel_data,
            texture_dirty: true,
            geometry_dirty: true,
            transform: Transform2D::default(),
            gpu_texture: None,
            chain: BufferProcessingChain::new(ProcessingToken::GRAPHICS_BACKEND, EnforcementStrategy::Filtered),
        }
    }

    fn quad_vertex_bytes(transform: &Transform2D) -> Vec<u8> {
        // Four vertices, each (x, y, z, u, v) as f32 — a minimal fullscreen
        // quad layout. The exact shader-facing layout is backend policy;
        // this crate only guarantees the bytes regenerate when the
        // transform changes.
        let (px, py) = transform.position;
        let (sx, sy) = transform.scale;
        let corners = [(-0.5f32, -0.5f32), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
        let uvs = [(0.0f32, 0.0f32), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let mut bytes = Vec::with_capacity(4 * 5 * 4);
        let (sin, cos) = transform.rotation_radians.sin_cos();
        for ((cx, cy), (u, v)) in corners.iter().zip(uvs.iter()) {
            let rx = cx * cos - cy * sin;
            let ry = cx * sin + cy * cos;
            let x = px + rx * sx;
            let y = py + ry * sy;
            bytes.extend_from_slice(&x.to_le_bytes());
            bytes.extend_from_slice(&y.to_le_bytes());
            bytes.extend_from_slice(&0.0f32.to_le_bytes());
            bytes.extend_from_slice(&u.to_le_bytes());
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    pub fn set_pixel_data(&mut self, data: Vec<u8>) {
        self.pixel_data = data;
        self.texture_dirty = true;
    }

    pub fn mark_pixels_dirty(&mut self) {
        self.texture_dirty = true;
    }

    pub fn pixel_data(&self) -> &[u8] {
        &self.pixel_data
    }

    pub fn is_texture_dirty(&self) -> bool {
        self.texture_dirty
    }

    pub fn is_geometry_dirty(&self) -> bool {
        self.geometry_dirty
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.transform.position = (x, y);
        self.geometry_dirty = true;
    }

    pub fn set_scale(&mut self, w: f32, h: f32) {
        self.transform.scale = (w, h);
        self.geometry_dirty = true;
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.transform.rotation_radians = radians;
        self.geometry_dirty = true;
    }

    pub fn has_texture(&self) -> bool {
        self.gpu_texture.is_some()
    }
}

/// Default processor for [`TextureBuffer`]: creates the GPU image on first
/// attach, uploads pixel data when `texture_dirty`, and re-uploads vertex
/// bytes when `geometry_dirty`.
pub struct TextureProcessor {
    backend: std::sync::Arc<dyn BufferService>,
}

impl TextureProcessor {
    pub fn new(backend: std::sync::Arc<dyn BufferService>) -> Self {
        Self { backend }
    }

    /// Run one cycle against `texture`, mutating its dirty flags as the
    /// upload completes. Returns `true` if any upload ran.
    pub fn run(&self, texture: &mut TextureBuffer) -> bool {
        let mut uploaded = false;
        if !texture.has_texture() {
            let (buffer, memory) = self
                .backend
                .initialize_buffer(texture.pixel_data.len(), Usage::Device);
            texture.gpu_texture = Some(buffer);
            texture.vk.attach_device_handles(buffer, memory);
        }

        if texture.texture_dirty {
            // A real backend would memcpy into a staging buffer and enqueue
            // a device copy; here the upload is represented by marking the
            // relevant byte range dirty for the transfer subsystem to pick
            // up via `get_and_clear_dirty_ranges`.
            let len = texture.pixel_data.len();
            texture.vk.core.mark_dirty_range(0, len);
            texture.texture_dirty = false;
            uploaded = true;
        }

        if texture.geometry_dirty {
            let bytes = TextureBuffer::quad_vertex_bytes(&texture.transform);
            if texture.vk.is_host_visible() {
                texture.vk.write_mapped(0, &bytes);
            }
            texture.geometry_dirty = false;
            uploaded = true;
        }

        uploaded
    }
}

impl Processor for TextureProcessor {
    fn token(&self) -> ProcessingToken {
        ProcessingToken::GRAPHICS_BACKEND
    }

    fn name(&self) -> &'static str {
        "TextureProcessor"
    }

    fn is_compatible_with(&self, buffer: &dyn Any) -> bool {
        buffer.is::<TextureBuffer>()
    }

    fn run(&mut self, buffer: &mut dyn Any) -> Result<()> {
        let texture = buffer.downcast_mut::<TextureBuffer>().ok_or_else(|| incompatible_buffer(self.name()))?;
        self.run(texture);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::CommandRecorder;
    use crate::vk::DeviceMemoryHandle;

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
    fn first_run_creates_texture_and_uploads_pixels() {
        let mut texture = TextureBuffer::new(2, 2, None);
        let processor = TextureProcessor::new(std::sync::Arc::new(StubBackend));
        assert!(!texture.has_texture());
        assert!(processor.run(&mut texture));
        assert!(texture.has_texture());
        assert!(!texture.is_texture_dirty());
    }

    #[test]
    fn geometry_dirty_triggers_vertex_reupload_independent_of_pixels() {
        let mut texture = TextureBuffer::new(2, 2, None);
        let processor = TextureProcessor::new(std::sync::Arc::new(StubBackend));
        processor.run(&mut texture);
        assert!(!processor.run(&mut texture));
        texture.set_position(10.0, 5.0);
        assert!(texture.is_geometry_dirty());
        assert!(processor.run(&mut texture));
        assert!(!texture.is_geometry_dirty());
    }
}
