//! Tagged dispatch for buffers and their default processors.
//!
//! `BufferKind` enumerates the known-complete set of buffer payloads
//! (`Audio`, `Vk`, `Texture`, `Geometry`, `Descriptor`) as a sum type rather
//! than a trait object, so cross-kind pairing (which processor may attach to
//! which buffer) is validated at attach time via pattern-match rather than a
//! downcast. The per-kind trait objects elsewhere in this crate
//! (`GraphicsChild`, `GeometrySource`, `DescriptorSource`) cover dispatch
//! *within* a buffer's own processing; `BufferKind` is the outward-facing
//! tag a distributor or registry uses to reason about a buffer generically
//! without downcasting.

use mayaflux_core::{Component, Context, ErrorKind, MayaFluxError, ProcessingToken, Result};

use crate::audio::{AudioBuffer, MixProcessor};
use crate::descriptor::{DescriptorBindingsProcessor, DescriptorBuffer};
use crate::geometry::{GeometryBindingsProcessor, GeometryBuffer};
use crate::texture::{TextureBuffer, TextureProcessor};
use crate::vk::VKBuffer;

/// The known-complete set of buffer payload kinds this crate provides.
pub enum BufferKind {
    Audio(AudioBuffer),
    Vk(VKBuffer),
    Texture(TextureBuffer),
    Geometry(GeometryBuffer),
    Descriptor(DescriptorBuffer),
}

impl BufferKind {
    pub fn token(&self) -> ProcessingToken {
        match self {
            BufferKind::Audio(_) => ProcessingToken::AUDIO_BACKEND,
            BufferKind::Vk(_) | BufferKind::Texture(_) | BufferKind::Geometry(_) | BufferKind::Descriptor(_) => {
                ProcessingToken::GRAPHICS_BACKEND
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BufferKind::Audio(_) => "Audio",
            BufferKind::Vk(_) => "VK",
            BufferKind::Texture(_) => "Texture",
            BufferKind::Geometry(_) => "Geometry",
            BufferKind::Descriptor(_) => "Descriptor",
        }
    }
}

/// The default processor each [`BufferKind`] variant accepts. `Vk` has no
/// default processor of its own — it's a bare GPU buffer driven entirely
/// by its chain.
pub enum ProcessorKind {
    Mix(MixProcessor),
    Texture(TextureProcessor),
    Geometry(GeometryBindingsProcessor),
    Descriptor(DescriptorBindingsProcessor),
}

/// Pattern-match validation for attaching a default processor to a buffer,
/// rejecting cross-kind pairings (e.g. a `GeometryBindingsProcessor`
/// attached to a `TextureBuffer`) before they reach attach-time chain
/// bookkeeping.
pub fn validate_default_processor(buffer: &BufferKind, processor: &ProcessorKind) -> Result<()> {
    let compatible = matches!(
        (buffer, processor),
        (BufferKind::Audio(_), ProcessorKind::Mix(_))
            | (BufferKind::Texture(_), ProcessorKind::Texture(_))
            | (BufferKind::Geometry(_), ProcessorKind::Geometry(_))
            | (BufferKind::Descriptor(_), ProcessorKind::Descriptor(_))
    );
    if compatible {
        Ok(())
    } else {
        Err(MayaFluxError::new(
            Component::Buffers,
            Context::BufferProcessing,
            ErrorKind::Incompatible(format!(
                "{} buffer cannot take a {} as its default processor",
                buffer.name(),
                processor_name(processor)
            )),
        ))
    }
}

fn processor_name(processor: &ProcessorKind) -> &'static str {
    match processor {
        ProcessorKind::Mix(_) => "MixProcessor",
        ProcessorKind::Texture(_) => "TextureProcessor",
        ProcessorKind::Geometry(_) => "GeometryBindingsProcessor",
        ProcessorKind::Descriptor(_) => "DescriptorBindingsProcessor",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vk::{Modality, Usage};

    #[test]
    fn matching_kind_and_processor_validates() {
        let buffer = BufferKind::Audio(AudioBuffer::new(0, 4));
        let processor = ProcessorKind::Mix(MixProcessor::new());
        assert!(validate_default_processor(&buffer, &processor).is_ok());
    }

    #[test]
    fn cross_kind_pairing_is_rejected() {
        let buffer = BufferKind::Vk(VKBuffer::new(16, Usage::Staging, Modality::Raw));
        let processor = ProcessorKind::Mix(MixProcessor::new());
        assert!(validate_default_processor(&buffer, &processor).is_err());
    }
}
