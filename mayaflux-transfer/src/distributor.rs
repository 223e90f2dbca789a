//! `BufferTokenDistributor`: decides how a newly created buffer should be
//! wired into root aggregation, transfer staging, or neither.
//!
//! Grounded on
//! `examples/original_source/src/MayaFlux/Buffers/Managers/BufferTokenDistributor.hpp`'s
//! static `distribute()` decision table.

use mayaflux_buffers::BufferKind;
use mayaflux_core::ProcessingToken;

/// The outcome of distributing one buffer against one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Add to normal root aggregation.
    DirectRoot,
    /// Create a `TransferProcessor` on a target domain's buffer; do not
    /// add to any root.
    TransferOnly,
    /// Transfer, then aggregate at the destination root.
    TransferToRoot,
    /// Tag internal (e.g. `AUDIO_PARALLEL` GPU-side audio with no CPU
    /// root).
    InternalOnly,
    /// Invalid combination; carries a human-readable reason.
    Rejected(String),
}

/// A `Decision` plus the reasoning that produced it, for diagnostics.
#[derive(Debug, Clone)]
pub struct DistributionDecision {
    pub decision: Decision,
    pub reason: &'static str,
}

/// Stateless: every call is a pure function of `(buffer kind, token)`,
/// matching the source's `static distribute()`.
pub struct BufferTokenDistributor;

impl BufferTokenDistributor {
    /// Decision table:
    ///
    /// | Buffer type | rate | device | Result |
    /// |---|---|---|---|
    /// | Audio | sample | CPU | DIRECT_ROOT |
    /// | Audio | sample | GPU | TRANSFER_ONLY |
    /// | VK | frame | GPU | DIRECT_ROOT |
    /// | VK | sample | GPU | INTERNAL_ONLY |
    /// | VK | sample | CPU | REJECTED |
    ///
    /// Texture/Geometry/Descriptor buffers are VK-backed GPU payloads and
    /// follow the VK row for rate/device combinations the table doesn't
    /// name explicitly: frame+GPU direct-roots, sample+GPU is internal,
    /// anything CPU-only is rejected (a GPU buffer kind with no GPU bit
    /// makes no sense).
    pub fn distribute(buffer: &BufferKind, token: ProcessingToken) -> DistributionDecision {
        match buffer {
            BufferKind::Audio(_) => Self::distribute_audio(token),
            BufferKind::Vk(_) | BufferKind::Texture(_) | BufferKind::Geometry(_) | BufferKind::Descriptor(_) => {
                Self::distribute_vk(token)
            }
        }
    }

    fn distribute_audio(token: ProcessingToken) -> DistributionDecision {
        if token.has_frame_rate() {
            return DistributionDecision {
                decision: Decision::Rejected(format!("audio buffer cannot take a frame-rate token ({:?})", token)),
                reason: "audio is a sample-rate payload",
            };
        }
        if token.has_gpu() {
            DistributionDecision {
                decision: Decision::TransferOnly,
                reason: "sample-rate GPU audio stages through a transfer target, no CPU root",
            }
        } else {
            DistributionDecision {
                decision: Decision::DirectRoot,
                reason: "sample-rate CPU audio aggregates at the audio root",
            }
        }
    }

    fn distribute_vk(token: ProcessingToken) -> DistributionDecision {
        if !token.has_gpu() {
            return DistributionDecision {
                decision: Decision::Rejected(format!("VK buffer requires a GPU-bit token, got {:?}", token)),
                reason: "a GPU-backed buffer with no GPU bit is an invalid combination",
            };
        }
        if token.has_frame_rate() {
            DistributionDecision {
                decision: Decision::DirectRoot,
                reason: "frame-rate GPU buffers aggregate at the graphics root",
            }
        } else {
            DistributionDecision {
                decision: Decision::InternalOnly,
                reason: "sample-rate GPU buffers have no CPU root counterpart",
            }
        }
    }

    /// `distribute_with_transfer`: like `distribute`, but additionally
    /// resolves `TRANSFER_ONLY` to `TRANSFER_TO_ROOT` when the caller
    /// states a destination root already exists for `destination_token`.
    pub fn distribute_with_transfer(
        buffer: &BufferKind,
        token: ProcessingToken,
        destination_root_exists: bool,
    ) -> DistributionDecision {
        let base = Self::distribute(buffer, token);
        match base.decision {
            Decision::TransferOnly if destination_root_exists => DistributionDecision {
                decision: Decision::TransferToRoot,
                reason: "a destination root already exists, so the transfer target aggregates into it",
            },
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mayaflux_buffers::{AudioBuffer, Modality, Usage, VKBuffer};

    #[test]
    fn sample_cpu_audio_direct_roots() {
        let buffer = BufferKind::Audio(AudioBuffer::new(0, 4));
        let result = BufferTokenDistributor::distribute(&buffer, ProcessingToken::AUDIO_BACKEND);
        assert_eq!(result.decision, Decision::DirectRoot);
    }

    #[test]
    fn sample_gpu_audio_is_transfer_only() {
        let buffer = BufferKind::Audio(AudioBuffer::new(0, 4));
        let result = BufferTokenDistributor::distribute(&buffer, ProcessingToken::AUDIO_PARALLEL);
        assert_eq!(result.decision, Decision::TransferOnly);
    }

    #[test]
    fn frame_gpu_vk_direct_roots() {
        let buffer = BufferKind::Vk(VKBuffer::new(16, Usage::Device, Modality::Raw));
        let result = BufferTokenDistributor::distribute(&buffer, ProcessingToken::GRAPHICS_BACKEND);
        assert_eq!(result.decision, Decision::DirectRoot);
    }

    #[test]
    fn sample_gpu_vk_is_internal_only() {
        let buffer = BufferKind::Vk(VKBuffer::new(16, Usage::Device, Modality::Raw));
        let result = BufferTokenDistributor::distribute(&buffer, ProcessingToken::AUDIO_PARALLEL);
        assert_eq!(result.decision, Decision::InternalOnly);
    }

    #[test]
    fn sample_cpu_vk_is_rejected() {
        let buffer = BufferKind::Vk(VKBuffer::new(16, Usage::Device, Modality::Raw));
        let result = BufferTokenDistributor::distribute(&buffer, ProcessingToken::AUDIO_BACKEND);
        assert!(matches!(result.decision, Decision::Rejected(_)));
    }

    #[test]
    fn transfer_only_upgrades_to_transfer_to_root_when_destination_exists() {
        let buffer = BufferKind::Audio(AudioBuffer::new(0, 4));
        let result = BufferTokenDistributor::distribute_with_transfer(&buffer, ProcessingToken::AUDIO_PARALLEL, true);
        assert_eq!(result.decision, Decision::TransferToRoot);
    }
}
