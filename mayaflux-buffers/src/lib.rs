//! Buffer Processing Chain & Root Aggregation.
//!
//! Every concrete buffer kind (`AudioBuffer`, `VKBuffer`, `TextureBuffer`,
//! `GeometryBuffer`, `DescriptorBuffer`) carries a [`core::BufferCore`] for
//! its reentrancy guard and dirty/invalid range tracking, and a
//! [`chain::BufferProcessingChain`] for ordered processor attachment. Root
//! aggregation units (`audio::RootAudioUnit`, `graphics_root::RootGraphicsUnit`)
//! are created and sized on demand through [`manager::TokenUnitManager`].
//! GPU-touching processors consume a [`service::BufferService`] the host
//! application registers — this crate never talks to a concrete backend.

pub mod audio;
pub mod chain;
pub mod core;
pub mod descriptor;
pub mod geometry;
pub mod graphics_root;
pub mod kind;
pub mod manager;
pub mod range;
pub mod service;
pub mod texture;
pub mod vk;

pub use audio::{AudioBuffer, MixProcessor, RootAudioBuffer, RootAudioUnit};
pub use chain::{BufferProcessingChain, EnforcementStrategy, Processor};
pub use core::BufferCore;
pub use descriptor::{
    AggregateBindingsProcessor, AggregateSource, DescriptorBindingsProcessor, DescriptorBuffer, DescriptorSource,
    DescriptorValue, FieldLayout, StructLayout,
};
pub use geometry::{GeometryBindingsProcessor, GeometryBuffer, GeometrySource, VertexLayout};
pub use graphics_root::{GraphicsBatchProcessor, GraphicsChild, PresentProcessor, RootGraphicsBuffer, RootGraphicsUnit};
pub use kind::{validate_default_processor, BufferKind, ProcessorKind};
pub use manager::TokenUnitManager;
pub use range::{DirtyRange, RangeList};
pub use service::{BufferService, CommandRecorder};
pub use texture::{TextureBuffer, TextureProcessor, Transform2D};
pub use vk::{DeviceBufferHandle, DeviceMemoryHandle, Modality, Usage, VKBuffer};
