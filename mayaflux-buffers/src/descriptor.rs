//! `DescriptorBuffer`: a VKBuffer holding packed descriptor payloads
//! (UBO/SSBO), bound to one or more nodes producing the values, plus its
//! default processor `DescriptorBindingsProcessor`.
//!
//! Grounded on
//! `examples/original_source/src/MayaFlux/Buffers/Shaders/DescriptorBindingsProcessor.hpp`
//! (scalar/vector/matrix/structured binding kinds) and
//! `examples/original_source/src/MayaFlux/Yantra/Data/StructureIntrospection.hpp`
//! (field-layout reflection for structured payloads), per SPEC_FULL.md's
//! "Supplemental features". `AggregateBindingsProcessor` is grounded on
//! `examples/original_source/src/MayaFlux/Buffers/Textures/AggregateBindingsProcessor.hpp`
//! and is used internally here whenever a descriptor binds more than one
//! source.

use std::collections::HashMap;

use std::any::Any;

use mayaflux_core::{ProcessingToken, Result};

use crate::chain::{incompatible_buffer, BufferProcessingChain, EnforcementStrategy, Processor};
use crate::vk::{Modality, Usage, VKBuffer};

/// Value shape a [`DescriptorSource`] can produce: scalar, vector, matrix,
/// or an opaque structured blob.
pub enum DescriptorValue {
    Scalar(f64),
    Vector(Vec<f64>),
    Matrix { rows: usize, cols: usize, data: Vec<f64> },
    Structured(Vec<u8>),
}

impl DescriptorValue {
    fn to_bytes(&self) -> Vec<u8> {
        match self {
            DescriptorValue::Scalar(v) => v.to_le_bytes().to_vec(),
            DescriptorValue::Vector(v) => bytemuck::cast_slice(v).to_vec(),
            DescriptorValue::Matrix { data, .. } => bytemuck::cast_slice(data).to_vec(),
            DescriptorValue::Structured(bytes) => bytes.clone(),
        }
    }
}

/// A node-equivalent that produces a descriptor's current value. Decoupled
/// from `mayaflux_nodes::Node` the same way `geometry::GeometrySource` is:
/// this crate stays a leaf with respect to the node graph.
pub trait DescriptorSource: Send {
    fn read(&self) -> DescriptorValue;
    fn is_dirty(&self) -> bool;
    fn mark_clean(&mut self);
}

/// A single named field's placement within a packed struct payload,
/// reflecting `examples/original_source/.../StructureIntrospection.hpp`'s
/// "infer structure" contract at the level this crate needs: fixed offset
/// and size, not full type introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub offset: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StructLayout {
    pub fields: Vec<(String, FieldLayout)>,
    pub stride: usize,
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<FieldLayout> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, l)| *l)
    }
}

struct Binding {
    source: Box<dyn DescriptorSource>,
    offset: usize,
}

/// A VKBuffer holding packed UBO/SSBO payloads, each named binding backed
/// by a [`DescriptorSource`].
pub struct DescriptorBuffer {
    pub vk: VKBuffer,
    bindings: HashMap<String, Binding>,
    pub chain: BufferProcessingChain,
}

impl DescriptorBuffer {
    pub fn new(initial_size: usize) -> Self {
        Self {
            vk: VKBuffer::new(initial_size, Usage::Uniform, Modality::Raw),
            bindings: HashMap::new(),
            chain: BufferProcessingChain::new(ProcessingToken::GRAPHICS_BACKEND, EnforcementStrategy::Filtered),
        }
    }

    /// Bind `source` at `offset` under `name`, replacing any prior binding
    /// of the same name.
    pub fn bind(&mut self, name: impl Into<String>, source: Box<dyn DescriptorSource>, offset: usize) {
        self.bindings.insert(name.into(), Binding { source, offset });
    }

    pub fn unbind(&mut self, name: &str) {
        self.bindings.remove(name);
    }

    pub fn binding_names(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }
}

/// Default processor for [`DescriptorBuffer`]: for every dirty binding,
/// writes its current value's bytes at the bound offset and marks the
/// range dirty for the transfer subsystem to flush.
pub struct DescriptorBindingsProcessor;

impl DescriptorBindingsProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, buffer: &mut DescriptorBuffer) -> bool {
        let mut uploaded = false;
        for binding in buffer.bindings.values_mut() {
            if !binding.source.is_dirty() {
                continue;
            }
            let bytes = binding.source.read().to_bytes();
            let required = binding.offset + bytes.len();
            if required > buffer.vk.size_bytes {
                let grown = ((required as f32) * 1.5) as usize;
                let mut replacement = VKBuffer::new(grown.max(required), Usage::Uniform, Modality::Raw);
                if let (Some(old), true) = (buffer.vk.mapped_bytes(), replacement.is_host_visible()) {
                    let old = old.to_vec();
                    replacement.write_mapped(0, &old);
                }
                buffer.vk = replacement;
            }
            if buffer.vk.is_host_visible() {
                buffer.vk.write_mapped(binding.offset, &bytes);
            } else {
                buffer.vk.core.mark_dirty_range(binding.offset, bytes.len());
            }
            binding.source.mark_clean();
            uploaded = true;
        }
        uploaded
    }
}

impl Default for DescriptorBindingsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for DescriptorBindingsProcessor {
    fn token(&self) -> ProcessingToken {
        ProcessingToken::GRAPHICS_BACKEND
    }

    fn name(&self) -> &'static str {
        "DescriptorBindingsProcessor"
    }

    fn is_compatible_with(&self, buffer: &dyn Any) -> bool {
        buffer.is::<DescriptorBuffer>()
    }

    fn run(&mut self, buffer: &mut dyn Any) -> Result<()> {
        let descriptor = buffer.downcast_mut::<DescriptorBuffer>().ok_or_else(|| incompatible_buffer(self.name()))?;
        self.run(descriptor);
        Ok(())
    }
}

/// A source contributing one scalar to a named aggregate, used by
/// [`AggregateBindingsProcessor`].
pub trait AggregateSource: Send {
    fn output(&self) -> f64;
}

/// Collects outputs from multiple sources grouped by aggregate name and
/// uploads them as a contiguous `f64` array. Unlike
/// `DescriptorBindingsProcessor`, which tracks per-binding dirtiness, every
/// `run` re-reads and re-uploads the full aggregate: the sources are
/// expected to change every cycle (e.g. per-particle velocities).
#[derive(Default)]
pub struct AggregateBindingsProcessor {
    aggregates: HashMap<String, Vec<Box<dyn AggregateSource>>>,
}

impl AggregateBindingsProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, aggregate_name: impl Into<String>, source: Box<dyn AggregateSource>) {
        self.aggregates.entry(aggregate_name.into()).or_default().push(source);
    }

    pub fn clear_aggregate(&mut self, aggregate_name: &str) {
        self.aggregates.remove(aggregate_name);
    }

    pub fn clear_all(&mut self) {
        self.aggregates.clear();
    }

    fn aggregate_bytes(&self, aggregate_name: &str) -> Option<Vec<u8>> {
        let sources = self.aggregates.get(aggregate_name)?;
        let values: Vec<f64> = sources.iter().map(|s| s.output()).collect();
        Some(bytemuck::cast_slice(&values).to_vec())
    }

    /// Upload the named aggregate into `target`, growing it by 1.5x if the
    /// aggregate no longer fits. Returns `false` if the aggregate is
    /// unknown or empty.
    pub fn run(&self, aggregate_name: &str, target: &mut VKBuffer) -> bool {
        let Some(bytes) = self.aggregate_bytes(aggregate_name) else {
            return false;
        };
        if bytes.is_empty() {
            return false;
        }
        if bytes.len() > target.size_bytes {
            let grown = ((bytes.len() as f32) * 1.5) as usize;
            *target = VKBuffer::new(grown.max(bytes.len()), target.usage, target.modality);
        }
        if target.is_host_visible() {
            target.write_mapped(0, &bytes);
        } else {
            target.core.mark_dirty_range(0, bytes.len());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScalarSource {
        value: f64,
        dirty: bool,
    }

    impl DescriptorSource for ScalarSource {
        fn read(&self) -> DescriptorValue {
            DescriptorValue::Scalar(self.value)
        }
        fn is_dirty(&self) -> bool {
            self.dirty
        }
        fn mark_clean(&mut self) {
            self.dirty = false;
        }
    }

    #[test]
    fn dirty_binding_uploads_and_clears() {
        let mut buffer = DescriptorBuffer::new(64);
        buffer.bind(
            "time",
            Box::new(ScalarSource {
                value: 1.5,
                dirty: true,
            }),
            0,
        );
        let processor = DescriptorBindingsProcessor::new();
        assert!(processor.run(&mut buffer));
        assert!(!processor.run(&mut buffer));
    }

    struct FixedAggregate(f64);
    impl AggregateSource for FixedAggregate {
        fn output(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn aggregate_uploads_contiguous_array_in_insertion_order() {
        let mut processor = AggregateBindingsProcessor::new();
        processor.add_node("velocities", Box::new(FixedAggregate(1.0)));
        processor.add_node("velocities", Box::new(FixedAggregate(2.0)));
        processor.add_node("velocities", Box::new(FixedAggregate(3.0)));

        let mut target = VKBuffer::new(8, Usage::Staging, Modality::Raw);
        assert!(processor.run("velocities", &mut target));
        let bytes = target.read_mapped(0, 24).unwrap();
        let values: &[f64] = bytemuck::cast_slice(bytes);
        assert_eq!(values, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn unknown_aggregate_is_a_noop() {
        let processor = AggregateBindingsProcessor::new();
        let mut target = VKBuffer::new(8, Usage::Staging, Modality::Raw);
        assert!(!processor.run("missing", &mut target));
    }
}
