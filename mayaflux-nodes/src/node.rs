//! The `Node` trait every graph participant implements.
//!
//! Grounded on the virtual interface in
//! `examples/original_source/src/MayaFlux/Kriya/Node.hpp`
//! (`process_sample`, `compute_frame`, `get_last_output`,
//! `reset_processed_state`, `enable_mock_process`), restated as a Rust
//! trait object stored behind the arena rather than a virtual base pointer.

use parking_lot::Mutex;

/// A graph participant evaluated at most once per cycle.
///
/// Sample-rate nodes implement `process_sample`; frame-rate nodes (texture,
/// geometry, readback) implement `compute_frame` and ignore the input.
/// Both default to a no-op so a concrete node only needs the one it uses.
pub trait Node: Send {
    fn process_sample(&mut self, _input: f64) -> f64 {
        0.0
    }

    fn compute_frame(&mut self) {}

    fn enable_mock_process(&mut self, enabled: bool);

    fn is_mock_process_enabled(&self) -> bool;
}

/// Boxes a [`Node`] behind the interior mutability the arena needs to hand
/// out evaluation access while other nodes still hold a handle to it.
pub(crate) struct NodeCell {
    pub(crate) inner: Mutex<Box<dyn Node>>,
}

impl NodeCell {
    pub(crate) fn new(node: Box<dyn Node>) -> Self {
        Self { inner: Mutex::new(node) }
    }
}
