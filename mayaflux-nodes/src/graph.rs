//! Generational arena holding every node, and the pull discipline that
//! guarantees at-most-once evaluation per cycle regardless of fan-in.
//!
//! Nodes back-reference each other through arena indices rather than owning
//! pointers; `slotmap`'s generational keys give each back-reference an index
//! plus a generation counter so a stale reference into a freed slot is
//! detected rather than silently aliasing whatever replaced it, the same
//! structural choice `graal::frame::PassId` makes for frame-graph passes.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use slotmap::{new_key_type, SlotMap};

use crate::node::{Node, NodeCell};
use crate::state::NodeState;

new_key_type! {
    /// Arena index plus generation counter; the single source of truth a
    /// node's back-references resolve through.
    pub struct NodeHandle;
}

struct NodeSlot {
    cell: NodeCell,
    state: AtomicU32,
    modulator_count: AtomicU32,
    cycle_ended: AtomicBool,
    last_output_bits: AtomicU64,
}

impl NodeSlot {
    fn new(node: Box<dyn Node>) -> Self {
        Self {
            cell: NodeCell::new(node),
            state: AtomicU32::new(NodeState::empty().bits()),
            modulator_count: AtomicU32::new(0),
            cycle_ended: AtomicBool::new(false),
            last_output_bits: AtomicU64::new(0.0f64.to_bits()),
        }
    }

    fn state(&self) -> NodeState {
        NodeState::from_bits_truncate(self.state.load(Ordering::Acquire))
    }

    fn set_flag(&self, flag: NodeState, value: bool) {
        loop {
            let current = self.state.load(Ordering::Acquire);
            let next = if value {
                current | flag.bits()
            } else {
                current & !flag.bits()
            };
            if self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }

    fn last_output(&self) -> f64 {
        f64::from_bits(self.last_output_bits.load(Ordering::Acquire))
    }

    fn store_last_output(&self, value: f64) {
        self.last_output_bits.store(value.to_bits(), Ordering::Release);
    }
}

/// Owns every node in one graph. Root units hold a `NodeGraphArena` and
/// drive evaluation; nodes themselves only ever hold [`NodeHandle`]s into
/// it, never references to each other.
#[derive(Default)]
pub struct NodeGraphArena {
    nodes: SlotMap<NodeHandle, NodeSlot>,
}

impl NodeGraphArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Box<dyn Node>) -> NodeHandle {
        self.nodes.insert(NodeSlot::new(node))
    }

    pub fn remove(&mut self, handle: NodeHandle) -> bool {
        self.nodes.remove(handle).is_some()
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    pub fn get_last_output(&self, handle: NodeHandle) -> Option<f64> {
        self.nodes.get(handle).map(|slot| slot.last_output())
    }

    pub fn is_processed(&self, handle: NodeHandle) -> bool {
        self.nodes
            .get(handle)
            .map(|slot| slot.state().contains(NodeState::PROCESSED))
            .unwrap_or(false)
    }

    pub fn enable_mock_process(&self, handle: NodeHandle, enabled: bool) {
        if let Some(slot) = self.nodes.get(handle) {
            slot.set_flag(NodeState::MOCK_PROCESS, enabled);
            slot.cell.inner.lock().enable_mock_process(enabled);
        }
    }

    /// Evaluate `compute_frame` directly, bypassing the at-most-once
    /// discipline — frame-rate nodes are driven once per frame tick by
    /// their root, never pulled by a fan-in consumer.
    pub fn compute_frame(&self, handle: NodeHandle) {
        if let Some(slot) = self.nodes.get(handle) {
            slot.cell.inner.lock().compute_frame();
        }
    }

    /// Pull `handle`'s output, applying at-most-once-per-cycle evaluation:
    /// the first puller in a cycle runs `process_sample`; every subsequent
    /// puller in the same cycle reads the cached value. Returns `None` if
    /// `handle` has been removed (a stale generation).
    pub fn pull(&self, handle: NodeHandle, input: f64) -> Option<f64> {
        let slot = self.nodes.get(handle)?;
        slot.modulator_count.fetch_add(1, Ordering::AcqRel);

        let already_processed = slot.set_flag_and_check(NodeState::PROCESSED);
        let output = if already_processed {
            slot.last_output()
        } else {
            let value = slot.cell.inner.lock().process_sample(input);
            let mock = slot.state().contains(NodeState::MOCK_PROCESS);
            if !mock {
                slot.store_last_output(value);
            }
            slot.last_output()
        };

        let previous_count = slot.modulator_count.fetch_sub(1, Ordering::AcqRel);
        if previous_count == 1 && slot.cycle_ended.load(Ordering::Acquire) {
            slot.set_flag(NodeState::PROCESSED, false);
            slot.cycle_ended.store(false, Ordering::Release);
        }

        Some(output)
    }

    /// Called by a root at the end of one evaluation cycle: clears
    /// `PROCESSED` on every node whose modulator count has already reached
    /// zero, and arms deferred clearing for any node still mid-pull.
    pub fn end_cycle(&self) {
        for (_, slot) in self.nodes.iter() {
            if slot.modulator_count.load(Ordering::Acquire) == 0 {
                slot.set_flag(NodeState::PROCESSED, false);
            } else {
                slot.cycle_ended.store(true, Ordering::Release);
            }
        }
    }
}

impl NodeSlot {
    /// Atomically set `PROCESSED`, returning whether it was already set.
    fn set_flag_and_check(&self, flag: NodeState) -> bool {
        loop {
            let current = self.state.load(Ordering::Acquire);
            if current & flag.bits() != 0 {
                return true;
            }
            let next = current | flag.bits();
            if self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32 as CallCount;
    use std::sync::Arc;

    struct CountingNode {
        calls: Arc<CallCount>,
        output: f64,
        mock: bool,
    }

    impl Node for CountingNode {
        fn process_sample(&mut self, input: f64) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output = input * 2.0;
            self.output
        }

        fn enable_mock_process(&mut self, enabled: bool) {
            self.mock = enabled;
        }

        fn is_mock_process_enabled(&self) -> bool {
            self.mock
        }
    }

    #[test]
    fn fan_in_pulls_evaluate_node_at_most_once_per_cycle() {
        let mut arena = NodeGraphArena::new();
        let calls = Arc::new(CallCount::new(0));
        let handle = arena.insert(Box::new(CountingNode {
            calls: calls.clone(),
            output: 0.0,
            mock: false,
        }));

        let a = arena.pull(handle, 3.0).unwrap();
        let b = arena.pull(handle, 3.0).unwrap();
        let c = arena.pull(handle, 3.0).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, 6.0);
        assert_eq!(b, 6.0);
        assert_eq!(c, 6.0);
    }

    #[test]
    fn end_cycle_allows_next_cycle_to_reevaluate() {
        let mut arena = NodeGraphArena::new();
        let calls = Arc::new(CallCount::new(0));
        let handle = arena.insert(Box::new(CountingNode {
            calls: calls.clone(),
            output: 0.0,
            mock: false,
        }));

        arena.pull(handle, 1.0);
        arena.end_cycle();
        arena.pull(handle, 1.0);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stale_handle_after_removal_returns_none() {
        let mut arena = NodeGraphArena::new();
        let handle = arena.insert(Box::new(CountingNode {
            calls: Arc::new(CallCount::new(0)),
            output: 0.0,
            mock: false,
        }));
        arena.remove(handle);
        assert_eq!(arena.pull(handle, 1.0), None);
    }
}
