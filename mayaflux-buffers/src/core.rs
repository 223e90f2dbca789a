//! Fields every buffer kind carries regardless of payload: the processing
//! token, the reentrancy guard, and the dirty/invalid range lists.
//!
//! Grounded on the common base fields described across
//! `examples/original_source/src/MayaFlux/Buffers/VKBuffer.hpp` and
//! `examples/original_source/src/MayaFlux/Buffers/Managers/TokenUnitManager.hpp`.

use std::sync::atomic::{AtomicBool, Ordering};

use mayaflux_core::ProcessingToken;

use crate::range::{DirtyRange, RangeList};

pub struct BufferCore {
    pub token: ProcessingToken,
    is_processing: AtomicBool,
    pub has_data: bool,
    pub needs_removal: bool,
    dirty_ranges: RangeList,
    invalid_ranges: RangeList,
}

impl BufferCore {
    pub fn new(token: ProcessingToken) -> Self {
        Self {
            token,
            is_processing: AtomicBool::new(false),
            has_data: false,
            needs_removal: false,
            dirty_ranges: RangeList::new(),
            invalid_ranges: RangeList::new(),
        }
    }

    /// CAS-guarded acquisition of the "processing" right. Returns `false`
    /// without side effects if another call already holds it, so two
    /// concurrent processing passes over the same buffer never overlap.
    pub fn try_acquire_processing(&self) -> bool {
        self.is_processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release_processing(&self) {
        self.is_processing.store(false, Ordering::Release);
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::Acquire)
    }

    /// Runs the per-buffer default-processing contract: acquire, run `body`
    /// if `needs_default_processing`, release. Returns `false` if the buffer
    /// was already being processed by another call.
    pub fn process_default(&self, needs_default_processing: bool, body: impl FnOnce()) -> bool {
        if !self.try_acquire_processing() {
            return false;
        }
        if needs_default_processing {
            body();
        }
        self.release_processing();
        true
    }

    pub fn mark_dirty_range(&mut self, offset: usize, size: usize) {
        self.dirty_ranges.mark(offset, size);
    }

    pub fn get_and_clear_dirty_ranges(&mut self) -> Vec<DirtyRange> {
        self.dirty_ranges.get_and_clear()
    }

    pub fn mark_invalid_range(&mut self, offset: usize, size: usize) {
        self.invalid_ranges.mark(offset, size);
    }

    pub fn get_and_clear_invalid_ranges(&mut self) -> Vec<DirtyRange> {
        self.invalid_ranges.get_and_clear()
    }
}
