//! Dirty-range / invalid-range tracking, grounded on
//! `VKBuffer::markDirtyRange` / `getAndClearDirtyRanges` in
//! `examples/original_source/src/MayaFlux/Buffers/VKBuffer.hpp`.

/// A byte interval awaiting flush-to-device (`dirty_ranges`) or
/// invalidate-from-device (`invalid_ranges`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRange {
    pub offset: usize,
    pub size: usize,
}

impl DirtyRange {
    pub fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    fn overlaps_or_touches(&self, other: &DirtyRange) -> bool {
        self.offset <= other.end() && other.offset <= self.end()
    }

    fn merge(&self, other: &DirtyRange) -> DirtyRange {
        let offset = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        DirtyRange::new(offset, end - offset)
    }
}

/// An append-only, drain-on-read list of ranges. Adjacent/overlapping
/// ranges are coalesced on insert to keep the list small.
#[derive(Debug, Default, Clone)]
pub struct RangeList {
    ranges: Vec<DirtyRange>,
}

impl RangeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, offset: usize, size: usize) {
        if size == 0 {
            return;
        }
        let incoming = DirtyRange::new(offset, size);
        if let Some(existing) = self.ranges.iter_mut().find(|r| r.overlaps_or_touches(&incoming)) {
            *existing = existing.merge(&incoming);
        } else {
            self.ranges.push(incoming);
        }
    }

    /// Drain every range currently tracked, leaving the list empty.
    pub fn get_and_clear(&mut self) -> Vec<DirtyRange> {
        std::mem::take(&mut self.ranges)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}
