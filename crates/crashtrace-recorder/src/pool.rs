//! The fixed-size trace slot pool.
//!
//! [`TraceSlotPool`] holds `RECORD_COUNT` records and the shared claim
//! counter in one `const`-constructible value, so a pool can live in a
//! `static` and never touch the heap.
//!
//! Slot selection is a single `fetch_add` on the counter followed by a
//! mask. The counter is never reset, so `N` concurrent claims with
//! `N <= capacity` always land on distinct slots; with more claims in
//! flight than slots, the oldest claim's slot is taken over.

use std::sync::atomic::{AtomicU32, Ordering};

use crashtrace_core::{BufferDescriptor, TraceRecord, FRAMES_PER_RECORD, RECORD_COUNT};

/// Slot index for a claim sequence number.
pub const fn slot_for(sequence: u32) -> usize {
    sequence as usize & (RECORD_COUNT - 1)
}

/// A successful claim: the slot index and the counter value that won it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Claim {
    /// Index into the pool.
    pub slot: usize,
    /// Counter value before the increment.
    pub sequence: u32,
}

/// Preallocated records plus the claim counter.
pub struct TraceSlotPool {
    records: [TraceRecord; RECORD_COUNT],
    next_trace: AtomicU32,
}

// Compile-time assertion: TraceSlotPool must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<TraceSlotPool>();
};

impl Default for TraceSlotPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSlotPool {
    /// A pool with every slot empty and the counter at zero.
    pub const fn new() -> Self {
        Self {
            records: [const { TraceRecord::new() }; RECORD_COUNT],
            next_trace: AtomicU32::new(0),
        }
    }

    /// Number of slots.
    pub const fn capacity(&self) -> usize {
        RECORD_COUNT
    }

    /// Frame capacity of each slot.
    pub const fn frames_per_record(&self) -> usize {
        FRAMES_PER_RECORD
    }

    /// The slot at `index` modulo the pool size.
    pub fn slot(&self, index: usize) -> &TraceRecord {
        &self.records[index & (RECORD_COUNT - 1)]
    }

    /// All slots in index order.
    pub fn records(&self) -> &[TraceRecord; RECORD_COUNT] {
        &self.records
    }

    /// The raw claim counter.
    pub fn next_trace(&self) -> &AtomicU32 {
        &self.next_trace
    }

    /// Claim the next slot. Wait-free: one atomic increment.
    pub fn claim(&self) -> Claim {
        let sequence = self.next_trace.fetch_add(1, Ordering::AcqRel);
        Claim {
            slot: slot_for(sequence),
            sequence,
        }
    }

    /// The sequence the next claim will receive.
    pub fn next_sequence(&self) -> u32 {
        self.next_trace.load(Ordering::Acquire)
    }

    /// A descriptor pointing at this pool, for pools in static storage.
    pub const fn describe(&'static self) -> BufferDescriptor {
        BufferDescriptor::new(&self.records, &self.next_trace)
    }
}
