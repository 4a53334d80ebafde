//! Values produced by the reader.

use std::fmt;

use crashtrace_core::{SlotState, FRAMES_PER_RECORD, RECORD_HEADER_WORDS};
use smallvec::SmallVec;

/// Buffer geometry decoded from a descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Format version of the buffer.
    pub version: u8,
    /// Declared descriptor size in bytes.
    pub descriptor_size: usize,
    /// Frame words per record.
    pub frames_per_record: usize,
    /// Number of records in the pool.
    pub record_count: usize,
    /// Width of every record word and descriptor pointer, in bytes.
    pub pointer_width: usize,
    /// Target address of the record array.
    pub records_addr: u64,
    /// Target address of the `u32` claim counter.
    pub next_trace_addr: u64,
}

impl Geometry {
    /// Words in one record.
    pub fn record_words(&self) -> usize {
        RECORD_HEADER_WORDS + self.frames_per_record
    }

    /// Bytes in one record.
    pub fn record_size(&self) -> usize {
        self.record_words() * self.pointer_width
    }

    /// Bytes in the whole record array.
    pub fn pool_size(&self) -> usize {
        self.record_size() * self.record_count
    }
}

/// Wall-clock time a trace was captured at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub secs: u64,
    /// Microseconds within the second.
    pub micros: u64,
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

/// Return addresses of one trace, innermost first.
pub type Frames = SmallVec<[u64; FRAMES_PER_RECORD]>;

/// One record as recovered from a target process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveredTrace {
    /// Index of the slot in the pool.
    pub slot: usize,
    /// Claim sequence number stored in the state word.
    pub sequence: u32,
    /// Slot state at the time of reading.
    pub status: SlotState,
    /// Context label, if the pointer was non-null and readable.
    pub context: Option<String>,
    /// Capture timestamp.
    pub captured_at: Timestamp,
    /// Captured frames with trailing zero words removed.
    pub frames: Frames,
}

impl RecoveredTrace {
    /// True when the writer finished the trace.
    ///
    /// Frames of any other trace may be partial or left over from a previous
    /// occupant of the slot.
    pub fn is_trustworthy(&self) -> bool {
        self.status.is_complete()
    }

    /// True when the writer began but never finished the trace. Such a
    /// trace is the most likely culprit of a crash.
    pub fn is_in_progress(&self) -> bool {
        self.status == SlotState::InProgress
    }
}
