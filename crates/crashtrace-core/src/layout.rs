//! Fixed record geometry and the [`TraceRecord`] slot layout.
//!
//! A record is `RECORD_WORDS` pointer-width words:
//!
//! ```text
//! word 0        state     packed tag + claim sequence (see `state`)
//! word 1        context   *const c_char to a static label, or null
//! word 2        secs      wall-clock seconds
//! word 3        micros    wall-clock microseconds
//! word 4..28    frames    return addresses, most recent first, zero tail
//! ```
//!
//! All words are atomics so that concurrent writers that collide on a slot
//! (more in-flight traces than slots) never race in the Rust memory model.
//! Atomics have the same size and alignment as the plain integers, so the
//! external reader sees ordinary words.

use std::ffi::c_char;
use std::mem::{align_of, offset_of, size_of};
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use crate::state::StateWord;

/// Current layout version shared by writer and reader.
///
/// History:
/// - v1: pointer-width words; state word carries tag and claim sequence.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum stack depth recorded per trace.
pub const FRAMES_PER_RECORD: usize = 24;

/// Number of recent traces retained.
pub const RECORD_COUNT: usize = 8;

/// Words preceding the frames in each record.
pub const RECORD_HEADER_WORDS: usize = 4;

/// Total words per record.
pub const RECORD_WORDS: usize = RECORD_HEADER_WORDS + FRAMES_PER_RECORD;

/// Size of a machine word on the recording target.
pub const POINTER_WIDTH: usize = size_of::<usize>();

/// Size of one record in bytes.
pub const RECORD_SIZE: usize = RECORD_WORDS * POINTER_WIDTH;

/// Word index of the state word.
pub const STATE_WORD: usize = 0;
/// Word index of the context pointer.
pub const CONTEXT_WORD: usize = 1;
/// Word index of the seconds component of the timestamp.
pub const SECS_WORD: usize = 2;
/// Word index of the microseconds component of the timestamp.
pub const MICROS_WORD: usize = 3;
/// Word index of the first frame.
pub const FIRST_FRAME_WORD: usize = RECORD_HEADER_WORDS;

// The claim counter is reduced with a mask, which keeps slot selection
// continuous across u32 wrap-around only for power-of-two pools.
const _: () = assert!(RECORD_COUNT.is_power_of_two());
const _: () = assert!(RECORD_COUNT <= u8::MAX as usize);
const _: () = assert!(FRAMES_PER_RECORD <= u8::MAX as usize);

/// One slot of the trace pool.
///
/// Fields are public because the layout is the contract; the claim/write
/// protocol lives in `crashtrace-recorder`.
#[repr(C)]
pub struct TraceRecord {
    /// Packed [`StateWord`].
    pub state: AtomicUsize,
    /// Pointer to a static NUL-terminated label, or null.
    pub context: AtomicPtr<c_char>,
    /// Wall-clock seconds at capture.
    pub captured_at_secs: AtomicUsize,
    /// Wall-clock microseconds at capture.
    pub captured_at_micros: AtomicUsize,
    /// Return addresses, most recent call first. Unused entries are zero.
    pub frames: [AtomicUsize; FRAMES_PER_RECORD],
}

// Compile-time layout assertions for the cross-process contract.
const _: () = assert!(size_of::<TraceRecord>() == RECORD_SIZE);
const _: () = assert!(align_of::<TraceRecord>() == POINTER_WIDTH);
const _: () = assert!(offset_of!(TraceRecord, state) == STATE_WORD * POINTER_WIDTH);
const _: () = assert!(offset_of!(TraceRecord, context) == CONTEXT_WORD * POINTER_WIDTH);
const _: () = assert!(offset_of!(TraceRecord, captured_at_secs) == SECS_WORD * POINTER_WIDTH);
const _: () = assert!(offset_of!(TraceRecord, captured_at_micros) == MICROS_WORD * POINTER_WIDTH);
const _: () = assert!(offset_of!(TraceRecord, frames) == FIRST_FRAME_WORD * POINTER_WIDTH);

// Compile-time assertion: TraceRecord must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<TraceRecord>();
};

impl Default for TraceRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceRecord {
    /// An empty record: every word zero.
    pub const fn new() -> Self {
        Self {
            state: AtomicUsize::new(0),
            context: AtomicPtr::new(ptr::null_mut()),
            captured_at_secs: AtomicUsize::new(0),
            captured_at_micros: AtomicUsize::new(0),
            frames: [const { AtomicUsize::new(0) }; FRAMES_PER_RECORD],
        }
    }

    /// Load the state word.
    pub fn state_word(&self) -> StateWord {
        StateWord::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Copy every word out with relaxed loads.
    ///
    /// The copy is not atomic as a whole: a concurrent writer may be
    /// midway through the record. Check [`RecordSnapshot::state`] before
    /// trusting the frames.
    pub fn snapshot(&self) -> RecordSnapshot {
        let state = self.state_word();
        let mut frames = [0usize; FRAMES_PER_RECORD];
        for (out, frame) in frames.iter_mut().zip(self.frames.iter()) {
            *out = frame.load(Ordering::Relaxed);
        }
        RecordSnapshot {
            state,
            context: self.context.load(Ordering::Relaxed) as usize,
            captured_at_secs: self.captured_at_secs.load(Ordering::Relaxed),
            captured_at_micros: self.captured_at_micros.load(Ordering::Relaxed),
            frames,
        }
    }
}

/// A plain copy of one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordSnapshot {
    /// The state word.
    pub state: StateWord,
    /// Address of the context label (0 if none).
    pub context: usize,
    /// Wall-clock seconds.
    pub captured_at_secs: usize,
    /// Wall-clock microseconds.
    pub captured_at_micros: usize,
    /// Frame words, including the zero tail.
    pub frames: [usize; FRAMES_PER_RECORD],
}

impl RecordSnapshot {
    /// The record as the `RECORD_WORDS` words a reader sees.
    pub fn to_words(&self) -> [usize; RECORD_WORDS] {
        let mut words = [0usize; RECORD_WORDS];
        words[STATE_WORD] = self.state.raw();
        words[CONTEXT_WORD] = self.context;
        words[SECS_WORD] = self.captured_at_secs;
        words[MICROS_WORD] = self.captured_at_micros;
        words[FIRST_FRAME_WORD..].copy_from_slice(&self.frames);
        words
    }

    /// Frames up to (not including) the first zero entry.
    pub fn captured_frames(&self) -> &[usize] {
        let depth = self
            .frames
            .iter()
            .position(|&f| f == 0)
            .unwrap_or(FRAMES_PER_RECORD);
        &self.frames[..depth]
    }
}
