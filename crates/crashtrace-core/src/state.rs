//! Slot state tags and the sequence-carrying state word.
//!
//! Word 0 of every [`TraceRecord`](crate::TraceRecord) packs two values:
//!
//! ```text
//! bit  0..8   tag       0 = empty, 1 = in progress, 2.. = complete (TraceKind)
//! bit  8..    sequence  claim counter value that owns the slot (truncated)
//! ```
//!
//! Carrying the sequence in the same word as the tag lets `end` publish
//! completion with a single compare-and-swap that fails if a newer writer
//! has reclaimed the slot in the meantime.

use std::fmt;

/// Number of low bits of the state word holding the tag.
pub const TAG_BITS: u32 = 8;

/// Mask selecting the tag bits of a state word.
pub const TAG_MASK: usize = (1 << TAG_BITS) - 1;

/// Bits of the claim sequence a state word keeps: 32 on 64-bit targets,
/// 24 on 32-bit ones.
pub const SEQUENCE_MASK: u32 = (usize::MAX >> TAG_BITS) as u32;

/// Tag of a slot that has never been written.
pub const TAG_EMPTY: u8 = 0;

/// Tag of a slot whose writer has not (yet) finished.
pub const TAG_IN_PROGRESS: u8 = 1;

/// Why a trace was recorded. Stored as the tag of a completed slot.
///
/// Values are ABI-stable: changing one requires a
/// [`FORMAT_VERSION`](crate::FORMAT_VERSION) bump.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraceKind {
    /// An internal assertion failed.
    AssertionFailure = 2,
    /// An exception or error value is being raised or propagated.
    Exception = 3,
    /// A Rust panic is unwinding.
    Panic = 4,
    /// A signal or hardware fault handler is running.
    Signal = 5,
    /// Any other risky operation.
    Generic = 6,
    /// A deferred callback or message dispatch is about to run.
    Dispatch = 7,
}

impl TraceKind {
    /// Every kind, in tag order.
    pub const ALL: [TraceKind; 6] = [
        TraceKind::AssertionFailure,
        TraceKind::Exception,
        TraceKind::Panic,
        TraceKind::Signal,
        TraceKind::Generic,
        TraceKind::Dispatch,
    ];

    /// The tag stored in the state word.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a completion tag. Returns `None` for tags this build does not know.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            2 => Some(TraceKind::AssertionFailure),
            3 => Some(TraceKind::Exception),
            4 => Some(TraceKind::Panic),
            5 => Some(TraceKind::Signal),
            6 => Some(TraceKind::Generic),
            7 => Some(TraceKind::Dispatch),
            _ => None,
        }
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AssertionFailure => "assertion failure",
            Self::Exception => "exception",
            Self::Panic => "panic",
            Self::Signal => "signal",
            Self::Generic => "generic",
            Self::Dispatch => "dispatch",
        };
        f.write_str(name)
    }
}

/// Decoded state of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// Never written since process start.
    Empty,
    /// Claimed; the writer has not marked it complete. Frame contents may
    /// be partially written or stale.
    InProgress,
    /// Fully written.
    Complete(TraceKind),
    /// A completion tag from a newer build. Treated as untrustworthy.
    Unrecognized(u8),
}

impl SlotState {
    /// Decode a tag byte.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            TAG_EMPTY => SlotState::Empty,
            TAG_IN_PROGRESS => SlotState::InProgress,
            other => match TraceKind::from_tag(other) {
                Some(kind) => SlotState::Complete(kind),
                None => SlotState::Unrecognized(other),
            },
        }
    }

    /// The tag byte for this state.
    pub const fn tag(self) -> u8 {
        match self {
            SlotState::Empty => TAG_EMPTY,
            SlotState::InProgress => TAG_IN_PROGRESS,
            SlotState::Complete(kind) => kind.tag(),
            SlotState::Unrecognized(tag) => tag,
        }
    }

    /// Whether the writer finished this record with a known kind.
    pub const fn is_complete(self) -> bool {
        matches!(self, SlotState::Complete(_))
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::InProgress => f.write_str("in progress"),
            Self::Complete(kind) => write!(f, "complete ({kind})"),
            Self::Unrecognized(tag) => write!(f, "unrecognized tag {tag}"),
        }
    }
}

/// A packed state word as stored in a record.
///
/// The sequence keeps `usize::BITS - 8` bits, so it is truncated to 24
/// bits on 32-bit targets. It only has to distinguish the current owner
/// of a slot from the previous few.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateWord(usize);

impl StateWord {
    /// The state word of an untouched slot.
    pub const EMPTY: StateWord = StateWord(0);

    /// State word written by `begin` for the claim with `sequence`.
    pub const fn in_progress(sequence: u32) -> Self {
        Self::pack(sequence, TAG_IN_PROGRESS)
    }

    /// State word written by `end` for the claim with `sequence`.
    pub const fn complete(sequence: u32, kind: TraceKind) -> Self {
        Self::pack(sequence, kind.tag())
    }

    const fn pack(sequence: u32, tag: u8) -> Self {
        StateWord(((sequence as usize) << TAG_BITS) | tag as usize)
    }

    /// Wrap a raw word loaded from a record.
    pub const fn from_raw(raw: usize) -> Self {
        StateWord(raw)
    }

    /// The raw word.
    pub const fn raw(self) -> usize {
        self.0
    }

    /// The tag byte.
    pub const fn tag(self) -> u8 {
        (self.0 & TAG_MASK) as u8
    }

    /// The (possibly truncated) claim sequence.
    pub const fn sequence(self) -> u32 {
        (self.0 >> TAG_BITS) as u32
    }

    /// The decoded slot state.
    pub const fn state(self) -> SlotState {
        SlotState::from_tag(self.tag())
    }

    /// Whether this word was written for a claim made after `sequence`.
    ///
    /// Sequences compare modulo the kept width, so the answer holds across
    /// counter wrap-around as long as the two claims are less than half the
    /// sequence space apart. An empty word is never newer.
    pub const fn is_newer_than(self, sequence: u32) -> bool {
        if self.tag() == TAG_EMPTY {
            return false;
        }
        let ahead = self.sequence().wrapping_sub(sequence) & SEQUENCE_MASK;
        ahead != 0 && ahead <= SEQUENCE_MASK / 2
    }
}

/// Split a state word read from another process into `(tag, sequence)`.
///
/// `word` is the zero-extended pointer-width value, so this works for
/// records written by 32-bit and 64-bit processes alike.
pub const fn split_state_word(word: u64) -> (u8, u32) {
    ((word & TAG_MASK as u64) as u8, (word >> TAG_BITS) as u32)
}
