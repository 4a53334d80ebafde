//! The claim/write protocol.
//!
//! `begin` writes a slot in a fixed order so that a reader looking at a
//! half-written slot can tell:
//!
//! 1. state word ← `InProgress(sequence)`, then a release fence
//! 2. context pointer and timestamp
//! 3. frames, written in place as the walker produces them
//! 4. zero the unused frame tail
//!
//! `end` publishes completion with a compare-and-swap on the state word.
//! The word carries the claim sequence, so an `end` for a slot that a
//! newer `begin` has since taken over fails instead of blessing the newer,
//! possibly half-written record.
//!
//! Step 1 is itself a compare-and-swap that never replaces a newer claim's
//! word, and every later store first checks that the slot still carries
//! this claim's word. A writer that has been overtaken stops writing; the
//! later claim owns the slot.

use std::sync::atomic::{fence, AtomicUsize, Ordering};

use crashtrace_core::{Label, StateWord, TraceKind, RECORD_COUNT};

use crate::clock;
use crate::pool::TraceSlotPool;
use crate::walker::StackWalker;

/// Identifies one claim of one slot.
///
/// Returned by [`Recorder::begin`]; pass it to [`Recorder::end`]. Dropping
/// it without calling `end` leaves the record in progress, which is how a
/// crash between the two calls shows up to the reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    slot: u8,
    kind: TraceKind,
    sequence: u32,
}

impl SlotHandle {
    /// Pool index of the claimed slot.
    pub fn slot(&self) -> usize {
        self.slot as usize
    }

    /// Claim sequence number.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Kind published by `end`.
    pub fn kind(&self) -> TraceKind {
        self.kind
    }

    /// Encode for the C ABI: `sequence << 32 | kind << 8 | slot`.
    pub fn to_raw(self) -> u64 {
        ((self.sequence as u64) << 32) | ((self.kind.tag() as u64) << 8) | self.slot as u64
    }

    /// Decode a value produced by [`to_raw`](Self::to_raw).
    ///
    /// Returns `None` if the slot or kind bits are out of range.
    pub fn from_raw(raw: u64) -> Option<Self> {
        let slot = (raw & 0xff) as u8;
        let tag = ((raw >> 8) & 0xff) as u8;
        if (slot as usize) >= RECORD_COUNT || raw & 0xffff_0000 != 0 {
            return None;
        }
        Some(Self {
            slot,
            kind: TraceKind::from_tag(tag)?,
            sequence: (raw >> 32) as u32,
        })
    }
}

/// Records traces into a pool using a given stack walker.
///
/// Every method is lock-free apart from the stack walk itself and never
/// allocates.
pub struct Recorder<'p, W> {
    pool: &'p TraceSlotPool,
    walker: W,
}

impl<'p, W> Recorder<'p, W> {
    /// A recorder writing into `pool`.
    pub const fn new(pool: &'p TraceSlotPool, walker: W) -> Self {
        Self { pool, walker }
    }

    /// The pool written to.
    pub fn pool(&self) -> &'p TraceSlotPool {
        self.pool
    }
}

impl<W: StackWalker> Recorder<'_, W> {
    /// Start a [`TraceKind::Generic`] trace. See [`begin_with_kind`](Self::begin_with_kind).
    pub fn begin(&self, context: Label) -> SlotHandle {
        self.begin_with_kind(TraceKind::Generic, context)
    }

    /// Claim a slot and record the current stack into it.
    ///
    /// The slot is left in progress until [`end`](Self::end). If more
    /// traces are in flight than the pool has slots, the oldest in-flight
    /// slot is taken over.
    #[inline(never)]
    pub fn begin_with_kind(&self, kind: TraceKind, context: Label) -> SlotHandle {
        let claim = self.pool.claim();
        let record = self.pool.slot(claim.slot);
        let handle = SlotHandle {
            slot: claim.slot as u8,
            kind,
            sequence: claim.sequence,
        };

        if !install(&record.state, claim.sequence) {
            return handle;
        }
        fence(Ordering::Release);

        let owned = StateWord::in_progress(claim.sequence).raw();
        let still_owned = || record.state.load(Ordering::Acquire) == owned;

        if !still_owned() {
            return handle;
        }
        record
            .context
            .store(context.as_ptr().cast_mut(), Ordering::Relaxed);
        let now = clock::now();
        if !still_owned() {
            return handle;
        }
        record
            .captured_at_secs
            .store(now.secs as usize, Ordering::Relaxed);
        record
            .captured_at_micros
            .store(now.micros as usize, Ordering::Relaxed);

        let Some(depth) = capture_frames(&self.walker, &record.frames, &still_owned) else {
            return handle;
        };
        for frame in &record.frames[depth..] {
            if !still_owned() {
                break;
            }
            frame.store(0, Ordering::Relaxed);
        }

        handle
    }

    /// Mark the trace complete.
    ///
    /// Returns `false` without touching the slot if a newer claim has taken
    /// it over, or if the handle was already ended.
    pub fn end(&self, handle: SlotHandle) -> bool {
        let record = self.pool.slot(handle.slot());
        record
            .state
            .compare_exchange(
                StateWord::in_progress(handle.sequence).raw(),
                StateWord::complete(handle.sequence, handle.kind).raw(),
                Ordering::Release,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Record a complete trace in one call.
    pub fn record(&self, kind: TraceKind, context: Label) -> SlotHandle {
        let handle = self.begin_with_kind(kind, context);
        self.end(handle);
        handle
    }
}

/// Publish `InProgress(sequence)` unless a newer claim already holds the slot.
fn install(state: &AtomicUsize, sequence: u32) -> bool {
    let mine = StateWord::in_progress(sequence).raw();
    let mut current = state.load(Ordering::Relaxed);
    loop {
        if StateWord::from_raw(current).is_newer_than(sequence) {
            return false;
        }
        match state.compare_exchange_weak(current, mine, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return true,
            Err(actual) => current = actual,
        }
    }
}

/// Write walked frames straight into the slot.
///
/// Returns how many were written, or `None` if the slot was taken over
/// during the walk.
fn capture_frames(
    walker: &impl StackWalker,
    frames: &[AtomicUsize],
    still_owned: &dyn Fn() -> bool,
) -> Option<usize> {
    let mut depth = 0;
    let mut overtaken = false;
    walker.walk(&mut |ip| {
        if depth >= frames.len() {
            return false;
        }
        if ip != 0 {
            if !still_owned() {
                overtaken = true;
                return false;
            }
            frames[depth].store(ip, Ordering::Relaxed);
            depth += 1;
        }
        depth < frames.len()
    });
    (!overtaken).then_some(depth)
}
