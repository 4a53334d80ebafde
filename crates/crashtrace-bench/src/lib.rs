//! Benchmark fixtures for crashtrace.
//!
//! - [`begin_at_depth`]: begin a trace from `depth` extra stack frames down,
//!   so the real stack walker has something to walk.
//! - [`full_pool_image`]: a frozen image with every slot written.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use crashtrace_core::{label, Label, TraceKind, FRAMES_PER_RECORD, RECORD_COUNT};
use crashtrace_recorder::{Recorder, SlotHandle, StackWalker, TraceSlotPool};
use crashtrace_test_utils::{capture_image, frame_addrs, CapturedImage, ScriptedWalker};

/// Labels used by [`full_pool_image`].
pub static BENCH_LABELS: [Label; 2] = [label!("bench: steady state"), label!("bench: in flight")];

/// Recurse `depth` frames, then begin a trace.
#[inline(never)]
pub fn begin_at_depth<W: StackWalker>(recorder: &Recorder<'_, W>, depth: usize) -> SlotHandle {
    if depth == 0 {
        recorder.begin(BENCH_LABELS[0])
    } else {
        let handle = begin_at_depth(recorder, depth - 1);
        std::hint::black_box(depth);
        handle
    }
}

/// Every slot written with a full-depth stack; the newest one left in
/// progress.
pub fn full_pool_image(pool: &TraceSlotPool) -> CapturedImage {
    let recorder = Recorder::new(pool, ScriptedWalker::new(frame_addrs(FRAMES_PER_RECORD)));
    for _ in 1..RECORD_COUNT {
        recorder.record(TraceKind::Generic, BENCH_LABELS[0]);
    }
    recorder.begin_with_kind(TraceKind::Dispatch, BENCH_LABELS[1]);
    capture_image(pool, &BENCH_LABELS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crashtrace_reader::{recover_traces, ReaderConfig};
    use crashtrace_recorder::NullWalker;

    #[test]
    fn full_pool_image_has_every_slot() {
        let pool = TraceSlotPool::new();
        let image = full_pool_image(&pool);
        let traces = recover_traces(&image.memory, image.descriptor_addr, ReaderConfig::default());
        assert_eq!(traces.len(), RECORD_COUNT);
        assert!(traces[0].is_in_progress());
        assert_eq!(traces[0].frames.len(), FRAMES_PER_RECORD);
    }

    #[test]
    fn begin_at_depth_claims_one_slot() {
        let pool = TraceSlotPool::new();
        let recorder = Recorder::new(&pool, NullWalker);
        let handle = begin_at_depth(&recorder, 5);
        assert_eq!(pool.next_sequence(), 1);
        assert!(recorder.end(handle));
    }
}
