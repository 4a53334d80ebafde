//! Concurrent claims against one pool.
//!
//! - Up to `RECORD_COUNT` overlapping traces never share a slot.
//! - Past that, the newest claim of a slot wins and stale `end`s are no-ops.
//! - Under heavy contention every slot still ends up in a consistent state.

use std::collections::HashSet;
use std::sync::Barrier;
use std::thread;

use crashtrace_core::{label, Label, SlotState, TraceKind, RECORD_COUNT};
use crashtrace_recorder::{Recorder, SlotHandle, TraceSlotPool};
use crashtrace_test_utils::{frame_addrs, ScriptedWalker};

static WORKER: Label = label!("worker");

#[test]
fn overlapping_traces_within_capacity_get_distinct_slots() {
    let pool = TraceSlotPool::new();
    let recorder = Recorder::new(&pool, ScriptedWalker::new(frame_addrs(6)));
    let barrier = Barrier::new(RECORD_COUNT);

    let handles: Vec<SlotHandle> = thread::scope(|s| {
        let workers: Vec<_> = (0..RECORD_COUNT)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    recorder.begin(WORKER)
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let slots: HashSet<usize> = handles.iter().map(|h| h.slot()).collect();
    assert_eq!(slots.len(), RECORD_COUNT);
    for record in pool.records() {
        assert_eq!(record.state_word().state(), SlotState::InProgress);
    }

    for handle in handles {
        assert!(recorder.end(handle));
    }
    for record in pool.records() {
        let snap = record.snapshot();
        assert_eq!(snap.state.state(), SlotState::Complete(TraceKind::Generic));
        assert_eq!(snap.captured_frames(), frame_addrs(6).as_slice());
    }
}

#[test]
fn overflow_reuses_oldest_slot_and_later_writer_wins() {
    let pool = TraceSlotPool::new();
    let recorder = Recorder::new(&pool, ScriptedWalker::new(frame_addrs(2)));

    let first: Vec<SlotHandle> = (0..RECORD_COUNT).map(|_| recorder.begin(WORKER)).collect();
    let overflow = recorder.begin_with_kind(TraceKind::Dispatch, label!("overflow"));
    assert_eq!(overflow.slot(), first[0].slot());

    // The displaced trace can no longer complete the slot.
    assert!(!recorder.end(first[0]));
    assert_eq!(
        pool.slot(overflow.slot()).state_word().state(),
        SlotState::InProgress
    );
    assert!(recorder.end(overflow));
    assert_eq!(
        pool.slot(overflow.slot()).state_word().state(),
        SlotState::Complete(TraceKind::Dispatch)
    );

    for handle in &first[1..] {
        assert!(recorder.end(*handle));
    }
}

#[test]
fn heavy_contention_leaves_consistent_slots() {
    const THREADS: usize = 16;
    const PER_THREAD: usize = 200;

    let pool = TraceSlotPool::new();
    let recorder = Recorder::new(&pool, ScriptedWalker::new(frame_addrs(12)));
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for t in 0..THREADS {
            let recorder = &recorder;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    let handle = recorder.begin(WORKER);
                    if (t + i) % 3 != 0 {
                        recorder.end(handle);
                    }
                }
            });
        }
    });

    let total = (THREADS * PER_THREAD) as u32;
    assert_eq!(pool.next_sequence(), total);
    let mut sequences = HashSet::new();
    for (index, record) in pool.records().iter().enumerate() {
        let snap = record.snapshot();
        let seq = snap.state.sequence();
        assert!(seq < total);
        assert_eq!(seq as usize % RECORD_COUNT, index, "slot {index} holds a foreign sequence");
        assert_eq!(
            seq,
            total - RECORD_COUNT as u32 + index as u32,
            "slot {index} was left to an older claim"
        );
        assert!(matches!(
            snap.state.state(),
            SlotState::InProgress | SlotState::Complete(TraceKind::Generic)
        ));
        assert_eq!(snap.context, WORKER.as_ptr() as usize);
        assert_eq!(snap.captured_frames(), frame_addrs(12).as_slice());
        sequences.insert(seq);
    }
    assert_eq!(sequences.len(), RECORD_COUNT);
}
