//! End-to-end recovery: record with the real recorder, freeze the pool into
//! a memory image, read it back the way a crash reporter would.

use crashtrace_core::{label, Label, SlotState, TraceKind, FORMAT_VERSION, RECORD_COUNT};
use crashtrace_reader::{recover_traces, BufferReader, ByteOrder, ReaderConfig, ReaderError};
use crashtrace_recorder::{NullWalker, Recorder, TraceSlotPool};
use crashtrace_test_utils::{
    capture_image, capture_static, frame_addrs, interrupted, ScriptedWalker, SyntheticBuffer,
    SyntheticSlot,
};

static SITES: [Label; 4] = [
    label!("opening archive"),
    label!("parsing header"),
    label!("decoding block"),
    label!("flushing output"),
];

fn as_u64(frames: &[usize]) -> Vec<u64> {
    frames.iter().map(|&f| f as u64).collect()
}

#[test]
fn twenty_records_leave_the_eight_newest() {
    let pool = TraceSlotPool::new();
    let recorder = Recorder::new(&pool, ScriptedWalker::new(frame_addrs(5)));
    for i in 0..20 {
        recorder.record(TraceKind::Generic, SITES[i % SITES.len()]);
    }

    let image = capture_image(&pool, &SITES);
    let traces = recover_traces(&image.memory, image.descriptor_addr, ReaderConfig::default());

    assert_eq!(traces.len(), RECORD_COUNT);
    let sequences: Vec<u32> = traces.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, (12..20).rev().collect::<Vec<u32>>());
    for trace in &traces {
        assert!(trace.is_trustworthy());
        assert_eq!(trace.slot, trace.sequence as usize % RECORD_COUNT);
        let expected = SITES[trace.sequence as usize % SITES.len()].to_str_lossy();
        assert_eq!(trace.context.as_deref(), Some(expected.as_ref()));
        assert_eq!(trace.frames.as_slice(), as_u64(&frame_addrs(5)).as_slice());
        assert!(trace.captured_at.secs > 0);
    }
}

#[test]
fn unfinished_trace_is_reported_in_progress() {
    let pool = TraceSlotPool::new();
    let recorder = Recorder::new(&pool, ScriptedWalker::new(frame_addrs(4)));
    recorder.record(TraceKind::Generic, SITES[0]);
    let _abandoned = recorder.begin_with_kind(TraceKind::Exception, SITES[1]);

    let image = capture_image(&pool, &SITES);
    let traces = recover_traces(&image.memory, image.descriptor_addr, ReaderConfig::default());

    assert_eq!(traces.len(), 2);
    let newest = &traces[0];
    assert_eq!(newest.sequence, 1);
    assert!(newest.is_in_progress());
    assert!(!newest.is_trustworthy());
    assert_eq!(newest.context.as_deref(), Some("parsing header"));
    assert!(traces[1].is_trustworthy());
}

#[test]
fn interrupted_walk_leaves_partial_frames_marked_untrustworthy() {
    let pool = TraceSlotPool::new();
    let old = frame_addrs(10);
    let complete = Recorder::new(&pool, ScriptedWalker::new(old.clone()));
    complete.record(TraceKind::Generic, SITES[0]);
    for _ in 1..RECORD_COUNT {
        complete.record(TraceKind::Generic, SITES[3]);
    }

    // The next claim reuses slot 0; the walk dies after three frames.
    let fresh: Vec<usize> = (1..=10).map(|i| 0x7f00_0000 + i).collect();
    let dying = Recorder::new(&pool, ScriptedWalker::interrupted_after(fresh.clone(), 3));
    assert!(interrupted(|| {
        dying.begin(SITES[2]);
    }));

    let image = capture_image(&pool, &SITES);
    let traces = recover_traces(&image.memory, image.descriptor_addr, ReaderConfig::default());
    let victim = traces
        .iter()
        .find(|t| t.slot == 0)
        .expect("slot 0 is reported");

    assert_eq!(victim.sequence, RECORD_COUNT as u32);
    assert_eq!(victim.status, SlotState::InProgress);
    assert!(!victim.is_trustworthy());
    assert_eq!(victim.context.as_deref(), Some("decoding block"));
    assert_eq!(&victim.frames[..3], as_u64(&fresh[..3]).as_slice());
    // The rest is left over from the previous occupant.
    assert_eq!(&victim.frames[3..], as_u64(&old[3..]).as_slice());
}

#[test]
fn unknown_version_yields_no_traces() {
    let pool = TraceSlotPool::new();
    Recorder::new(&pool, NullWalker).record(TraceKind::Generic, SITES[0]);
    let mut image = capture_image(&pool, &SITES);
    image.memory.region_mut(image.descriptor_addr).unwrap()[0] = FORMAT_VERSION + 1;

    assert!(matches!(
        BufferReader::open(&image.memory, image.descriptor_addr, ReaderConfig::default()),
        Err(ReaderError::UnsupportedVersion { .. })
    ));
    assert!(recover_traces(&image.memory, image.descriptor_addr, ReaderConfig::default()).is_empty());
}

#[test]
fn missing_label_text_gives_no_context() {
    let pool = TraceSlotPool::new();
    Recorder::new(&pool, NullWalker).record(TraceKind::Signal, SITES[0]);
    let image = capture_image(&pool, &[]);
    let traces = recover_traces(&image.memory, image.descriptor_addr, ReaderConfig::default());
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].status, SlotState::Complete(TraceKind::Signal));
    assert_eq!(traces[0].context, None);
}

#[test]
fn exported_descriptor_reads_back() {
    static SITE: Label = label!("global site");
    crashtrace_recorder::record(TraceKind::AssertionFailure, SITE);

    let image = capture_static(
        crashtrace_recorder::descriptor(),
        &crashtrace_recorder::GLOBAL_POOL,
        &[SITE],
    );
    let reader = BufferReader::open(&image.memory, image.descriptor_addr, ReaderConfig::default())
        .expect("exported descriptor is valid");
    assert_eq!(reader.geometry().record_count, RECORD_COUNT);
    assert!(reader.next_sequence().unwrap() >= 1);
    let traces = reader.traces().unwrap();
    assert!(traces
        .iter()
        .any(|t| t.status == SlotState::Complete(TraceKind::AssertionFailure)
            && t.context.as_deref() == Some("global site")));
}

#[test]
fn foreign_big_endian_32_bit_buffer() {
    let mut buffer = SyntheticBuffer::with_geometry(4, ByteOrder::Big, 6, 4);
    let ctx = buffer.label("remote");
    buffer
        .set(
            2,
            SyntheticSlot::complete(6, TraceKind::Exception, 50)
                .with_context(ctx)
                .with_frames(&[0x8000_1000, 0x8000_2000]),
        )
        .set(1, SyntheticSlot::in_progress(5, 40));
    buffer.next_trace = 7;
    let image = buffer.build();

    let reader = BufferReader::open(&image.memory, image.descriptor_addr, buffer.config()).unwrap();
    assert_eq!(reader.next_sequence(), Some(7));
    let traces = reader.traces().unwrap();
    assert_eq!(traces.len(), 2);
    assert_eq!(traces[0].slot, 2);
    assert_eq!(traces[0].context.as_deref(), Some("remote"));
    assert_eq!(traces[0].frames.as_slice(), &[0x8000_1000, 0x8000_2000]);
    assert!(traces[1].is_in_progress());
}

#[test]
fn wrong_byte_order_yields_no_traces() {
    let mut buffer = SyntheticBuffer::with_geometry(8, ByteOrder::Big, 4, 2);
    buffer.set(0, SyntheticSlot::complete(0, TraceKind::Generic, 1));
    let image = buffer.build();
    let config = ReaderConfig {
        byte_order: ByteOrder::Little,
        ..ReaderConfig::default()
    };
    // Pointers decode to addresses that are not in the image.
    assert!(recover_traces(&image.memory, image.descriptor_addr, config).is_empty());
}
