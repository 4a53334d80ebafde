//! Memory images of backtrace buffers.

use std::sync::atomic::{AtomicU32, Ordering};

use crashtrace_core::{
    BufferDescriptor, Label, StateWord, TraceKind, DESCRIPTOR_SIZE, FORMAT_VERSION,
    FRAMES_PER_RECORD, HEADER_LEN, POINTER_WIDTH, RECORD_COUNT, RECORD_HEADER_WORDS, RECORD_SIZE,
};
use crashtrace_reader::{ByteOrder, ImageMemory, ReaderConfig};
use crashtrace_recorder::TraceSlotPool;

/// Address at which [`capture_image`] and [`SyntheticBuffer`] place the
/// descriptor. Never mapped in a real user-space process.
pub const SYNTHETIC_DESCRIPTOR: u64 = 0x1000;

const SYNTHETIC_RECORDS: u64 = 0x10_0000;
const SYNTHETIC_COUNTER: u64 = 0x20_0000;
const SYNTHETIC_LABELS: u64 = 0x30_0000;

/// A memory image plus where its descriptor lives.
#[derive(Clone, Debug)]
pub struct CapturedImage {
    pub memory: ImageMemory,
    pub descriptor_addr: u64,
}

/// Freeze `pool` as a crash handler would, with a descriptor written at
/// [`SYNTHETIC_DESCRIPTOR`].
///
/// Records and the counter keep their real addresses. Only the text of
/// `labels` is included; any other context pointer is unreadable.
pub fn capture_image(pool: &TraceSlotPool, labels: &[Label]) -> CapturedImage {
    let mut descriptor = vec![
        FORMAT_VERSION,
        DESCRIPTOR_SIZE as u8,
        FRAMES_PER_RECORD as u8,
        RECORD_COUNT as u8,
        POINTER_WIDTH as u8,
        0,
        0,
        0,
    ];
    descriptor.extend_from_slice(&(pool.records().as_ptr() as usize).to_ne_bytes());
    descriptor.extend_from_slice(&(pool.next_trace() as *const AtomicU32 as usize).to_ne_bytes());
    debug_assert_eq!(descriptor.len(), DESCRIPTOR_SIZE);

    let mut memory = freeze_pool(pool, labels);
    memory.insert(SYNTHETIC_DESCRIPTOR, descriptor);
    CapturedImage {
        memory,
        descriptor_addr: SYNTHETIC_DESCRIPTOR,
    }
}

/// Freeze a static pool together with its real exported descriptor.
pub fn capture_static(
    descriptor: &'static BufferDescriptor,
    pool: &TraceSlotPool,
    labels: &[Label],
) -> CapturedImage {
    let descriptor_addr = descriptor as *const BufferDescriptor as usize as u64;
    let mut memory = freeze_pool(pool, labels);
    memory.insert(descriptor_addr, descriptor.to_bytes().to_vec());
    CapturedImage {
        memory,
        descriptor_addr,
    }
}

fn freeze_pool(pool: &TraceSlotPool, labels: &[Label]) -> ImageMemory {
    let mut records = Vec::with_capacity(RECORD_COUNT * RECORD_SIZE);
    for record in pool.records() {
        for word in record.snapshot().to_words() {
            records.extend_from_slice(&word.to_ne_bytes());
        }
    }
    let counter = pool.next_trace().load(Ordering::Acquire);

    let mut memory = ImageMemory::new()
        .with_region(pool.records().as_ptr() as usize as u64, records)
        .with_region(
            pool.next_trace() as *const AtomicU32 as usize as u64,
            counter.to_ne_bytes().to_vec(),
        );
    for label in labels {
        memory.insert(
            label.as_ptr() as usize as u64,
            label.to_bytes_with_nul().to_vec(),
        );
    }
    memory
}

/// One hand-written record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyntheticSlot {
    pub state: u64,
    pub context: u64,
    pub secs: u64,
    pub micros: u64,
    pub frames: Vec<u64>,
}

impl SyntheticSlot {
    pub fn complete(sequence: u32, kind: TraceKind, secs: u64) -> Self {
        Self {
            state: StateWord::complete(sequence, kind).raw() as u64,
            secs,
            ..Self::default()
        }
    }

    pub fn in_progress(sequence: u32, secs: u64) -> Self {
        Self {
            state: StateWord::in_progress(sequence).raw() as u64,
            secs,
            ..Self::default()
        }
    }

    pub fn with_context(mut self, addr: u64) -> Self {
        self.context = addr;
        self
    }

    pub fn with_frames(mut self, frames: &[u64]) -> Self {
        self.frames = frames.to_vec();
        self
    }
}

/// Builder for buffers of arbitrary geometry, as written by a process of
/// any word width and byte order.
#[derive(Clone, Debug)]
pub struct SyntheticBuffer {
    pub version: u8,
    pub pointer_width: usize,
    pub byte_order: ByteOrder,
    pub frames_per_record: usize,
    pub slots: Vec<SyntheticSlot>,
    pub next_trace: u32,
    labels: Vec<u8>,
}

impl SyntheticBuffer {
    /// A current-version buffer with the local geometry and all slots empty.
    pub fn new() -> Self {
        Self::with_geometry(POINTER_WIDTH, ByteOrder::native(), FRAMES_PER_RECORD, RECORD_COUNT)
    }

    pub fn with_geometry(
        pointer_width: usize,
        byte_order: ByteOrder,
        frames_per_record: usize,
        record_count: usize,
    ) -> Self {
        Self {
            version: FORMAT_VERSION,
            pointer_width,
            byte_order,
            frames_per_record,
            slots: vec![SyntheticSlot::default(); record_count],
            next_trace: 0,
            labels: Vec::new(),
        }
    }

    /// Store a NUL-terminated label and return its address.
    pub fn label(&mut self, text: &str) -> u64 {
        let addr = SYNTHETIC_LABELS + self.labels.len() as u64;
        self.labels.extend_from_slice(text.as_bytes());
        self.labels.push(0);
        addr
    }

    pub fn set(&mut self, slot: usize, record: SyntheticSlot) -> &mut Self {
        self.slots[slot] = record;
        self
    }

    /// A reader configuration matching this buffer's byte order.
    pub fn config(&self) -> ReaderConfig {
        ReaderConfig {
            byte_order: self.byte_order,
            ..ReaderConfig::default()
        }
    }

    pub fn build(&self) -> CapturedImage {
        let width = self.pointer_width;
        let order = self.byte_order;

        let mut descriptor = vec![
            self.version,
            (HEADER_LEN + 2 * width) as u8,
            self.frames_per_record as u8,
            self.slots.len() as u8,
            width as u8,
            0,
            0,
            0,
        ];
        order.write_uint(SYNTHETIC_RECORDS, width, &mut descriptor);
        order.write_uint(SYNTHETIC_COUNTER, width, &mut descriptor);

        let words = RECORD_HEADER_WORDS + self.frames_per_record;
        let mut records = Vec::with_capacity(self.slots.len() * words * width);
        for slot in &self.slots {
            for word in [slot.state, slot.context, slot.secs, slot.micros] {
                order.write_uint(word, width, &mut records);
            }
            for i in 0..self.frames_per_record {
                let frame = slot.frames.get(i).copied().unwrap_or(0);
                order.write_uint(frame, width, &mut records);
            }
        }

        let mut counter = Vec::new();
        order.write_uint(u64::from(self.next_trace), 4, &mut counter);

        let mut memory = ImageMemory::new()
            .with_region(SYNTHETIC_DESCRIPTOR, descriptor)
            .with_region(SYNTHETIC_RECORDS, records)
            .with_region(SYNTHETIC_COUNTER, counter);
        if !self.labels.is_empty() {
            memory.insert(SYNTHETIC_LABELS, self.labels.clone());
        }
        CapturedImage {
            memory,
            descriptor_addr: SYNTHETIC_DESCRIPTOR,
        }
    }
}

impl Default for SyntheticBuffer {
    fn default() -> Self {
        Self::new()
    }
}
