//! The self-describing buffer header read first by the crash reporter.
//!
//! The first [`PREFIX_LEN`] bytes (`version`, `descriptor_size`,
//! `frames_per_record`, `record_count`) keep their offsets in every format
//! version, so a reader that shares nothing with the writer but this
//! prefix can decide whether it understands the rest.

use std::mem::{offset_of, size_of};
use std::sync::atomic::AtomicU32;

use crate::layout::{TraceRecord, FORMAT_VERSION, FRAMES_PER_RECORD, POINTER_WIDTH, RECORD_COUNT};

/// Bytes of the version-independent prefix.
pub const PREFIX_LEN: usize = 4;

/// Bytes before the first pointer field (prefix + pointer width + reserved).
pub const HEADER_LEN: usize = 8;

/// Size of [`BufferDescriptor`] on this target.
pub const DESCRIPTOR_SIZE: usize = size_of::<BufferDescriptor>();

/// Geometry and location of the trace pool.
///
/// Created once as a `static`, never mutated. The pool and counter it
/// points to are the only parts that change while the process runs.
#[repr(C)]
#[derive(Debug)]
pub struct BufferDescriptor {
    /// Layout version; a reader must refuse any value it does not know.
    pub version: u8,
    /// `size_of::<BufferDescriptor>()` in the writing process.
    pub descriptor_size: u8,
    /// Frame words per record.
    pub frames_per_record: u8,
    /// Records in the pool.
    pub record_count: u8,
    /// Bytes per word (and per pointer) in the writing process.
    pub pointer_width: u8,
    reserved: [u8; 3],
    /// Start of the record array.
    pub records: *const TraceRecord,
    /// The shared claim counter ("next free slot" before reduction).
    pub next_trace: *const AtomicU32,
}

const _: () = assert!(offset_of!(BufferDescriptor, version) == 0);
const _: () = assert!(offset_of!(BufferDescriptor, descriptor_size) == 1);
const _: () = assert!(offset_of!(BufferDescriptor, frames_per_record) == 2);
const _: () = assert!(offset_of!(BufferDescriptor, record_count) == 3);
const _: () = assert!(offset_of!(BufferDescriptor, pointer_width) == PREFIX_LEN);
const _: () = assert!(offset_of!(BufferDescriptor, records) == HEADER_LEN);
const _: () = assert!(offset_of!(BufferDescriptor, next_trace) == HEADER_LEN + POINTER_WIDTH);
const _: () = assert!(DESCRIPTOR_SIZE == HEADER_LEN + 2 * POINTER_WIDTH);
const _: () = assert!(DESCRIPTOR_SIZE <= u8::MAX as usize);

// SAFETY: both pointers are derived from `&'static` references to types
// that are themselves `Sync` (atomics only), and the descriptor is never
// mutated after construction.
#[allow(unsafe_code)]
unsafe impl Sync for BufferDescriptor {}

impl BufferDescriptor {
    /// Describe a pool living in static storage.
    pub const fn new(
        records: &'static [TraceRecord; RECORD_COUNT],
        next_trace: &'static AtomicU32,
    ) -> Self {
        Self {
            version: FORMAT_VERSION,
            descriptor_size: DESCRIPTOR_SIZE as u8,
            frames_per_record: FRAMES_PER_RECORD as u8,
            record_count: RECORD_COUNT as u8,
            pointer_width: POINTER_WIDTH as u8,
            reserved: [0; 3],
            records: records as *const [TraceRecord; RECORD_COUNT] as *const TraceRecord,
            next_trace,
        }
    }

    /// Whether a reader of this build can interpret a buffer of `version`.
    pub const fn is_supported_version(version: u8) -> bool {
        version == FORMAT_VERSION
    }

    /// Address of the record array.
    pub fn records_addr(&self) -> usize {
        self.records as usize
    }

    /// Address of the claim counter.
    pub fn next_trace_addr(&self) -> usize {
        self.next_trace as usize
    }

    /// The fixed header bytes exactly as they sit in memory.
    pub fn header_bytes(&self) -> [u8; HEADER_LEN] {
        [
            self.version,
            self.descriptor_size,
            self.frames_per_record,
            self.record_count,
            self.pointer_width,
            self.reserved[0],
            self.reserved[1],
            self.reserved[2],
        ]
    }

    /// The whole descriptor as native-endian bytes, as a memory snapshot
    /// of the writing process would contain it.
    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut out = [0u8; DESCRIPTOR_SIZE];
        out[..HEADER_LEN].copy_from_slice(&self.header_bytes());
        out[HEADER_LEN..HEADER_LEN + POINTER_WIDTH]
            .copy_from_slice(&self.records_addr().to_ne_bytes());
        out[HEADER_LEN + POINTER_WIDTH..].copy_from_slice(&self.next_trace_addr().to_ne_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static RECORDS: [TraceRecord; RECORD_COUNT] = [const { TraceRecord::new() }; RECORD_COUNT];
    static NEXT: AtomicU32 = AtomicU32::new(0);
    static DESCRIPTOR: BufferDescriptor = BufferDescriptor::new(&RECORDS, &NEXT);

    #[test]
    fn prefix_carries_geometry() {
        let header = DESCRIPTOR.header_bytes();
        assert_eq!(header[0], FORMAT_VERSION);
        assert_eq!(header[1] as usize, DESCRIPTOR_SIZE);
        assert_eq!(header[2] as usize, FRAMES_PER_RECORD);
        assert_eq!(header[3] as usize, RECORD_COUNT);
        assert_eq!(header[4] as usize, POINTER_WIDTH);
        assert_eq!(&header[5..], &[0, 0, 0]);
    }

    #[test]
    fn pointers_locate_the_statics() {
        assert_eq!(DESCRIPTOR.records_addr(), RECORDS.as_ptr() as usize);
        assert_eq!(DESCRIPTOR.next_trace_addr(), &NEXT as *const AtomicU32 as usize);
    }

    #[test]
    fn to_bytes_places_pointers_after_header() {
        let bytes = DESCRIPTOR.to_bytes();
        let mut word = [0u8; POINTER_WIDTH];
        word.copy_from_slice(&bytes[HEADER_LEN..HEADER_LEN + POINTER_WIDTH]);
        assert_eq!(usize::from_ne_bytes(word), DESCRIPTOR.records_addr());
        word.copy_from_slice(&bytes[HEADER_LEN + POINTER_WIDTH..]);
        assert_eq!(usize::from_ne_bytes(word), DESCRIPTOR.next_trace_addr());
    }

    #[test]
    fn only_current_version_is_supported() {
        assert!(BufferDescriptor::is_supported_version(FORMAT_VERSION));
        assert!(!BufferDescriptor::is_supported_version(FORMAT_VERSION + 1));
        assert!(!BufferDescriptor::is_supported_version(0));
    }
}
