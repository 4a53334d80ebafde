//! C-compatible mirrors of the recorder's public types.

use std::ffi::c_void;
use std::mem::{offset_of, size_of};

use crashtrace_core::{BufferDescriptor, TraceKind};

/// Kind of a trace, as passed to `crashtrace_begin_with_kind` and
/// `crashtrace_record`. Values match the state-word tags.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrashtraceKind {
    /// An assertion failed.
    AssertionFailure = 2,
    /// An exception is being thrown or unwound.
    Exception = 3,
    /// A panic or abort path.
    Panic = 4,
    /// A fatal signal handler.
    Signal = 5,
    /// Any other instrumented operation.
    Generic = 6,
    /// A task or message dispatch.
    Dispatch = 7,
}

impl CrashtraceKind {
    /// Decode a raw C value; `None` for anything outside the enum.
    pub fn from_raw(raw: i32) -> Option<Self> {
        let tag = u8::try_from(raw).ok()?;
        TraceKind::from_tag(tag).map(Self::from)
    }
}

impl From<TraceKind> for CrashtraceKind {
    fn from(kind: TraceKind) -> Self {
        match kind {
            TraceKind::AssertionFailure => CrashtraceKind::AssertionFailure,
            TraceKind::Exception => CrashtraceKind::Exception,
            TraceKind::Panic => CrashtraceKind::Panic,
            TraceKind::Signal => CrashtraceKind::Signal,
            TraceKind::Generic => CrashtraceKind::Generic,
            TraceKind::Dispatch => CrashtraceKind::Dispatch,
        }
    }
}

impl From<CrashtraceKind> for TraceKind {
    fn from(kind: CrashtraceKind) -> Self {
        match kind {
            CrashtraceKind::AssertionFailure => TraceKind::AssertionFailure,
            CrashtraceKind::Exception => TraceKind::Exception,
            CrashtraceKind::Panic => TraceKind::Panic,
            CrashtraceKind::Signal => TraceKind::Signal,
            CrashtraceKind::Generic => TraceKind::Generic,
            CrashtraceKind::Dispatch => TraceKind::Dispatch,
        }
    }
}

/// C view of the exported buffer descriptor.
///
/// Same layout as the recorder's descriptor; records are exposed as an
/// opaque pointer because their words are atomics.
#[repr(C)]
#[derive(Debug)]
pub struct CrashtraceBufferDescriptor {
    /// Layout version.
    pub version: u8,
    /// Size of this struct in bytes.
    pub descriptor_size: u8,
    /// Frame words per record.
    pub frames_per_record: u8,
    /// Records in the pool.
    pub record_count: u8,
    /// Bytes per record word and pointer.
    pub pointer_width: u8,
    /// Zero.
    pub reserved: [u8; 3],
    /// First record.
    pub records: *const c_void,
    /// The `uint32_t` claim counter.
    pub next_trace: *const u32,
}

const _: () = assert!(size_of::<CrashtraceBufferDescriptor>() == size_of::<BufferDescriptor>());
const _: () = assert!(
    offset_of!(CrashtraceBufferDescriptor, pointer_width) == offset_of!(BufferDescriptor, pointer_width)
);
const _: () =
    assert!(offset_of!(CrashtraceBufferDescriptor, records) == offset_of!(BufferDescriptor, records));
const _: () = assert!(
    offset_of!(CrashtraceBufferDescriptor, next_trace) == offset_of!(BufferDescriptor, next_trace)
);
