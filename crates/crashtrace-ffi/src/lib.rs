//! C ABI for the crashtrace backtrace recorder.
//!
//! Exposes the process-wide recorder to C and C++ callers. The header
//! `crashtrace.h` is generated by `cbindgen` into the build's `OUT_DIR`,
//! and also into `$CRASHTRACE_HEADER_DIR` when that variable is set.
//!
//! Handles are plain `uint64_t` values encoding slot, kind and claim
//! sequence; they own nothing and need no cleanup. A crash reporter
//! locates the buffer through `crashtrace_buffer_descriptor()` or the
//! exported `CRASHTRACE_BUFFER_INFO` symbol.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod record;
pub mod status;
pub mod types;

pub use record::{
    crashtrace_begin, crashtrace_begin_with_kind, crashtrace_buffer_descriptor, crashtrace_end,
    crashtrace_record,
};
pub use status::CrashtraceStatus;
pub use types::{CrashtraceBufferDescriptor, CrashtraceKind};
