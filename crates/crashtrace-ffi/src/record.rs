//! Recording entry points for C callers.
//!
//! Every function records into the process-wide pool. Context strings
//! must be NUL-terminated and must stay valid and unchanged for the rest
//! of the process's life: string literals, or storage that is never
//! freed. A null context records the label `"unknown"`.

use std::ffi::c_char;

use crashtrace_core::{Label, TraceKind};
use crashtrace_recorder::{global, SlotHandle};

use crate::status::CrashtraceStatus;
use crate::types::{CrashtraceBufferDescriptor, CrashtraceKind};

#[allow(unsafe_code)]
fn context_label(context: *const c_char) -> Label {
    // SAFETY: the caller contract above makes a non-null `context` a
    // static NUL-terminated string.
    unsafe { Label::from_static_ptr(context) }.unwrap_or(Label::UNKNOWN)
}

fn trace_kind(raw: i32) -> Option<TraceKind> {
    CrashtraceKind::from_raw(raw).map(TraceKind::from)
}

/// Start a generic trace and return its handle.
///
/// Never fails. Pass the handle to `crashtrace_end` when the traced
/// operation finishes.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn crashtrace_begin(context: *const c_char) -> u64 {
    global::begin(context_label(context)).to_raw()
}

/// Start a trace of `kind`, writing its handle to `handle_out`.
///
/// Returns `InvalidArgument` without recording if `kind` is not a
/// `CrashtraceKind` or `handle_out` is null.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn crashtrace_begin_with_kind(
    kind: i32,
    context: *const c_char,
    handle_out: *mut u64,
) -> i32 {
    let Some(kind) = trace_kind(kind) else {
        return CrashtraceStatus::InvalidArgument as i32;
    };
    if handle_out.is_null() {
        return CrashtraceStatus::InvalidArgument as i32;
    }
    let handle = global::begin_with_kind(kind, context_label(context));
    // SAFETY: handle_out is non-null and points to caller-owned storage.
    unsafe { *handle_out = handle.to_raw() };
    CrashtraceStatus::Ok as i32
}

/// Mark a trace complete.
///
/// Returns `SlotReclaimed` if the trace was already ended or a newer
/// trace has taken its slot; the slot is left untouched.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn crashtrace_end(handle: u64) -> i32 {
    let Some(handle) = SlotHandle::from_raw(handle) else {
        return CrashtraceStatus::InvalidHandle as i32;
    };
    if global::end(handle) {
        CrashtraceStatus::Ok as i32
    } else {
        CrashtraceStatus::SlotReclaimed as i32
    }
}

/// Record a complete trace of `kind` in one call.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn crashtrace_record(kind: i32, context: *const c_char) -> i32 {
    let Some(kind) = trace_kind(kind) else {
        return CrashtraceStatus::InvalidArgument as i32;
    };
    global::record(kind, context_label(context));
    CrashtraceStatus::Ok as i32
}

/// The descriptor of the process-wide pool, also exported as the symbol
/// `CRASHTRACE_BUFFER_INFO`. Never null.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn crashtrace_buffer_descriptor() -> *const CrashtraceBufferDescriptor {
    (global::descriptor() as *const crashtrace_core::BufferDescriptor).cast()
}
