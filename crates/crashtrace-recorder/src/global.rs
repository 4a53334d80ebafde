//! The process-wide pool, its exported descriptor, and free functions over
//! them.
//!
//! A crash reporter finds the buffer through the exported
//! `CRASHTRACE_BUFFER_INFO` symbol (or through whatever address the
//! process hands it via [`descriptor`]).

use std::panic;

use crashtrace_core::{label, BufferDescriptor, Label, TraceKind};

use crate::pool::TraceSlotPool;
use crate::recorder::{Recorder, SlotHandle};
use crate::walker::BacktraceWalker;

/// The pool every free function in this module records into.
pub static GLOBAL_POOL: TraceSlotPool = TraceSlotPool::new();

/// Descriptor of [`GLOBAL_POOL`], exported unmangled for crash reporters.
#[no_mangle]
#[used]
#[allow(unsafe_code)]
pub static CRASHTRACE_BUFFER_INFO: BufferDescriptor = GLOBAL_POOL.describe();

static GLOBAL: Recorder<'static, BacktraceWalker> = Recorder::new(&GLOBAL_POOL, BacktraceWalker);

/// The process-wide recorder.
pub fn recorder() -> &'static Recorder<'static, BacktraceWalker> {
    &GLOBAL
}

/// The descriptor of the process-wide pool.
pub fn descriptor() -> &'static BufferDescriptor {
    &CRASHTRACE_BUFFER_INFO
}

/// Start a generic trace in the global pool.
pub fn begin(context: Label) -> SlotHandle {
    GLOBAL.begin(context)
}

/// Start a trace of `kind` in the global pool.
pub fn begin_with_kind(kind: TraceKind, context: Label) -> SlotHandle {
    GLOBAL.begin_with_kind(kind, context)
}

/// Mark a global trace complete. See [`Recorder::end`].
pub fn end(handle: SlotHandle) -> bool {
    GLOBAL.end(handle)
}

/// Record a complete trace in the global pool.
pub fn record(kind: TraceKind, context: Label) -> SlotHandle {
    GLOBAL.record(kind, context)
}

/// Install a panic hook that records a [`TraceKind::Panic`] trace before
/// delegating to the previously installed hook.
///
/// Call once during startup; installing replaces the current hook.
pub fn install_panic_hook() {
    const PANIC: Label = label!("panic");
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        record(TraceKind::Panic, PANIC);
        previous(info);
    }));
}
