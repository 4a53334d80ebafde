//! Continuous recording of recent stack traces for crash reporting.
//!
//! Instrumented code calls [`begin`] before doing something risky and
//! [`end`] once it is done. Each call claims one of a handful of
//! preallocated slots with a single atomic increment and writes the
//! current stack into it. If the process dies between the two calls, the
//! slot is still marked in progress when a crash reporter reads it out of
//! the process image.
//!
//! # Constraints
//!
//! The recording path may run inside signal handlers, during unwinding,
//! or with the heap in an unknown state, so it:
//!
//! - never allocates and never takes a lock,
//! - never fails (no error returns, no panics of its own),
//! - makes no system calls besides one `clock_gettime`.
//!
//! # Architecture
//!
//! ```text
//! global (GLOBAL_POOL, CRASHTRACE_BUFFER_INFO)
//! └── Recorder<W: StackWalker>
//!     ├── TraceSlotPool  (records + claim counter, static storage)
//!     ├── clock::now     (signal-safe wall clock)
//!     └── StackWalker    (BacktraceWalker / NullWalker)
//! ```
//!
//! # Examples
//!
//! ```
//! use crashtrace_core::{label, TraceKind};
//! use crashtrace_recorder::{Recorder, TraceSlotPool, BacktraceWalker};
//!
//! static POOL: TraceSlotPool = TraceSlotPool::new();
//! let recorder = Recorder::new(&POOL, BacktraceWalker);
//!
//! let handle = recorder.begin(label!("flushing caches"));
//! // ... risky work ...
//! assert!(recorder.end(handle));
//!
//! recorder.record(TraceKind::AssertionFailure, label!("invariant broken"));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod clock;
pub mod global;
pub mod pool;
pub mod recorder;
pub mod walker;

pub use global::{
    begin, begin_with_kind, descriptor, end, install_panic_hook, record, recorder, GLOBAL_POOL,
};
pub use pool::{Claim, TraceSlotPool};
pub use recorder::{Recorder, SlotHandle};
pub use walker::{BacktraceWalker, NullWalker, StackWalker};
