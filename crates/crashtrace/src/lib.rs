//! crashtrace: a fixed ring of recent stack traces that survives a crash.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all crashtrace sub-crates. Recording processes and crash reporters can
//! both depend on `crashtrace` alone.
//!
//! # Quick start
//!
//! ```rust
//! use crashtrace::prelude::*;
//!
//! static POOL: TraceSlotPool = TraceSlotPool::new();
//! let recorder = Recorder::new(&POOL, BacktraceWalker);
//!
//! let handle = recorder.begin(label!("loading configuration"));
//! // ... work that might crash ...
//! recorder.end(handle);
//!
//! // In the crash reporter, given a memory source for the dead process:
//! let image = ImageMemory::new();
//! let traces = recover_traces(&image, 0x1000, ReaderConfig::default());
//! assert!(traces.is_empty());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`layout`] | `crashtrace-core` | Record and descriptor layout, state words, labels |
//! | [`recorder`] | `crashtrace-recorder` | Slot pool, recorder, stack walkers, global API |
//! | [`reader`] | `crashtrace-reader` | Memory sources and out-of-process recovery |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Shared memory layout (`crashtrace-core`).
///
/// [`layout::TraceRecord`], [`layout::BufferDescriptor`], the state-word
/// encoding and [`layout::Label`].
pub use crashtrace_core as layout;

/// Writer side (`crashtrace-recorder`).
///
/// [`recorder::Recorder`] over a [`recorder::TraceSlotPool`], plus the
/// process-wide free functions ([`recorder::begin`], [`recorder::end`],
/// [`recorder::record`]).
pub use crashtrace_recorder as recorder;

/// Out-of-process reader (`crashtrace-reader`).
///
/// [`reader::BufferReader`] and the never-failing [`reader::recover_traces`].
pub use crashtrace_reader as reader;

pub use crashtrace_core::label;

/// Common imports for recording and recovering traces.
pub mod prelude {
    // Layout
    pub use crashtrace_core::{label, BufferDescriptor, Label, SlotState, TraceKind};

    // Recording
    pub use crashtrace_recorder::{
        BacktraceWalker, NullWalker, Recorder, SlotHandle, StackWalker, TraceSlotPool,
    };

    // Recovery
    pub use crashtrace_reader::{
        recover_traces, BufferReader, ImageMemory, MemorySource, ReaderConfig, ReaderError,
        RecoveredTrace,
    };
}
