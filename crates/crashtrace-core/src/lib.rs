//! Shared memory layout for the crashtrace backtrace buffer.
//!
//! This is the leaf crate of the workspace. It defines the structures that
//! a recording process keeps in static storage and that an independently
//! built crash reporter reads back out of the crashed process's memory:
//! the per-slot [`TraceRecord`], the self-describing [`BufferDescriptor`],
//! the state-word encoding, and the [`Label`] contract for context strings.
//!
//! # Layout contract
//!
//! ```text
//! BufferDescriptor (exported symbol)
//! ├── version, descriptor_size, frames_per_record, record_count   (stable 4-byte prefix)
//! ├── pointer_width, reserved[3]
//! ├── records ───────▶ TraceRecord[record_count]
//! │                     └── state | context | secs | micros | frames[frames_per_record]
//! └── next_trace ────▶ u32 claim counter
//! ```
//!
//! Every record word is pointer-sized. A reader only needs the geometry in
//! the descriptor and the word order for the descriptor's `version`; it
//! never needs these Rust definitions.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod descriptor;
pub mod label;
pub mod layout;
pub mod state;

pub use descriptor::{BufferDescriptor, DESCRIPTOR_SIZE, HEADER_LEN, PREFIX_LEN};
pub use label::Label;
pub use layout::{
    RecordSnapshot, TraceRecord, FORMAT_VERSION, FRAMES_PER_RECORD, POINTER_WIDTH, RECORD_COUNT,
    RECORD_HEADER_WORDS, RECORD_SIZE, RECORD_WORDS,
};
pub use state::{split_state_word, SlotState, StateWord, TraceKind, SEQUENCE_MASK};
