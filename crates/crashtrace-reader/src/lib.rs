//! Recovery of recent stack traces from a crashed process.
//!
//! A crash reporter locates the process's `CRASHTRACE_BUFFER_INFO`
//! descriptor (by symbol lookup in the crashed binary, or by an address the
//! process registered ahead of time), supplies a [`MemorySource`] over the
//! dead process's memory, and calls [`recover_traces`].
//!
//! The reader is built independently of the recording process. It trusts
//! nothing but the descriptor's `version` byte until that byte checks out,
//! bounds every read by [`ReaderConfig`], and reports "no data" rather than
//! guessing whenever the buffer cannot be interpreted.
//!
//! ```
//! use crashtrace_reader::{recover_traces, ImageMemory, ReaderConfig};
//!
//! // An image with nothing at the descriptor address: no traces.
//! let image = ImageMemory::new();
//! assert!(recover_traces(&image, 0x1000, ReaderConfig::default()).is_empty());
//! ```
//!
//! Symbolication of the recovered return addresses is out of scope.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod memory;
pub mod reader;
pub mod types;

pub use config::{ByteOrder, ConfigError, ReaderConfig};
pub use error::{MemoryError, ReaderError};
pub use memory::{ImageMemory, LocalMemory, MemorySource};
pub use reader::{recover_traces, BufferReader};
pub use types::{Frames, Geometry, RecoveredTrace, Timestamp};
