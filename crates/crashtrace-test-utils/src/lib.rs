//! Test fixtures for crashtrace development.
//!
//! - [`ScriptedWalker`]: a stack walker that yields a fixed frame list and
//!   can simulate a crash partway through the walk.
//! - [`capture_image`] / [`capture_static`]: freeze a live pool into an
//!   [`ImageMemory`](crashtrace_reader::ImageMemory), the way a crash
//!   handler would snapshot a dying process.
//! - [`SyntheticBuffer`]: hand-assembled buffers with any word width, byte
//!   order or version, for images no local process could produce.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod image;
pub mod walker;

pub use image::{
    capture_image, capture_static, CapturedImage, SyntheticBuffer, SyntheticSlot, SYNTHETIC_DESCRIPTOR,
};
pub use walker::{frame_addrs, interrupted, ScriptedWalker};
