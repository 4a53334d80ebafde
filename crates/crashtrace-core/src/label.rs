//! Context labels stored in trace records.
//!
//! A record keeps only a pointer to its label, and that pointer is
//! dereferenced by another process after this one has died. Labels are
//! therefore restricted to NUL-terminated strings in static storage.

use std::borrow::Cow;
use std::ffi::{c_char, CStr};
use std::fmt;

/// A static, NUL-terminated description of a call site.
///
/// # Examples
///
/// ```
/// use crashtrace_core::{label, Label};
///
/// const LOW_MEMORY: Label = label!("low memory handler");
/// assert_eq!(LOW_MEMORY.to_str_lossy(), "low memory handler");
///
/// let same = Label::new(c"low memory handler");
/// assert_eq!(LOW_MEMORY, same);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Label(&'static CStr);

impl Label {
    /// Label used when a caller supplies none.
    pub const UNKNOWN: Label = Label(c"unknown");

    /// Wrap a static C string.
    pub const fn new(text: &'static CStr) -> Self {
        Label(text)
    }

    /// Wrap a raw pointer received across the C ABI.
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a NUL-terminated string that stays
    /// valid and unmodified for the rest of the process lifetime (a string
    /// literal or other static data).
    #[allow(unsafe_code)]
    pub unsafe fn from_static_ptr(ptr: *const c_char) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        // SAFETY: non-null, NUL-terminated and 'static per caller contract.
        Some(Label(unsafe { CStr::from_ptr(ptr) }))
    }

    /// Pointer stored into a record.
    pub const fn as_ptr(self) -> *const c_char {
        self.0.as_ptr()
    }

    /// The label as a C string.
    pub const fn as_c_str(self) -> &'static CStr {
        self.0
    }

    /// Label bytes including the trailing NUL.
    pub const fn to_bytes_with_nul(self) -> &'static [u8] {
        self.0.to_bytes_with_nul()
    }

    /// The label text, replacing invalid UTF-8.
    pub fn to_str_lossy(self) -> Cow<'static, str> {
        self.0.to_string_lossy()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

/// Build a [`Label`] from a string literal at compile time.
///
/// A literal containing an interior NUL byte is a compile error.
#[macro_export]
macro_rules! label {
    ($text:literal) => {{
        const LABEL: $crate::Label = $crate::Label::new(
            match ::core::ffi::CStr::from_bytes_with_nul(concat!($text, "\0").as_bytes()) {
                Ok(text) => text,
                Err(_) => panic!("label contains an interior NUL byte"),
            },
        );
        LABEL
    }};
}
