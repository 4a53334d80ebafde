//! Error types for reading a backtrace buffer.

use std::error::Error;
use std::fmt;

use crate::config::ConfigError;

/// A memory source could not supply the requested bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryError {
    /// Some byte of `addr..addr + len` is not present in the source.
    Unmapped {
        /// First requested address.
        addr: u64,
        /// Requested length in bytes.
        len: usize,
    },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmapped { addr, len } => {
                write!(f, "{len} bytes at {addr:#x} are not readable")
            }
        }
    }
}

impl Error for MemoryError {}

/// Why a buffer could not be interpreted.
///
/// Every variant means "no data available": callers report nothing rather
/// than guess at the layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReaderError {
    /// The descriptor, the records, or a pointer target was unreadable.
    Memory(MemoryError),
    /// The descriptor's `version` is not one this build understands.
    UnsupportedVersion {
        /// The version found in the descriptor.
        found: u8,
    },
    /// The descriptor's geometry is inconsistent or exceeds the configured limits.
    InvalidGeometry {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A required pointer in the descriptor is null.
    NullPointer {
        /// Name of the descriptor field.
        field: &'static str,
    },
    /// The reader configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(e) => write!(f, "memory read failed: {e}"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported buffer format version {found}")
            }
            Self::InvalidGeometry { detail } => write!(f, "invalid buffer geometry: {detail}"),
            Self::NullPointer { field } => write!(f, "descriptor field `{field}` is null"),
            Self::Config(e) => write!(f, "invalid reader configuration: {e}"),
        }
    }
}

impl Error for ReaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Memory(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MemoryError> for ReaderError {
    fn from(e: MemoryError) -> Self {
        Self::Memory(e)
    }
}

impl From<ConfigError> for ReaderError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ReaderError::UnsupportedVersion { found: 9 }.to_string(),
            "unsupported buffer format version 9"
        );
        assert_eq!(
            MemoryError::Unmapped { addr: 0x1000, len: 8 }.to_string(),
            "8 bytes at 0x1000 are not readable"
        );
        assert_eq!(
            ReaderError::NullPointer { field: "records" }.to_string(),
            "descriptor field `records` is null"
        );
    }

    #[test]
    fn memory_error_is_the_source() {
        let err = ReaderError::from(MemoryError::Unmapped { addr: 4, len: 1 });
        assert!(err.source().is_some());
        assert!(ReaderError::UnsupportedVersion { found: 2 }.source().is_none());
    }
}
