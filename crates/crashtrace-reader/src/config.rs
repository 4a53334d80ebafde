//! Reader configuration and validation.

use std::error::Error;
use std::fmt;

// ── ByteOrder ─────────────────────────────────────────────────────

/// Byte order of the process image being read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl ByteOrder {
    /// The byte order of the machine running the reader.
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    /// Decode an unsigned integer of 1 to 8 bytes.
    pub fn read_uint(self, bytes: &[u8]) -> u64 {
        debug_assert!(!bytes.is_empty() && bytes.len() <= 8);
        let mut buf = [0u8; 8];
        match self {
            ByteOrder::Little => {
                buf[..bytes.len()].copy_from_slice(bytes);
                u64::from_le_bytes(buf)
            }
            ByteOrder::Big => {
                buf[8 - bytes.len()..].copy_from_slice(bytes);
                u64::from_be_bytes(buf)
            }
        }
    }

    /// Encode the low `width` bytes of `value`.
    pub fn write_uint(self, value: u64, width: usize, out: &mut Vec<u8>) {
        debug_assert!(width <= 8);
        match self {
            ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()[..width]),
            ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()[8 - width..]),
        }
    }
}

// ── ReaderConfig ──────────────────────────────────────────────────

/// Limits and options for [`BufferReader`](crate::BufferReader).
///
/// The limits bound how much memory the reader will request from a
/// descriptor it does not trust.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Report slots that were never written. Default: false.
    pub include_empty: bool,
    /// Longest context label read, excluding the NUL. Default: 256.
    pub max_context_len: usize,
    /// Largest `record_count` accepted. Default: 255.
    pub max_record_count: usize,
    /// Largest `frames_per_record` accepted. Default: 255.
    pub max_frames_per_record: usize,
    /// Byte order of the target image. Default: the reader's own.
    pub byte_order: ByteOrder,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            include_empty: false,
            max_context_len: 256,
            max_record_count: u8::MAX as usize,
            max_frames_per_record: u8::MAX as usize,
            byte_order: ByteOrder::native(),
        }
    }
}

impl ReaderConfig {
    /// Check that every limit is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_context_len == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_context_len",
            });
        }
        if self.max_record_count == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_record_count",
            });
        }
        if self.max_frames_per_record == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_frames_per_record",
            });
        }
        Ok(())
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors from [`ReaderConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A limit that must be positive is zero.
    ZeroLimit {
        /// Name of the offending field.
        field: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLimit { field } => write!(f, "{field} must be greater than zero"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ReaderConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let cfg = ReaderConfig {
            max_context_len: 0,
            ..ReaderConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroLimit {
                field: "max_context_len"
            })
        );

        let cfg = ReaderConfig {
            max_record_count: 0,
            ..ReaderConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = ReaderConfig {
            max_frames_per_record: 0,
            ..ReaderConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn byte_order_decodes_both_widths() {
        assert_eq!(ByteOrder::Little.read_uint(&[0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
        assert_eq!(ByteOrder::Big.read_uint(&[0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
        assert_eq!(
            ByteOrder::Big.read_uint(&[0, 0, 0, 0, 0, 0, 0x01, 0x02]),
            0x0102
        );
    }

    #[test]
    fn byte_order_encode_decode_agree() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            for width in [4usize, 8] {
                let mut out = Vec::new();
                order.write_uint(0xdead_beef, width, &mut out);
                assert_eq!(out.len(), width);
                assert_eq!(order.read_uint(&out), 0xdead_beef);
            }
        }
    }

    #[test]
    fn native_matches_target() {
        let expected = if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        assert_eq!(ByteOrder::native(), expected);
    }
}
