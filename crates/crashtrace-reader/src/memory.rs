//! Sources of target-process memory.
//!
//! Obtaining the memory of a crashed process is a privileged, platform
//! specific operation and lives outside this crate. [`MemorySource`] is the
//! boundary: anything that can copy bytes at a target address can back a
//! [`BufferReader`](crate::BufferReader).

use std::collections::BTreeMap;

use crate::error::MemoryError;

/// Random-access reads of a target address space.
pub trait MemorySource {
    /// Fill `buf` with the bytes at `addr..addr + buf.len()`.
    ///
    /// Must fail rather than return partial data.
    fn read(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemoryError>;
}

impl<M: MemorySource + ?Sized> MemorySource for &M {
    fn read(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemoryError> {
        (**self).read(addr, buf)
    }
}

impl<M: MemorySource + ?Sized> MemorySource for Box<M> {
    fn read(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemoryError> {
        (**self).read(addr, buf)
    }
}

/// A sparse memory image: byte regions keyed by their start address.
///
/// Typically filled from a core file or a snapshot taken by a crash
/// handler. A read must fall entirely inside one region.
#[derive(Clone, Debug, Default)]
pub struct ImageMemory {
    regions: BTreeMap<u64, Vec<u8>>,
}

impl ImageMemory {
    /// An image with no regions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region starting at `base`. Replaces any region with the same base.
    pub fn insert(&mut self, base: u64, bytes: Vec<u8>) {
        self.regions.insert(base, bytes);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_region(mut self, base: u64, bytes: Vec<u8>) -> Self {
        self.insert(base, bytes);
        self
    }

    /// Drop the region starting exactly at `base`.
    pub fn remove(&mut self, base: u64) -> Option<Vec<u8>> {
        self.regions.remove(&base)
    }

    /// Number of regions.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Mutable access to the region starting exactly at `base`.
    pub fn region_mut(&mut self, base: u64) -> Option<&mut Vec<u8>> {
        self.regions.get_mut(&base)
    }
}

impl MemorySource for ImageMemory {
    fn read(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemoryError> {
        let unmapped = MemoryError::Unmapped {
            addr,
            len: buf.len(),
        };
        let (&base, bytes) = self.regions.range(..=addr).next_back().ok_or(unmapped.clone())?;
        let start = (addr - base) as usize;
        let end = start.checked_add(buf.len()).ok_or(unmapped.clone())?;
        let src = bytes.get(start..end).ok_or(unmapped)?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

/// Reads the current process's own address space.
///
/// Meant for crash handlers that fork and read the frozen parent image
/// from the child, and for in-process diagnostics.
#[derive(Debug)]
pub struct LocalMemory {
    _private: (),
}

impl LocalMemory {
    /// Create a local memory source.
    ///
    /// # Safety
    ///
    /// A fault on this source is a fault of the calling process, so when it
    /// backs a [`BufferReader`](crate::BufferReader) the caller must ensure
    /// that:
    ///
    /// - the descriptor at the address given to `open` is mapped for its
    ///   declared size;
    /// - the record array and the `u32` claim counter it points to are
    ///   mapped;
    /// - every non-null context pointer in a record points into a mapped,
    ///   NUL-terminated string.
    ///
    /// None of that memory may be unmapped while being read. Context reads
    /// stop at the end of the 4 KiB page holding the label's NUL, so a label
    /// may sit right before an unmapped page. The address null is rejected.
    ///
    /// Direct calls to [`read`](MemorySource::read) must name a range that
    /// is mapped and readable.
    #[allow(unsafe_code)]
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl MemorySource for LocalMemory {
    #[allow(unsafe_code)]
    fn read(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemoryError> {
        let unmapped = MemoryError::Unmapped {
            addr,
            len: buf.len(),
        };
        if addr == 0 || usize::try_from(addr).is_err() {
            return Err(unmapped);
        }
        if (addr as usize).checked_add(buf.len()).is_none() {
            return Err(unmapped);
        }
        // SAFETY: the constructor's contract guarantees the range is mapped,
        // readable and quiescent; `buf` is a distinct, writable allocation.
        unsafe {
            std::ptr::copy_nonoverlapping(addr as usize as *const u8, buf.as_mut_ptr(), buf.len());
        }
        Ok(())
    }
}
