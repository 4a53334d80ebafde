//! Descriptor validation and record decoding.

use crashtrace_core::layout::{CONTEXT_WORD, FIRST_FRAME_WORD, MICROS_WORD, SECS_WORD, STATE_WORD};
use crashtrace_core::{split_state_word, BufferDescriptor, SlotState, HEADER_LEN, PREFIX_LEN};

use crate::config::ReaderConfig;
use crate::error::ReaderError;
use crate::memory::MemorySource;
use crate::types::{Frames, Geometry, RecoveredTrace, Timestamp};

const CONTEXT_CHUNK: usize = 64;

/// Context reads are split so that none spans two pages of this size. A
/// label that ends short of an unmapped page is then never read past its
/// own page.
const PAGE_SIZE: u64 = 4096;

/// Reads a backtrace buffer out of a target address space.
///
/// Opening validates the descriptor once; [`traces`](Self::traces) may then
/// be called repeatedly, for instance against a live process.
#[derive(Debug)]
pub struct BufferReader<M> {
    source: M,
    config: ReaderConfig,
    geometry: Geometry,
}

impl<M: MemorySource> BufferReader<M> {
    /// Validate the descriptor at `descriptor_addr`.
    ///
    /// Only the version byte is trusted before the version check passes;
    /// any other version is refused without interpreting the rest.
    pub fn open(
        source: M,
        descriptor_addr: u64,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        config.validate()?;

        let mut header = [0u8; HEADER_LEN];
        source.read(descriptor_addr, &mut header[..PREFIX_LEN])?;

        let version = header[0];
        if !BufferDescriptor::is_supported_version(version) {
            return Err(ReaderError::UnsupportedVersion { found: version });
        }
        let rest_addr = descriptor_addr
            .checked_add(PREFIX_LEN as u64)
            .ok_or_else(|| invalid("descriptor address overflows".to_string()))?;
        source.read(rest_addr, &mut header[PREFIX_LEN..])?;

        let descriptor_size = header[1] as usize;
        let frames_per_record = header[2] as usize;
        let record_count = header[3] as usize;
        let pointer_width = header[4] as usize;

        if pointer_width != 4 && pointer_width != 8 {
            return Err(invalid(format!("pointer width {pointer_width} is not 4 or 8")));
        }
        let min_size = HEADER_LEN + 2 * pointer_width;
        if descriptor_size < min_size {
            return Err(invalid(format!(
                "descriptor size {descriptor_size} is below the {min_size} bytes its pointers need"
            )));
        }
        if frames_per_record == 0 || frames_per_record > config.max_frames_per_record {
            return Err(invalid(format!(
                "frames_per_record {frames_per_record} outside 1..={}",
                config.max_frames_per_record
            )));
        }
        if record_count == 0 || record_count > config.max_record_count {
            return Err(invalid(format!(
                "record_count {record_count} outside 1..={}",
                config.max_record_count
            )));
        }

        let mut pointers = [0u8; 16];
        let pointers = &mut pointers[..2 * pointer_width];
        let pointers_addr = descriptor_addr
            .checked_add(HEADER_LEN as u64)
            .ok_or_else(|| invalid("descriptor address overflows".to_string()))?;
        source.read(pointers_addr, pointers)?;
        let records_addr = config.byte_order.read_uint(&pointers[..pointer_width]);
        let next_trace_addr = config.byte_order.read_uint(&pointers[pointer_width..]);

        if records_addr == 0 {
            return Err(ReaderError::NullPointer { field: "records" });
        }
        if next_trace_addr == 0 {
            return Err(ReaderError::NullPointer {
                field: "next_trace",
            });
        }

        let geometry = Geometry {
            version,
            descriptor_size,
            frames_per_record,
            record_count,
            pointer_width,
            records_addr,
            next_trace_addr,
        };
        if records_addr.checked_add(geometry.pool_size() as u64).is_none() {
            return Err(invalid("record array wraps the address space".to_string()));
        }

        tracing::debug!(
            version,
            record_count,
            frames_per_record,
            pointer_width,
            records_addr,
            "opened backtrace buffer"
        );

        Ok(Self {
            source,
            config,
            geometry,
        })
    }

    /// The validated geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The configuration this reader was opened with.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Current value of the claim counter, if readable.
    ///
    /// This is the total number of traces ever begun, modulo 2^32.
    pub fn next_sequence(&self) -> Option<u32> {
        let mut bytes = [0u8; 4];
        match self.source.read(self.geometry.next_trace_addr, &mut bytes) {
            Ok(()) => Some(self.config.byte_order.read_uint(&bytes) as u32),
            Err(e) => {
                tracing::debug!(error = %e, "claim counter unreadable");
                None
            }
        }
    }

    /// Decode every record, newest first.
    ///
    /// The record array is read in one request. Traces are ordered by
    /// capture time, ties broken by sequence number.
    pub fn traces(&self) -> Result<Vec<RecoveredTrace>, ReaderError> {
        let record_size = self.geometry.record_size();
        let mut block = vec![0u8; self.geometry.pool_size()];
        self.source.read(self.geometry.records_addr, &mut block)?;

        let mut traces: Vec<RecoveredTrace> = block
            .chunks_exact(record_size)
            .enumerate()
            .filter_map(|(slot, bytes)| self.decode_record(slot, bytes))
            .collect();
        traces.sort_by(|a, b| (b.captured_at, b.sequence).cmp(&(a.captured_at, a.sequence)));

        tracing::debug!(recovered = traces.len(), "decoded backtrace buffer");
        Ok(traces)
    }

    /// Give back the memory source.
    pub fn into_inner(self) -> M {
        self.source
    }

    fn decode_record(&self, slot: usize, bytes: &[u8]) -> Option<RecoveredTrace> {
        let width = self.geometry.pointer_width;
        let order = self.config.byte_order;
        let word = |index: usize| order.read_uint(&bytes[index * width..(index + 1) * width]);

        let (tag, sequence) = split_state_word(word(STATE_WORD));
        let status = SlotState::from_tag(tag);
        if status == SlotState::Empty && !self.config.include_empty {
            return None;
        }
        if let SlotState::Unrecognized(tag) = status {
            tracing::debug!(slot, tag, "slot carries an unrecognized state tag");
        }

        let frame_words = FIRST_FRAME_WORD..FIRST_FRAME_WORD + self.geometry.frames_per_record;
        let mut frames: Frames = frame_words.map(&word).collect();
        while frames.last() == Some(&0) {
            frames.pop();
        }

        Some(RecoveredTrace {
            slot,
            sequence,
            status,
            context: self.read_context(word(CONTEXT_WORD)),
            captured_at: Timestamp {
                secs: word(SECS_WORD),
                micros: word(MICROS_WORD),
            },
            frames,
        })
    }

    /// Read a NUL-terminated label of at most `max_context_len` bytes.
    ///
    /// A string that runs into unreadable memory is cut there; one whose
    /// first byte is unreadable yields `None`.
    fn read_context(&self, addr: u64) -> Option<String> {
        if addr == 0 {
            return None;
        }
        let limit = self.config.max_context_len;
        let mut text = Vec::new();
        let mut cursor = addr;

        'chunks: while text.len() < limit {
            let to_page_end = (PAGE_SIZE - cursor % PAGE_SIZE) as usize;
            let want = CONTEXT_CHUNK.min(limit - text.len()).min(to_page_end);
            let mut buf = [0u8; CONTEXT_CHUNK];
            let got = self.read_prefix(cursor, &mut buf[..want]);

            for &b in &buf[..got] {
                if b == 0 {
                    break 'chunks;
                }
                text.push(b);
            }
            if got < want {
                if cursor == addr && got == 0 {
                    tracing::debug!(addr, "context label unreadable");
                    return None;
                }
                break;
            }
            cursor = cursor.checked_add(got as u64)?;
        }

        Some(String::from_utf8_lossy(&text).into_owned())
    }

    /// Fill as much of `buf` as is readable from `addr`, returning the count.
    fn read_prefix(&self, addr: u64, buf: &mut [u8]) -> usize {
        if self.source.read(addr, buf).is_ok() {
            return buf.len();
        }
        // The label may end just short of an unmapped page.
        let mut n = 0;
        while n < buf.len() {
            let Some(at) = addr.checked_add(n as u64) else {
                break;
            };
            if self.source.read(at, &mut buf[n..n + 1]).is_err() {
                break;
            }
            n += 1;
        }
        n
    }
}

fn invalid(detail: String) -> ReaderError {
    ReaderError::InvalidGeometry { detail }
}

/// Open the buffer and decode it, reporting nothing if either step fails.
///
/// This is the entry point for crash reporters that must never act on a
/// layout they cannot interpret. The failure is logged at `warn`.
pub fn recover_traces<M: MemorySource>(
    source: M,
    descriptor_addr: u64,
    config: ReaderConfig,
) -> Vec<RecoveredTrace> {
    match BufferReader::open(source, descriptor_addr, config).and_then(|r| r.traces()) {
        Ok(traces) => traces,
        Err(e) => {
            tracing::warn!(error = %e, descriptor_addr, "no traces recovered from backtrace buffer");
            Vec::new()
        }
    }
}
