//! Bounded in-memory window over a random-access source.
//!
//! The window holds one contiguous range of the source. A request that is
//! fully covered is served from memory; anything else refills the window
//! centred on the requested range, so forward and backward walks over nearby
//! records cost one source read per half-window.

use byteorder::{ByteOrder, LittleEndian};

use super::ReadAt;
use crate::error::{Error, Result};

/// Default window capacity in bytes.
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// Sliding window over `source`.
///
/// A refill discards the previous contents, so slices handed out by
/// [`slice`](Self::slice) borrow the window and must be dropped before the
/// next seek.
#[derive(Debug)]
pub struct Window<R> {
    source: R,
    buf: Box<[u8]>,
    start: u64,
    len: usize,
    file_len: u64,
    refills: u64,
}

impl<R: ReadAt> Window<R> {
    /// Creates an empty window of `capacity` bytes (at least one).
    pub fn new(source: R, capacity: usize) -> Self {
        let file_len = source.size();
        Self {
            source,
            buf: vec![0u8; capacity.max(1)].into_boxed_slice(),
            start: 0,
            len: 0,
            file_len,
            refills: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    /// Number of source reads performed so far.
    pub fn refills(&self) -> u64 {
        self.refills
    }

    fn covers(&self, start: u64, length: usize) -> bool {
        start >= self.start && start + length as u64 <= self.start + self.len as u64
    }

    /// Makes `[start, start + length)` resident and returns its offset inside the window.
    pub fn seek(&mut self, start: u64, length: usize) -> Result<usize> {
        let in_bounds = start
            .checked_add(length as u64)
            .is_some_and(|end| end <= self.file_len);
        if length > self.capacity() || !in_bounds {
            return Err(Error::InvalidRange {
                start,
                length,
                file_len: self.file_len,
                capacity: self.capacity(),
            });
        }

        if !self.covers(start, length) {
            self.refill(start, length)?;
        }
        Ok((start - self.start) as usize)
    }

    fn refill(&mut self, start: u64, length: usize) -> Result<()> {
        let window_len = (self.capacity() as u64).min(self.file_len) as usize;
        let slack = ((window_len - length) / 2) as u64;
        let window_start = start
            .saturating_sub(slack)
            .min(self.file_len - window_len as u64);

        // Invalidate first so a failed read never leaves stale bytes marked valid.
        self.len = 0;
        self.source
            .read_exact_at(window_start, &mut self.buf[..window_len])?;
        self.start = window_start;
        self.len = window_len;
        self.refills += 1;
        log::trace!("window refilled at {window_start} ({window_len} bytes) for {start}+{length}");
        Ok(())
    }

    /// Returns `length` bytes at `start`, refilling if needed.
    pub fn slice(&mut self, start: u64, length: usize) -> Result<&[u8]> {
        let local = self.seek(start, length)?;
        Ok(&self.buf[local..local + length])
    }

    pub fn read_u16_le(&mut self, pos: u64) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.slice(pos, 2)?))
    }

    pub fn read_u32_le(&mut self, pos: u64) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.slice(pos, 4)?))
    }

    /// Copies `length` bytes at `pos`, reading directly from the source when
    /// the range is larger than the window.
    pub fn read_vec(&mut self, pos: u64, length: usize) -> Result<Vec<u8>> {
        if length <= self.capacity() {
            return Ok(self.slice(pos, length)?.to_vec());
        }
        if pos.checked_add(length as u64).is_none_or(|end| end > self.file_len) {
            return Err(Error::InvalidRange {
                start: pos,
                length,
                file_len: self.file_len,
                capacity: self.capacity(),
            });
        }
        let mut out = vec![0u8; length];
        self.source.read_exact_at(pos, &mut out)?;
        Ok(out)
    }
}
