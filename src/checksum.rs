//! CRC-32 checksum (ISO-3309 / zlib / ZIP).
//!
//! The remainder table is generated from the generator polynomial
//! `0x04C11DB7` in MSB-first form. Input bytes are bit-reflected before they
//! are folded in and the final accumulator is reflected again, which yields the
//! same values as the reflected `0xEDB88320` formulation used by zlib.

use std::io::{self, Read};

use crate::error::Error;

const POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Remainder table, computed at compile time so every caller sees the same table.
const TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut rem = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            rem = if rem & 0x8000_0000 != 0 {
                (rem << 1) ^ POLYNOMIAL
            } else {
                rem << 1
            };
            bit += 1;
        }
        table[i] = rem;
        i += 1;
    }
    table
};

/// Running CRC-32 accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32 {
    acc: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    pub const fn new() -> Self {
        Self { acc: 0xFFFF_FFFF }
    }

    /// Folds a single byte into the accumulator.
    #[inline]
    pub fn update_byte(&mut self, byte: u8) {
        let index = (u32::from(byte.reverse_bits()) ^ (self.acc >> 24)) & 0xFF;
        self.acc = TABLE[index as usize] ^ (self.acc << 8);
    }

    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.update_byte(byte);
        }
    }

    /// Returns the checksum of everything folded in so far.
    pub fn value(&self) -> u32 {
        self.acc.reverse_bits() ^ 0xFFFF_FFFF
    }

    pub fn reset(&mut self) {
        self.acc = 0xFFFF_FFFF;
    }
}

/// Computes the CRC-32 of `data` in one call.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(data);
    crc.value()
}

/// Reader that validates the CRC-32 of the inner stream when it reaches EOF.
#[derive(Debug)]
pub struct Crc32Reader<R> {
    inner: R,
    crc: Crc32,
    expected: u32,
}

impl<R> Crc32Reader<R> {
    pub fn new(inner: R, expected: u32) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
            expected,
        }
    }

    /// Checksum of the bytes read so far.
    pub fn value(&self) -> u32 {
        self.crc.value()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Crc32Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return self.inner.read(buf);
        }

        let count = self.inner.read(buf)?;
        if count == 0 {
            let actual = self.crc.value();
            if actual != self.expected {
                return Err(Error::ChecksumMismatch {
                    expected: self.expected,
                    actual,
                }
                .into());
            }
            return Ok(0);
        }
        self.crc.update(&buf[..count]);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_values() {
        assert_eq!(crc32(b""), 0x0000_0000);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b"hello world"), 0x0D4A_1185);
    }

    #[test]
    fn test_table_layout() {
        assert_eq!(TABLE[0], 0);
        // Entry 1 of the MSB-first table is the polynomial itself.
        assert_eq!(TABLE[1], POLYNOMIAL);
        assert_eq!(TABLE[2], POLYNOMIAL << 1);
    }

    #[test]
    fn test_incremental_equals_one_shot() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut crc = Crc32::new();
        for chunk in data.chunks(7) {
            crc.update(chunk);
        }
        assert_eq!(crc.value(), crc32(data));
        assert_eq!(crc.value(), 0x414F_A339);
    }

    #[test]
    fn test_reset() {
        let mut crc = Crc32::new();
        crc.update(b"garbage");
        crc.reset();
        crc.update(b"123456789");
        assert_eq!(crc.value(), 0xCBF4_3926);
    }

    #[test]
    fn test_reader_accepts_matching_checksum() {
        let data: &[u8] = b"123456789";
        let mut reader = Crc32Reader::new(data, 0xCBF4_3926);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_reader_rejects_mismatch() {
        let data: &[u8] = b"123456789";
        let mut reader = Crc32Reader::new(data, 0);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("checksum mismatch"));
    }
}
