//! Shared test utilities for integration tests.
//!
//! Archives are assembled byte by byte so the fixtures do not depend on any
//! external ZIP writer. CRCs come from `crc32fast` and deflated payloads from
//! flate2, both independent of the code under test.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::Write;

pub const STORED: u16 = 0;
pub const DEFLATED: u16 = 8;

/// 2024-03-15 13:45:30 in DOS format.
pub const DOS_DATE: u16 = ((2024 - 1980) << 9) | (3 << 5) | 15;
pub const DOS_TIME: u16 = (13 << 11) | (45 << 5) | 15;

struct Entry {
    name: Vec<u8>,
    data: Vec<u8>,
    method: u16,
    local_extra: Vec<u8>,
    central_extra: Vec<u8>,
    comment: Vec<u8>,
}

/// An assembled archive plus the offsets of its records.
pub struct BuiltZip {
    pub bytes: Vec<u8>,
    pub central_offsets: Vec<usize>,
    pub local_offsets: Vec<usize>,
    pub eocd_offset: usize,
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Entry>,
    comment: Vec<u8>,
    prefix: Vec<u8>,
}

pub fn deflate_raw(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.entry(name.as_bytes(), data, STORED)
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.entry(name.as_bytes(), data, DEFLATED)
    }

    /// Adds an entry with an arbitrary method code; `data` is stored as-is.
    pub fn entry(mut self, name: &[u8], data: &[u8], method: u16) -> Self {
        self.entries.push(Entry {
            name: name.to_vec(),
            data: data.to_vec(),
            method,
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            comment: Vec::new(),
        });
        self
    }

    /// Gives the most recent entry extra fields and a comment that differ
    /// between its local and central headers.
    pub fn with_extras(mut self, local: &[u8], central: &[u8], comment: &[u8]) -> Self {
        let entry = self.entries.last_mut().expect("no entry to decorate");
        entry.local_extra = local.to_vec();
        entry.central_extra = central.to_vec();
        entry.comment = comment.to_vec();
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Bytes placed before the first local header (e.g. a self-extractor stub).
    pub fn prefix(mut self, prefix: &[u8]) -> Self {
        self.prefix = prefix.to_vec();
        self
    }

    pub fn build(self) -> BuiltZip {
        let mut out = self.prefix.clone();
        let mut local_offsets = Vec::new();
        let mut payloads = Vec::new();

        for entry in &self.entries {
            let payload = if entry.method == DEFLATED {
                deflate_raw(&entry.data)
            } else {
                entry.data.clone()
            };
            let crc = crc32fast::hash(&entry.data);
            local_offsets.push(out.len());

            out.extend_from_slice(b"PK\x03\x04");
            put_u16(&mut out, 20);
            put_u16(&mut out, 0);
            put_u16(&mut out, entry.method);
            put_u16(&mut out, DOS_TIME);
            put_u16(&mut out, DOS_DATE);
            put_u32(&mut out, crc);
            put_u32(&mut out, payload.len() as u32);
            put_u32(&mut out, entry.data.len() as u32);
            put_u16(&mut out, entry.name.len() as u16);
            put_u16(&mut out, entry.local_extra.len() as u16);
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&entry.local_extra);
            out.extend_from_slice(&payload);
            payloads.push((crc, payload.len()));
        }

        let cd_start = out.len();
        let mut central_offsets = Vec::new();
        for ((entry, (crc, compressed_len)), local_offset) in
            self.entries.iter().zip(&payloads).zip(&local_offsets)
        {
            central_offsets.push(out.len());
            out.extend_from_slice(b"PK\x01\x02");
            put_u16(&mut out, 20);
            put_u16(&mut out, 20);
            put_u16(&mut out, 0);
            put_u16(&mut out, entry.method);
            put_u16(&mut out, DOS_TIME);
            put_u16(&mut out, DOS_DATE);
            put_u32(&mut out, *crc);
            put_u32(&mut out, *compressed_len as u32);
            put_u32(&mut out, entry.data.len() as u32);
            put_u16(&mut out, entry.name.len() as u16);
            put_u16(&mut out, entry.central_extra.len() as u16);
            put_u16(&mut out, entry.comment.len() as u16);
            put_u16(&mut out, 0);
            put_u16(&mut out, 0);
            put_u32(&mut out, 0);
            put_u32(&mut out, *local_offset as u32);
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&entry.central_extra);
            out.extend_from_slice(&entry.comment);
        }
        let cd_size = out.len() - cd_start;

        let eocd_offset = out.len();
        out.extend_from_slice(b"PK\x05\x06");
        put_u16(&mut out, 0);
        put_u16(&mut out, 0);
        put_u16(&mut out, self.entries.len() as u16);
        put_u16(&mut out, self.entries.len() as u16);
        put_u32(&mut out, cd_size as u32);
        put_u32(&mut out, cd_start as u32);
        put_u16(&mut out, self.comment.len() as u16);
        out.extend_from_slice(&self.comment);

        BuiltZip {
            bytes: out,
            central_offsets,
            local_offsets,
            eocd_offset,
        }
    }
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Deterministic, mildly compressible test payload.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed) % 61 + b' ')
        .collect()
}
