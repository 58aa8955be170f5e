//! Central directory index and entry content resolution.
//!
//! ## Opening an archive
//!
//! 1. Scan backward from `len - 22` for the End of Central Directory magic.
//!    The record carries a variable-length comment, so there is no fixed
//!    offset to read it from.
//! 2. Read the central directory offset from the EOCD record.
//! 3. Walk the central directory forward, indexing each record's name against
//!    the record's own offset. A record without the header magic ends the
//!    walk; entries indexed before it stay usable.
//!
//! All field reads go through one [`Window`], so walking neighbouring records
//! costs a single source read per half-window.
//!
//! ## Reading entries
//!
//! [`ZipArchive::open`] resolves the local header lazily and returns an
//! [`EntryReader`] that owns its own cursor over the shared source. Entry
//! readers never touch the window, so several can be open at once.

use std::io::{self, Read};
use std::sync::Arc;

use indexmap::IndexMap;

use super::structures::{
    CompressionMethod, ZipFileEntry, cdfh, decode_name, eocd, lfh, normalize_name,
};
use crate::codec::{Framing, InflaterReader};
use crate::error::{Error, Result};
use crate::io::{DEFAULT_WINDOW_SIZE, ReadAt, Window};

/// Smallest window that can hold a central directory file header.
const MIN_WINDOW_SIZE: usize = cdfh::SIZE;

/// Read-only view of a ZIP archive.
///
/// ```
/// use std::sync::Arc;
/// use runzip::ZipArchive;
///
/// // An archive with no entries is just an EOCD record.
/// let mut bytes = b"PK\x05\x06".to_vec();
/// bytes.resize(22, 0);
/// let archive = ZipArchive::new(Arc::new(bytes)).unwrap();
/// assert!(archive.is_empty());
/// ```
#[derive(Debug)]
pub struct ZipArchive<R: ReadAt> {
    source: Arc<R>,
    window: Window<Arc<R>>,
    /// Normalized name -> central directory record offset, in directory order.
    index: IndexMap<String, u64>,
    comment: Vec<u8>,
    eocd_offset: u64,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Opens an archive with the default window size.
    pub fn new(reader: Arc<R>) -> Result<Self> {
        Self::with_window_size(reader, DEFAULT_WINDOW_SIZE)
    }

    /// Opens an archive whose directory is read through a window of `window_size` bytes.
    pub fn with_window_size(reader: Arc<R>, window_size: usize) -> Result<Self> {
        let mut window = Window::new(Arc::clone(&reader), window_size.max(MIN_WINDOW_SIZE));

        let eocd_offset = find_eocd(&mut window)?;
        let cd_offset = u64::from(window.read_u32_le(eocd_offset + eocd::CD_OFFSET)?);
        let expected = window.read_u16_le(eocd_offset + eocd::TOTAL_ENTRIES)?;
        let comment = read_comment(&mut window, eocd_offset)?;

        let index = build_index(&mut window, cd_offset, expected as usize)?;
        log::debug!(
            "indexed {} entries (EOCD at {eocd_offset}, directory at {cd_offset}, {} window reads)",
            index.len(),
            window.refills()
        );

        Ok(Self {
            source: reader,
            window,
            index,
            comment,
            eocd_offset,
        })
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Entry names in central directory order, leading slashes removed.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(normalize_name(name))
    }

    /// Central directory offset of `name`, ignoring leading slashes.
    pub fn find(&self, name: &str) -> Option<u64> {
        self.index.get(normalize_name(name)).copied()
    }

    /// Archive comment bytes from the EOCD record.
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    pub fn eocd_offset(&self) -> u64 {
        self.eocd_offset
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &Arc<R> {
        &self.source
    }

    /// Resolves the metadata of `name`.
    pub fn entry(&mut self, name: &str) -> Result<ZipFileEntry> {
        let offset = self
            .find(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.entry_at(offset)
    }

    /// Parses the central directory record at `offset`.
    pub fn entry_at(&mut self, offset: u64) -> Result<ZipFileEntry> {
        let w = &mut self.window;
        let header = w
            .slice(offset, cdfh::SIZE)
            .map_err(|e| truncated(e, "central directory record", offset))?;
        if header[..4] != cdfh::SIGNATURE {
            return Err(Error::CorruptArchive(format!(
                "no central directory record at {offset}"
            )));
        }

        let method = w.read_u16_le(offset + cdfh::METHOD)?;
        let last_mod_time = w.read_u16_le(offset + cdfh::LAST_MOD_TIME)?;
        let last_mod_date = w.read_u16_le(offset + cdfh::LAST_MOD_DATE)?;
        let crc32 = w.read_u32_le(offset + cdfh::CRC32)?;
        let compressed_size = u64::from(w.read_u32_le(offset + cdfh::COMPRESSED_SIZE)?);
        let uncompressed_size = u64::from(w.read_u32_le(offset + cdfh::UNCOMPRESSED_SIZE)?);
        let name_len = w.read_u16_le(offset + cdfh::NAME_LEN)? as usize;
        let lfh_offset = u64::from(w.read_u32_le(offset + cdfh::LFH_OFFSET)?);
        let file_name = decode_name(w.read_vec(offset + cdfh::SIZE as u64, name_len)?);

        Ok(ZipFileEntry {
            is_directory: file_name.ends_with('/'),
            file_name,
            compression_method: CompressionMethod::from_u16(method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            cd_offset: offset,
            last_mod_time,
            last_mod_date,
        })
    }

    /// List all files in the archive, in central directory order.
    pub fn list_files(&mut self) -> Result<Vec<ZipFileEntry>> {
        let offsets: Vec<u64> = self.index.values().copied().collect();
        offsets
            .into_iter()
            .map(|offset| self.entry_at(offset))
            .collect()
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The local header carries its own name and extra field lengths, which
    /// may differ from the central directory's, so it is read here.
    pub fn data_offset(&mut self, lfh_offset: u64) -> Result<u64> {
        let w = &mut self.window;
        let header = w
            .slice(lfh_offset, lfh::SIZE)
            .map_err(|e| truncated(e, "local header", lfh_offset))?;
        if header[..4] != lfh::SIGNATURE {
            return Err(Error::CorruptArchive(format!(
                "invalid local header at {lfh_offset}"
            )));
        }
        let name_len = u64::from(w.read_u16_le(lfh_offset + lfh::NAME_LEN)?);
        let extra_len = u64::from(w.read_u16_le(lfh_offset + lfh::EXTRA_LEN)?);
        Ok(lfh_offset + lfh::SIZE as u64 + name_len + extra_len)
    }

    /// Opens the content stream of `name`.
    pub fn open(&mut self, name: &str) -> Result<EntryReader<R>> {
        let offset = self
            .find(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.open_at(offset)
    }

    /// Opens the content stream of the entry whose central directory record is at `offset`.
    pub fn open_at(&mut self, offset: u64) -> Result<EntryReader<R>> {
        let entry = self.entry_at(offset)?;
        let data_start = self.data_offset(entry.lfh_offset)?;

        let end = data_start + entry.compressed_size;
        if end > self.window.file_len() {
            return Err(Error::CorruptArchive(format!(
                "{}: data runs past end of archive ({end} > {})",
                entry.file_name,
                self.window.file_len()
            )));
        }

        let raw = RawEntryReader {
            source: Arc::clone(&self.source),
            pos: data_start,
            remaining: entry.compressed_size,
        };
        let inner = match entry.compression_method {
            CompressionMethod::Stored => EntryStream::Stored(raw),
            CompressionMethod::Deflate => {
                EntryStream::Deflated(InflaterReader::new(raw, Framing::Raw))
            }
            CompressionMethod::Unknown(code) => {
                return Err(Error::UnsupportedCompressionMethod(code));
            }
        };
        log::debug!(
            "opened {} ({:?}, {} -> {} bytes at {data_start})",
            entry.file_name,
            entry.compression_method,
            entry.compressed_size,
            entry.uncompressed_size
        );

        Ok(EntryReader { inner, entry })
    }
}

/// Reports a header that would extend past the end of the archive as corruption.
fn truncated(err: Error, what: &str, offset: u64) -> Error {
    match err {
        Error::InvalidRange { .. } => {
            Error::CorruptArchive(format!("{what} at {offset} is truncated"))
        }
        other => other,
    }
}

fn find_eocd<R: ReadAt>(window: &mut Window<R>) -> Result<u64> {
    let file_len = window.file_len();
    if file_len < eocd::SIZE as u64 {
        return Err(Error::CorruptArchive(format!(
            "{file_len} bytes is too small for a ZIP archive"
        )));
    }

    let mut pointer = file_len - eocd::SIZE as u64;
    loop {
        if window.slice(pointer, 4)? == eocd::SIGNATURE {
            return Ok(pointer);
        }
        if pointer == 0 {
            return Err(Error::CorruptArchive(
                "end of central directory record not found".to_string(),
            ));
        }
        pointer -= 1;
    }
}

fn read_comment<R: ReadAt>(window: &mut Window<R>, eocd_offset: u64) -> Result<Vec<u8>> {
    let declared = window.read_u16_le(eocd_offset + eocd::COMMENT_LEN)? as u64;
    let start = eocd_offset + eocd::SIZE as u64;
    let available = window.file_len() - start;
    if declared > available {
        log::warn!("archive comment truncated: {available} of {declared} bytes present");
    }
    window.read_vec(start, declared.min(available) as usize)
}

fn build_index<R: ReadAt>(
    window: &mut Window<R>,
    cd_offset: u64,
    expected: usize,
) -> Result<IndexMap<String, u64>> {
    let file_len = window.file_len();
    let mut index = IndexMap::with_capacity(expected);
    let mut pos = cd_offset;
    let mut records = 0usize;

    while pos + cdfh::SIZE as u64 <= file_len {
        if window.slice(pos, 4)? != cdfh::SIGNATURE {
            break;
        }
        let name_len = u64::from(window.read_u16_le(pos + cdfh::NAME_LEN)?);
        let extra_len = u64::from(window.read_u16_le(pos + cdfh::EXTRA_LEN)?);
        let comment_len = u64::from(window.read_u16_le(pos + cdfh::COMMENT_LEN)?);

        let name_start = pos + cdfh::SIZE as u64;
        if name_start + name_len > file_len {
            log::warn!("central directory record at {pos} has a truncated name");
            break;
        }
        let name = decode_name(window.read_vec(name_start, name_len as usize)?);
        let key = normalize_name(&name).to_string();
        if index.insert(key, pos).is_some() {
            log::warn!("duplicate entry {name:?}; the later record wins");
        }
        records += 1;

        pos = name_start + name_len + extra_len + comment_len;
    }

    if records < expected {
        log::warn!("central directory ended after {records} of {expected} entries");
    }
    Ok(index)
}

/// Length-bounded stream over the raw (possibly compressed) bytes of one entry.
#[derive(Debug)]
pub struct RawEntryReader<R: ReadAt> {
    source: Arc<R>,
    pos: u64,
    remaining: u64,
}

impl<R: ReadAt> RawEntryReader<R> {
    /// Bytes left before the end of the entry data.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl<R: ReadAt> Read for RawEntryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.source.read_at(self.pos, &mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("archive ended at {} inside entry data", self.pos),
            ));
        }
        self.pos += n as u64;
        self.remaining -= n as u64;
        Ok(n)
    }
}

#[derive(Debug)]
enum EntryStream<R: ReadAt> {
    Stored(RawEntryReader<R>),
    Deflated(InflaterReader<RawEntryReader<R>>),
}

/// Decompressed content of one archive entry.
#[derive(Debug)]
pub struct EntryReader<R: ReadAt> {
    inner: EntryStream<R>,
    entry: ZipFileEntry,
}

impl<R: ReadAt> EntryReader<R> {
    pub fn entry(&self) -> &ZipFileEntry {
        &self.entry
    }

    /// Uncompressed size recorded in the central directory.
    pub fn size(&self) -> u64 {
        self.entry.uncompressed_size
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.entry.compression_method
    }

    /// Releases the codec session, if any. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let EntryStream::Deflated(reader) = &mut self.inner {
            reader.close();
        }
    }
}

impl<R: ReadAt> Read for EntryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            EntryStream::Stored(reader) => reader.read(buf),
            EntryStream::Deflated(reader) => reader.read(buf),
        }
    }
}
