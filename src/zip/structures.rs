//! On-disk ZIP record layouts.
//!
//! Only the fields the reader consumes are named here. All multi-byte fields
//! are little-endian and read through [`Window::read_u16_le`] /
//! [`Window::read_u32_le`].
//!
//! [`Window::read_u16_le`]: crate::io::Window::read_u16_le
//! [`Window::read_u32_le`]: crate::io::Window::read_u32_le

use std::path::{Component, Path, PathBuf};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub mod eocd {
    pub const SIGNATURE: [u8; 4] = *b"PK\x05\x06";
    pub const SIZE: usize = 22;
    pub const TOTAL_ENTRIES: u64 = 10;
    pub const CD_OFFSET: u64 = 16;
    pub const COMMENT_LEN: u64 = 20;
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub mod cdfh {
    pub const SIGNATURE: [u8; 4] = *b"PK\x01\x02";
    pub const SIZE: usize = 46;
    pub const LAST_MOD_TIME: u64 = 12;
    pub const LAST_MOD_DATE: u64 = 14;
    pub const METHOD: u64 = 10;
    pub const CRC32: u64 = 16;
    pub const COMPRESSED_SIZE: u64 = 20;
    pub const UNCOMPRESSED_SIZE: u64 = 24;
    pub const NAME_LEN: u64 = 28;
    pub const EXTRA_LEN: u64 = 30;
    pub const COMMENT_LEN: u64 = 32;
    pub const LFH_OFFSET: u64 = 42;
}

/// Local File Header (LFH) - 30 bytes
pub mod lfh {
    pub const SIGNATURE: [u8; 4] = *b"PK\x03\x04";
    pub const SIZE: usize = 30;
    pub const NAME_LEN: u64 = 26;
    pub const EXTRA_LEN: u64 = 28;
}

/// Decodes an entry name, falling back to Latin-1 for non-UTF-8 bytes.
pub fn decode_name(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(name) => name,
        Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

/// Strips the leading slashes ZIP lookups ignore.
pub fn normalize_name(name: &str) -> &str {
    name.trim_start_matches('/')
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    /// Offset of this entry's central directory record.
    pub cd_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    /// Relative path to extract this entry to, or `None` if the name could
    /// escape the target directory.
    ///
    /// Leading slashes are ignored like in lookups. Any `..`, root or drive
    /// prefix component left after that rejects the name, as does a NUL byte.
    pub fn enclosed_name(&self) -> Option<PathBuf> {
        let name = normalize_name(&self.file_name);
        if name.contains('\0') {
            return None;
        }
        let mut path = PathBuf::new();
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        (!path.as_os_str().is_empty()).then_some(path)
    }
}
