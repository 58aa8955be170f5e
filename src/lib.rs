//! # runzip
//!
//! A Rust unzip utility built on a windowed random-access ZIP reader and a
//! streaming DEFLATE codec bridge.
//!
//! ## Features
//!
//! - Read ZIP archives from local files, memory, or HTTP/HTTPS URLs using Range requests
//! - Directory parsing through a small sliding window, so listing a large archive
//!   costs a handful of reads
//! - STORED and DEFLATE entries, streamed with CRC-32 verification
//! - Stateful [`Inflater`]/[`Deflater`] sessions and `Read`/`Write` adapters over them
//!
//! ## Example
//!
//! ```no_run
//! use std::io::Read;
//! use std::path::Path;
//! use std::sync::Arc;
//! use runzip::{LocalFileReader, ZipArchive};
//!
//! fn main() -> runzip::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new(Path::new("archive.zip"))?);
//!     let mut archive = ZipArchive::new(reader)?;
//!
//!     for name in archive.names() {
//!         println!("{name}");
//!     }
//!
//!     let mut content = String::new();
//!     archive.open("/docs/readme.txt")?.read_to_string(&mut content)?;
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod cli;
pub mod codec;
pub mod error;
pub mod io;
pub mod zip;

pub use checksum::{Crc32, Crc32Reader, crc32};
pub use cli::Cli;
pub use codec::{Deflater, DeflaterWriter, Framing, Inflater, InflaterReader, Level};
pub use error::{Error, Result};
pub use io::{DEFAULT_WINDOW_SIZE, HttpRangeReader, LocalFileReader, ReadAt, Window};
pub use zip::{EntryReader, ZipArchive, ZipExtractor, ZipFileEntry};
