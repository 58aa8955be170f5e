//! ZIP archive parsing and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: record layouts, field offsets and entry metadata
//! - [`archive`]: the central directory index and entry content streams
//! - [`extractor`]: high-level extraction API for end users
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The EOCD is read first (from the end of the file), then the Central
//! Directory, so listing never touches entry data.
//!
//! ## Limitations
//!
//! - STORED and DEFLATE only
//! - No ZIP64, encryption or multi-disk archives
//! - Read-only; raw DEFLATE streams can be written with
//!   [`DeflaterWriter`](crate::codec::DeflaterWriter)

pub mod archive;
mod extractor;
pub mod structures;

pub use archive::{EntryReader, RawEntryReader, ZipArchive};
pub use extractor::ZipExtractor;
pub use structures::{CompressionMethod, ZipFileEntry};
