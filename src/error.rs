//! Error types for archive and codec operations.
//!
//! Every fallible library operation returns [`Result<T>`]. Faults are scoped
//! the way they are detected: a missing End of Central Directory record fails
//! [`ZipArchive::new`](crate::ZipArchive::new), while a bad compression method
//! or a codec fault only affects the stream of the entry that produced it.
//!
//! Stream adapters implement [`std::io::Read`] and [`std::io::Write`], so their
//! faults travel as [`std::io::Error`]. The typed error is kept as the inner
//! error and can be recovered:
//!
//! ```
//! use runzip::Error;
//!
//! fn codec_error(err: &std::io::Error) -> Option<&Error> {
//!     err.get_ref().and_then(|inner| inner.downcast_ref::<Error>())
//! }
//! ```

use std::io;

/// Errors produced by the checksum, codec, window and ZIP layers.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A window seek fell outside the file or exceeded the window capacity.
    #[error(
        "invalid range: {length} bytes at offset {start} (file length {file_len}, window capacity {capacity})"
    )]
    InvalidRange {
        start: u64,
        length: usize,
        file_len: u64,
        capacity: usize,
    },

    /// The archive structure could not be located or is malformed.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// No entry with the requested name exists in the archive.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The entry uses a compression method other than stored or deflated.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompressionMethod(u16),

    /// The decompression engine reported a fault status.
    #[error("codec fault (status {code}): {message}")]
    CodecFault { code: i32, message: String },

    /// The compression engine reported a status it must never produce.
    #[error("codec protocol violation (status {code}): {message}")]
    CodecProtocolViolation { code: i32, message: String },

    /// The compressed stream requires a preset dictionary.
    #[error("compressed stream requires a preset dictionary")]
    MissingDictionary,

    /// The compressed source ended before the codec saw the end-of-stream marker.
    #[error("compressed stream ended unexpectedly")]
    UnexpectedEndOfStream,

    /// The codec session was used after it was disposed.
    #[error("codec session has been disposed")]
    InvalidSession,

    /// Data was written after the compressor finished.
    #[error("stream is closed")]
    StreamClosed,

    /// Decompressed content did not match the recorded CRC-32.
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true for faults that are confined to one entry stream.
    pub fn is_entry_scoped(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedCompressionMethod(_)
                | Error::CodecFault { .. }
                | Error::MissingDictionary
                | Error::UnexpectedEndOfStream
                | Error::ChecksumMismatch { .. }
        )
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            Error::InvalidRange { .. } => io::ErrorKind::InvalidInput,
            Error::EntryNotFound(_) => io::ErrorKind::NotFound,
            Error::UnsupportedCompressionMethod(_) => io::ErrorKind::Unsupported,
            Error::UnexpectedEndOfStream => io::ErrorKind::UnexpectedEof,
            Error::InvalidSession | Error::StreamClosed => io::ErrorKind::BrokenPipe,
            Error::CorruptArchive(_)
            | Error::CodecFault { .. }
            | Error::CodecProtocolViolation { .. }
            | Error::MissingDictionary
            | Error::ChecksumMismatch { .. } => io::ErrorKind::InvalidData,
            Error::Io(e) => e.kind(),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}

/// Recovers the typed error carried by an [`io::Error`] returned from a stream adapter.
pub(crate) fn from_io(err: io::Error) -> Error {
    if err.get_ref().is_none() {
        return Error::Io(err);
    }
    let kind = err.kind();
    match err.into_inner().map(|inner| inner.downcast::<Error>()) {
        Some(Ok(typed)) => *typed,
        Some(Err(other)) => Error::Io(io::Error::new(kind, other)),
        None => Error::Io(io::Error::from(kind)),
    }
}
