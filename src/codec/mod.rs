//! Streaming DEFLATE/INFLATE codec bridge.
//!
//! The actual compression work is delegated to a [`CodecEngine`]. The default
//! engines wrap [`flate2::Compress`] and [`flate2::Decompress`]; tests plug in
//! their own. On top of the engine boundary this module provides:
//!
//! - [`Inflater`] and [`Deflater`]: stateful sessions that own the engine,
//!   track pending input and translate engine status codes into [`Error`]s
//! - [`InflaterReader`] and [`DeflaterWriter`]: `Read`/`Write` adapters that
//!   drive a session to completion over arbitrary-sized reads and writes
//!
//! [`Error`]: crate::Error

mod deflater;
mod flate;
mod inflater;
pub mod stream;

pub use deflater::Deflater;
pub use flate::{FlateCompressEngine, FlateDecompressEngine};
pub use inflater::Inflater;
pub use stream::{DeflaterWriter, InflaterReader};

/// Stream framing around the DEFLATE data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Bare DEFLATE blocks, as embedded in ZIP entries.
    Raw,
    /// Two-byte zlib header and Adler-32 trailer.
    Zlib,
}

impl Framing {
    pub fn is_raw(self) -> bool {
        self == Framing::Raw
    }
}

/// Compression level, clamped to `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level(u32);

impl Level {
    pub const NONE: Level = Level(0);
    pub const FAST: Level = Level(1);
    pub const DEFAULT: Level = Level(6);
    pub const BEST: Level = Level(9);

    pub fn new(level: u32) -> Self {
        Level(level.min(9))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::DEFAULT
    }
}

/// Status reported by an engine after one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Ok,
    StreamEnd,
    NeedsDictionary,
    Fault { code: i32, message: String },
}

impl EngineStatus {
    /// zlib-style numeric code: 0 ok, 1 stream end, 2 needs dictionary, negative fault.
    pub fn code(&self) -> i32 {
        match self {
            EngineStatus::Ok => 0,
            EngineStatus::StreamEnd => 1,
            EngineStatus::NeedsDictionary => 2,
            EngineStatus::Fault { code, .. } => *code,
        }
    }
}

/// Outcome of a single [`CodecEngine::feed`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub status: EngineStatus,
    pub consumed: usize,
    pub produced: usize,
}

/// One live instance of an external compression or decompression engine.
///
/// Dropping the engine releases it, so a session that holds an engine by
/// value can never reach a destroyed one.
pub trait CodecEngine {
    /// Advances the engine over `input`, writing into `output`.
    ///
    /// `finish` asks a compressor to flush and terminate the stream; it is
    /// ignored by decompressors.
    fn feed(&mut self, input: &[u8], output: &mut [u8], finish: bool) -> Feed;
}

/// Engine that can be created for compression.
pub trait CompressEngine: CodecEngine + Sized {
    fn create(level: Level, framing: Framing) -> Self;
}

/// Engine that can be created for decompression.
pub trait DecompressEngine: CodecEngine + Sized {
    fn create(framing: Framing) -> Self;
}

/// Input handed to a session but not yet consumed by its engine.
#[derive(Debug, Default)]
struct PendingInput {
    data: Vec<u8>,
    pos: usize,
}

impl PendingInput {
    /// Replaces the pending slice, returning how many unconsumed bytes were dropped.
    fn replace(&mut self, input: &[u8]) -> usize {
        let dropped = self.remaining();
        self.data.clear();
        self.data.extend_from_slice(input);
        self.pos = 0;
        dropped
    }

    fn slice(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.data.len());
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn clear(&mut self) {
        self.data.clear();
        self.pos = 0;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_clamped() {
        assert_eq!(Level::new(100).get(), 9);
        assert_eq!(Level::new(3).get(), 3);
        assert_eq!(Level::default(), Level::DEFAULT);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(EngineStatus::Ok.code(), 0);
        assert_eq!(EngineStatus::StreamEnd.code(), 1);
        assert_eq!(EngineStatus::NeedsDictionary.code(), 2);
        let fault = EngineStatus::Fault {
            code: -3,
            message: "bad".into(),
        };
        assert_eq!(fault.code(), -3);
    }

    #[test]
    fn test_pending_input_replace_reports_dropped() {
        let mut pending = PendingInput::default();
        assert_eq!(pending.replace(b"abcdef"), 0);
        pending.advance(2);
        assert_eq!(pending.slice(), b"cdef");
        assert_eq!(pending.replace(b"xy"), 4);
        assert_eq!(pending.remaining(), 2);
    }
}
