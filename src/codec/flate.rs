//! Engines backed by flate2.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use super::{CodecEngine, CompressEngine, DecompressEngine, EngineStatus, Feed, Framing, Level};

/// zlib's `Z_DATA_ERROR`.
const Z_DATA_ERROR: i32 = -3;
/// zlib's `Z_STREAM_ERROR`.
const Z_STREAM_ERROR: i32 = -2;

/// DEFLATE compressor engine.
pub struct FlateCompressEngine {
    inner: Compress,
}

impl std::fmt::Debug for FlateCompressEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlateCompressEngine")
            .field("total_in", &self.inner.total_in())
            .field("total_out", &self.inner.total_out())
            .finish()
    }
}

impl CompressEngine for FlateCompressEngine {
    fn create(level: Level, framing: Framing) -> Self {
        Self {
            inner: Compress::new(Compression::new(level.get()), !framing.is_raw()),
        }
    }
}

impl CodecEngine for FlateCompressEngine {
    fn feed(&mut self, input: &[u8], output: &mut [u8], finish: bool) -> Feed {
        let flush = if finish {
            FlushCompress::Finish
        } else {
            FlushCompress::None
        };
        let (in_before, out_before) = (self.inner.total_in(), self.inner.total_out());
        let result = self.inner.compress(input, output, flush);
        let consumed = (self.inner.total_in() - in_before) as usize;
        let produced = (self.inner.total_out() - out_before) as usize;

        let status = match result {
            Ok(Status::StreamEnd) => EngineStatus::StreamEnd,
            // BufError only means no progress was possible with these buffers.
            Ok(Status::Ok) | Ok(Status::BufError) => EngineStatus::Ok,
            Err(e) => EngineStatus::Fault {
                code: Z_STREAM_ERROR,
                message: e.to_string(),
            },
        };
        Feed {
            status,
            consumed,
            produced,
        }
    }
}

/// DEFLATE decompressor engine.
pub struct FlateDecompressEngine {
    inner: Decompress,
}

impl std::fmt::Debug for FlateDecompressEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlateDecompressEngine")
            .field("total_in", &self.inner.total_in())
            .field("total_out", &self.inner.total_out())
            .finish()
    }
}

impl DecompressEngine for FlateDecompressEngine {
    fn create(framing: Framing) -> Self {
        Self {
            inner: Decompress::new(!framing.is_raw()),
        }
    }
}

impl CodecEngine for FlateDecompressEngine {
    fn feed(&mut self, input: &[u8], output: &mut [u8], _finish: bool) -> Feed {
        let (in_before, out_before) = (self.inner.total_in(), self.inner.total_out());
        let result = self.inner.decompress(input, output, FlushDecompress::None);
        let consumed = (self.inner.total_in() - in_before) as usize;
        let produced = (self.inner.total_out() - out_before) as usize;

        let status = match result {
            Ok(Status::StreamEnd) => EngineStatus::StreamEnd,
            Ok(Status::Ok) | Ok(Status::BufError) => EngineStatus::Ok,
            Err(e) if e.needs_dictionary().is_some() => EngineStatus::NeedsDictionary,
            Err(e) => EngineStatus::Fault {
                code: Z_DATA_ERROR,
                message: e.to_string(),
            },
        };
        Feed {
            status,
            consumed,
            produced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_engines_round_trip() {
        let data = b"engine level round trip, engine level round trip".repeat(20);

        let mut compressor = FlateCompressEngine::create(Level::DEFAULT, Framing::Raw);
        let mut compressed = vec![0u8; 4096];
        let feed = compressor.feed(&data, &mut compressed, true);
        assert_eq!(feed.status, EngineStatus::StreamEnd);
        assert_eq!(feed.consumed, data.len());
        compressed.truncate(feed.produced);

        let mut decompressor = FlateDecompressEngine::create(Framing::Raw);
        let mut out = vec![0u8; data.len() + 16];
        let feed = decompressor.feed(&compressed, &mut out, false);
        assert_eq!(feed.status, EngineStatus::StreamEnd);
        assert_eq!(&out[..feed.produced], &data[..]);
    }

    #[test]
    fn test_garbage_is_a_fault() {
        let mut decompressor = FlateDecompressEngine::create(Framing::Zlib);
        let mut out = [0u8; 64];
        let feed = decompressor.feed(&[0xFF; 16], &mut out, false);
        assert!(matches!(feed.status, EngineStatus::Fault { code, .. } if code < 0));
    }
}
