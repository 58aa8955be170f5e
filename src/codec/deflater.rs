use super::{CompressEngine, EngineStatus, FlateCompressEngine, Framing, Level, PendingInput};
use crate::error::{Error, Result};

/// Compression session.
///
/// Input is supplied with [`set_input`](Self::set_input) and drained with
/// [`deflate`](Self::deflate). After [`finish`](Self::finish) the next calls
/// flush the engine until [`finished`](Self::finished) is set.
#[derive(Debug)]
pub struct Deflater<E: CompressEngine = FlateCompressEngine> {
    engine: Option<E>,
    level: Level,
    framing: Framing,
    input: PendingInput,
    finish_requested: bool,
    finished: bool,
    total_in: u64,
    total_out: u64,
}

impl Deflater {
    pub fn new(level: Level, framing: Framing) -> Self {
        Self::with_engine(level, framing)
    }
}

impl<E: CompressEngine> Deflater<E> {
    /// Creates a session over a freshly created engine of type `E`.
    pub fn with_engine(level: Level, framing: Framing) -> Self {
        Self {
            engine: Some(E::create(level, framing)),
            level,
            framing,
            input: PendingInput::default(),
            finish_requested: false,
            finished: false,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Replaces the pending input; unconsumed bytes are discarded.
    pub fn set_input(&mut self, input: &[u8]) {
        let dropped = self.input.replace(input);
        if dropped > 0 {
            log::warn!("deflater input replaced with {dropped} unconsumed bytes pending");
        }
    }

    /// Requests that the next [`deflate`](Self::deflate) calls terminate the stream.
    pub fn finish(&mut self) {
        self.finish_requested = true;
    }

    /// Compresses pending input into `output`, returning the number of bytes produced.
    pub fn deflate(&mut self, output: &mut [u8]) -> Result<usize> {
        let engine = self.engine.as_mut().ok_or(Error::InvalidSession)?;
        let feed = engine.feed(self.input.slice(), output, self.finish_requested);

        self.input.advance(feed.consumed);
        self.total_in += feed.consumed as u64;
        self.total_out += feed.produced as u64;

        match feed.status {
            EngineStatus::Ok => {}
            EngineStatus::StreamEnd => self.finished = true,
            // A compressor has no dictionary path; anything but Ok/StreamEnd is a defect.
            EngineStatus::NeedsDictionary => {
                return Err(Error::CodecProtocolViolation {
                    code: 2,
                    message: "compressor requested a dictionary".to_string(),
                });
            }
            EngineStatus::Fault { code, message } => {
                return Err(Error::CodecProtocolViolation { code, message });
            }
        }
        Ok(feed.produced)
    }

    /// Disposes the engine and recreates it at `level`, discarding in-flight state.
    pub fn set_level(&mut self, level: Level) -> Result<()> {
        if self.engine.is_none() {
            return Err(Error::InvalidSession);
        }
        self.engine = None;
        self.level = level;
        self.engine = Some(E::create(level, self.framing));
        self.input.clear();
        self.finish_requested = false;
        self.finished = false;
        Ok(())
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn needs_input(&self) -> bool {
        self.input.remaining() == 0
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn remaining(&self) -> usize {
        self.input.remaining()
    }

    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Recreates the engine at the current level so a new stream can be written.
    pub fn reset(&mut self) -> Result<()> {
        self.set_level(self.level)?;
        self.total_in = 0;
        self.total_out = 0;
        Ok(())
    }

    /// Releases the engine. Calling this more than once is a no-op.
    pub fn dispose(&mut self) {
        if self.engine.take().is_some() {
            self.input.clear();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.engine.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Inflater;
    use crate::codec::testing::{self, MockEngine};

    #[test]
    fn test_dispose_twice_destroys_once() {
        let (created, destroyed) = testing::counts();
        let mut deflater = Deflater::<MockEngine>::with_engine(Level::DEFAULT, Framing::Raw);
        deflater.dispose();
        deflater.dispose();
        let (c, d) = testing::counts();
        assert_eq!((c - created, d - destroyed), (1, 1));

        let mut out = [0u8; 8];
        assert!(matches!(deflater.deflate(&mut out), Err(Error::InvalidSession)));
        assert!(matches!(
            deflater.set_level(Level::BEST),
            Err(Error::InvalidSession)
        ));
    }

    #[test]
    fn test_set_level_recreates_engine() {
        let (created, destroyed) = testing::counts();
        let mut deflater = Deflater::<MockEngine>::with_engine(Level::FAST, Framing::Raw);
        deflater.set_input(b"pending");
        deflater.set_level(Level::BEST).unwrap();
        assert_eq!(deflater.level(), Level::BEST);
        assert!(deflater.needs_input());
        drop(deflater);
        let (c, d) = testing::counts();
        assert_eq!((c - created, d - destroyed), (2, 2));
    }

    #[test]
    fn test_negative_status_is_protocol_violation() {
        let mut deflater = Deflater::<MockEngine>::with_engine(Level::DEFAULT, Framing::Raw);
        testing::script([EngineStatus::Fault {
            code: -2,
            message: "stream error".into(),
        }]);
        let mut out = [0u8; 8];
        let err = deflater.deflate(&mut out).unwrap_err();
        assert!(matches!(err, Error::CodecProtocolViolation { code: -2, .. }));

        testing::script([EngineStatus::NeedsDictionary]);
        let err = deflater.deflate(&mut out).unwrap_err();
        assert!(matches!(err, Error::CodecProtocolViolation { code: 2, .. }));
    }

    #[test]
    fn test_finish_flag_reaches_engine() {
        let mut deflater = Deflater::<MockEngine>::with_engine(Level::DEFAULT, Framing::Raw);
        deflater.set_input(b"abc");
        let mut out = [0u8; 8];
        deflater.deflate(&mut out).unwrap();
        assert!(!deflater.finished());
        deflater.finish();
        deflater.deflate(&mut out).unwrap();
        assert!(deflater.finished());
    }

    #[test]
    fn test_flate_round_trip_with_small_output() {
        let data = b"0123456789abcdef".repeat(64);
        let mut deflater = Deflater::new(Level::BEST, Framing::Raw);
        deflater.set_input(&data);
        deflater.finish();

        let mut compressed = Vec::new();
        let mut chunk = [0u8; 16];
        while !deflater.finished() {
            let n = deflater.deflate(&mut chunk).unwrap();
            compressed.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(deflater.total_in(), data.len() as u64);
        assert_eq!(deflater.total_out(), compressed.len() as u64);

        let mut inflater = Inflater::new(Framing::Raw);
        inflater.set_input(&compressed);
        let mut out = vec![0u8; data.len() + 64];
        let mut filled = 0;
        while !inflater.finished() {
            filled += inflater.inflate(&mut out[filled..]).unwrap();
        }
        assert_eq!(&out[..filled], &data[..]);
    }
}
