use super::{DecompressEngine, EngineStatus, FlateDecompressEngine, Framing, PendingInput};
use crate::error::{Error, Result};

/// Decompression session.
///
/// Feed compressed bytes with [`set_input`](Self::set_input), then call
/// [`inflate`](Self::inflate) until it stops producing output. When
/// [`needs_input`](Self::needs_input) becomes true the caller supplies the next
/// chunk. The session ends when [`finished`](Self::finished) is set.
///
/// ```
/// use runzip::codec::{Framing, Inflater};
///
/// // Raw DEFLATE encoding of "hi", one final stored block.
/// let compressed = [0x01, 0x02, 0x00, 0xfd, 0xff, b'h', b'i'];
/// let mut inflater = Inflater::new(Framing::Raw);
/// inflater.set_input(&compressed);
/// let mut out = [0u8; 8];
/// let n = inflater.inflate(&mut out).unwrap();
/// assert_eq!(&out[..n], b"hi");
/// assert!(inflater.finished());
/// ```
#[derive(Debug)]
pub struct Inflater<E: DecompressEngine = FlateDecompressEngine> {
    engine: Option<E>,
    framing: Framing,
    input: PendingInput,
    finished: bool,
    needs_dictionary: bool,
    total_in: u64,
    total_out: u64,
}

impl Inflater {
    pub fn new(framing: Framing) -> Self {
        Self::with_engine(framing)
    }
}

impl<E: DecompressEngine> Inflater<E> {
    /// Creates a session over a freshly created engine of type `E`.
    pub fn with_engine(framing: Framing) -> Self {
        Self {
            engine: Some(E::create(framing)),
            framing,
            input: PendingInput::default(),
            finished: false,
            needs_dictionary: false,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Replaces the pending input.
    ///
    /// Input that has not been consumed yet is discarded; callers should only
    /// supply more data once [`needs_input`](Self::needs_input) is true.
    pub fn set_input(&mut self, input: &[u8]) {
        let dropped = self.input.replace(input);
        if dropped > 0 {
            log::warn!("inflater input replaced with {dropped} unconsumed bytes pending");
        }
    }

    /// Decompresses pending input into `output`, returning the number of bytes produced.
    pub fn inflate(&mut self, output: &mut [u8]) -> Result<usize> {
        let engine = self.engine.as_mut().ok_or(Error::InvalidSession)?;
        let feed = engine.feed(self.input.slice(), output, false);

        self.input.advance(feed.consumed);
        self.total_in += feed.consumed as u64;
        self.total_out += feed.produced as u64;

        match feed.status {
            EngineStatus::Ok => {}
            EngineStatus::StreamEnd => self.finished = true,
            EngineStatus::NeedsDictionary => self.needs_dictionary = true,
            EngineStatus::Fault { code, message } => {
                return Err(Error::CodecFault { code, message });
            }
        }
        Ok(feed.produced)
    }

    /// True when all pending input has been consumed.
    pub fn needs_input(&self) -> bool {
        self.input.remaining() == 0
    }

    pub fn needs_dictionary(&self) -> bool {
        self.needs_dictionary
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Bytes of pending input not yet consumed.
    pub fn remaining(&self) -> usize {
        self.input.remaining()
    }

    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Recreates the engine so the session can decode a new stream.
    pub fn reset(&mut self) -> Result<()> {
        if self.engine.is_none() {
            return Err(Error::InvalidSession);
        }
        self.engine = Some(E::create(self.framing));
        self.input.clear();
        self.finished = false;
        self.needs_dictionary = false;
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
