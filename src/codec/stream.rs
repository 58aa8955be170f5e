//! `Read`/`Write` adapters that drive a codec session to completion.

use std::io::{self, Read, Write};

use super::{
    CompressEngine, DecompressEngine, Deflater, FlateCompressEngine, FlateDecompressEngine,
    Framing, Inflater, Level,
};
use crate::error::{Error, Result};

/// Size of the internal chunk buffers.
pub const BUFFER_SIZE: usize = 4096;

/// Writer that compresses everything written to it into `inner`.
///
/// Call [`close`](Self::close) or [`finish`](Self::finish) to terminate the
/// stream. Dropping an unclosed writer finishes it on a best-effort basis.
pub struct DeflaterWriter<W: Write, E: CompressEngine = FlateCompressEngine> {
    inner: Option<W>,
    deflater: Deflater<E>,
    buf: Box<[u8]>,
    closed: bool,
}

impl<W: Write, E: CompressEngine> std::fmt::Debug for DeflaterWriter<W, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflaterWriter")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<W: Write> DeflaterWriter<W> {
    /// Creates a raw DEFLATE writer, the framing used inside ZIP entries.
    pub fn new(inner: W, level: Level) -> Self {
        Self::with_deflater(inner, Deflater::new(level, Framing::Raw))
    }
}

impl<W: Write, E: CompressEngine> DeflaterWriter<W, E> {
    pub fn with_deflater(inner: W, deflater: Deflater<E>) -> Self {
        Self {
            inner: Some(inner),
            deflater,
            buf: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            closed: false,
        }
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    /// Uncompressed bytes accepted so far.
    pub fn total_in(&self) -> u64 {
        self.deflater.total_in()
    }

    /// Compressed bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.deflater.total_out()
    }

    fn drain(&mut self) -> Result<()> {
        let n = self.deflater.deflate(&mut self.buf)?;
        if n > 0 {
            let inner = self.inner.as_mut().ok_or(Error::StreamClosed)?;
            inner.write_all(&self.buf[..n])?;
        }
        Ok(())
    }

    /// Terminates the stream, flushes `inner` and releases the engine.
    ///
    /// Closing an already closed writer does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.deflater.finish();
        while !self.deflater.finished() {
            self.drain()?;
        }
        if let Some(inner) = self.inner.as_mut() {
            inner.flush()?;
        }
        self.deflater.dispose();
        self.closed = true;
        Ok(())
    }

    /// Closes the stream and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.close()?;
        self.inner.take().ok_or(Error::StreamClosed)
    }
}

impl<W: Write, E: CompressEngine> Write for DeflaterWriter<W, E> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.closed || self.deflater.finished() {
            return Err(Error::StreamClosed.into());
        }
        if data.is_empty() {
            return Ok(0);
        }
        self.deflater.set_input(data);
        while !self.deflater.needs_input() {
            self.drain()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write, E: CompressEngine> Drop for DeflaterWriter<W, E> {
    fn drop(&mut self) {
        if !self.closed && self.inner.is_some() {
            let _ = self.close();
        }
    }
}

/// Reader that decompresses the bytes pulled from `inner`.
pub struct InflaterReader<R: Read, E: DecompressEngine = FlateDecompressEngine> {
    inner: R,
    inflater: Inflater<E>,
    chunk: Box<[u8]>,
}

impl<R: Read, E: DecompressEngine> std::fmt::Debug for InflaterReader<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InflaterReader")
            .field("total_in", &self.inflater.total_in())
            .field("total_out", &self.inflater.total_out())
            .field("finished", &self.inflater.finished())
            .finish_non_exhaustive()
    }
}

impl<R: Read> InflaterReader<R> {
    pub fn new(inner: R, framing: Framing) -> Self {
        Self::with_inflater(inner, Inflater::new(framing))
    }
}

impl<R: Read, E: DecompressEngine> InflaterReader<R, E> {
    pub fn with_inflater(inner: R, inflater: Inflater<E>) -> Self {
        Self {
            inner,
            inflater,
            chunk: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn total_in(&self) -> u64 {
        self.inflater.total_in()
    }

    pub fn total_out(&self) -> u64 {
        self.inflater.total_out()
    }

    /// Releases the engine. Further reads fail with [`Error::InvalidSession`].
    pub fn close(&mut self) {
        self.inflater.dispose();
    }

    /// Releases the engine and returns the compressed source.
    pub fn into_inner(mut self) -> R {
        self.inflater.dispose();
        self.inner
    }

    fn read_inner(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.inflater.is_disposed() {
            return Err(Error::InvalidSession);
        }
        loop {
            if self.inflater.finished() {
                return Ok(0);
            }
            if self.inflater.needs_dictionary() {
                return Err(Error::MissingDictionary);
            }
            let mut upstream_done = false;
            if self.inflater.needs_input() {
                let n = self.inner.read(&mut self.chunk)?;
                if n == 0 {
                    // The engine may still hold output for input it already took.
                    upstream_done = true;
                } else {
                    self.inflater.set_input(&self.chunk[..n]);
                }
            }

            let pending = self.inflater.remaining();
            let produced = self.inflater.inflate(buf)?;
            if produced > 0 {
                return Ok(produced);
            }
            if upstream_done && !self.inflater.finished() && !self.inflater.needs_dictionary() {
                return Err(Error::UnexpectedEndOfStream);
            }
            if self.inflater.remaining() == pending
                && pending > 0
                && !self.inflater.finished()
                && !self.inflater.needs_dictionary()
            {
                return Err(Error::CodecFault {
                    code: -5,
                    message: "engine made no progress".to_string(),
                });
            }
        }
    }
}

impl<R: Read, E: DecompressEngine> Read for InflaterReader<R, E> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.read_inner(buf).map_err(io::Error::from)
    }
}
