use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use bytes::Bytes;

use crate::codec::StreamCodec;
use crate::config::StreamConfig;
use crate::driver::Driver;
use crate::error::StreamError;
use crate::gate::{Downstream, Signal};

/// Push-based sink: codec output goes straight to a writer.
///
/// # Write contract
/// Every produced chunk is written with a single `write` call and must be
/// accepted in full; a short write is fatal. Writes are synchronous, so the
/// sink never applies backpressure. Call [`finish`](CodecSink::finish) to
/// flush the codec and close the writer. Dropping an unfinished sink discards
/// whatever the codec still buffers.
pub struct CodecSink<W: Write> {
    driver: Driver,
    out: ChunkWriter<W>,
}

/// Sink writing to a file descriptor.
pub type FileSink = CodecSink<File>;

impl FileSink {
    /// Create (or truncate) `path` and write codec output to it.
    pub fn create(
        path: impl AsRef<Path>,
        codec: Box<dyn StreamCodec>,
        config: &StreamConfig,
    ) -> Result<Self, StreamError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| StreamError::Resource {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "file sink opened");
        Self::new(file, codec, config)
    }
}

impl<W: Write> CodecSink<W> {
    pub fn new(writer: W, codec: Box<dyn StreamCodec>, config: &StreamConfig) -> Result<Self, StreamError> {
        Ok(Self {
            driver: Driver::new(codec, config)?,
            out: ChunkWriter {
                inner: Some(writer),
                written: 0,
            },
        })
    }

    /// Run `input` through the codec and write whatever it produces.
    pub fn push(&mut self, input: &[u8]) -> Result<(), StreamError> {
        let res = self.driver.feed(input, &mut self.out);
        self.poison_on_error(res).map(|_| ())
    }

    /// Flush the codec, dispose it and close the writer.
    ///
    /// Returns the total number of bytes written. Calling `finish` again
    /// writes nothing.
    pub fn finish(&mut self) -> Result<u64, StreamError> {
        self.finalize()?;
        self.out.inner = None;
        Ok(self.out.written)
    }

    /// Like [`finish`](CodecSink::finish) but hands the writer back.
    pub fn finish_into_inner(mut self) -> Result<W, StreamError> {
        self.finalize()?;
        self.out
            .inner
            .take()
            .ok_or(StreamError::Misuse("sink already closed"))
    }

    /// Compressed bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.out.written
    }

    fn finalize(&mut self) -> Result<(), StreamError> {
        if !self.driver.is_ended() {
            let res = self.driver.finalize(&mut self.out);
            self.poison_on_error(res)?;
        }
        self.driver.dispose();
        if let Some(inner) = self.out.inner.as_mut() {
            inner.flush()?;
        }
        Ok(())
    }

    /// Failures are fatal: the codec and the writer are released so that any
    /// further use reports misuse instead of writing a corrupt stream.
    fn poison_on_error<T>(&mut self, res: Result<T, StreamError>) -> Result<T, StreamError> {
        if let Err(err) = &res {
            tracing::debug!(error = %err, "sink failed, releasing codec and writer");
            self.driver.dispose();
            self.out.inner = None;
        }
        res
    }
}

impl<W: Write> Write for CodecSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf)?;
        Ok(buf.len())
    }

    /// Flushes the underlying writer only; the codec keeps its buffered state.
    fn flush(&mut self) -> io::Result<()> {
        match self.out.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

struct ChunkWriter<W> {
    inner: Option<W>,
    written: u64,
}

impl<W: Write> Downstream for ChunkWriter<W> {
    fn forward(&mut self, chunk: Bytes) -> Result<Signal, StreamError> {
        let inner = self
            .inner
            .as_mut()
            .ok_or(StreamError::Misuse("write to a closed sink"))?;
        let written = inner.write(&chunk)?;
        if written != chunk.len() {
            return Err(StreamError::ShortWrite {
                written,
                expected: chunk.len(),
            });
        }
        self.written += written as u64;
        Ok(Signal::Accepted)
    }
}
