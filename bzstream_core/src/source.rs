use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::{Buf, Bytes};

use crate::codec::{CodecFactory, StepResult};
use crate::config::StreamConfig;
use crate::driver::Driver;
use crate::error::StreamError;

/// Lifecycle of a [`FileSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Codec and descriptor are live.
    Open,
    /// The descriptor hit end of file; the codec may still hold output.
    Draining,
    /// Codec disposed, descriptor closed. Only [`FileSource::reopen`] leaves
    /// this state.
    Closed,
}

/// Pull-based source that reads a file and runs it through a codec.
///
/// # Pull contract
/// Each [`pull`](FileSource::pull) reads at most `size` bytes from the file
/// and makes one codec call with an output buffer of `size` bytes. Once the
/// file is exhausted, a transform call that stalls with input still pending
/// is followed by a finish call in the same pull.
/// The chunk it returns may be empty: the codec is still buffering. `Ok(None)`
/// signals end of stream, after which the source is [`StreamState::Closed`].
///
/// A codec call that makes no progress only closes the source once the file is
/// exhausted and no input is pending; before that it merely means the codec
/// wants more input.
pub struct FileSource {
    path: PathBuf,
    file: Option<File>,
    driver: Driver,
    factory: CodecFactory,
    state: StreamState,
    /// Unread tail of the last chunk handed out through `io::Read`.
    leftover: Bytes,
}

impl FileSource {
    /// Open `path` and initialize a codec from `factory`.
    pub fn open(
        path: impl AsRef<Path>,
        factory: CodecFactory,
        config: &StreamConfig,
    ) -> Result<Self, StreamError> {
        let path = path.as_ref().to_path_buf();
        let file = open_read(&path)?;
        let driver = Driver::new(factory()?, config)?;
        tracing::debug!(path = %path.display(), "file source opened");
        Ok(Self {
            path,
            file: Some(file),
            driver,
            factory,
            state: StreamState::Open,
            leftover: Bytes::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Produce the next chunk of codec output, or `None` at end of stream.
    pub fn pull(&mut self, size: usize) -> Result<Option<Bytes>, StreamError> {
        let size = size.max(1);
        match self.state {
            StreamState::Closed => return Err(StreamError::Misuse("pull from a closed stream")),
            StreamState::Open => {
                let mut buf = vec![0u8; size];
                let n = read_some(self.file.as_mut(), &mut buf)?;
                if n == 0 {
                    tracing::debug!(path = %self.path.display(), "end of file, draining");
                    self.state = StreamState::Draining;
                } else {
                    self.driver.accept(&buf[..n])?;
                }
            }
            StreamState::Draining => {}
        }

        let (step, chunk) = self.pass(size)?;
        if self.state == StreamState::Draining && step.is_stalled() && self.driver.pending_len() == 0 {
            self.close();
            return Ok(None);
        }
        Ok(Some(chunk))
    }

    /// One bounded codec call, or two when a draining transform call stalls.
    /// Once the file is exhausted and nothing is pending, the call goes
    /// through the finish phase instead.
    fn pass(&mut self, size: usize) -> Result<(StepResult, Bytes), StreamError> {
        if self.state != StreamState::Draining {
            return self.driver.transform_once(size);
        }
        if self.driver.pending_len() == 0 {
            return self.driver.finish_once(size);
        }
        let (step, chunk) = self.driver.transform_once(size)?;
        if step.is_stalled() {
            return self.driver.finish_once(size);
        }
        Ok((step, chunk))
    }

    /// Dispose the codec and close the descriptor. Idempotent.
    pub fn close(&mut self) {
        self.driver.dispose();
        self.leftover = Bytes::new();
        if self.file.take().is_some() {
            tracing::debug!(path = %self.path.display(), "file source closed");
        }
        self.state = StreamState::Closed;
    }

    /// Reopen the same path from the start with a freshly initialized codec.
    pub fn reopen(&mut self) -> Result<(), StreamError> {
        self.close();
        let file = open_read(&self.path)?;
        self.driver.reset((self.factory)()?);
        self.file = Some(file);
        self.state = StreamState::Open;
        tracing::debug!(path = %self.path.display(), "file source reopened");
        Ok(())
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.leftover.is_empty() {
            if self.state == StreamState::Closed {
                return Ok(0);
            }
            match self.pull(self.driver.output_buf_size())? {
                Some(chunk) => self.leftover = chunk,
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.leftover.len());
        buf[..n].copy_from_slice(&self.leftover[..n]);
        self.leftover.advance(n);
        Ok(n)
    }
}

fn open_read(path: &Path) -> Result<File, StreamError> {
    File::open(path).map_err(|source| StreamError::Resource {
        path: path.to_path_buf(),
        source,
    })
}

fn read_some(file: Option<&mut File>, buf: &mut [u8]) -> Result<usize, StreamError> {
    let file = file.ok_or(StreamError::Misuse("read from a closed descriptor"))?;
    loop {
        match file.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
