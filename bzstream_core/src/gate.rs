use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::StreamError;

/// Answer from a downstream consumer after it took one chunk.
///
/// `Saturated` still means the chunk was taken; it asks the producer not to
/// send another one until it is told the consumer has drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Accepted,
    Saturated,
}

impl Signal {
    #[inline]
    pub fn is_saturated(self) -> bool {
        self == Signal::Saturated
    }
}

/// Consumer of output chunks.
pub trait Downstream {
    fn forward(&mut self, chunk: Bytes) -> Result<Signal, StreamError>;
}

/// In-memory collector: never saturates.
impl Downstream for Vec<u8> {
    fn forward(&mut self, chunk: Bytes) -> Result<Signal, StreamError> {
        self.extend_from_slice(&chunk);
        Ok(Signal::Accepted)
    }
}

impl<D: Downstream + ?Sized> Downstream for &mut D {
    fn forward(&mut self, chunk: Bytes) -> Result<Signal, StreamError> {
        (**self).forward(chunk)
    }
}

/// Bounded FIFO of output chunks.
///
/// Reports [`Signal::Saturated`] once the buffered byte count reaches the
/// high-water mark. Popping below the mark is the drain notification the
/// owner of the queue reacts to.
#[derive(Debug)]
pub struct ChunkQueue {
    chunks: VecDeque<Bytes>,
    buffered: usize,
    high_water_mark: usize,
}

impl ChunkQueue {
    pub fn new(high_water_mark: usize) -> Self {
        Self {
            chunks: VecDeque::new(),
            buffered: 0,
            high_water_mark,
        }
    }

    pub fn pop(&mut self) -> Option<Bytes> {
        let chunk = self.chunks.pop_front()?;
        self.buffered -= chunk.len();
        Some(chunk)
    }

    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.buffered >= self.high_water_mark
    }

    /// Bytes currently queued.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffered
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl Downstream for ChunkQueue {
    fn forward(&mut self, chunk: Bytes) -> Result<Signal, StreamError> {
        self.buffered += chunk.len();
        self.chunks.push_back(chunk);
        Ok(if self.is_saturated() {
            Signal::Saturated
        } else {
            Signal::Accepted
        })
    }
}
