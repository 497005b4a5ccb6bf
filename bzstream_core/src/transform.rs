use bytes::Bytes;

use crate::codec::StreamCodec;
use crate::config::StreamConfig;
use crate::driver::{Driver, Flow};
use crate::error::StreamError;
use crate::gate::{ChunkQueue, Downstream, Signal};
use crate::trace::TraceSummary;

/// Push-based transform stream.
///
/// Input is written in chunks of any size; output accumulates in a bounded
/// [`ChunkQueue`] that the consumer drains with [`read`](TransformStream::read).
/// When the queue reaches its high-water mark the driver pauses, and it
/// resumes automatically once a read brings the queue back under the mark.
///
/// ```ignore
/// let mut stream = TransformStream::new(codec, &StreamConfig::default())?;
/// stream.write(b"payload")?;
/// stream.end()?;
/// while let Some(chunk) = stream.read()? {
///     sink.extend_from_slice(&chunk);
/// }
/// assert!(stream.is_finished());
/// ```
pub struct TransformStream {
    driver: Driver,
    queue: ChunkQueue,
    flow: Flow,
}

impl TransformStream {
    pub fn new(codec: Box<dyn StreamCodec>, config: &StreamConfig) -> Result<Self, StreamError> {
        Ok(Self {
            driver: Driver::new(codec, config)?,
            queue: ChunkQueue::new(config.high_water_mark),
            flow: Flow::Idle,
        })
    }

    /// Feed one input chunk.
    ///
    /// Returns `false` when the output queue is saturated: the chunk has been
    /// buffered, but the caller should read before writing more.
    pub fn write(&mut self, chunk: &[u8]) -> Result<bool, StreamError> {
        if self.flow == Flow::Paused {
            self.driver.accept(chunk)?;
            return Ok(false);
        }
        let flow = self.driver.feed(chunk, &mut self.queue)?;
        self.settle(flow);
        Ok(self.flow != Flow::Paused)
    }

    /// Signal that no more input will be written and flush the codec.
    ///
    /// Calling `end` again, or after the stream ended on its own, is a no-op.
    pub fn end(&mut self) -> Result<(), StreamError> {
        if self.driver.is_ended() {
            return Ok(());
        }
        self.driver.close_input();
        if self.flow != Flow::Paused {
            let flow = self.driver.resume(&mut self.queue)?;
            self.settle(flow);
        }
        Ok(())
    }

    /// Take the next output chunk, if one is queued.
    ///
    /// `None` only means nothing is queued right now; use
    /// [`is_finished`](TransformStream::is_finished) to tell end of stream.
    pub fn read(&mut self) -> Result<Option<Bytes>, StreamError> {
        let chunk = self.queue.pop();
        if self.flow == Flow::Paused && !self.queue.is_saturated() {
            tracing::trace!(queued = self.queue.buffered(), "output drained, resuming");
            let flow = self.driver.resume(&mut self.queue)?;
            self.settle(flow);
        }
        Ok(chunk)
    }

    /// Move queued output into `downstream` until it saturates or the queue
    /// is empty.
    pub fn pipe_to<D: Downstream>(&mut self, downstream: &mut D) -> Result<Signal, StreamError> {
        while let Some(chunk) = self.read()? {
            if downstream.forward(chunk)?.is_saturated() {
                return Ok(Signal::Saturated);
            }
        }
        Ok(Signal::Accepted)
    }

    /// The codec reached end of stream and every chunk has been read.
    pub fn is_finished(&self) -> bool {
        self.flow == Flow::Ended && self.queue.is_empty()
    }

    pub fn is_paused(&self) -> bool {
        self.flow == Flow::Paused
    }

    pub fn queued_bytes(&self) -> usize {
        self.queue.buffered()
    }

    pub fn queued_chunks(&self) -> usize {
        self.queue.len()
    }

    pub fn trace_summary(&self) -> TraceSummary {
        self.driver.trace_summary()
    }

    fn settle(&mut self, flow: Flow) {
        self.flow = flow;
        if flow == Flow::Ended {
            self.driver.dispose();
        }
    }
}

/// Writing into a transform stream applies its own backpressure to the
/// producer, so streams chain: `compress.pipe_to(&mut decompress)`.
impl Downstream for TransformStream {
    fn forward(&mut self, chunk: Bytes) -> Result<Signal, StreamError> {
        Ok(if self.write(&chunk)? {
            Signal::Accepted
        } else {
            Signal::Saturated
        })
    }
}

/// Drain `source` into `sink` honouring the sink's backpressure.
pub fn pipe<D: Downstream>(source: &mut TransformStream, sink: &mut D) -> Result<Signal, StreamError> {
    source.pipe_to(sink)
}
