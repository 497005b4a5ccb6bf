//! The transform driver loop.
//!
//! A [`Driver`] owns one codec and the input it has not consumed yet. Each
//! activation offers the whole pending buffer to the codec with a fresh
//! fixed-capacity output buffer, trims whatever the codec consumed and forwards
//! every non-empty output chunk downstream before making the next call. The
//! loop halts as soon as downstream reports saturation; [`Driver::resume`]
//! picks up from the current pending state once it has drained.

use bytes::{Bytes, BytesMut};

use crate::accumulator::Accumulator;
use crate::codec::{StepResult, StreamCodec};
use crate::config::{StreamConfig, DEFAULT_OUTPUT_BUF_SIZE};
use crate::error::{CodecFault, StreamError};
use crate::gate::Downstream;
use crate::trace::{Phase, Trace, TraceRecord, TraceSummary};

/// Why a driver activation returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The codec needs more input (or a finalize) to make progress.
    Idle,
    /// Downstream is saturated; call [`Driver::resume`] after it drains.
    Paused,
    /// The stream is complete. The codec will not be called again.
    Ended,
}

pub struct Driver {
    codec: Option<Box<dyn StreamCodec>>,
    name: &'static str,
    pending: Accumulator,
    output_buf_size: usize,
    max_finish_iterations: usize,
    finish_calls: usize,
    /// Output capacity offered to `finish` so far.
    finish_capacity: u64,
    trace: Trace,
    /// No more input will arrive; drain pending input then run the finish phase.
    closing: bool,
    ended: bool,
}

impl Driver {
    pub fn new(codec: Box<dyn StreamCodec>, config: &StreamConfig) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self {
            name: codec.name(),
            trace: Trace::new(codec.direction(), config.verbose),
            codec: Some(codec),
            pending: Accumulator::new(),
            output_buf_size: config.output_buf_size,
            max_finish_iterations: config.max_finish_iterations,
            finish_calls: 0,
            finish_capacity: 0,
            closing: false,
            ended: false,
        })
    }

    /// Replace the codec with a freshly initialized one and forget all
    /// buffered input.
    pub fn reset(&mut self, codec: Box<dyn StreamCodec>) {
        self.name = codec.name();
        self.trace = Trace::new(codec.direction(), self.trace.enabled());
        self.codec = Some(codec);
        self.pending.clear();
        self.finish_calls = 0;
        self.finish_capacity = 0;
        self.closing = false;
        self.ended = false;
    }

    /// Drop the codec state. Idempotent.
    pub fn dispose(&mut self) {
        if self.codec.take().is_some() {
            tracing::debug!(label = self.trace.label(), codec = self.name, "codec disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.codec.is_none()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn output_buf_size(&self) -> usize {
        self.output_buf_size
    }

    pub fn trace_summary(&self) -> TraceSummary {
        self.trace.summary()
    }

    /// Queue `input` without running the codec.
    pub fn accept(&mut self, input: &[u8]) -> Result<(), StreamError> {
        if self.closing {
            return Err(StreamError::Misuse("write after end of input"));
        }
        if self.ended {
            self.discard_trailing(input.len());
            return Ok(());
        }
        if self.codec.is_none() {
            return Err(StreamError::Misuse("write to a disposed codec"));
        }
        self.pending.append(input);
        Ok(())
    }

    /// Append `input` and run the transform loop.
    pub fn feed<D: Downstream>(&mut self, input: &[u8], downstream: &mut D) -> Result<Flow, StreamError> {
        self.accept(input)?;
        self.resume(downstream)
    }

    /// Declare the end of input and run the finish phase.
    ///
    /// Pending input is drained first. Finalizing an already ended stream
    /// forwards nothing.
    pub fn finalize<D: Downstream>(&mut self, downstream: &mut D) -> Result<Flow, StreamError> {
        self.close_input();
        self.resume(downstream)
    }

    /// Declare the end of input without running the codec. The finish phase
    /// runs on the next [`resume`](Driver::resume).
    pub fn close_input(&mut self) {
        self.closing = true;
    }

    /// Re-enter the loop, typically after a drain notification.
    pub fn resume<D: Downstream>(&mut self, downstream: &mut D) -> Result<Flow, StreamError> {
        if self.ended {
            self.drop_pending();
            return Ok(Flow::Ended);
        }
        match self.run_transform(downstream)? {
            Flow::Idle if self.closing => self.run_finish(downstream),
            flow => Ok(flow),
        }
    }

    fn run_transform<D: Downstream>(&mut self, downstream: &mut D) -> Result<Flow, StreamError> {
        let capacity = self.output_buf_size;
        loop {
            if self.pending.is_empty() && self.closing {
                return Ok(Flow::Idle);
            }
            let (step, chunk) = self.call(Phase::Transform, capacity)?;
            let saturated = self.forward(chunk, downstream)?;

            if step.end_of_stream {
                self.mark_ended();
                return Ok(Flow::Ended);
            }
            if saturated {
                return Ok(Flow::Paused);
            }
            if step.is_stalled() {
                return Ok(Flow::Idle);
            }
            // An unfilled output buffer means the codec has nothing more for
            // this input. While closing, keep going until pending is drained.
            if step.produced < capacity && !self.closing {
                return Ok(Flow::Idle);
            }
        }
    }

    fn run_finish<D: Downstream>(&mut self, downstream: &mut D) -> Result<Flow, StreamError> {
        let capacity = self.output_buf_size;
        while !self.ended {
            let (step, chunk) = self.finish_call(capacity)?;
            let saturated = self.forward(chunk, downstream)?;
            if step.end_of_stream || step.produced == 0 {
                self.mark_ended();
            } else if saturated {
                return Ok(Flow::Paused);
            }
        }
        Ok(Flow::Ended)
    }

    /// One transform call with an output buffer of `capacity` bytes.
    pub fn transform_once(&mut self, capacity: usize) -> Result<(StepResult, Bytes), StreamError> {
        if self.ended {
            self.drop_pending();
            return Ok((StepResult::new(0, 0, true), Bytes::new()));
        }
        let (step, chunk) = self.call(Phase::Transform, capacity)?;
        if step.end_of_stream {
            self.mark_ended();
        }
        Ok((step, chunk))
    }

    /// One finish call with an output buffer of `capacity` bytes.
    pub fn finish_once(&mut self, capacity: usize) -> Result<(StepResult, Bytes), StreamError> {
        self.closing = true;
        if self.ended {
            return Ok((StepResult::new(0, 0, true), Bytes::new()));
        }
        let (step, chunk) = self.finish_call(capacity)?;
        if step.end_of_stream || step.produced == 0 {
            self.mark_ended();
        }
        Ok((step, chunk))
    }

    /// The finish bound is `max_finish_iterations` calls of
    /// [`DEFAULT_OUTPUT_BUF_SIZE`] bytes each. Smaller buffers get
    /// proportionally more calls, so the same trailer fits whatever the
    /// configured capacity.
    fn finish_call(&mut self, capacity: usize) -> Result<(StepResult, Bytes), StreamError> {
        let budget = (self.max_finish_iterations as u64).saturating_mul(DEFAULT_OUTPUT_BUF_SIZE as u64);
        if self.finish_calls >= self.max_finish_iterations && self.finish_capacity >= budget {
            return Err(CodecFault::FinishStalled {
                codec: self.name,
                iterations: self.finish_calls,
            }
            .into());
        }
        self.finish_calls += 1;
        self.finish_capacity += capacity as u64;
        self.call(Phase::Finish, capacity)
    }

    fn call(&mut self, phase: Phase, capacity: usize) -> Result<(StepResult, Bytes), StreamError> {
        let codec = self
            .codec
            .as_mut()
            .ok_or(StreamError::Misuse("codec already disposed"))?;
        let mut out = BytesMut::zeroed(capacity);
        let bytes_in = self.pending.len();
        let step = match phase {
            Phase::Transform => codec.step(self.pending.current(), &mut out)?,
            Phase::Finish => codec.finish(&mut out)?,
        };
        assert!(
            step.consumed <= bytes_in && step.produced <= capacity,
            "{} reported {}/{} consumed and {}/{} produced",
            self.name,
            step.consumed,
            bytes_in,
            step.produced,
            capacity
        );
        self.pending.consume(step.consumed);
        out.truncate(step.produced);
        self.trace.record(TraceRecord {
            phase,
            bytes_in: step.consumed,
            bytes_out: step.produced,
            end_of_stream: step.end_of_stream,
        });
        Ok((step, out.freeze()))
    }

    /// Returns true when downstream asked us to stop.
    fn forward<D: Downstream>(&mut self, chunk: Bytes, downstream: &mut D) -> Result<bool, StreamError> {
        if chunk.is_empty() {
            return Ok(false);
        }
        Ok(downstream.forward(chunk)?.is_saturated())
    }

    fn mark_ended(&mut self) {
        self.ended = true;
        self.drop_pending();
    }

    fn drop_pending(&mut self) {
        let trailing = self.pending.len();
        if trailing > 0 {
            self.pending.clear();
            self.discard_trailing(trailing);
        }
    }

    fn discard_trailing(&self, bytes: usize) {
        if bytes > 0 {
            tracing::warn!(
                label = self.trace.label(),
                codec = self.name,
                bytes,
                "discarding input received after end of stream"
            );
        }
    }
}
