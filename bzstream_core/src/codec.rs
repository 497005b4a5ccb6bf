use crate::error::CodecFault;

/// Which way a codec transforms bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Compress,
    Decompress,
}

impl Direction {
    /// Label prefixed to every trace record emitted for this direction.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Compress => "[CO]",
            Direction::Decompress => "[DEC]",
        }
    }
}

/// Report of a single `step` or `finish` call.
///
/// `consumed` never exceeds the input offered and `produced` never exceeds the
/// output capacity offered. `end_of_stream` means the codec will take no
/// further input: a decompressor saw the stream trailer, or a compressor
/// emitted its final trailer during the finish phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    pub consumed: usize,
    pub produced: usize,
    pub end_of_stream: bool,
}

impl StepResult {
    pub fn new(consumed: usize, produced: usize, end_of_stream: bool) -> Self {
        Self {
            consumed,
            produced,
            end_of_stream,
        }
    }

    /// True when the call neither consumed input nor produced output.
    #[inline]
    pub fn is_stalled(&self) -> bool {
        self.consumed == 0 && self.produced == 0
    }
}

/// Stateful block codec driven by the stream engine.
///
/// An implementation owns the codec state for exactly one stream. Creating the
/// value initializes the state and dropping it disposes of it, so a handle can
/// never outlive or be shared across streams.
///
/// - [`step`](StreamCodec::step) offers all pending input plus a fresh output
///   buffer and reports how much of each was used. Consuming and producing
///   nothing is legal and means "offer more input".
/// - [`finish`](StreamCodec::finish) is called repeatedly once no more input
///   will ever arrive, until it reports `end_of_stream` or produces nothing.
///
/// Errors raised by the underlying library are returned as
/// [`CodecFault::Backend`] and are never retried by the engine.
pub trait StreamCodec: Send {
    /// Short codec name used in errors and trace output.
    fn name(&self) -> &'static str;

    fn direction(&self) -> Direction;

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<StepResult, CodecFault>;

    fn finish(&mut self, output: &mut [u8]) -> Result<StepResult, CodecFault>;
}

/// Creates a freshly initialized codec. Used wherever a stream has to be able
/// to start over, e.g. [`FileSource::reopen`](crate::FileSource::reopen).
pub type CodecFactory = Box<dyn Fn() -> Result<Box<dyn StreamCodec>, CodecFault> + Send>;
