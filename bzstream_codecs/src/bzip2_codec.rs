use bzip2::{Action, Compress, Compression, Decompress, Status};
use bzstream_core::{CodecFault, Direction, StepResult, StreamCodec};

const NAME: &str = "bzip2";

/// Block size in units of 100 kB.
pub const DEFAULT_BLOCK_SIZE: u32 = 2;

/// How hard the compressor works on repetitive input before falling back to
/// its slower sort.
pub const DEFAULT_WORK_FACTOR: u32 = 30;

/// bzip2 compressor.
///
/// Input is consumed with `BZ_RUN`; output appears only once a whole block has
/// been gathered, so most early steps produce nothing. The finish phase issues
/// `BZ_FINISH` until libbz2 reports the stream end.
pub struct Bzip2Compressor {
    inner: Compress,
}

impl Bzip2Compressor {
    pub fn new(block_size: u32, work_factor: u32) -> Self {
        Self {
            inner: Compress::new(Compression::new(block_size), work_factor),
        }
    }

    fn run(&mut self, input: &[u8], output: &mut [u8], action: Action) -> Result<StepResult, CodecFault> {
        let (in_before, out_before) = (self.inner.total_in(), self.inner.total_out());
        let status = self
            .inner
            .compress(input, output, action)
            .map_err(|e| CodecFault::backend(NAME, e))?;
        Ok(StepResult::new(
            (self.inner.total_in() - in_before) as usize,
            (self.inner.total_out() - out_before) as usize,
            matches!(status, Status::StreamEnd),
        ))
    }
}

impl Default for Bzip2Compressor {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, DEFAULT_WORK_FACTOR)
    }
}

impl StreamCodec for Bzip2Compressor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Compress
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<StepResult, CodecFault> {
        // libbz2 rejects a run request that cannot make progress.
        if input.is_empty() {
            return Ok(StepResult::default());
        }
        self.run(input, output, Action::Run)
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<StepResult, CodecFault> {
        self.run(&[], output, Action::Finish)
    }
}

/// bzip2 decompressor.
///
/// Stops at the first end-of-stream marker. A stream that never reaches it is
/// reported as [`CodecFault::Truncated`] during the finish phase; input that
/// was empty from the start decodes to nothing.
pub struct Bzip2Decompressor {
    inner: Decompress,
    ended: bool,
}

impl Bzip2Decompressor {
    /// `small` selects libbz2's slower, low-memory decoding mode.
    pub fn new(small: bool) -> Self {
        Self {
            inner: Decompress::new(small),
            ended: false,
        }
    }
}

impl Default for Bzip2Decompressor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl StreamCodec for Bzip2Decompressor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Decompress
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<StepResult, CodecFault> {
        if self.ended {
            return Ok(StepResult::new(0, 0, true));
        }
        let (in_before, out_before) = (self.inner.total_in(), self.inner.total_out());
        let status = self
            .inner
            .decompress(input, output)
            .map_err(|e| CodecFault::backend(NAME, e))?;
        self.ended = matches!(status, Status::StreamEnd);
        Ok(StepResult::new(
            (self.inner.total_in() - in_before) as usize,
            (self.inner.total_out() - out_before) as usize,
            self.ended,
        ))
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<StepResult, CodecFault> {
        if self.ended || self.inner.total_in() == 0 {
            self.ended = true;
            return Ok(StepResult::new(0, 0, true));
        }
        let step = self.step(&[], output)?;
        if step.produced == 0 && !step.end_of_stream {
            return Err(CodecFault::Truncated { codec: NAME });
        }
        Ok(step)
    }
}
