use bzstream_core::{CodecFault, Direction, StepResult, StreamCodec};
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

/// Default deflate level.
pub const DEFAULT_LEVEL: u32 = 6;

fn codec_name(zlib_header: bool) -> &'static str {
    if zlib_header {
        "zlib"
    } else {
        "deflate"
    }
}

/// Deflate compressor, either zlib-wrapped or raw.
pub struct DeflateCompressor {
    inner: Compress,
    name: &'static str,
}

impl DeflateCompressor {
    pub fn new(level: u32, zlib_header: bool) -> Self {
        Self {
            inner: Compress::new(Compression::new(level), zlib_header),
            name: codec_name(zlib_header),
        }
    }

    fn run(&mut self, input: &[u8], output: &mut [u8], flush: FlushCompress) -> Result<StepResult, CodecFault> {
        let (in_before, out_before) = (self.inner.total_in(), self.inner.total_out());
        let status = self
            .inner
            .compress(input, output, flush)
            .map_err(|e| CodecFault::backend(self.name, e))?;
        Ok(StepResult::new(
            (self.inner.total_in() - in_before) as usize,
            (self.inner.total_out() - out_before) as usize,
            matches!(status, Status::StreamEnd),
        ))
    }
}

impl StreamCodec for DeflateCompressor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn direction(&self) -> Direction {
        Direction::Compress
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<StepResult, CodecFault> {
        self.run(input, output, FlushCompress::None)
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<StepResult, CodecFault> {
        self.run(&[], output, FlushCompress::Finish)
    }
}

/// Deflate decompressor matching [`DeflateCompressor`].
pub struct DeflateDecompressor {
    inner: Decompress,
    name: &'static str,
    ended: bool,
}

impl DeflateDecompressor {
    pub fn new(zlib_header: bool) -> Self {
        Self {
            inner: Decompress::new(zlib_header),
            name: codec_name(zlib_header),
            ended: false,
        }
    }
}

impl StreamCodec for DeflateDecompressor {
    fn name(&self) -> &'static str {
        self.name
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
            .decompress(input, output, FlushDecompress::None)
            .map_err(|e| CodecFault::backend(self.name, e))?;
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
            return Err(CodecFault::Truncated { codec: self.name });
        }
        Ok(step)
    }
}
