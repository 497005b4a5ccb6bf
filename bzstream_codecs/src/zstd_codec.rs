use std::io;

use bzstream_core::{CodecFault, Direction, StepResult, StreamCodec};
use zstd::stream::raw::{Decoder, Encoder, InBuffer, Operation, OutBuffer};

const NAME: &str = "zstd";

/// Default compression level (1 = fast / larger, 22 = slow / smallest).
pub const DEFAULT_LEVEL: i32 = 3;

fn fault(e: io::Error) -> CodecFault {
    CodecFault::backend(NAME, e)
}

/// Zstandard compressor producing a single frame.
pub struct ZstdCompressor {
    inner: Encoder<'static>,
}

impl ZstdCompressor {
    pub fn new(level: i32) -> Result<Self, CodecFault> {
        Ok(Self {
            inner: Encoder::new(level).map_err(fault)?,
        })
    }
}

impl StreamCodec for ZstdCompressor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Compress
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<StepResult, CodecFault> {
        let mut src = InBuffer::around(input);
        let mut dst = OutBuffer::around(output);
        self.inner.run(&mut src, &mut dst).map_err(fault)?;
        Ok(StepResult::new(src.pos(), dst.pos(), false))
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<StepResult, CodecFault> {
        let mut dst = OutBuffer::around(output);
        let remaining = self.inner.finish(&mut dst, true).map_err(fault)?;
        Ok(StepResult::new(0, dst.pos(), remaining == 0))
    }
}

/// Zstandard decompressor. Ends after the first complete frame.
pub struct ZstdDecompressor {
    inner: Decoder<'static>,
    seen_input: bool,
    ended: bool,
}

impl ZstdDecompressor {
    pub fn new() -> Result<Self, CodecFault> {
        Ok(Self {
            inner: Decoder::new().map_err(fault)?,
            seen_input: false,
            ended: false,
        })
    }
}

impl StreamCodec for ZstdDecompressor {
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
        self.seen_input |= !input.is_empty();
        let mut src = InBuffer::around(input);
        let mut dst = OutBuffer::around(output);
        // A zero hint means the frame is fully decoded and flushed.
        let hint = self.inner.run(&mut src, &mut dst).map_err(fault)?;
        self.ended = self.seen_input && hint == 0;
        Ok(StepResult::new(src.pos(), dst.pos(), self.ended))
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<StepResult, CodecFault> {
        if self.ended || !self.seen_input {
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
