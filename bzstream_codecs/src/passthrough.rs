use bzstream_core::{CodecFault, Direction, StepResult, StreamCodec};

/// Identity codec: output equals input.
///
/// Useful for:
/// - Exercising the stream engine without a real algorithm in the way.
/// - Pipelines that sometimes carry data that is already compressed.
pub struct PassThroughCodec {
    direction: Direction,
}

impl PassThroughCodec {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }
}

impl StreamCodec for PassThroughCodec {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<StepResult, CodecFault> {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        Ok(StepResult::new(n, n, false))
    }

    fn finish(&mut self, _output: &mut [u8]) -> Result<StepResult, CodecFault> {
        Ok(StepResult::new(0, 0, true))
    }
}
