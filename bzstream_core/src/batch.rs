use crate::codec::StreamCodec;
use crate::config::StreamConfig;
use crate::driver::Driver;
use crate::error::StreamError;

/// Run a whole in-memory buffer through `codec` and return everything it
/// produced, transform phase followed by finish phase.
///
/// The collector never saturates, so this is the streaming loop with
/// backpressure reduced to a no-op; for the same input and
/// `output_buf_size` the output is byte-identical to a streamed run.
pub fn run_batch(
    codec: Box<dyn StreamCodec>,
    input: &[u8],
    config: &StreamConfig,
) -> Result<Vec<u8>, StreamError> {
    let mut driver = Driver::new(codec, config)?;
    let mut out = Vec::new();
    driver.feed(input, &mut out)?;
    driver.finalize(&mut out)?;
    Ok(out)
}
