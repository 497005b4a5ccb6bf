use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default capacity of every output buffer handed to the codec: 8 KiB.
pub const DEFAULT_OUTPUT_BUF_SIZE: usize = 8 * 1024;

/// Default number of bytes a [`ChunkQueue`](crate::ChunkQueue) holds before it
/// reports saturation: 16 KiB.
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// Upper bound on `finish` calls for one stream, counted in calls of
/// [`DEFAULT_OUTPUT_BUF_SIZE`] bytes.
pub const DEFAULT_MAX_FINISH_ITERATIONS: usize = 1 << 16;

/// Options shared by every stream adapter and by the batch codec.
///
/// All fields have defaults, so a partial document deserializes:
///
/// ```
/// let cfg: bzstream_core::StreamConfig =
///     serde_json::from_str(r#"{ "verbose": true }"#).unwrap();
/// assert_eq!(cfg.output_buf_size, 8192);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Emit one trace record per codec call.
    pub verbose: bool,
    /// Capacity in bytes of each output chunk.
    pub output_buf_size: usize,
    /// Safeguard against a codec whose finish phase never ends. Smaller output
    /// buffers are allowed proportionally more calls.
    pub max_finish_iterations: usize,
    /// Byte threshold at which a stream's output queue reports saturation.
    pub high_water_mark: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            output_buf_size: DEFAULT_OUTPUT_BUF_SIZE,
            max_finish_iterations: DEFAULT_MAX_FINISH_ITERATIONS,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

impl StreamConfig {
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn output_buf_size(mut self, size: usize) -> Self {
        self.output_buf_size = size;
        self
    }

    pub fn max_finish_iterations(mut self, iterations: usize) -> Self {
        self.max_finish_iterations = iterations;
        self
    }

    pub fn high_water_mark(mut self, bytes: usize) -> Self {
        self.high_water_mark = bytes;
        self
    }

    /// Reject values that would stall the driver.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_buf_size == 0 {
            return Err(ConfigError::Zero {
                field: "output_buf_size",
            });
        }
        if self.max_finish_iterations == 0 {
            return Err(ConfigError::Zero {
                field: "max_finish_iterations",
            });
        }
        if self.high_water_mark == 0 {
            return Err(ConfigError::Zero {
                field: "high_water_mark",
            });
        }
        Ok(())
    }
}
