use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a codec or by the engine on the codec's behalf.
#[derive(Debug, Error)]
pub enum CodecFault {
    /// The codec library rejected the data or its own state.
    #[error("{codec} codec error: {source}")]
    Backend {
        codec: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Input ended before the compressed stream's end marker.
    #[error("{codec} stream is truncated: input ended before the end-of-stream marker")]
    Truncated { codec: &'static str },

    /// The finish phase kept producing output without ever reaching the end
    /// of the stream.
    #[error("{codec} finish did not reach end of stream after {iterations} calls")]
    FinishStalled {
        codec: &'static str,
        iterations: usize,
    },
}

impl CodecFault {
    pub fn backend<E>(codec: &'static str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        CodecFault::Backend {
            codec,
            source: source.into(),
        }
    }
}

/// Errors surfaced by the stream adapters, the batch codec and the driver.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("cannot open {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A synchronous write accepted fewer bytes than the chunk length.
    #[error("short write: {written} of {expected} bytes written")]
    ShortWrite { written: usize, expected: usize },

    #[error(transparent)]
    Codec(#[from] CodecFault),

    /// The caller used a disposed codec or a closed stream.
    #[error("stream misuse: {0}")]
    Misuse(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(e) => e,
            StreamError::Resource { source, .. } => source,
            StreamError::ShortWrite { .. } => io::Error::new(io::ErrorKind::WriteZero, err),
            StreamError::Codec(_) => io::Error::new(io::ErrorKind::InvalidData, err),
            StreamError::Misuse(_) | StreamError::Config(_) => {
                io::Error::new(io::ErrorKind::Other, err)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}
