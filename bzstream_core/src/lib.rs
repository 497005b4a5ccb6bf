pub mod accumulator;
pub mod batch;
pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod gate;
pub mod sink;
pub mod source;
pub mod trace;
pub mod transform;

pub use accumulator::Accumulator;
pub use batch::run_batch;
pub use codec::{CodecFactory, Direction, StepResult, StreamCodec};
pub use config::{StreamConfig, DEFAULT_HIGH_WATER_MARK, DEFAULT_OUTPUT_BUF_SIZE};
pub use driver::{Driver, Flow};
pub use error::{CodecFault, ConfigError, StreamError};
pub use gate::{ChunkQueue, Downstream, Signal};
pub use sink::{CodecSink, FileSink};
pub use source::{FileSource, StreamState};
pub use trace::{Phase, TraceRecord, TraceSummary};
pub use transform::{pipe, TransformStream};
