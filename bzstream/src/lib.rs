//! bzip2 streams.
//!
//! Transform streams, one-shot helpers and file-backed streams over a
//! stateful codec, bzip2 by default. Every function has a `*_with` twin that
//! takes a [`CodecKind`].
//!
//! ```
//! use bzstream::{compress_sync, decompress_sync, StreamConfig};
//!
//! let cfg = StreamConfig::default();
//! let packed = compress_sync(b"hello hello hello", &cfg).unwrap();
//! assert_eq!(decompress_sync(&packed, &cfg).unwrap(), b"hello hello hello");
//! ```

use std::path::Path;

pub use bzstream_codecs::{CodecKind, UnknownCodec};
pub use bzstream_core::{
    pipe, ChunkQueue, CodecFault, CodecSink, Direction, Downstream, FileSink, FileSource, Signal,
    StreamConfig, StreamError, StreamState, TraceSummary, TransformStream,
};

/// bzip2 compressing transform stream.
pub fn create_compress_stream(config: &StreamConfig) -> Result<TransformStream, StreamError> {
    create_compress_stream_with(CodecKind::Bzip2, config)
}

/// bzip2 decompressing transform stream.
pub fn create_decompress_stream(config: &StreamConfig) -> Result<TransformStream, StreamError> {
    create_decompress_stream_with(CodecKind::Bzip2, config)
}

pub fn create_compress_stream_with(
    kind: CodecKind,
    config: &StreamConfig,
) -> Result<TransformStream, StreamError> {
    TransformStream::new(kind.create(Direction::Compress)?, config)
}

pub fn create_decompress_stream_with(
    kind: CodecKind,
    config: &StreamConfig,
) -> Result<TransformStream, StreamError> {
    TransformStream::new(kind.create(Direction::Decompress)?, config)
}

/// Compress a whole buffer with bzip2.
pub fn compress_sync(input: &[u8], config: &StreamConfig) -> Result<Vec<u8>, StreamError> {
    compress_sync_with(CodecKind::Bzip2, input, config)
}

/// Decompress a whole bzip2 buffer. Truncated or corrupt input is an error.
pub fn decompress_sync(input: &[u8], config: &StreamConfig) -> Result<Vec<u8>, StreamError> {
    decompress_sync_with(CodecKind::Bzip2, input, config)
}

pub fn compress_sync_with(
    kind: CodecKind,
    input: &[u8],
    config: &StreamConfig,
) -> Result<Vec<u8>, StreamError> {
    bzstream_core::run_batch(kind.create(Direction::Compress)?, input, config)
}

pub fn decompress_sync_with(
    kind: CodecKind,
    input: &[u8],
    config: &StreamConfig,
) -> Result<Vec<u8>, StreamError> {
    bzstream_core::run_batch(kind.create(Direction::Decompress)?, input, config)
}

/// Read and decompress a bzip2 file.
pub fn create_file_read_stream(
    path: impl AsRef<Path>,
    config: &StreamConfig,
) -> Result<FileSource, StreamError> {
    create_file_read_stream_with(CodecKind::Bzip2, path, config)
}

/// Compress into a bzip2 file, created or truncated.
pub fn create_file_write_stream(
    path: impl AsRef<Path>,
    config: &StreamConfig,
) -> Result<FileSink, StreamError> {
    create_file_write_stream_with(CodecKind::Bzip2, path, config)
}

pub fn create_file_read_stream_with(
    kind: CodecKind,
    path: impl AsRef<Path>,
    config: &StreamConfig,
) -> Result<FileSource, StreamError> {
    FileSource::open(path, kind.factory(Direction::Decompress), config)
}

pub fn create_file_write_stream_with(
    kind: CodecKind,
    path: impl AsRef<Path>,
    config: &StreamConfig,
) -> Result<FileSink, StreamError> {
    FileSink::create(path, kind.create(Direction::Compress)?, config)
}
