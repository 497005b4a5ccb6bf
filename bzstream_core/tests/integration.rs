/// Integration tests for the stream engine: driver, transform stream, file
/// source and sink, batch codec.
///
/// Most tests run real bzip2 through the engine; the pass-through codec is
/// used where exact chunk boundaries matter.
use std::fs;
use std::io::{self, Read, Write};

use bytes::Bytes;
use bzstream_codecs::{Bzip2Compressor, Bzip2Decompressor, CodecKind, PassThroughCodec};
use bzstream_core::{
    run_batch, CodecFault, CodecSink, Direction, Downstream, Driver, FileSink, FileSource, Flow,
    Signal, StreamConfig, StreamError, StreamState, TransformStream,
};
use proptest::prelude::*;

/// Generate `len` deterministic bytes using a simple LCG.
fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

/// Generate `len` highly compressible bytes (repeating pattern).
fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog. ";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

// ── helpers ───────────────────────────────────────────────────────────────

fn bz_compress(data: &[u8], cfg: &StreamConfig) -> Vec<u8> {
    run_batch(Box::new(Bzip2Compressor::default()), data, cfg).unwrap()
}

fn bz_decompress(data: &[u8], cfg: &StreamConfig) -> Result<Vec<u8>, StreamError> {
    run_batch(Box::new(Bzip2Decompressor::default()), data, cfg)
}

/// Read everything a transform stream has queued.
fn drain(stream: &mut TransformStream, out: &mut Vec<u8>) {
    while let Some(chunk) = stream.read().unwrap() {
        out.extend_from_slice(&chunk);
    }
}

/// Feed `chunks` through a transform stream, honouring its backpressure.
fn stream_all(mut stream: TransformStream, chunks: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in chunks {
        if !stream.write(chunk).unwrap() {
            drain(&mut stream, &mut out);
        }
    }
    stream.end().unwrap();
    while !stream.is_finished() {
        drain(&mut stream, &mut out);
    }
    out
}

/// Downstream that reports saturation after every chunk it takes.
#[derive(Default)]
struct AlwaysFull {
    chunks: Vec<Bytes>,
}

impl Downstream for AlwaysFull {
    fn forward(&mut self, chunk: Bytes) -> Result<Signal, StreamError> {
        self.chunks.push(chunk);
        Ok(Signal::Saturated)
    }
}

/// Writer that accepts only half of every buffer.
struct HalfWriter;

impl Write for HalfWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len() / 2)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── driver ────────────────────────────────────────────────────────────────

#[test]
fn test_saturation_stops_after_each_chunk() {
    let cfg = StreamConfig::default().output_buf_size(16);
    let data = pseudo_random_bytes(100, 7);
    let mut driver = Driver::new(Box::new(PassThroughCodec::new(Direction::Compress)), &cfg).unwrap();
    let mut down = AlwaysFull::default();

    assert_eq!(driver.feed(&data, &mut down).unwrap(), Flow::Paused);
    assert_eq!(down.chunks.len(), 1, "no chunk may follow a saturated one");

    let mut activations = 1;
    while driver.resume(&mut down).unwrap() == Flow::Paused {
        activations += 1;
        assert_eq!(down.chunks.len(), activations);
    }
    driver.finalize(&mut down).unwrap();

    let joined: Vec<u8> = down.chunks.iter().flat_map(|c| c.iter().copied()).collect();
    assert_eq!(joined, data);
    assert!(down.chunks.iter().all(|c| c.len() <= 16));
}

#[test]
fn test_zero_progress_mid_stream_is_not_an_error() {
    // bzip2 produces nothing until a block fills up or the stream finishes.
    let cfg = StreamConfig::default();
    let mut driver = Driver::new(Box::new(Bzip2Compressor::default()), &cfg).unwrap();
    let mut out = Vec::new();
    assert_eq!(driver.feed(b"tiny", &mut out).unwrap(), Flow::Idle);
    assert_eq!(driver.feed(b"", &mut out).unwrap(), Flow::Idle);
    assert!(out.is_empty());
    assert_eq!(driver.finalize(&mut out).unwrap(), Flow::Ended);
    assert_eq!(bz_decompress(&out, &cfg).unwrap(), b"tiny");
}

// ── batch ─────────────────────────────────────────────────────────────────

#[test]
fn test_batch_round_trip_all_byte_values() -> anyhow::Result<()> {
    let cfg = StreamConfig::default();
    let data: Vec<u8> = (0..=255u8).cycle().take(300_000).collect();
    let packed = bz_compress(&data, &cfg);
    assert_eq!(bz_decompress(&packed, &cfg)?, data);
    Ok(())
}

#[test]
fn test_batch_round_trip_one_byte_buffers() -> anyhow::Result<()> {
    // A single block, so the whole compressed stream comes out of the
    // finish phase one byte per call.
    let cfg = StreamConfig::default().output_buf_size(1);
    let data = pseudo_random_bytes(150_000, 1);
    let packed = run_batch(Box::new(Bzip2Compressor::default()), &data, &cfg)?;
    assert!(packed.len() > 100_000);
    assert_eq!(bz_decompress(&packed, &cfg)?, data);
    assert_eq!(bz_compress(&data, &StreamConfig::default()), packed);
    Ok(())
}

#[test]
fn test_verbose_trace_accounts_for_every_byte() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();

    let cfg = StreamConfig::default().output_buf_size(4096).verbose(true);
    let data = compressible_bytes(120_000);
    let mut driver = Driver::new(Box::new(Bzip2Compressor::default()), &cfg)?;
    let mut out = Vec::new();
    driver.feed(&data, &mut out)?;
    assert_eq!(driver.finalize(&mut out)?, Flow::Ended);

    let summary = driver.trace_summary();
    assert!(summary.calls >= 2, "at least one transform and one finish call");
    assert_eq!(summary.bytes_in, data.len() as u64);
    assert_eq!(summary.bytes_out, out.len() as u64);
    assert_eq!(out, bz_compress(&data, &StreamConfig::default()));
    Ok(())
}

#[test]
fn test_batch_is_deterministic() {
    let cfg = StreamConfig::default().output_buf_size(333);
    let data = compressible_bytes(50_000);
    assert_eq!(bz_compress(&data, &cfg), bz_compress(&data, &cfg));
}

#[test]
fn test_batch_empty_input() {
    let cfg = StreamConfig::default();
    let packed = bz_compress(b"", &cfg);
    assert!(!packed.is_empty(), "an empty stream still carries a header");
    assert!(bz_decompress(&packed, &cfg).unwrap().is_empty());
}

#[test]
fn test_truncated_input_fails_loudly() {
    let cfg = StreamConfig::default();
    let packed = bz_compress(&pseudo_random_bytes(100_000, 3), &cfg);
    let err = bz_decompress(&packed[..packed.len() / 2], &cfg).unwrap_err();
    assert!(
        matches!(err, StreamError::Codec(CodecFault::Truncated { .. })),
        "unexpected error: {err}"
    );
}

#[test]
fn test_corrupt_input_fails_loudly() {
    let cfg = StreamConfig::default();
    let mut packed = bz_compress(&compressible_bytes(10_000), &cfg);
    packed[0] = b'X';
    let err = bz_decompress(&packed, &cfg).unwrap_err();
    assert!(matches!(err, StreamError::Codec(CodecFault::Backend { .. })));
}

#[test]
fn test_trailing_bytes_after_end_are_discarded() {
    let cfg = StreamConfig::default();
    let data = compressible_bytes(5_000);
    let mut packed = bz_compress(&data, &cfg);
    packed.extend_from_slice(b"garbage after the trailer");
    assert_eq!(bz_decompress(&packed, &cfg).unwrap(), data);
}

#[test]
fn test_invalid_config_is_rejected() {
    let cfg = StreamConfig::default().output_buf_size(0);
    let err = run_batch(Box::new(Bzip2Compressor::default()), b"x", &cfg).unwrap_err();
    assert!(matches!(err, StreamError::Config(_)));
}

// ── transform stream ──────────────────────────────────────────────────────

#[test]
fn test_transform_stream_pauses_at_high_water_mark() {
    let cfg = StreamConfig::default().output_buf_size(1024).high_water_mark(1024);
    let data = pseudo_random_bytes(1024 * 1024, 11);
    let mut stream = TransformStream::new(Box::new(Bzip2Compressor::default()), &cfg).unwrap();

    assert!(!stream.write(&data).unwrap(), "a full output chunk saturates the queue");
    assert!(stream.is_paused());
    assert_eq!(stream.queued_chunks(), 1);

    // Writes while paused are buffered, not run.
    assert!(!stream.write(b"more").unwrap());
    assert_eq!(stream.queued_chunks(), 1);

    let mut out = Vec::new();
    drain(&mut stream, &mut out);
    stream.end().unwrap();
    while !stream.is_finished() {
        drain(&mut stream, &mut out);
    }

    let mut expected = data.clone();
    expected.extend_from_slice(b"more");
    assert_eq!(out, bz_compress(&expected, &cfg));
}

#[test]
fn test_transform_stream_end_is_idempotent() {
    let cfg = StreamConfig::default();
    let mut stream = TransformStream::new(Box::new(Bzip2Compressor::default()), &cfg).unwrap();
    stream.write(b"abc").unwrap();
    stream.end().unwrap();
    let mut out = Vec::new();
    drain(&mut stream, &mut out);
    assert!(stream.is_finished());

    stream.end().unwrap();
    assert!(stream.read().unwrap().is_none());
    assert!(matches!(stream.write(b"late"), Err(StreamError::Misuse(_))));
}

#[test]
fn test_transform_streams_chain_with_backpressure() {
    let cfg = StreamConfig::default().output_buf_size(2048).high_water_mark(4096);
    let data = compressible_bytes(400_000);
    let mut compress = TransformStream::new(Box::new(Bzip2Compressor::default()), &cfg).unwrap();
    let mut decompress = TransformStream::new(Box::new(Bzip2Decompressor::default()), &cfg).unwrap();

    let mut out = Vec::new();
    for chunk in data.chunks(10_000) {
        compress.write(chunk).unwrap();
        while compress.queued_chunks() > 0 {
            compress.pipe_to(&mut decompress).unwrap();
            drain(&mut decompress, &mut out);
        }
    }
    compress.end().unwrap();
    while !compress.is_finished() {
        compress.pipe_to(&mut decompress).unwrap();
        drain(&mut decompress, &mut out);
    }
    decompress.end().unwrap();
    while !decompress.is_finished() {
        drain(&mut decompress, &mut out);
    }
    assert_eq!(out, data);
}

#[test]
fn test_transform_streams_with_tiny_buffers() -> anyhow::Result<()> {
    let cfg = StreamConfig::default().output_buf_size(2).high_water_mark(64);
    let data = pseudo_random_bytes(150_000, 17);
    let mut compress = TransformStream::new(Box::new(Bzip2Compressor::default()), &cfg)?;
    let mut decompress = TransformStream::new(Box::new(Bzip2Decompressor::default()), &cfg)?;

    let mut out = Vec::new();
    for chunk in data.chunks(25_000) {
        compress.write(chunk)?;
        while compress.queued_chunks() > 0 {
            compress.pipe_to(&mut decompress)?;
            drain(&mut decompress, &mut out);
        }
    }
    compress.end()?;
    while !compress.is_finished() {
        compress.pipe_to(&mut decompress)?;
        drain(&mut decompress, &mut out);
    }
    decompress.end()?;
    while !decompress.is_finished() {
        drain(&mut decompress, &mut out);
    }
    assert_eq!(out, data);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_chunking_does_not_change_output(
        data in proptest::collection::vec(any::<u8>(), 0..20_000),
        cuts in proptest::collection::vec(any::<usize>(), 0..12),
    ) {
        let cfg = StreamConfig::default().output_buf_size(512).high_water_mark(2048);

        let mut points: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
        points.push(0);
        points.push(data.len());
        points.sort_unstable();
        let chunks: Vec<&[u8]> = points.windows(2).map(|w| &data[w[0]..w[1]]).collect();

        let whole = stream_all(
            TransformStream::new(Box::new(Bzip2Compressor::default()), &cfg).unwrap(),
            &[&data],
        );
        let split = stream_all(
            TransformStream::new(Box::new(Bzip2Compressor::default()), &cfg).unwrap(),
            &chunks,
        );
        prop_assert_eq!(&whole, &split);
        prop_assert_eq!(bz_decompress(&split, &cfg).unwrap(), data);
    }
}

// ── file source ───────────────────────────────────────────────────────────

#[test]
fn test_file_source_state_machine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.bin");
    fs::write(&path, b"hello file source").unwrap();

    let cfg = StreamConfig::default();
    let factory = CodecKind::PassThrough.factory(Direction::Decompress);
    let mut src = FileSource::open(&path, factory, &cfg).unwrap();
    assert_eq!(src.state(), StreamState::Open);

    let mut out = Vec::new();
    while let Some(chunk) = src.pull(5).unwrap() {
        assert!(chunk.len() <= 5);
        out.extend_from_slice(&chunk);
    }
    assert_eq!(out, b"hello file source");
    assert_eq!(src.state(), StreamState::Closed);
    assert!(matches!(src.pull(5), Err(StreamError::Misuse(_))));

    src.reopen().unwrap();
    assert_eq!(src.state(), StreamState::Open);
    let mut again = Vec::new();
    src.read_to_end(&mut again).unwrap();
    assert_eq!(again, b"hello file source");
}

#[test]
fn test_file_source_waits_for_draining_before_closing() {
    // Small pulls against a bzip2 stream: many codec calls consume input and
    // produce nothing, and none of them may close the source early.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bz2");
    let cfg = StreamConfig::default();
    let data = pseudo_random_bytes(300_000, 21);
    fs::write(&path, bz_compress(&data, &cfg)).unwrap();

    let factory = CodecKind::Bzip2.factory(Direction::Decompress);
    let mut src = FileSource::open(&path, factory, &cfg).unwrap();
    let mut out = Vec::new();
    let mut empty_pulls = 0;
    while let Some(chunk) = src.pull(64).unwrap() {
        if chunk.is_empty() {
            empty_pulls += 1;
        }
        out.extend_from_slice(&chunk);
    }
    assert!(empty_pulls > 0);
    assert_eq!(out, data);
    assert_eq!(src.state(), StreamState::Closed);
}

#[test]
fn test_file_source_tiny_pulls_over_a_large_block() -> anyhow::Result<()> {
    // Most of the decoded block is still inside the codec when the file runs
    // out, so it is delivered by finish calls two bytes at a time.
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("block.bz2");
    let cfg = StreamConfig::default();
    let data = pseudo_random_bytes(150_000, 23);
    fs::write(&path, bz_compress(&data, &cfg))?;

    let mut src = FileSource::open(&path, CodecKind::Bzip2.factory(Direction::Decompress), &cfg)?;
    let mut out = Vec::new();
    while let Some(chunk) = src.pull(2)? {
        assert!(chunk.len() <= 2);
        out.extend_from_slice(&chunk);
    }
    assert_eq!(out, data);
    assert_eq!(src.state(), StreamState::Closed);
    Ok(())
}

#[test]
fn test_file_source_truncated_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.bz2");
    let cfg = StreamConfig::default();
    let packed = bz_compress(&pseudo_random_bytes(50_000, 5), &cfg);
    fs::write(&path, &packed[..packed.len() - 10]).unwrap();

    let mut src = FileSource::open(&path, CodecKind::Bzip2.factory(Direction::Decompress), &cfg).unwrap();
    let mut out = Vec::new();
    let err = src.read_to_end(&mut out).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn test_file_source_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let factory = CodecKind::Bzip2.factory(Direction::Decompress);
    let res = FileSource::open(dir.path().join("absent.bz2"), factory, &StreamConfig::default());
    assert!(matches!(res, Err(StreamError::Resource { .. })));
}

// ── file sink ─────────────────────────────────────────────────────────────

#[test]
fn test_file_sink_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bz2");
    let cfg = StreamConfig::default();
    let data = compressible_bytes(250_000);

    let mut sink = FileSink::create(&path, Box::new(Bzip2Compressor::default()), &cfg).unwrap();
    for chunk in data.chunks(7_777) {
        sink.write_all(chunk).unwrap();
    }
    let written = sink.finish().unwrap();
    assert_eq!(sink.finish().unwrap(), written, "finish is idempotent");

    let packed = fs::read(&path).unwrap();
    assert_eq!(packed.len() as u64, written);
    assert!(packed.len() < data.len());
    assert_eq!(bz_decompress(&packed, &cfg).unwrap(), data);

    assert!(matches!(sink.push(b"late"), Err(StreamError::Misuse(_))));
}

#[test]
fn test_sink_into_inner_returns_writer() {
    let cfg = StreamConfig::default().output_buf_size(64);
    let mut sink = CodecSink::new(Vec::new(), Box::new(Bzip2Compressor::default()), &cfg).unwrap();
    sink.push(b"into inner").unwrap();
    let packed = sink.finish_into_inner().unwrap();
    assert_eq!(bz_decompress(&packed, &cfg).unwrap(), b"into inner");
}

#[test]
fn test_short_write_is_fatal() {
    let cfg = StreamConfig::default();
    let mut sink = CodecSink::new(
        HalfWriter,
        Box::new(PassThroughCodec::new(Direction::Compress)),
        &cfg,
    )
    .unwrap();
    let err = sink.push(b"abcdef").unwrap_err();
    assert!(matches!(
        err,
        StreamError::ShortWrite {
            written: 3,
            expected: 6
        }
    ));
    assert!(matches!(sink.push(b"again"), Err(StreamError::Misuse(_))));
}

#[test]
fn test_file_sink_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.bz2");
    let res = FileSink::create(&path, Box::new(Bzip2Compressor::default()), &StreamConfig::default());
    assert!(matches!(res, Err(StreamError::Resource { .. })));
}
