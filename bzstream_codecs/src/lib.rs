mod bzip2_codec;
mod deflate_codec;
mod passthrough;
mod zstd_codec;

pub use bzip2_codec::{Bzip2Compressor, Bzip2Decompressor, DEFAULT_BLOCK_SIZE, DEFAULT_WORK_FACTOR};
pub use deflate_codec::{DeflateCompressor, DeflateDecompressor};
pub use passthrough::PassThroughCodec;
pub use zstd_codec::{ZstdCompressor, ZstdDecompressor};

use std::fmt;
use std::str::FromStr;

use bzstream_core::{CodecFactory, CodecFault, Direction, StreamCodec};
use serde::{Deserialize, Serialize};

/// Every codec this crate can build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Bzip2,
    Zstd,
    Zlib,
    Deflate,
    PassThrough,
}

impl CodecKind {
    pub const ALL: [CodecKind; 5] = [
        CodecKind::Bzip2,
        CodecKind::Zstd,
        CodecKind::Zlib,
        CodecKind::Deflate,
        CodecKind::PassThrough,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CodecKind::Bzip2 => "bzip2",
            CodecKind::Zstd => "zstd",
            CodecKind::Zlib => "zlib",
            CodecKind::Deflate => "deflate",
            CodecKind::PassThrough => "passthrough",
        }
    }

    /// Initialize a codec with its default settings.
    pub fn create(self, direction: Direction) -> Result<Box<dyn StreamCodec>, CodecFault> {
        Ok(match (self, direction) {
            (CodecKind::Bzip2, Direction::Compress) => Box::new(Bzip2Compressor::default()),
            (CodecKind::Bzip2, Direction::Decompress) => Box::new(Bzip2Decompressor::default()),
            (CodecKind::Zstd, Direction::Compress) => {
                Box::new(ZstdCompressor::new(zstd_codec::DEFAULT_LEVEL)?)
            }
            (CodecKind::Zstd, Direction::Decompress) => Box::new(ZstdDecompressor::new()?),
            (CodecKind::Zlib, Direction::Compress) => {
                Box::new(DeflateCompressor::new(deflate_codec::DEFAULT_LEVEL, true))
            }
            (CodecKind::Zlib, Direction::Decompress) => Box::new(DeflateDecompressor::new(true)),
            (CodecKind::Deflate, Direction::Compress) => {
                Box::new(DeflateCompressor::new(deflate_codec::DEFAULT_LEVEL, false))
            }
            (CodecKind::Deflate, Direction::Decompress) => Box::new(DeflateDecompressor::new(false)),
            (CodecKind::PassThrough, direction) => Box::new(PassThroughCodec::new(direction)),
        })
    }

    /// A factory that initializes a fresh codec on every call.
    pub fn factory(self, direction: Direction) -> CodecFactory {
        Box::new(move || self.create(direction))
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown codec {0:?}; supported: bzip2, zstd, zlib, deflate, passthrough")]
pub struct UnknownCodec(pub String);

impl FromStr for CodecKind {
    type Err = UnknownCodec;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        CodecKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownCodec(name.to_string()))
    }
}
