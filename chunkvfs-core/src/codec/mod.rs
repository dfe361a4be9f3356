use crate::error::{Result, VfsError};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionKind {
    Store = 0,
    Zstd = 1,
}

impl CompressionKind {
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            0 => Ok(Self::Store),
            1 => Ok(Self::Zstd),
            other => Err(VfsError::Format(format!("unknown codec id {other}"))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Zstd => "zstd",
        }
    }
}

pub trait Compressor: Send + Sync {
    fn kind(&self) -> CompressionKind;
    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write, level: i32) -> Result<u64>;
    /// Wrap a raw chunk stream so reads yield decompressed bytes.
    fn decoder<'a>(&self, src: Box<dyn Read + Send + 'a>) -> Result<Box<dyn Read + Send + 'a>>;
}

pub fn compressor_for(kind: CompressionKind) -> &'static dyn Compressor {
    match kind {
        CompressionKind::Store => &store::Store,
        CompressionKind::Zstd => &zstdc::ZstdCompressor,
    }
}

pub mod store;
pub mod zstdc;
