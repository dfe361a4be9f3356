use super::{CompressionKind, Compressor};
use crate::error::Result;
use std::io::{Read, Write};

pub struct ZstdCompressor;

impl Compressor for ZstdCompressor {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Zstd
    }

    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write, level: i32) -> Result<u64> {
        let enc = zstd::stream::Encoder::new(dst, level.max(1))?;
        let mut w = enc.auto_finish();
        let written_uncompressed = std::io::copy(src, &mut w)?;
        Ok(written_uncompressed)
    }

    fn decoder<'a>(&self, src: Box<dyn Read + Send + 'a>) -> Result<Box<dyn Read + Send + 'a>> {
        let dec = zstd::stream::read::Decoder::new(src)?;
        Ok(Box::new(dec))
    }
}
