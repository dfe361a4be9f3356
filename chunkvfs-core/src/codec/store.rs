use super::{CompressionKind, Compressor};
use crate::error::Result;
use std::io::{Read, Write};

pub struct Store;

impl Compressor for Store {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Store
    }

    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write, _level: i32) -> Result<u64> {
        Ok(std::io::copy(src, dst)?)
    }

    fn decoder<'a>(&self, src: Box<dyn Read + Send + 'a>) -> Result<Box<dyn Read + Send + 'a>> {
        Ok(src)
    }
}
