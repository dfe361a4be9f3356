use std::io::Read;

use super::{ArchiveReader, Chunk};
use crate::codec::{CompressionKind, compressor_for};
use crate::error::{Result, VfsError};
use crate::hash::path_hash;

/// Archive held entirely in memory. Chunk handles are slot indices.
#[derive(Default)]
pub struct MemoryArchive {
    chunks: Vec<Chunk>,
    slots: Vec<Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert keyed by the hash of `path`, stored uncompressed.
    pub fn with_file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.push(path_hash(path), data.into());
        self
    }

    pub fn push(&mut self, path_hash: u64, data: Vec<u8>) -> Chunk {
        let chunk = Chunk {
            path_hash,
            compression: CompressionKind::Store,
            compressed_size: data.len() as u64,
            uncompressed_size: data.len() as u64,
            handle: self.slots.len() as u64,
        };
        self.slots.push(data);
        self.chunks.push(chunk);
        chunk
    }

    pub fn push_compressed(
        &mut self,
        path_hash: u64,
        data: &[u8],
        kind: CompressionKind,
    ) -> Result<Chunk> {
        let mut packed = Vec::new();
        compressor_for(kind).compress(&mut &data[..], &mut packed, 3)?;
        let chunk = Chunk {
            path_hash,
            compression: kind,
            compressed_size: packed.len() as u64,
            uncompressed_size: data.len() as u64,
            handle: self.slots.len() as u64,
        };
        self.slots.push(packed);
        self.chunks.push(chunk);
        Ok(chunk)
    }
}

impl ArchiveReader for MemoryArchive {
    fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    fn open_raw(&self, chunk: &Chunk) -> Result<Box<dyn Read + Send + '_>> {
        let slot = self
            .slots
            .get(chunk.handle as usize)
            .ok_or_else(|| VfsError::Format(format!("no chunk slot {}", chunk.handle)))?;
        Ok(Box::new(&slot[..]))
    }
}
