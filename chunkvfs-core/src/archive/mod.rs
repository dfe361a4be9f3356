//! Read access to hash-keyed chunk archives.
//!
//! The tree only needs three things from an archive: the list of chunks, a raw
//! stream per chunk, and a decompressed stream per chunk. [`ArchiveReader`] is
//! that surface; [`FsArchive`] and [`MemoryArchive`] implement it.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::codec::{CompressionKind, compressor_for};
use crate::error::Result;

pub mod fs;
pub mod memory;
pub mod pack;

pub use fs::FsArchive;
pub use memory::MemoryArchive;

/// A stored content entry, keyed by the hash of its logical path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub path_hash: u64,
    pub compression: CompressionKind,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    /// Reader-specific locator (data offset, slot index, ...)
    pub handle: u64,
}

pub trait ArchiveReader: Send + Sync {
    /// Chunks in archive order; no particular sort is implied.
    fn chunks(&self) -> &[Chunk];

    fn open_raw(&self, chunk: &Chunk) -> Result<Box<dyn Read + Send + '_>>;

    fn open_decompressed(&self, chunk: &Chunk) -> Result<Box<dyn Read + Send + '_>> {
        let raw = self.open_raw(chunk)?;
        compressor_for(chunk.compression).decoder(raw)
    }

    /// Decompress at most `limit` leading bytes of a chunk.
    fn read_prefix(&self, chunk: &Chunk, limit: u64) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(limit.min(chunk.uncompressed_size) as usize);
        self.open_decompressed(chunk)?
            .take(limit)
            .read_to_end(&mut out)?;
        Ok(out)
    }
}

pub fn open_archive(path: &Path) -> Result<Arc<dyn ArchiveReader>> {
    Ok(Arc::new(FsArchive::open(path)?))
}
