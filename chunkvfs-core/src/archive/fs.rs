use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{ArchiveReader, Chunk};
use crate::codec::CompressionKind;
use crate::container::chunktab::{ENTRY_SIZE, read_table_from_slice};
use crate::container::superblock::{HEADER_LEN, Superblock, VERSION};
use crate::error::{Result, VfsError};

/// An archive file opened once and shared read-only between readers.
pub struct FsArchive {
    path: PathBuf,
    f: Arc<Mutex<File>>,
    sb: Superblock,
    chunks: Vec<Chunk>,
}

impl FsArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let mut f = File::open(path)?;
        let file_len = f.metadata()?.len();

        let sb = Superblock::read_from(&mut f)
            .map_err(|e| VfsError::Format(format!("{}: {e}", path.display())))?;
        if sb.version != VERSION {
            return Err(VfsError::Format(format!(
                "{}: unsupported version {}",
                path.display(),
                sb.version
            )));
        }

        let table_len = sb
            .chunk_count
            .checked_mul(ENTRY_SIZE as u64)
            .ok_or_else(|| VfsError::Format("chunk table size overflow".into()))?;
        if sb.chunk_table_off < HEADER_LEN
            || sb.chunk_table_off.saturating_add(table_len) > sb.data_off
            || sb.data_off > file_len
        {
            return Err(VfsError::Format(format!(
                "{}: chunk table out of bounds",
                path.display()
            )));
        }

        f.seek(SeekFrom::Start(sb.chunk_table_off))?;
        let mut tbytes = vec![0u8; table_len as usize];
        f.read_exact(&mut tbytes)?;
        let table = read_table_from_slice(&tbytes, sb.chunk_count)?;

        let mut chunks = Vec::with_capacity(table.len());
        for (i, ce) in table.iter().enumerate() {
            if ce.data_off < sb.data_off || ce.data_off.saturating_add(ce.c_size) > file_len {
                return Err(VfsError::Format(format!("chunk[{i}] out of bounds")));
            }
            chunks.push(Chunk {
                path_hash: ce.path_hash,
                compression: CompressionKind::from_u8(ce.codec)?,
                compressed_size: ce.c_size,
                uncompressed_size: ce.u_size,
                handle: ce.data_off,
            });
        }

        tracing::debug!(archive = %path.display(), chunks = chunks.len(), "opened archive");

        Ok(Self {
            path: path.to_path_buf(),
            f: Arc::new(Mutex::new(f)),
            sb,
            chunks,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn superblock(&self) -> &Superblock {
        &self.sb
    }
}

impl ArchiveReader for FsArchive {
    fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    fn open_raw(&self, chunk: &Chunk) -> Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(SectionReader {
            f: Arc::clone(&self.f),
            pos: chunk.handle,
            remain: chunk.compressed_size,
        }))
    }
}

/// Positional reader over one chunk's bytes. The shared handle is locked only
/// for the duration of a single `read` call.
struct SectionReader {
    f: Arc<Mutex<File>>,
    pos: u64,
    remain: u64,
}

impl Read for SectionReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.remain == 0 || buf.is_empty() {
            return Ok(0);
        }
        let cap = std::cmp::min(self.remain, buf.len() as u64) as usize;
        let n = {
            let mut f = self
                .f
                .lock()
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            f.seek(SeekFrom::Start(self.pos))?;
            f.read(&mut buf[..cap])?
        };
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "chunk data truncated",
            ));
        }
        self.pos += n as u64;
        self.remain -= n as u64;
        Ok(n)
    }
}
