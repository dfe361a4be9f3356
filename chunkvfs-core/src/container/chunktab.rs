use crate::error::Result;
use std::io::Write;

pub const ENTRY_SIZE: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkEntry {
    pub path_hash: u64,
    pub codec: u8,
    pub u_size: u64,
    pub c_size: u64,
    pub data_off: u64,
}

pub fn write_table(mut w: impl Write, entries: &[ChunkEntry]) -> Result<()> {
    let mut buf = [0u8; ENTRY_SIZE];
    for e in entries {
        buf[0..8].copy_from_slice(&e.path_hash.to_le_bytes());
        buf[8] = e.codec;
        for b in &mut buf[9..16] {
            *b = 0;
        }
        buf[16..24].copy_from_slice(&e.u_size.to_le_bytes());
        buf[24..32].copy_from_slice(&e.c_size.to_le_bytes());
        buf[32..40].copy_from_slice(&e.data_off.to_le_bytes());
        w.write_all(&buf)?;
    }
    Ok(())
}

#[inline]
fn le64(x: &[u8]) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&x[..8]);
    u64::from_le_bytes(b)
}

pub fn read_table_from_slice(buf: &[u8], count: u64) -> std::io::Result<Vec<ChunkEntry>> {
    let need = (count as usize).checked_mul(ENTRY_SIZE).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "chunk table size overflow")
    })?;
    if buf.len() != need {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "chunk table size mismatch: got {} bytes, expected {}",
                buf.len(),
                need
            ),
        ));
    }

    let mut out = Vec::with_capacity(count as usize);
    // Layout: [0..8]=path_hash, [8]=codec, [9..16]=pad, [16..24]=u_size, [24..32]=c_size, [32..40]=data_off
    for e in buf.chunks_exact(ENTRY_SIZE) {
        out.push(ChunkEntry {
            path_hash: le64(&e[0..8]),
            codec: e[8],
            u_size: le64(&e[16..24]),
            c_size: le64(&e[24..32]),
            data_off: le64(&e[32..40]),
        });
    }
    Ok(out)
}
