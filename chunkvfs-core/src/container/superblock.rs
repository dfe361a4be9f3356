use std::io::{Read, Write};

pub const MAGIC: &[u8; 6] = b"CVFSCK";
pub const VERSION: u16 = 1;
/// magic(6) + version(2) + chunk_count(8) + chunk_table_off(8) + data_off(8)
pub const HEADER_LEN: u64 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub version: u16,
    pub chunk_count: u64,
    /// Absolute file offset of the first chunk table entry
    pub chunk_table_off: u64,
    /// Absolute file offset where the data section starts (chunk table end)
    pub data_off: u64,
}

impl Superblock {
    pub fn write_to(&self, mut w: impl Write) -> std::io::Result<()> {
        w.write_all(MAGIC)?;
        w.write_all(&self.version.to_le_bytes())?;
        w.write_all(&self.chunk_count.to_le_bytes())?;
        w.write_all(&self.chunk_table_off.to_le_bytes())?;
        w.write_all(&self.data_off.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from(mut r: impl Read) -> std::io::Result<Self> {
        let mut magic = [0u8; 6];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "bad archive magic",
            ));
        }
        let mut v = [0u8; 2];
        r.read_exact(&mut v)?;
        let version = u16::from_le_bytes(v);
        let mut buf8 = [0u8; 8];
        r.read_exact(&mut buf8)?;
        let chunk_count = u64::from_le_bytes(buf8);
        r.read_exact(&mut buf8)?;
        let chunk_table_off = u64::from_le_bytes(buf8);
        r.read_exact(&mut buf8)?;
        let data_off = u64::from_le_bytes(buf8);
        Ok(Self {
            version,
            chunk_count,
            chunk_table_off,
            data_off,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_len_matches_encoding() {
        let sb = Superblock {
            version: VERSION,
            chunk_count: 3,
            chunk_table_off: HEADER_LEN,
            data_off: HEADER_LEN + 120,
        };
        let mut buf = Vec::new();
        sb.write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, HEADER_LEN);
        assert_eq!(Superblock::read_from(&buf[..]).unwrap(), sb);
    }

    #[test]
    fn rejects_foreign_magic() {
        let err = Superblock::read_from(&b"BADMAG\x01\x00"[..]).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
