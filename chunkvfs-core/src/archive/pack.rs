use crate::codec::zstdc::ZstdCompressor;
use crate::codec::{CompressionKind, Compressor};
use crate::container::chunktab::{ChunkEntry, ENTRY_SIZE, write_table};
use crate::container::superblock::{HEADER_LEN, Superblock, VERSION};
use crate::error::Result;
use crate::hash::path_hash;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Clone, Debug)]
pub struct PackOptions {
    /// Only accept compression if it saves at least this fraction.
    /// e.g. 0.05 means "compress only if >=5% smaller than STORE".
    pub min_gain: f32,
    pub level: i32,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            min_gain: 0.05,
            level: 3,
        }
    }
}

/// What a pack run wrote. `paths` pairs each chunk hash with the logical path
/// it was derived from, in archive order.
#[derive(Clone, Debug, Default)]
pub struct PackSummary {
    pub paths: Vec<(u64, String)>,
    pub stored: usize,
    pub compressed: usize,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Small Write adapter that counts bytes written
struct CountingWriter<W: Write> {
    inner: W,
    n: u64,
}
impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, n: 0 }
    }
}
impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let k = self.inner.write(buf)?;
        self.n += k as u64;
        Ok(k)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn effective_min_gain(opts: Option<&PackOptions>) -> f32 {
    let val = opts.map(|o| o.min_gain).unwrap_or(0.05);
    if val <= 0.0 { 0.05 } else { val }
}

fn should_compress(u: u64, c: u64, min_gain: f32) -> bool {
    // true if (u - c) >= u * min_gain  ⇔  c <= u * (1 - min_gain)
    u > 0 && (u as f64 - c as f64) >= (u as f64 * min_gain as f64)
}

/// Logical archive path of `path`: relative to the first matching root, `/`-separated.
fn logical_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

struct FilePlan {
    src: PathBuf,
    logical: String,
    hash: u64,
    u_size: u64,
    codec: CompressionKind,
}

/// Pack every regular file under `inputs` into a hash-keyed archive at `out`.
/// Each file becomes one chunk keyed by [`path_hash`] of its path relative to
/// its input root.
pub fn pack(inputs: &[&Path], out: &Path, opts: Option<&PackOptions>) -> Result<PackSummary> {
    let mut files: Vec<(PathBuf, String)> = Vec::new();
    for root in inputs {
        for e in WalkDir::new(root).follow_links(false) {
            let e = e.map_err(std::io::Error::other)?;
            if e.file_type().is_file() {
                files.push((e.path().to_path_buf(), logical_path(e.path(), root)));
            }
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));

    // Case-only duplicates collide on the archive key; first one wins.
    let mut seen = HashSet::new();
    files.retain(|(src, logical)| {
        let fresh = seen.insert(path_hash(logical));
        if !fresh {
            tracing::warn!(src = %src.display(), "skipping file with duplicate path hash");
        }
        fresh
    });

    let min_gain = effective_min_gain(opts);
    let level = opts.map(|o| o.level).unwrap_or(3);
    let zstd = ZstdCompressor;

    let plans: Vec<FilePlan> = files
        .into_par_iter() // In parallel, each file independent
        .map(|(src, logical)| -> Result<FilePlan> {
            let u_size = std::fs::metadata(&src)?.len();

            // Trial compress to measure compressed size
            let mut f = File::open(&src)?;
            let mut cw = CountingWriter::new(std::io::sink());
            zstd.compress(&mut f, &mut cw, level)?;

            let codec = if should_compress(u_size, cw.n, min_gain) {
                CompressionKind::Zstd
            } else {
                CompressionKind::Store
            };
            Ok(FilePlan {
                hash: path_hash(&logical),
                src,
                logical,
                u_size,
                codec,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let chunk_count = plans.len() as u64;
    let chunk_table_off = HEADER_LEN;
    let data_off = chunk_table_off + chunk_count * ENTRY_SIZE as u64;

    let mut out_f = File::create(out)?;

    // chunk data first; the table is written once real sizes are known
    out_f.seek(SeekFrom::Start(data_off))?;
    let mut entries = Vec::with_capacity(plans.len());
    let mut summary = PackSummary::default();
    let mut cursor = data_off;
    {
        let mut w = CountingWriter::new(BufWriter::new(&mut out_f));
        for plan in &plans {
            let start = w.n;
            let mut src = File::open(&plan.src)?.take(plan.u_size);
            match plan.codec {
                CompressionKind::Store => {
                    std::io::copy(&mut src, &mut w)?;
                    summary.stored += 1;
                }
                CompressionKind::Zstd => {
                    zstd.compress(&mut src, &mut w, level)?;
                    summary.compressed += 1;
                }
            }
            let c_size = w.n - start;
            entries.push(ChunkEntry {
                path_hash: plan.hash,
                codec: plan.codec as u8,
                u_size: plan.u_size,
                c_size,
                data_off: cursor,
            });
            cursor += c_size;
            summary.bytes_in += plan.u_size;
            summary.paths.push((plan.hash, plan.logical.clone()));
        }
        w.flush()?;
        summary.bytes_out = w.n;
    }

    out_f.seek(SeekFrom::Start(chunk_table_off))?;
    write_table(&mut out_f, &entries)?;

    out_f.seek(SeekFrom::Start(0))?;
    Superblock {
        version: VERSION,
        chunk_count,
        chunk_table_off,
        data_off,
    }
    .write_to(&mut out_f)?;
    out_f.flush()?;

    tracing::info!(
        out = %out.display(),
        chunks = chunk_count,
        stored = summary.stored,
        compressed = summary.compressed,
        "packed archive"
    );

    Ok(summary)
}
