//! Hash → path resolution.
//!
//! A [`PathResolver`] owns the hashtable: a map from a chunk's path hash to its
//! human-readable path, loaded additively from any number of text files. Each
//! record is `"<hex hash> <path>"`; only the first space separates, so paths may
//! contain spaces. When a hash occurs more than once the first occurrence wins,
//! which lets trusted tables be layered under broader ones.
//!
//! Chunks absent from the table are named by [`PathResolver::guess_path`] (hex
//! placeholder plus a sniffed extension) or, failing that, by the bare
//! placeholder. Resolution never fails.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::{ArchiveReader, Chunk};
use crate::error::Result;
use crate::hash::{hex16, path_hash};

pub mod sniff;

use sniff::{FileKind, SNIFF_LEN};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub added: usize,
    pub duplicates: usize,
    pub malformed: usize,
}

impl LoadStats {
    fn merge(&mut self, other: LoadStats) {
        self.added += other.added;
        self.duplicates += other.duplicates;
        self.malformed += other.malformed;
    }
}

/// Where a resolved name came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Table,
    Guessed,
    Placeholder,
}

#[derive(Clone, Debug, Default)]
pub struct PathResolver {
    items: HashMap<u64, Arc<str>>,
    sources: Vec<PathBuf>,
}

/// One hashtable record. `None` for blank lines, `Some(None)` for malformed ones.
fn parse_line(line: &str) -> Option<Option<(u64, &str)>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    match line.split_once(' ') {
        Some((hash, path)) => {
            let parsed = (hash.len() <= 16)
                .then(|| u64::from_str_radix(hash, 16).ok())
                .flatten();
            match parsed {
                Some(hash) if !path.is_empty() => Some(Some((hash, path))),
                _ => Some(None),
            }
        }
        // bare path flavor: the key is derived from the path itself
        None => Some(Some((path_hash(line), line))),
    }
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file in order; earlier files take precedence.
    pub fn from_files(files: &[impl AsRef<Path>]) -> Result<(Self, LoadStats)> {
        let mut resolver = Self::new();
        let stats = resolver.load_all(files)?;
        Ok((resolver, stats))
    }

    /// Add every file in order on top of what is already loaded.
    pub fn load_all(&mut self, files: &[impl AsRef<Path>]) -> Result<LoadStats> {
        let mut stats = LoadStats::default();
        for file in files {
            stats.merge(self.load(file)?);
        }
        Ok(stats)
    }

    pub fn load(&mut self, source: impl AsRef<Path>) -> Result<LoadStats> {
        let source = source.as_ref();
        let stats = self.load_reader(BufReader::new(File::open(source)?))?;
        if stats.malformed > 0 {
            tracing::warn!(
                source = %source.display(),
                malformed = stats.malformed,
                "skipped malformed hashtable lines"
            );
        }
        tracing::info!(
            source = %source.display(),
            added = stats.added,
            duplicates = stats.duplicates,
            "loaded hashtable"
        );
        self.sources.push(source.to_path_buf());
        Ok(stats)
    }

    pub fn load_reader(&mut self, reader: impl BufRead) -> Result<LoadStats> {
        let mut stats = LoadStats::default();
        for line in reader.lines() {
            match parse_line(&line?) {
                None => {}
                Some(None) => stats.malformed += 1,
                Some(Some((hash, path))) => {
                    if self.insert(hash, path) {
                        stats.added += 1;
                    } else {
                        stats.duplicates += 1;
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Add one entry unless the hash is already known. Returns whether it was added.
    pub fn insert(&mut self, hash: u64, path: &str) -> bool {
        match self.items.entry(hash) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(Arc::from(path));
                true
            }
        }
    }

    pub fn insert_many<'a>(&mut self, entries: impl IntoIterator<Item = (u64, &'a str)>) -> usize {
        entries
            .into_iter()
            .filter(|(hash, path)| self.insert(*hash, path))
            .count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Files loaded so far, in load order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn lookup(&self, hash: u64) -> Option<&Arc<str>> {
        self.items.get(&hash)
    }

    pub fn get_path(&self, chunk: &Chunk) -> String {
        match self.lookup(chunk.path_hash) {
            Some(path) => path.to_string(),
            None => hex16(chunk.path_hash),
        }
    }

    pub fn try_get_path(&self, chunk: &Chunk) -> Option<&Arc<str>> {
        self.lookup(chunk.path_hash)
    }

    fn sniff_extension(chunk: &Chunk, archive: &dyn ArchiveReader) -> Option<&'static str> {
        match archive.read_prefix(chunk, SNIFF_LEN) {
            Ok(head) => FileKind::identify(&head).extension(),
            Err(e) => {
                tracing::debug!(
                    hash = %hex16(chunk.path_hash),
                    error = %e,
                    "could not sniff chunk"
                );
                None
            }
        }
    }

    /// Placeholder name with an extension sniffed from the chunk's content.
    /// Falls back to the bare placeholder on any read or identification failure.
    pub fn guess_path(chunk: &Chunk, archive: &dyn ArchiveReader) -> String {
        let placeholder = hex16(chunk.path_hash);
        match Self::sniff_extension(chunk, archive) {
            Some(ext) => format!("{placeholder}.{ext}"),
            None => placeholder,
        }
    }

    /// Table hit, then guess (when enabled), then placeholder.
    pub fn resolve(
        &self,
        chunk: &Chunk,
        archive: &dyn ArchiveReader,
        guess_on_miss: bool,
    ) -> (Arc<str>, Resolution) {
        if let Some(path) = self.try_get_path(chunk) {
            return (Arc::clone(path), Resolution::Table);
        }
        let placeholder = hex16(chunk.path_hash);
        match guess_on_miss
            .then(|| Self::sniff_extension(chunk, archive))
            .flatten()
        {
            Some(ext) => {
                tracing::debug!(hash = %placeholder, ext, "guessed extension");
                (format!("{placeholder}.{ext}").into(), Resolution::Guessed)
            }
            None => (placeholder.into(), Resolution::Placeholder),
        }
    }

    /// Write the table as `"<HEX16> <path>"` lines, sorted by hash.
    pub fn write_to(&self, mut w: impl Write) -> Result<()> {
        let mut rows: Vec<_> = self.items.iter().collect();
        rows.sort_by_key(|(hash, _)| **hash);
        for (hash, path) in rows {
            writeln!(w, "{hash:016X} {path}")?;
        }
        Ok(())
    }
}
