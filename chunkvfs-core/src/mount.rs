//! Ingesting one archive into the shared tree.

use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::archive::{ArchiveReader, Chunk};
use crate::error::Result;
use crate::hash::hex16;
use crate::resolver::{PathResolver, Resolution};
use crate::tree::{FileEntry, MountId, NodeId, VirtualTree};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountMode {
    /// Every archive's paths share the tree root.
    #[default]
    Merge,
    /// Each archive gets a top-level directory named after its label.
    Isolated,
}

#[derive(Clone, Debug)]
pub struct MountOptions {
    pub mode: MountMode,
    /// Sniff content to pick an extension for chunks missing from the hashtable.
    pub guess_on_miss: bool,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            mode: MountMode::Merge,
            guess_on_miss: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountStats {
    pub chunks: usize,
    pub resolved: usize,
    pub guessed: usize,
    pub placeholders: usize,
}

impl MountStats {
    fn count(&mut self, how: Resolution) {
        self.chunks += 1;
        match how {
            Resolution::Table => self.resolved += 1,
            Resolution::Guessed => self.guessed += 1,
            Resolution::Placeholder => self.placeholders += 1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MountReport {
    pub mount: MountId,
    pub label: String,
    pub stats: MountStats,
}

/// Non-empty `/`-separated components of a resolved path.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|c| !c.is_empty()).collect()
}

/// One opened archive and the label it is shown under.
#[derive(Clone)]
pub struct ArchiveMount {
    id: MountId,
    label: String,
    archive: Arc<dyn ArchiveReader>,
}

impl std::fmt::Debug for ArchiveMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveMount")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("chunks", &self.archive.chunks().len())
            .finish()
    }
}

impl ArchiveMount {
    pub fn new(id: MountId, label: impl Into<String>, archive: Arc<dyn ArchiveReader>) -> Self {
        Self {
            id,
            label: label.into(),
            archive,
        }
    }

    pub fn id(&self) -> MountId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn archive(&self) -> &Arc<dyn ArchiveReader> {
        &self.archive
    }

    /// Chunks in archive order.
    pub fn chunks(&self) -> &[Chunk] {
        self.archive.chunks()
    }

    fn insertion_root(&self, tree: &mut VirtualTree, mode: MountMode) -> Result<Option<NodeId>> {
        match mode {
            MountMode::Merge => Ok(None),
            MountMode::Isolated => {
                let parts: Vec<&str> = self
                    .label
                    .split(['/', '\\'])
                    .filter(|c| !c.is_empty())
                    .collect();
                tree.ensure_dirs(None, &parts)
            }
        }
    }

    /// Resolve every chunk (in parallel) and insert it into `tree`. Each chunk
    /// becomes exactly one file leaf. The tree lock is taken once, for the
    /// insertion pass only, so get-or-create stays atomic across mounts.
    pub fn ingest(
        &self,
        tree: &Mutex<VirtualTree>,
        resolver: &PathResolver,
        opts: &MountOptions,
    ) -> Result<MountStats> {
        tracing::info!(
            mount = %self.id,
            label = %self.label,
            chunks = self.chunks().len(),
            "mounting"
        );
        let archive = self.archive.as_ref();
        let resolved: Vec<(Chunk, Arc<str>, Resolution)> = self
            .chunks()
            .par_iter()
            .map(|chunk| {
                let (path, how) = resolver.resolve(chunk, archive, opts.guess_on_miss);
                (*chunk, path, how)
            })
            .collect();

        let mut stats = MountStats::default();
        let mut tree = tree.lock().unwrap_or_else(PoisonError::into_inner);
        let root = self.insertion_root(&mut tree, opts.mode)?;
        for (chunk, path, how) in resolved {
            let placeholder;
            let mut parts = split_path(&path);
            if parts.is_empty() {
                placeholder = hex16(chunk.path_hash);
                parts.push(&placeholder);
            }
            let entry = FileEntry {
                mount: self.id,
                chunk,
                resolved_path: Arc::clone(&path),
            };
            tree.insert_file(root, &parts, entry)?;
            stats.count(how);
        }

        tracing::info!(
            mount = %self.id,
            resolved = stats.resolved,
            guessed = stats.guessed,
            placeholders = stats.placeholders,
            "mounted"
        );
        Ok(stats)
    }
}
