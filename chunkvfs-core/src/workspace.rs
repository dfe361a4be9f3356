//! A resolver, a set of mounted archives and the tree built from them.

use std::io::Read;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;

use crate::archive::{ArchiveReader, open_archive};
use crate::config::WorkspaceConfig;
use crate::error::{Result, VfsError};
use crate::extract::{self, CancelToken, ExtractOptions, ExtractionReport};
use crate::mount::{ArchiveMount, MountOptions, MountReport};
use crate::resolver::{LoadStats, PathResolver};
use crate::tree::{FileEntry, MountId, NodeId, TreeNode, VirtualTree};

#[derive(Debug, Default)]
pub struct Workspace {
    resolver: PathResolver,
    mounts: Vec<ArchiveMount>,
    tree: VirtualTree,
    options: MountOptions,
    next_mount: u32,
}

fn mount_error(label: &str, source: VfsError) -> VfsError {
    tracing::warn!(label, error = %source, "mount failed");
    VfsError::Mount {
        label: label.to_string(),
        source: Box::new(source),
    }
}

impl Workspace {
    pub fn new(resolver: PathResolver, options: MountOptions) -> Self {
        Self {
            resolver,
            options,
            ..Default::default()
        }
    }

    /// Load the configured hashtables; no archives are mounted yet.
    pub fn from_config(config: &WorkspaceConfig) -> Result<Self> {
        let (resolver, _) = PathResolver::from_files(&config.hashtables)?;
        Ok(Self::new(resolver, config.mount_options()))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn tree(&self) -> &VirtualTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut VirtualTree {
        &mut self.tree
    }

    pub fn mounts(&self) -> &[ArchiveMount] {
        &self.mounts
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    pub fn mount(
        &mut self,
        label: impl Into<String>,
        archive: Arc<dyn ArchiveReader>,
    ) -> Result<MountReport> {
        let label = label.into();
        self.mount_archives(vec![(label.clone(), archive)])
            .pop()
            .unwrap_or_else(|| Err(mount_error(&label, VfsError::Format("not mounted".into()))))
    }

    /// Ingest several archives in parallel, then sort once. One report per
    /// input, in input order; a failed mount leaves no nodes behind.
    pub fn mount_archives(
        &mut self,
        archives: Vec<(String, Arc<dyn ArchiveReader>)>,
    ) -> Vec<Result<MountReport>> {
        let fresh: Vec<ArchiveMount> = archives
            .into_iter()
            .map(|(label, archive)| {
                let id = MountId(self.next_mount);
                self.next_mount += 1;
                ArchiveMount::new(id, label, archive)
            })
            .collect();

        let tree = Mutex::new(mem::take(&mut self.tree));
        let results: Vec<Result<MountReport>> = fresh
            .par_iter()
            .map(|m| {
                let stats = m
                    .ingest(&tree, &self.resolver, &self.options)
                    .map_err(|e| mount_error(m.label(), e))?;
                Ok(MountReport {
                    mount: m.id(),
                    label: m.label().to_string(),
                    stats,
                })
            })
            .collect();
        self.tree = tree.into_inner().unwrap_or_else(PoisonError::into_inner);

        let mut failed = false;
        for (m, r) in fresh.into_iter().zip(&results) {
            if r.is_ok() {
                self.mounts.push(m);
            } else {
                failed = true;
            }
        }
        if failed {
            // drop whatever a failed ingest managed to insert
            if let Err(e) = self.rebuild() {
                tracing::warn!(error = %e, "rebuild after failed mount");
            }
        } else {
            self.tree.sort();
        }
        results
    }

    /// Open and mount archive files. Files that cannot be opened are reported
    /// and the rest are mounted.
    pub fn mount_paths(&mut self, paths: &[PathBuf]) -> Vec<Result<MountReport>> {
        let opened: Vec<Result<Arc<dyn ArchiveReader>>> =
            paths.par_iter().map(|p| open_archive(p)).collect();

        let mut results: Vec<Option<Result<MountReport>>> = Vec::with_capacity(paths.len());
        let mut pending = Vec::new();
        let mut slots = Vec::new();
        for (path, archive) in paths.iter().zip(opened) {
            let label = path.display().to_string();
            match archive {
                Ok(archive) => {
                    slots.push(results.len());
                    results.push(None);
                    pending.push((label, archive));
                }
                Err(e) => results.push(Some(Err(mount_error(&label, e)))),
            }
        }
        for (slot, report) in slots.into_iter().zip(self.mount_archives(pending)) {
            results[slot] = Some(report);
        }
        results.into_iter().flatten().collect()
    }

    pub fn unmount(&mut self, id: MountId) -> Result<()> {
        let pos = self
            .mounts
            .iter()
            .position(|m| m.id() == id)
            .ok_or(VfsError::UnknownMount(id))?;
        let m = self.mounts.remove(pos);
        tracing::info!(mount = %id, label = m.label(), "unmounted");
        self.rebuild()
    }

    /// Add `files` to the current hashtable (known hashes keep their path) and
    /// rebuild the tree. On a load error the current table and tree are kept.
    pub fn load_hashtables(&mut self, files: &[impl AsRef<Path>]) -> Result<LoadStats> {
        let mut resolver = self.resolver.clone();
        let stats = resolver.load_all(files)?;
        self.set_resolver(resolver)?;
        Ok(stats)
    }

    /// Drop the current hashtable, load only `files` and rebuild the tree.
    pub fn replace_hashtables(&mut self, files: &[impl AsRef<Path>]) -> Result<LoadStats> {
        let (resolver, stats) = PathResolver::from_files(files)?;
        self.set_resolver(resolver)?;
        Ok(stats)
    }

    pub fn set_resolver(&mut self, resolver: PathResolver) -> Result<()> {
        tracing::info!(entries = resolver.len(), "hashtable replaced");
        self.resolver = resolver;
        self.rebuild()
    }

    /// Recreate the tree from every current mount. Node flags and the
    /// selection are reset; the filter is kept.
    pub fn rebuild(&mut self) -> Result<()> {
        self.tree.clear();
        let tree = Mutex::new(mem::take(&mut self.tree));
        let outcome = self
            .mounts
            .par_iter()
            .try_for_each(|m| m.ingest(&tree, &self.resolver, &self.options).map(|_| ()));
        self.tree = tree.into_inner().unwrap_or_else(PoisonError::into_inner);
        self.tree.sort();
        tracing::info!(mounts = self.mounts.len(), nodes = self.tree.len(), "tree rebuilt");
        outcome
    }

    pub fn archive(&self, mount: MountId) -> Result<&Arc<dyn ArchiveReader>> {
        self.mounts
            .iter()
            .find(|m| m.id() == mount)
            .map(|m| m.archive())
            .ok_or(VfsError::UnknownMount(mount))
    }

    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        self.tree.find_by_path(path)
    }

    pub fn file_entry(&self, id: NodeId) -> Result<&FileEntry> {
        self.tree.get(id)?.file().ok_or(VfsError::NotAFile(id))
    }

    /// Decompressed content of a file node.
    pub fn open_file(&self, id: NodeId) -> Result<Box<dyn Read + Send + '_>> {
        let entry = self.file_entry(id)?;
        self.archive(entry.mount)?.open_decompressed(&entry.chunk)
    }

    /// Checked file leaves in tree order.
    pub fn checked_files(&self) -> Vec<NodeId> {
        self.tree
            .traverse_checked()
            .filter(|n| n.file().is_some())
            .map(|n| n.id())
            .collect()
    }

    /// Every file leaf in tree order.
    pub fn all_files(&self) -> Vec<NodeId> {
        self.tree
            .traverse_all()
            .filter(|n| n.file().is_some())
            .map(|n| n.id())
            .collect()
    }

    pub fn selected_file(&self) -> Option<&TreeNode> {
        self.tree
            .selected()
            .and_then(|id| self.tree.node(id))
            .filter(|n| n.file().is_some())
    }

    pub fn select(&mut self, id: NodeId) -> Result<()> {
        self.tree.select(id)
    }

    pub fn set_checked(&mut self, id: NodeId, value: bool) -> Result<()> {
        self.tree.set_checked(id, value)
    }

    pub fn set_expanded(&mut self, id: NodeId, value: bool) -> Result<()> {
        self.tree.set_expanded(id, value)
    }

    pub fn expand_all(&mut self) {
        self.tree.expand_all()
    }

    pub fn set_filter(&mut self, text: &str, use_regex: bool) -> Result<()> {
        self.tree.set_filter(text, use_regex)
    }

    /// Range toggle over the current visible list.
    pub fn toggle_range(&mut self, target: NodeId) -> Result<()> {
        let visible = self.tree.visible();
        self.tree.toggle_range(&visible, target)
    }

    /// Extract file nodes under `root`. Nodes that cannot be extracted (a
    /// directory, an unsafe path) and write errors are reported per file.
    pub fn extract(
        &self,
        nodes: &[NodeId],
        root: &Path,
        opts: &ExtractOptions,
        cancel: &CancelToken,
    ) -> Result<ExtractionReport> {
        let plan = extract::plan(&self.tree, nodes, root, opts);
        let mut report = extract::run(&plan.jobs, |mount| self.archive(mount).cloned(), cancel);
        if cancel.is_cancelled() && report.skipped > 0 {
            tracing::warn!(skipped = report.skipped, "extraction cancelled");
        }
        report.failed.extend(plan.rejected);
        Ok(report)
    }
}
