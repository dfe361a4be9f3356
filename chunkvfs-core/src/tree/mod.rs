//! The merged virtual filesystem tree.
//!
//! Nodes live in one arena (`Vec<TreeNode>`) and refer to each other by
//! [`NodeId`]; a parent is always allocated before its children, so a node's id
//! is strictly greater than its parent's. The root set is an ordinary
//! [`Directory`] that is not itself a node.

use crate::error::{Result, VfsError};
use crate::traverse::NodeFilter;

pub mod insert;
pub mod node;
pub mod sort;

pub use node::{Directory, FileEntry, ItemKind, MountId, NodeId, NodeKind, TreeNode};

#[derive(Debug, Default)]
pub struct VirtualTree {
    pub(crate) nodes: Vec<TreeNode>,
    pub(crate) roots: Directory,
    pub(crate) selected: Option<NodeId>,
    filter_text: String,
    use_regex: bool,
    filter: Option<NodeFilter>,
}

impl VirtualTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total node count, files and directories.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        self.roots.children()
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    pub fn get(&self, id: NodeId) -> Result<&TreeNode> {
        self.node(id).ok_or(VfsError::NodeNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut TreeNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or(VfsError::NodeNotFound(id))
    }

    /// Children of `parent`, or the roots for `None`.
    pub fn children_of(&self, parent: Option<NodeId>) -> Result<&[NodeId]> {
        match parent {
            None => Ok(self.roots()),
            Some(id) => Ok(self.get(id)?.children()),
        }
    }

    /// First child of `parent` named `name`. Directories are found through the
    /// hash index; leaves by a scan.
    pub fn find_child(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        let dir = match parent {
            None => &self.roots,
            Some(id) => match &self.node(id)?.kind {
                NodeKind::Directory(dir) => dir,
                NodeKind::File(_) => return None,
            },
        };
        let by_hash = dir
            .lookup
            .get(&crate::hash::name_hash(name))
            .and_then(|bucket| {
                bucket
                    .iter()
                    .copied()
                    .find(|id| self.nodes[id.index()].name() == name)
            });
        by_hash.or_else(|| {
            dir.children
                .iter()
                .copied()
                .find(|id| self.nodes[id.index()].name() == name)
        })
    }

    /// Node at a `/`-separated tree path (case-sensitive).
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        let mut at = None;
        for name in path.split('/').filter(|c| !c.is_empty()) {
            at = Some(self.find_child(at, name)?);
        }
        at
    }

    /// Every node in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    /// Number of file leaves (File variant).
    pub fn file_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.file().is_some()).count()
    }

    /// Drop all nodes and the selection. Filter state is kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots = Directory::default();
        self.selected = None;
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn use_regex(&self) -> bool {
        self.use_regex
    }

    pub fn filter(&self) -> Option<&NodeFilter> {
        self.filter.as_ref()
    }

    /// Set the filter used by [`VirtualTree::visible`]. An empty text clears it.
    /// An invalid regex leaves the previous filter in place.
    pub fn set_filter(&mut self, text: &str, use_regex: bool) -> Result<()> {
        let filter = NodeFilter::new(text, use_regex)?;
        self.filter_text = text.to_string();
        self.use_regex = use_regex;
        self.filter = filter;
        Ok(())
    }
}
