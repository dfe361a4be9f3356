use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::archive::Chunk;

/// Arena index of a node inside one [`super::VirtualTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountId(pub(crate) u32);

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mount#{}", self.0)
    }
}

/// Kind used for ordering and traversal. Directories sort first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKind {
    Directory,
    File,
}

/// Payload of a file leaf: which mount it came from and the chunk it stands for.
#[derive(Clone, Debug)]
pub struct FileEntry {
    pub mount: MountId,
    pub chunk: Chunk,
    /// Path the chunk resolved to, before any mount label was prepended.
    pub resolved_path: Arc<str>,
}

#[derive(Clone, Debug, Default)]
pub struct Directory {
    pub(crate) children: Vec<NodeId>,
    /// name hash -> directory children carrying that hash
    pub(crate) lookup: HashMap<u64, Vec<NodeId>>,
}

impl Directory {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    File(FileEntry),
    Directory(Directory),
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub(crate) id: NodeId,
    pub(crate) name: Arc<str>,
    pub(crate) name_hash: u64,
    pub(crate) path: Arc<str>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) is_selected: bool,
    pub(crate) is_checked: bool,
    pub(crate) is_expanded: bool,
}

impl TreeNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_hash(&self) -> u64 {
        self.name_hash
    }

    /// Ancestor names and this node's name joined with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn node_kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn file(&self) -> Option<&FileEntry> {
        match &self.kind {
            NodeKind::File(entry) => Some(entry),
            NodeKind::Directory(_) => None,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory(dir) => dir.children(),
            NodeKind::File(_) => &[],
        }
    }

    /// A node without children counts as a file, whatever its variant.
    pub fn kind(&self) -> ItemKind {
        if self.children().is_empty() {
            ItemKind::File
        } else {
            ItemKind::Directory
        }
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub fn is_checked(&self) -> bool {
        self.is_checked
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }
}
