use std::sync::Arc;

use super::{Directory, FileEntry, NodeId, NodeKind, TreeNode, VirtualTree};
use crate::error::{Result, VfsError};
use crate::hash::name_hash;

impl VirtualTree {
    fn directory(&self, parent: Option<NodeId>) -> Result<&Directory> {
        match parent {
            None => Ok(&self.roots),
            Some(id) => match &self.get(id)?.kind {
                NodeKind::Directory(dir) => Ok(dir),
                NodeKind::File(_) => Err(VfsError::NotADirectory(id)),
            },
        }
    }

    fn directory_mut(&mut self, parent: Option<NodeId>) -> Result<&mut Directory> {
        match parent {
            None => Ok(&mut self.roots),
            Some(id) => match &mut self.get_mut(id)?.kind {
                NodeKind::Directory(dir) => Ok(dir),
                NodeKind::File(_) => Err(VfsError::NotADirectory(id)),
            },
        }
    }

    fn child_path(&self, parent: Option<NodeId>, name: &str) -> Arc<str> {
        match parent.and_then(|p| self.node(p)) {
            Some(p) => format!("{}/{}", p.path, name).into(),
            None => name.into(),
        }
    }

    fn push_node(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        hash: u64,
        kind: NodeKind,
    ) -> Result<NodeId> {
        let id = NodeId(
            u32::try_from(self.nodes.len())
                .map_err(|_| VfsError::Format("tree node limit reached".into()))?,
        );
        let is_dir = matches!(kind, NodeKind::Directory(_));
        let node = TreeNode {
            id,
            name: name.into(),
            name_hash: hash,
            path: self.child_path(parent, name),
            parent,
            kind,
            is_selected: false,
            is_checked: false,
            is_expanded: false,
        };
        let dir = self.directory_mut(parent)?;
        dir.children.push(id);
        if is_dir {
            dir.lookup.entry(hash).or_default().push(id);
        }
        self.nodes.push(node);
        Ok(id)
    }

    /// Find the directory `name` under `parent` (roots for `None`), creating it
    /// if absent. Lookup goes by name hash first, then by exact name.
    pub fn get_or_create_dir(&mut self, parent: Option<NodeId>, name: &str) -> Result<NodeId> {
        let hash = name_hash(name);
        let dir = self.directory(parent)?;
        if let Some(bucket) = dir.lookup.get(&hash) {
            let found = bucket
                .iter()
                .copied()
                .find(|id| self.nodes[id.index()].name() == name);
            if let Some(id) = found {
                return Ok(id);
            }
        }
        self.push_node(parent, name, hash, NodeKind::Directory(Directory::default()))
    }

    /// Insert a file leaf at `components` below `parent`. Intermediate
    /// directories are shared; the leaf itself is always new, so two entries
    /// resolving to the same path become distinct siblings.
    pub fn insert_file(
        &mut self,
        parent: Option<NodeId>,
        components: &[&str],
        entry: FileEntry,
    ) -> Result<NodeId> {
        let Some((leaf, dirs)) = components.split_last() else {
            return Err(VfsError::Format(format!(
                "empty path for chunk {:016x}",
                entry.chunk.path_hash
            )));
        };
        let mut at = parent;
        for name in dirs {
            at = Some(self.get_or_create_dir(at, name)?);
        }
        self.push_node(at, leaf, name_hash(leaf), NodeKind::File(entry))
    }

    /// Get-or-create every component as a directory; returns the deepest one.
    pub fn ensure_dirs(
        &mut self,
        parent: Option<NodeId>,
        components: &[&str],
    ) -> Result<Option<NodeId>> {
        let mut at = parent;
        for name in components {
            at = Some(self.get_or_create_dir(at, name)?);
        }
        Ok(at)
    }
}
