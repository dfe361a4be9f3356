//! Selection, check and expansion state on tree nodes.

use crate::error::{Result, VfsError};
use crate::tree::{NodeId, VirtualTree};

impl VirtualTree {
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Make `id` the only selected node.
    pub fn select(&mut self, id: NodeId) -> Result<()> {
        self.get(id)?;
        self.clear_selection();
        self.nodes[id.index()].is_selected = true;
        self.selected = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if let Some(prev) = self.selected.take() {
            if let Some(node) = self.nodes.get_mut(prev.index()) {
                node.is_selected = false;
            }
        }
    }

    pub fn set_checked(&mut self, id: NodeId, value: bool) -> Result<()> {
        self.get_mut(id)?.is_checked = value;
        Ok(())
    }

    pub fn set_expanded(&mut self, id: NodeId, value: bool) -> Result<()> {
        self.get_mut(id)?.is_expanded = value;
        Ok(())
    }

    /// Expand every node that has children.
    pub fn expand_all(&mut self) {
        for node in &mut self.nodes {
            if !node.children().is_empty() {
                node.is_expanded = true;
            }
        }
    }

    /// Toggle `is_checked` across `visible`, from the selected node to `target`
    /// inclusive, in either direction. A toggled node that is collapsed has its
    /// whole subtree set to the same value. Without a selected node inside
    /// `visible`, only `target` is toggled.
    pub fn toggle_range(&mut self, visible: &[NodeId], target: NodeId) -> Result<()> {
        let end = visible
            .iter()
            .position(|&id| id == target)
            .ok_or(VfsError::NodeNotFound(target))?;
        let start = self
            .selected
            .and_then(|anchor| visible.iter().position(|&id| id == anchor))
            .unwrap_or(end);
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };

        for &id in &visible[lo..=hi] {
            let node = self.get(id)?;
            let value = !node.is_checked();
            if node.is_directory() && !node.is_expanded() {
                self.check_subtree(id, value)?;
            } else {
                self.nodes[id.index()].is_checked = value;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Chunk;
    use crate::codec::CompressionKind;
    use crate::tree::{FileEntry, MountId};

    fn build(paths: &[&str]) -> VirtualTree {
        let mut tree = VirtualTree::new();
        for path in paths {
            let parts: Vec<&str> = path.split('/').collect();
            let entry = FileEntry {
                mount: MountId(0),
                chunk: Chunk {
                    path_hash: 0,
                    compression: CompressionKind::Store,
                    compressed_size: 0,
                    uncompressed_size: 0,
                    handle: 0,
                },
                resolved_path: (*path).into(),
            };
            tree.insert_file(None, &parts, entry).unwrap();
        }
        tree.sort();
        tree
    }

    fn checked(tree: &VirtualTree) -> Vec<&str> {
        tree.traverse_checked().map(|n| n.path()).collect()
    }

    #[test]
    fn single_selection() {
        let mut tree = build(&["a.bin", "b.bin"]);
        let (a, b) = (tree.roots()[0], tree.roots()[1]);
        tree.select(a).unwrap();
        tree.select(b).unwrap();
        assert_eq!(tree.selected(), Some(b));
        assert!(!tree.get(a).unwrap().is_selected());
        assert_eq!(tree.nodes().filter(|n| n.is_selected()).count(), 1);
    }

    #[test]
    fn range_toggle_both_directions() {
        let mut tree = build(&["1", "2", "3", "4"]);
        let visible = tree.visible();
        tree.select(visible[3]).unwrap();
        tree.toggle_range(&visible, visible[1]).unwrap();
        assert_eq!(checked(&tree), ["2", "3", "4"]);

        tree.select(visible[0]).unwrap();
        tree.toggle_range(&visible, visible[2]).unwrap();
        assert_eq!(checked(&tree), ["1", "4"]);
    }

    #[test]
    fn collapsed_directory_takes_its_subtree_along() {
        let mut tree = build(&["d/x", "d/y", "f"]);
        let visible = tree.visible();
        assert_eq!(visible.len(), 2);
        tree.select(visible[0]).unwrap();
        tree.toggle_range(&visible, visible[1]).unwrap();
        assert_eq!(checked(&tree), ["d", "d/x", "d/y", "f"]);
    }

    #[test]
    fn expanded_directory_toggles_alone() {
        let mut tree = build(&["d/x", "f"]);
        tree.expand_all();
        let visible = tree.visible();
        let d = visible[0];
        tree.select(d).unwrap();
        tree.toggle_range(&visible, d).unwrap();
        assert_eq!(checked(&tree), ["d"]);
    }

    #[test]
    fn no_anchor_toggles_target_only() {
        let mut tree = build(&["1", "2", "3"]);
        let visible = tree.visible();
        tree.toggle_range(&visible, visible[1]).unwrap();
        assert_eq!(checked(&tree), ["2"]);

        let hidden = NodeId(99);
        assert!(matches!(
            tree.toggle_range(&visible, hidden),
            Err(VfsError::NodeNotFound(_))
        ));
    }
}
