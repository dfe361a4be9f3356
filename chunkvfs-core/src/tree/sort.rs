use std::cmp::Ordering;

use super::{NodeId, NodeKind, TreeNode, VirtualTree};

fn compare(a: &TreeNode, b: &TreeNode) -> Ordering {
    a.kind()
        .cmp(&b.kind())
        .then_with(|| a.name().cmp(b.name()))
}

fn sort_children(nodes: &[TreeNode], children: &mut [NodeId]) {
    children.sort_by(|a, b| compare(&nodes[a.index()], &nodes[b.index()]));
}

impl VirtualTree {
    /// Order every directory (and the roots): directory-kind first, then by
    /// name, ordinal. Running it twice changes nothing.
    pub fn sort(&mut self) {
        let mut roots = std::mem::take(&mut self.roots.children);
        sort_children(&self.nodes, &mut roots);
        self.roots.children = roots;

        for i in 0..self.nodes.len() {
            let mut children = match &mut self.nodes[i].kind {
                NodeKind::Directory(dir) if dir.children.len() > 1 => {
                    std::mem::take(&mut dir.children)
                }
                _ => continue,
            };
            sort_children(&self.nodes, &mut children);
            if let NodeKind::Directory(dir) = &mut self.nodes[i].kind {
                dir.children = children;
            }
        }
        tracing::debug!(nodes = self.nodes.len(), "sorted tree");
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
        tree
    }

    fn names(tree: &VirtualTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|id| tree.get(*id).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn directories_first_then_ordinal() {
        let mut tree = build(&["z.bin", "b/1", "B.bin", "a/2", "a.bin"]);
        tree.sort();
        assert_eq!(names(&tree, tree.roots()), ["a", "b", "B.bin", "a.bin", "z.bin"]);
    }

    #[test]
    fn nested_directories_are_sorted() {
        let mut tree = build(&["r/y", "r/x/1", "r/a"]);
        tree.sort();
        let r = tree.roots()[0];
        assert_eq!(names(&tree, tree.get(r).unwrap().children()), ["x", "a", "y"]);
    }

    #[test]
    fn empty_directory_sorts_with_files() {
        let mut tree = build(&["c.bin", "d/1"]);
        tree.get_or_create_dir(None, "a").unwrap();
        tree.sort();
        assert_eq!(names(&tree, tree.roots()), ["d", "a", "c.bin"]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut tree = build(&["q/w/e", "Q", "a/s/d", "a/f", "0"]);
        tree.sort();
        let once: Vec<Vec<NodeId>> = tree.nodes().map(|n| n.children().to_vec()).collect();
        let roots_once = tree.roots().to_vec();
        tree.sort();
        let twice: Vec<Vec<NodeId>> = tree.nodes().map(|n| n.children().to_vec()).collect();
        assert_eq!(once, twice);
        assert_eq!(roots_once, tree.roots());
    }
}
