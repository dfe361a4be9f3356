//! Flattening the tree: full pre-order, checked-only, and the visible set
//! under expansion and filter state.

use regex::{Regex, RegexBuilder};

use crate::error::{Result, VfsError};
use crate::tree::{NodeId, TreeNode, VirtualTree};

/// Compiled path filter. Both modes ignore case.
#[derive(Clone, Debug)]
pub enum NodeFilter {
    /// Stores the needle already lower-cased.
    Substring(String),
    Regex(Regex),
}

impl NodeFilter {
    /// `None` for an empty text; an invalid regex is an error.
    pub fn new(text: &str, use_regex: bool) -> Result<Option<Self>> {
        if text.is_empty() {
            return Ok(None);
        }
        if use_regex {
            let re = RegexBuilder::new(text)
                .case_insensitive(true)
                .build()
                .map_err(VfsError::InvalidFilter)?;
            Ok(Some(Self::Regex(re)))
        } else {
            Ok(Some(Self::Substring(text.to_lowercase())))
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Substring(needle) => path.to_lowercase().contains(needle.as_str()),
            Self::Regex(re) => re.is_match(path),
        }
    }
}

/// Depth-first pre-order walk. Holds only a stack of ids, so a new one can be
/// started at any time.
pub struct Preorder<'a> {
    tree: &'a VirtualTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id)?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

impl VirtualTree {
    pub fn traverse_all(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.roots().iter().rev().copied().collect(),
        }
    }

    /// Pre-order walk from `id`, `id` included.
    pub fn traverse_from(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Checked nodes in pre-order, regardless of expansion.
    pub fn traverse_checked(&self) -> impl Iterator<Item = &TreeNode> {
        self.traverse_all().filter(|n| n.is_checked())
    }

    /// Visible list for an ad-hoc filter.
    pub fn traverse_visible(&self, filter_text: &str, use_regex: bool) -> Result<Vec<NodeId>> {
        let filter = NodeFilter::new(filter_text, use_regex)?;
        Ok(self.visible_with(filter.as_ref()))
    }

    /// Visible list under the tree's own filter state.
    pub fn visible(&self) -> Vec<NodeId> {
        self.visible_with(self.filter())
    }

    pub fn visible_with(&self, filter: Option<&NodeFilter>) -> Vec<NodeId> {
        let shown = filter.map(|f| self.match_map(f));
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(shown) = &shown {
                if !shown[id.index()] {
                    continue;
                }
            }
            let node = &self.nodes[id.index()];
            out.push(id);
            if node.is_expanded() {
                stack.extend(node.children().iter().rev());
            }
        }
        out
    }

    /// Per node: does it or anything below it match? File leaves match on
    /// their own path; directories, empty ones included, only through
    /// descendants.
    fn match_map(&self, filter: &NodeFilter) -> Vec<bool> {
        let mut shown = vec![false; self.nodes.len()];
        // children always have larger ids than their parent
        for node in self.nodes.iter().rev() {
            let i = node.id().index();
            if node.file().is_some() && filter.matches(node.path()) {
                shown[i] = true;
            }
            if shown[i] {
                if let Some(parent) = node.parent() {
                    shown[parent.index()] = true;
                }
            }
        }
        shown
    }

    /// Set `is_checked` on `id` and everything below it.
    pub fn check_subtree(&mut self, id: NodeId, value: bool) -> Result<()> {
        self.get(id)?;
        let ids: Vec<NodeId> = self.traverse_from(id).map(|n| n.id()).collect();
        for id in ids {
            self.nodes[id.index()].is_checked = value;
        }
        Ok(())
    }
}
