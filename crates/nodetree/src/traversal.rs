//! Depth-first traversal
//!
//! Two flavours:
//! - [`NodeTree::traverse`] borrows the tree; the visitor only reads.
//! - [`NodeTree::traverse_mut`] hands the visitor `&mut NodeTree`. In `head`
//!   it may remove or replace the node it is visiting; traversal carries on
//!   with the next sibling, or with the replacement.

use crate::arena::NodeTree;
use crate::error::Result;
use crate::types::NodeId;

/// Callbacks on entering (`head`) and leaving (`tail`) each node
pub trait NodeVisitor {
    fn head(&mut self, tree: &NodeTree, node: NodeId, depth: usize) -> Result<()>;

    fn tail(&mut self, _tree: &NodeTree, _node: NodeId, _depth: usize) -> Result<()> {
        Ok(())
    }
}

pub trait NodeVisitorMut {
    fn head(&mut self, tree: &mut NodeTree, node: NodeId, depth: usize) -> Result<()>;

    fn tail(&mut self, _tree: &mut NodeTree, _node: NodeId, _depth: usize) -> Result<()> {
        Ok(())
    }
}

struct HeadFn<F>(F);

impl<F> NodeVisitor for HeadFn<F>
where
    F: FnMut(&NodeTree, NodeId, usize),
{
    fn head(&mut self, tree: &NodeTree, node: NodeId, depth: usize) -> Result<()> {
        (self.0)(tree, node, depth);
        Ok(())
    }
}

impl NodeTree {
    /// Visit `root` and its subtree in document order
    pub fn traverse<V: NodeVisitor>(&self, root: NodeId, visitor: &mut V) -> Result<()> {
        // (node, depth, children already pushed)
        let mut stack = vec![(root, 0usize, false)];

        while let Some((node_id, depth, entered)) = stack.pop() {
            if entered {
                visitor.tail(self, node_id, depth)?;
                continue;
            }
            visitor.head(self, node_id, depth)?;
            stack.push((node_id, depth, true));

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in self.get(node_id)?.child_ids().iter().rev() {
                stack.push((child_id, depth + 1, false));
            }
        }

        Ok(())
    }

    /// Call `f` on entering every node
    pub fn for_each_node<F>(&self, root: NodeId, f: F) -> Result<()>
    where
        F: FnMut(&NodeTree, NodeId, usize),
    {
        self.traverse(root, &mut HeadFn(f))
    }

    /// Visit `root` and its subtree, letting the visitor edit the tree.
    ///
    /// Nodes removed in `head` are not descended into or tailed. A node
    /// replaced in `head` is swapped for its replacement, which is then
    /// descended into.
    pub fn traverse_mut<V: NodeVisitorMut>(&mut self, root: NodeId, visitor: &mut V) -> Result<()> {
        let mut root = root;
        let mut node = root;
        let mut depth = 0usize;

        loop {
            let parent = self.parent(node)?;
            let orig_size = match parent {
                Some(p) => self.child_count(p)?,
                None => 0,
            };
            let next = self.next_sibling(node)?;

            visitor.head(self, node, depth)?;

            if let Some(parent) = parent {
                if self.parent(node)? != Some(parent) {
                    if self.child_count(parent)? == orig_size {
                        // replaced: the old node keeps its last index
                        let index = self.get(node)?.sibling_index.get();
                        let replacement = self.child(parent, index)?;
                        if node == root {
                            root = replacement;
                        }
                        node = replacement;
                    } else if node == root {
                        return Ok(());
                    } else if let Some(next) = next {
                        node = next;
                        continue;
                    } else {
                        match self.ascend(root, parent, depth - 1, visitor)? {
                            Some((n, d)) => {
                                node = n;
                                depth = d;
                                continue;
                            }
                            None => return Ok(()),
                        }
                    }
                }
            }

            if let Some(first) = self.first_child(node)? {
                node = first;
                depth += 1;
                continue;
            }
            match self.ascend(root, node, depth, visitor)? {
                Some((n, d)) => {
                    node = n;
                    depth = d;
                }
                None => return Ok(()),
            }
        }
    }

    /// Tail `node` and then its ancestors until one has a next sibling.
    /// `None` once `root` has been tailed.
    fn ascend<V: NodeVisitorMut>(
        &mut self,
        root: NodeId,
        mut node: NodeId,
        mut depth: usize,
        visitor: &mut V,
    ) -> Result<Option<(NodeId, usize)>> {
        loop {
            visitor.tail(self, node, depth)?;
            if node == root {
                return Ok(None);
            }
            if let Some(next) = self.next_sibling(node)? {
                return Ok(Some((next, depth)));
            }
            match self.parent(node)? {
                Some(parent) if depth > 0 => {
                    node = parent;
                    depth -= 1;
                }
                _ => return Ok(None),
            }
        }
    }

    /// `root` and every node below it, in document order
    pub fn descendants(&self, root: NodeId) -> Result<Descendants<'_>> {
        self.get(root)?;
        Ok(Descendants {
            tree: self,
            stack: vec![root],
        })
    }
}

/// Pre-order iterator returned by [`NodeTree::descendants`]
pub struct Descendants<'a> {
    tree: &'a NodeTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node_id = self.stack.pop()?;
        if let Ok(node) = self.tree.get(node_id) {
            self.stack.extend(node.child_ids().iter().rev());
        }
        Some(node_id)
    }
}
