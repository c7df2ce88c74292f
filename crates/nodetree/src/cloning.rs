//! Deep and shallow clone
//!
//! Clones are new arena entries. Attribute stores are copied, never shared,
//! so editing a clone can't reach the source.

use std::collections::VecDeque;

use crate::arena::NodeTree;
use crate::error::Result;
use crate::types::NodeId;

impl NodeTree {
    /// Copy of this node alone: attributes and content, no children, no
    /// parent
    pub fn shallow_clone(&mut self, node_id: NodeId) -> Result<NodeId> {
        let copy = self.get(node_id)?.shallow_copy();
        Ok(self.insert_detached(copy))
    }

    /// Independent copy of the whole subtree.
    ///
    /// A cloned non-document node is placed under a fresh copy of its source
    /// document (settings and base URI, no other children) so it keeps
    /// serializing the same way. Nodes without a document come back as
    /// plain roots.
    pub fn deep_clone(&mut self, node_id: NodeId) -> Result<NodeId> {
        let root = self.shallow_clone(node_id)?;

        if !self.get(node_id)?.is_document() {
            if let Some(doc) = self.owner_document(node_id)? {
                let synthetic = self.shallow_clone(doc)?;
                self.attach_clone(synthetic, root)?;
            }
        }

        let mut cloned = 1;
        let mut queue = VecDeque::from([(node_id, root)]);
        while let Some((source, target)) = queue.pop_front() {
            let children = self.get(source)?.child_ids().to_vec();
            for child in children {
                let copy = self.shallow_clone(child)?;
                self.attach_clone(target, copy)?;
                queue.push_back((child, copy));
                cloned += 1;
            }
        }

        tracing::debug!("Cloned {} nodes from node {}", cloned, node_id);
        Ok(root)
    }

    /// Deep clones of each child, in order
    pub fn child_nodes_copy(&mut self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let children = self.children(node_id)?;
        children
            .into_iter()
            .map(|child| self.deep_clone(child))
            .collect()
    }

    // `child` is freshly created, so there's nothing to detach or check
    fn attach_clone(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let list = self.container_mut(parent)?.ensure_children();
        list.nodes.push(child);
        let index = list.nodes.len() - 1;
        let node = self.get_mut(child)?;
        node.parent = Some(parent);
        node.sibling_index.set(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputSettings, ParseSettings};
    use crate::types::NodeKind;

    fn three_levels() -> (NodeTree, NodeId) {
        let mut tree = NodeTree::new();
        let doc = tree.create_document("https://example.com/");
        let root = tree.create_element("div");
        tree.append_child(doc, root).unwrap();
        tree.append(root, "<ul id=\"list\"><li>one</li><li>two</li></ul><p>after</p>")
            .unwrap();
        (tree, root)
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let (mut tree, original) = three_levels();
        let clone = tree.deep_clone(original).unwrap();
        assert_ne!(clone, original);
        assert!(tree.has_same_value(clone, original).unwrap());

        let clone_ul = tree.child(clone, 0).unwrap();
        let clone_li = tree.child(clone_ul, 1).unwrap();
        tree.remove(clone_li).unwrap();

        let ul = tree.child(original, 0).unwrap();
        let li = tree.child(ul, 1).unwrap();
        assert_eq!(tree.parent(li).unwrap(), Some(ul));
        assert_eq!(tree.child_count(ul).unwrap(), 2);
        assert!(!tree.has_same_value(clone, original).unwrap());
    }

    #[test]
    fn test_mutating_original_breaks_equality() {
        let (mut tree, original) = three_levels();
        let clone = tree.deep_clone(original).unwrap();
        let ul = tree.child(original, 0).unwrap();
        tree.set_attr(ul, "id", "changed").unwrap();

        let clone_ul = tree.child(clone, 0).unwrap();
        assert_eq!(tree.attr(clone_ul, "id").unwrap(), "list");
        assert!(!tree.has_same_value(clone, original).unwrap());
    }

    #[test]
    fn test_clone_gets_synthetic_document() {
        let mut tree = NodeTree::new();
        let doc = tree.create_document_with(ParseSettings::PRESERVE_CASE, OutputSettings::xml(), "https://example.com/");
        let el = tree.create_element("item");
        let child = tree.create_text("t");
        tree.append_child(doc, el).unwrap();
        tree.append_child(el, child).unwrap();

        let clone = tree.deep_clone(el).unwrap();
        let synthetic = tree.parent(clone).unwrap().unwrap();
        assert_ne!(synthetic, doc);
        assert_eq!(tree.kind(synthetic).unwrap(), NodeKind::Document);
        assert_eq!(tree.children(synthetic).unwrap(), vec![clone]);
        assert_eq!(tree.output_settings(clone), OutputSettings::xml());
        assert_eq!(tree.base_uri(clone).unwrap(), "https://example.com/");
        assert_eq!(tree.child_count(doc).unwrap(), 1);

        // a cloned document has no synthetic parent
        let doc_clone = tree.deep_clone(doc).unwrap();
        assert!(!tree.has_parent(doc_clone));
        assert_eq!(tree.child_count(doc_clone).unwrap(), 1);

        // nor does a node that never had a document
        let orphan = tree.create_element("span");
        let orphan_clone = tree.deep_clone(orphan).unwrap();
        assert!(!tree.has_parent(orphan_clone));
    }

    #[test]
    fn test_shallow_clone() {
        let (mut tree, original) = three_levels();
        let ul = tree.child(original, 0).unwrap();
        let copy = tree.shallow_clone(ul).unwrap();

        assert!(!tree.has_parent(copy));
        assert_eq!(tree.child_count(copy).unwrap(), 0);
        assert_eq!(tree.attr(copy, "id").unwrap(), "list");

        tree.set_attr(copy, "id", "other").unwrap();
        assert_eq!(tree.attr(ul, "id").unwrap(), "list");
    }

    #[test]
    fn test_child_nodes_copy() {
        let (mut tree, original) = three_levels();
        let copies = tree.child_nodes_copy(original).unwrap();
        assert_eq!(copies.len(), 2);
        let ul = tree.child(original, 0).unwrap();
        assert!(tree.has_same_value(copies[0], ul).unwrap());
        assert_ne!(copies[0], ul);
    }
}
