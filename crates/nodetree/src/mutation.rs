//! Structural editing
//!
//! Every change of parentage goes through `reparent` or the
//! whole-list move in `add_children_at`; nothing else assigns a
//! parent. Edits clear the parent's index-valid flag instead of restamping
//! sibling indexes eagerly.
//!
//! ```text
//! wrap(X, "<div><span></span></div><p></p>")
//!
//!   parent            parent
//!     └ X      →        ├ div
//!                       │  └ span
//!                       │     └ X
//!                       └ p          <- remainder, after the wrap
//! ```

use ahash::AHashSet;

use crate::arena::NodeTree;
use crate::error::{Result, TreeError};
use crate::types::NodeId;
use crate::utils::deep_child;

impl NodeTree {
    fn index_in_parent(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        let list = self
            .child_list(parent)
            .ok_or_else(|| TreeError::precondition(format!("node {parent} has no children")))?;
        let cached = self.get(child)?.sibling_index.get();
        if list.valid.get() && list.nodes.get(cached) == Some(&child) {
            return Ok(cached);
        }
        list.nodes
            .iter()
            .position(|&id| id == child)
            .ok_or_else(|| {
                TreeError::precondition(format!("node {child} is not in the children of {parent}"))
            })
    }

    /// Detach `child` from `parent`. Fails if `parent` doesn't own it.
    pub(crate) fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.get(child)?.parent != Some(parent) {
            return Err(TreeError::precondition(format!(
                "node {child} is not a child of {parent}"
            )));
        }
        let index = self.index_in_parent(parent, child)?;
        let list = self.container_mut(parent)?.ensure_children();
        list.nodes.remove(index);
        if index < list.nodes.len() {
            list.invalidate();
        }
        self.get_mut(child)?.parent = None;
        Ok(())
    }

    /// Detach `node` from its parent. The subtree below stays attached to
    /// `node`. A no-op for a root.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        match self.get(node)?.parent {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(()),
        }
    }

    /// Detach `child` and point it at `new_parent`. The caller places it in
    /// the child list.
    fn reparent(&mut self, new_parent: NodeId, child: NodeId) -> Result<()> {
        if self.is_self_or_ancestor(child, new_parent) {
            return Err(TreeError::precondition(format!(
                "node {child} can't be moved into itself or its own descendant {new_parent}"
            )));
        }
        self.remove(child)?;
        self.get_mut(child)?.parent = Some(new_parent);
        Ok(())
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.container_mut(parent)?;
        self.reparent(parent, child)?;
        let list = self.container_mut(parent)?.ensure_children();
        list.nodes.push(child);
        let index = list.nodes.len() - 1;
        self.get(child)?.sibling_index.set(index);
        Ok(())
    }

    pub fn append_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<()> {
        let len = self.child_count(parent)?;
        self.add_children_at(parent, len, children)
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.add_children_at(parent, 0, &[child])
    }

    /// Insert `children` at `index` of `parent` (`index == child_count`
    /// appends)
    pub fn insert_children(&mut self, parent: NodeId, index: usize, children: &[NodeId]) -> Result<()> {
        let len = self.child_count(parent)?;
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        self.add_children_at(parent, index, children)
    }

    /// Bulk insert. When `children` is exactly another parent's whole child
    /// list (same ids, same order) the list is moved in one step instead of
    /// detaching each node.
    pub(crate) fn add_children_at(
        &mut self,
        parent: NodeId,
        index: usize,
        children: &[NodeId],
    ) -> Result<()> {
        self.container_mut(parent)?;
        if children.is_empty() {
            return Ok(());
        }

        let mut seen = AHashSet::with_capacity(children.len());
        for &child in children {
            self.get(child)?;
            if !seen.insert(child) {
                return Err(TreeError::invalid_argument(format!(
                    "node {child} appears more than once in the inserted nodes"
                )));
            }
            if self.is_self_or_ancestor(child, parent) {
                return Err(TreeError::precondition(format!(
                    "node {child} can't be moved into itself or its own descendant {parent}"
                )));
            }
        }

        if let Some(source) = self.whole_list_owner(children)? {
            if source == parent {
                return Ok(());
            }
            self.move_whole_list(source, parent, index)?;
            return Ok(());
        }

        for &child in children {
            self.reparent(parent, child)?;
        }
        let list = self.container_mut(parent)?.ensure_children();
        // detaching from this same parent may have shortened the list
        let index = index.min(list.nodes.len());
        list.nodes.insert_many(index, children.iter().copied());
        list.invalidate();
        Ok(())
    }

    /// The parent whose entire child list is `children`, if any
    fn whole_list_owner(&self, children: &[NodeId]) -> Result<Option<NodeId>> {
        let Some(source) = self.get(children[0])?.parent else {
            return Ok(None);
        };
        let matches = self
            .child_list(source)
            .is_some_and(|list| list.as_slice() == children);
        Ok(matches.then_some(source))
    }

    fn move_whole_list(&mut self, source: NodeId, dest: NodeId, index: usize) -> Result<()> {
        let moved = {
            let list = self.container_mut(source)?.ensure_children();
            list.invalidate();
            std::mem::take(&mut list.nodes)
        };
        tracing::debug!(
            "Moving {} children from node {} to node {} in one step",
            moved.len(),
            source,
            dest
        );

        let list = self.container_mut(dest)?.ensure_children();
        let index = index.min(list.nodes.len());
        list.nodes.insert_many(index, moved.iter().copied());
        list.invalidate();

        for child in moved {
            self.get_mut(child)?.parent = Some(dest);
        }
        Ok(())
    }

    /// Put `incoming` where `old` sits under `parent`. `incoming` is
    /// detached from wherever it was first.
    pub(crate) fn replace_child(&mut self, parent: NodeId, old: NodeId, incoming: NodeId) -> Result<()> {
        if old == incoming {
            return Ok(());
        }
        if self.get(old)?.parent != Some(parent) {
            return Err(TreeError::precondition(format!(
                "node {old} is not a child of {parent}"
            )));
        }
        if self.is_self_or_ancestor(incoming, parent) {
            return Err(TreeError::precondition(format!(
                "node {incoming} can't replace a node inside its own subtree"
            )));
        }

        self.remove(incoming)?;
        let index = self.index_in_parent(parent, old)?;
        let list = self.container_mut(parent)?.ensure_children();
        list.nodes[index] = incoming;

        let node = self.get_mut(incoming)?;
        node.parent = Some(parent);
        node.sibling_index.set(index);
        self.get_mut(old)?.parent = None;
        Ok(())
    }

    /// Replace `node` in the tree with `replacement`
    pub fn replace_with(&mut self, node: NodeId, replacement: NodeId) -> Result<()> {
        let parent = self.require_parent(node, "replace_with")?;
        self.replace_child(parent, node, replacement)
    }

    fn require_parent(&self, node: NodeId, op: &str) -> Result<NodeId> {
        self.get(node)?
            .parent
            .ok_or_else(|| TreeError::precondition(format!("{op} requires node {node} to have a parent")))
    }

    /// Parse `markup` in the parent's context and insert the nodes before
    /// `node`
    pub fn before(&mut self, node: NodeId, markup: &str) -> Result<()> {
        self.add_sibling_html(node, 0, markup)
    }

    /// Parse `markup` in the parent's context and insert the nodes after
    /// `node`
    pub fn after(&mut self, node: NodeId, markup: &str) -> Result<()> {
        self.add_sibling_html(node, 1, markup)
    }

    /// Parse `markup` in the context of `parent` and append the nodes
    pub fn append(&mut self, parent: NodeId, markup: &str) -> Result<()> {
        let nodes = self.parse_children_of(parent, markup)?;
        let len = self.child_count(parent)?;
        self.add_children_at(parent, len, &nodes)
    }

    /// Parse `markup` in the context of `parent` and insert the nodes first
    pub fn prepend(&mut self, parent: NodeId, markup: &str) -> Result<()> {
        let nodes = self.parse_children_of(parent, markup)?;
        self.add_children_at(parent, 0, &nodes)
    }

    fn parse_children_of(&mut self, parent: NodeId, markup: &str) -> Result<Vec<NodeId>> {
        self.container_mut(parent)?;
        let base_uri = self.base_uri(parent)?;
        let parser = self.parser();
        parser.parse_fragment(self, markup, Some(parent), &base_uri)
    }

    fn add_sibling_html(&mut self, node: NodeId, offset: usize, markup: &str) -> Result<()> {
        let parent = self.require_parent(node, "before/after")?;
        let base_uri = self.base_uri(node)?;

        let parser = self.parser();
        let nodes = parser.parse_fragment(self, markup, Some(parent), &base_uri)?;
        let index = self.sibling_index(node)? + offset;
        self.add_children_at(parent, index, &nodes)
    }

    /// Insert `sibling` directly before `node`, moving it if attached
    pub fn before_node(&mut self, node: NodeId, sibling: NodeId) -> Result<()> {
        self.add_sibling_node(node, 0, sibling)
    }

    /// Insert `sibling` directly after `node`, moving it if attached
    pub fn after_node(&mut self, node: NodeId, sibling: NodeId) -> Result<()> {
        self.add_sibling_node(node, 1, sibling)
    }

    fn add_sibling_node(&mut self, node: NodeId, offset: usize, sibling: NodeId) -> Result<()> {
        let parent = self.require_parent(node, "before/after")?;
        if sibling == node {
            return Ok(());
        }
        if self.get(sibling)?.parent == Some(parent) {
            self.remove_child(parent, sibling)?;
        }
        let index = self.sibling_index(node)? + offset;
        self.add_children_at(parent, index, &[sibling])
    }

    /// Wrap `node` in the structure parsed from `markup`; `node` ends up
    /// inside the deepest first element. Returns `node`.
    ///
    /// Markup that doesn't start with an element leaves the tree unchanged.
    /// Extra top-level nodes in `markup` follow the wrapper, in order.
    pub fn wrap(&mut self, node: NodeId, markup: &str) -> Result<NodeId> {
        if markup.is_empty() {
            return Err(TreeError::invalid_argument("wrap markup must not be empty"));
        }
        let parent = self.get(node)?.parent;
        let base_uri = self.base_uri(node)?;

        let parser = self.parser();
        let nodes = parser.parse_fragment(self, markup, Some(parent.unwrap_or(node)), &base_uri)?;
        let Some(&wrapper) = nodes.first().filter(|&&first| self.is_element(first)) else {
            tracing::debug!("wrap markup {:?} has no leading element, node {} unchanged", markup, node);
            return Ok(node);
        };
        let deepest = deep_child(self, wrapper)?;

        match parent {
            Some(parent) => self.replace_child(parent, node, wrapper)?,
            None => self.remove(wrapper)?,
        }
        self.append_child(deepest, node)?;

        let mut last = wrapper;
        for &remainder in &nodes[1..] {
            self.remove(remainder)?;
            if self.has_parent(wrapper) {
                self.after_node(last, remainder)?;
                last = remainder;
            }
        }
        Ok(node)
    }

    /// Replace `node` with its children. Returns the former first child.
    pub fn unwrap(&mut self, node: NodeId) -> Result<Option<NodeId>> {
        let parent = self.require_parent(node, "unwrap")?;
        let children = self.children(node)?;
        let first = children.first().copied();

        let index = self.sibling_index(node)?;
        self.add_children_at(parent, index, &children)?;
        self.remove_child(parent, node)?;
        Ok(first)
    }

    /// Detach every child of `node`
    pub fn empty(&mut self, node: NodeId) -> Result<()> {
        let removed = match self.get_mut(node)?.container_mut() {
            Some(container) => match container.children.as_mut() {
                Some(list) => {
                    list.invalidate();
                    std::mem::take(&mut list.nodes)
                }
                None => return Ok(()),
            },
            None => return Ok(()),
        };
        for child in removed {
            self.get_mut(child)?.parent = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_with(markup: &str) -> (NodeTree, NodeId) {
        let mut tree = NodeTree::new();
        let doc = tree.create_document("");
        let body = tree.create_element("body");
        tree.append_child(doc, body).unwrap();
        tree.append(body, markup).unwrap();
        (tree, body)
    }

    #[test]
    fn test_remove_middle_child_reindexes() {
        let mut tree = NodeTree::new();
        let parent = tree.create_element("div");
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        tree.append_children(parent, &[a, b, c]).unwrap();

        tree.remove(b).unwrap();
        assert_eq!(tree.sibling_index(c).unwrap(), 1);
        assert_eq!(tree.sibling_index(a).unwrap(), 0);
        assert_eq!(tree.parent(b).unwrap(), None);
        assert_eq!(tree.children(parent).unwrap(), vec![a, c]);

        // orphan removal is a no-op
        tree.remove(b).unwrap();
    }

    #[test]
    fn test_remove_keeps_subtree() {
        let (mut tree, body) = body_with("<div><p>one</p></div>");
        let div = tree.child(body, 0).unwrap();
        let p = tree.child(div, 0).unwrap();
        tree.remove(div).unwrap();
        assert_eq!(tree.parent(p).unwrap(), Some(div));
        assert_eq!(tree.child_count(body).unwrap(), 0);
    }

    #[test]
    fn test_append_moves_within_parent() {
        let mut tree = NodeTree::new();
        let parent = tree.create_element("ul");
        let a = tree.create_element("li");
        let b = tree.create_element("li");
        tree.append_children(parent, &[a, b]).unwrap();

        tree.append_child(parent, a).unwrap();
        assert_eq!(tree.children(parent).unwrap(), vec![b, a]);
        assert_eq!(tree.sibling_index(a).unwrap(), 1);
        assert_eq!(tree.sibling_index(b).unwrap(), 0);
    }

    #[test]
    fn test_insert_children_validation() {
        let mut tree = NodeTree::new();
        let parent = tree.create_element("div");
        let child = tree.create_element("span");
        let text = tree.create_text("leaf");

        assert_eq!(
            tree.insert_children(parent, 1, &[child]).unwrap_err(),
            TreeError::IndexOutOfRange { index: 1, len: 0 }
        );
        assert!(matches!(
            tree.insert_children(parent, 0, &[child, child]),
            Err(TreeError::InvalidArgument(_))
        ));
        assert!(matches!(
            tree.append_child(text, child),
            Err(TreeError::InvalidNodeType { .. })
        ));

        tree.append_child(parent, child).unwrap();
        assert!(matches!(
            tree.append_child(child, parent),
            Err(TreeError::Precondition(_))
        ));
        assert!(matches!(
            tree.append_child(parent, parent),
            Err(TreeError::Precondition(_))
        ));
    }

    #[test]
    fn test_whole_list_move() {
        let mut tree = NodeTree::new();
        let from = tree.create_element("div");
        let to = tree.create_element("section");
        let existing = tree.create_element("h1");
        tree.append_child(to, existing).unwrap();
        let moved: Vec<NodeId> = (0..5).map(|_| tree.create_element("p")).collect();
        tree.append_children(from, &moved).unwrap();

        tree.insert_children(to, 0, &moved).unwrap();
        assert_eq!(tree.child_count(from).unwrap(), 0);
        assert_eq!(tree.child_count(to).unwrap(), 6);
        for (i, &id) in moved.iter().enumerate() {
            assert_eq!(tree.parent(id).unwrap(), Some(to));
            assert_eq!(tree.sibling_index(id).unwrap(), i);
        }
        assert_eq!(tree.sibling_index(existing).unwrap(), 5);

        // same list back into its own parent: unchanged
        let all = tree.children(to).unwrap();
        tree.insert_children(to, 6, &all).unwrap();
        assert_eq!(tree.child(to, 0).unwrap(), moved[0]);
    }

    #[test]
    fn test_partial_list_takes_slow_path() {
        let mut tree = NodeTree::new();
        let from = tree.create_element("div");
        let to = tree.create_element("div");
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        let c = tree.create_text("c");
        tree.append_children(from, &[a, b, c]).unwrap();

        tree.append_children(to, &[c, a]).unwrap();
        assert_eq!(tree.children(from).unwrap(), vec![b]);
        assert_eq!(tree.children(to).unwrap(), vec![c, a]);
        assert_eq!(tree.sibling_index(b).unwrap(), 0);
        assert_eq!(tree.sibling_index(a).unwrap(), 1);
    }

    #[test]
    fn test_replace_with() {
        let (mut tree, body) = body_with("<p>one</p><p>two</p>");
        let first = tree.child(body, 0).unwrap();
        let second = tree.child(body, 1).unwrap();
        let h1 = tree.create_element("h1");

        tree.replace_with(first, h1).unwrap();
        assert_eq!(tree.children(body).unwrap(), vec![h1, second]);
        assert_eq!(tree.parent(first).unwrap(), None);
        assert_eq!(tree.sibling_index(h1).unwrap(), 0);

        // replacement is detached from its old place first
        tree.replace_with(h1, second).unwrap();
        assert_eq!(tree.children(body).unwrap(), vec![second]);
        assert_eq!(tree.sibling_index(second).unwrap(), 0);

        tree.replace_with(second, second).unwrap();
        assert!(matches!(
            tree.replace_with(first, h1),
            Err(TreeError::Precondition(_))
        ));
    }

    #[test]
    fn test_replace_child_rejects_foreign_node() {
        let mut tree = NodeTree::new();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        let child = tree.create_element("span");
        let other = tree.create_element("em");
        tree.append_child(a, child).unwrap();
        assert!(matches!(
            tree.replace_child(b, child, other),
            Err(TreeError::Precondition(_))
        ));
    }

    #[test]
    fn test_before_after_markup() {
        let (mut tree, body) = body_with("<p>middle</p>");
        let p = tree.child(body, 0).unwrap();

        tree.before(p, "<h1>top</h1>").unwrap();
        tree.after(p, "<hr><footer>end</footer>").unwrap();
        assert_eq!(
            tree.html(body).unwrap(),
            "<h1>top</h1><p>middle</p><hr><footer>end</footer>"
        );

        let orphan = tree.create_element("p");
        assert!(matches!(
            tree.before(orphan, "<b></b>"),
            Err(TreeError::Precondition(_))
        ));
    }

    #[test]
    fn test_before_after_node() {
        let (mut tree, body) = body_with("<a></a><b></b><c></c>");
        let [a, b, c] = [0, 1, 2].map(|i| tree.child(body, i).unwrap());

        tree.after_node(a, c).unwrap();
        assert_eq!(tree.children(body).unwrap(), vec![a, c, b]);
        tree.before_node(a, b).unwrap();
        assert_eq!(tree.children(body).unwrap(), vec![b, a, c]);
        tree.after_node(a, a).unwrap();
        assert_eq!(tree.children(body).unwrap(), vec![b, a, c]);

        let fresh = tree.create_text("x");
        tree.after_node(c, fresh).unwrap();
        assert_eq!(tree.last_child(body).unwrap(), Some(fresh));
        assert_eq!(tree.sibling_index(fresh).unwrap(), 3);
    }

    fn assert_wrap_unwrap_restores(markup: &str, pick: impl Fn(&NodeTree, NodeId) -> NodeId) {
        let (mut tree, body) = body_with(markup);
        let before = tree.outer_html(body).unwrap();
        let target = pick(&tree, body);

        tree.wrap(target, "<div></div>").unwrap();
        let div = tree.parent(target).unwrap().unwrap();
        assert!(tree.name_is(div, "div"));
        assert_ne!(tree.outer_html(body).unwrap(), before);

        assert_eq!(tree.unwrap(div).unwrap(), Some(target));
        assert_eq!(tree.outer_html(body).unwrap(), before);
    }

    #[test]
    fn test_wrap_unwrap_leaf() {
        assert_wrap_unwrap_restores("<p>a</p>text<p>b</p>", |tree, body| {
            tree.child(body, 1).unwrap()
        });
    }

    #[test]
    fn test_wrap_unwrap_container_with_children() {
        assert_wrap_unwrap_restores("<i>x</i><p><b>one</b> two <em>three</em></p>", |tree, body| {
            tree.child(body, 1).unwrap()
        });
    }

    #[test]
    fn test_wrap_unwrap_sole_child() {
        assert_wrap_unwrap_restores("<section><p>only</p></section>", |tree, body| {
            let section = tree.child(body, 0).unwrap();
            tree.child(section, 0).unwrap()
        });
    }

    #[test]
    fn test_wrap_into_deepest_first_element() {
        let (mut tree, body) = body_with("<span>x</span>");
        let span = tree.child(body, 0).unwrap();
        tree.wrap(span, "<div class=\"outer\"><p><b></b></p><i></i></div>").unwrap();
        assert_eq!(
            tree.html(body).unwrap(),
            "<div class=\"outer\"><p><b><span>x</span></b></p><i></i></div>"
        );
    }

    #[test]
    fn test_wrap_unbalanced_remainder_follows() {
        let (mut tree, body) = body_with("<span>x</span>");
        let span = tree.child(body, 0).unwrap();
        tree.wrap(span, "<div></div><p></p>").unwrap();
        assert_eq!(tree.html(body).unwrap(), "<div><span>x</span></div><p></p>");

        let (mut tree, body) = body_with("<span>x</span><em></em>");
        let span = tree.child(body, 0).unwrap();
        tree.wrap(span, "<div></div>tail<p></p><q></q>").unwrap();
        assert_eq!(
            tree.html(body).unwrap(),
            "<div><span>x</span></div>tail<p></p><q></q><em></em>"
        );
    }

    #[test]
    fn test_wrap_without_leading_element_is_noop() {
        let (mut tree, body) = body_with("<span>x</span>");
        let span = tree.child(body, 0).unwrap();
        let before = tree.outer_html(body).unwrap();
        assert_eq!(tree.wrap(span, "just text").unwrap(), span);
        assert_eq!(tree.outer_html(body).unwrap(), before);
        assert!(matches!(tree.wrap(span, ""), Err(TreeError::InvalidArgument(_))));
    }

    #[test]
    fn test_wrap_orphan() {
        let mut tree = NodeTree::new();
        let span = tree.create_element("span");
        tree.wrap(span, "<div></div><p></p>").unwrap();
        let div = tree.parent(span).unwrap().unwrap();
        assert!(tree.name_is(div, "div"));
        assert_eq!(tree.parent(div).unwrap(), None);
    }

    #[test]
    fn test_unwrap() {
        let (mut tree, body) = body_with("<div><p>a</p><p>b</p></div><hr>");
        let div = tree.child(body, 0).unwrap();
        let first = tree.unwrap(div).unwrap();
        assert_eq!(first, Some(tree.child(body, 0).unwrap()));
        assert_eq!(tree.html(body).unwrap(), "<p>a</p><p>b</p><hr>");
        assert_eq!(tree.parent(div).unwrap(), None);

        let hr = tree.child(body, 2).unwrap();
        assert_eq!(tree.unwrap(hr).unwrap(), None);
        assert_eq!(tree.child_count(body).unwrap(), 2);

        assert!(matches!(tree.unwrap(div), Err(TreeError::Precondition(_))));
    }

    #[test]
    fn test_empty() {
        let (mut tree, body) = body_with("<p>a</p>b<i></i>");
        let children = tree.children(body).unwrap();
        tree.empty(body).unwrap();
        assert_eq!(tree.child_count(body).unwrap(), 0);
        assert!(children.iter().all(|&c| !tree.has_parent(c)));

        // re-attach after empty
        tree.append_child(body, children[2]).unwrap();
        assert_eq!(tree.sibling_index(children[2]).unwrap(), 0);
    }
}
