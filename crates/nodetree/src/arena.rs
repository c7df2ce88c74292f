//! Arena-based node storage and navigation
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<Node>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte NodeId, not an 8-byte pointer
//! ```
//!
//! A node's parent is a plain `NodeId`; the parent's child list is the only
//! owning edge, so there is no reference cycle to manage. Detached nodes stay
//! in the arena and can be re-attached by id. Several roots (documents,
//! orphans, clones) live side by side.
//!
//! ## Sibling indexes
//!
//! Every node caches its position in its parent's child list. Structural
//! edits only clear the parent's `valid` flag; the next index read restamps
//! all children in one pass.

use std::fmt;
use std::rc::Rc;

use crate::attributes::BASE_URI_KEY;
use crate::config::{OutputSettings, ParseSettings};
use crate::error::{Result, TreeError};
use crate::parser::{FragmentParser, HtmlParser};
use crate::types::{
    ChildList, ContainerData, DoctypeData, DocumentData, ElementData, Node, NodeData, NodeId,
    NodeKind,
};

/// Arena owning every node of one or more trees
pub struct NodeTree {
    /// All nodes stored sequentially; a NodeId is an index here
    nodes: Vec<Node>,

    /// Used by `before`/`after`/`wrap` to turn markup into nodes
    parser: Rc<dyn FragmentParser>,
}

impl NodeTree {
    /// Create an empty arena with the built-in HTML parser
    pub fn new() -> Self {
        Self::with_parser(HtmlParser::new())
    }

    /// Create an empty arena that parses fragments with `parser`
    pub fn with_parser(parser: impl FragmentParser + 'static) -> Self {
        Self {
            nodes: Vec::with_capacity(256),
            parser: Rc::new(parser),
        }
    }

    pub fn parser(&self) -> Rc<dyn FragmentParser> {
        Rc::clone(&self.parser)
    }

    fn add_node(&mut self, node: Node) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        node_id
    }

    pub(crate) fn insert_detached(&mut self, node: Node) -> NodeId {
        self.add_node(node)
    }

    /// New document root with HTML settings
    pub fn create_document(&mut self, base_uri: &str) -> NodeId {
        self.create_document_with(ParseSettings::HTML_DEFAULT, OutputSettings::html(), base_uri)
    }

    pub fn create_document_with(
        &mut self,
        settings: ParseSettings,
        output: OutputSettings,
        base_uri: &str,
    ) -> NodeId {
        let mut container = ContainerData::default();
        if !base_uri.is_empty() {
            container
                .ensure_attributes()
                .put(BASE_URI_KEY, Some(base_uri));
        }
        self.add_node(Node::new(NodeData::Document(Box::new(DocumentData {
            container,
            settings,
            output,
        }))))
    }

    /// New detached element. The tag is stored as given.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.add_node(Node::new(NodeData::Element(ElementData {
            tag: tag.to_string(),
            container: ContainerData::default(),
        })))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.add_node(Node::new(NodeData::Text(text.to_string())))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.add_node(Node::new(NodeData::Comment(data.to_string())))
    }

    /// Raw content (script/style bodies), output without escaping
    pub fn create_data(&mut self, data: &str) -> NodeId {
        self.add_node(Node::new(NodeData::Data(data.to_string())))
    }

    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.add_node(Node::new(NodeData::Doctype(Box::new(DoctypeData {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }))))
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&Node> {
        self.nodes
            .get(node_id as usize)
            .ok_or(TreeError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub(crate) fn get_mut(&mut self, node_id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(TreeError::NodeNotFound(node_id))
    }

    /// Total number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| i as NodeId)
    }

    pub fn kind(&self, node_id: NodeId) -> Result<NodeKind> {
        Ok(self.get(node_id)?.kind())
    }

    pub fn is_element(&self, node_id: NodeId) -> bool {
        self.get(node_id).is_ok_and(Node::is_element)
    }

    pub fn node_name(&self, node_id: NodeId) -> Result<&str> {
        Ok(self.get(node_id)?.node_name())
    }

    /// Lower-cased tag for elements, otherwise the node name
    pub fn normal_name(&self, node_id: NodeId) -> Result<String> {
        Ok(self.get(node_id)?.node_name().to_lowercase())
    }

    pub fn name_is(&self, node_id: NodeId, normal_name: &str) -> bool {
        self.normal_name(node_id)
            .is_ok_and(|name| name == normal_name)
    }

    pub fn node_value(&self, node_id: NodeId) -> Result<&str> {
        Ok(self.get(node_id)?.node_value())
    }

    pub(crate) fn container_mut(&mut self, node_id: NodeId) -> Result<&mut ContainerData> {
        let node = self.get_mut(node_id)?;
        let actual = node.kind().as_str();
        node.container_mut().ok_or(TreeError::InvalidNodeType {
            expected: "container",
            actual,
        })
    }

    pub(crate) fn child_list(&self, node_id: NodeId) -> Option<&ChildList> {
        self.nodes.get(node_id as usize)?.children()
    }

    // ---- parents and roots ----

    pub fn parent(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.parent)
    }

    pub fn has_parent(&self, node_id: NodeId) -> bool {
        self.get(node_id).is_ok_and(|n| n.parent.is_some())
    }

    /// Parent, if it is an element (not a document)
    pub fn parent_element(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self
            .get(node_id)?
            .parent
            .filter(|&p| self.is_element(p)))
    }

    /// Topmost ancestor (the node itself when it has no parent)
    pub fn root(&self, node_id: NodeId) -> Result<NodeId> {
        let mut current = node_id;
        while let Some(parent) = self.get(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    /// Nearest document at or above this node
    pub fn owner_document(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.get(id)?;
            if node.is_document() {
                return Ok(Some(id));
            }
            current = node.parent;
        }
        Ok(None)
    }

    fn document_data(&self, node_id: NodeId) -> Option<&DocumentData> {
        let doc = self.owner_document(node_id).ok()??;
        match &self.nodes[doc as usize].data {
            NodeData::Document(data) => Some(data),
            _ => None,
        }
    }

    /// Case policy of the owning document, or the HTML default
    pub fn parse_settings(&self, node_id: NodeId) -> ParseSettings {
        self.document_data(node_id)
            .map_or(ParseSettings::HTML_DEFAULT, |doc| doc.settings)
    }

    /// Output rules of the owning document, or the HTML default
    pub fn output_settings(&self, node_id: NodeId) -> OutputSettings {
        self.document_data(node_id)
            .map_or_else(OutputSettings::default, |doc| doc.output)
    }

    pub fn set_output_settings(&mut self, document: NodeId, output: OutputSettings) -> Result<()> {
        match &mut self.get_mut(document)?.data {
            NodeData::Document(doc) => {
                doc.output = output;
                Ok(())
            }
            other => Err(TreeError::InvalidNodeType {
                expected: "document",
                actual: kind_name(other),
            }),
        }
    }

    /// True if `ancestor` is `node_id` or above it
    pub(crate) fn is_self_or_ancestor(&self, ancestor: NodeId, node_id: NodeId) -> bool {
        let mut current = Some(node_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id as usize).and_then(|n| n.parent);
        }
        false
    }

    // ---- children ----

    pub fn child_count(&self, node_id: NodeId) -> Result<usize> {
        Ok(self.get(node_id)?.child_ids().len())
    }

    /// Child at `index`
    pub fn child(&self, node_id: NodeId, index: usize) -> Result<NodeId> {
        let children = self.get(node_id)?.child_ids();
        children
            .get(index)
            .copied()
            .ok_or(TreeError::IndexOutOfRange {
                index,
                len: children.len(),
            })
    }

    /// Snapshot of the children. Editing the tree afterwards does not
    /// affect the returned list.
    pub fn children(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.get(node_id)?.child_ids().to_vec())
    }

    pub fn first_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.child_ids().first().copied())
    }

    pub fn last_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.child_ids().last().copied())
    }

    // ---- siblings ----

    fn reindex_children(&self, list: &ChildList) {
        tracing::trace!("Reindexing {} children", list.len());
        for (i, &child) in list.nodes.iter().enumerate() {
            if let Some(node) = self.nodes.get(child as usize) {
                node.sibling_index.set(i);
            }
        }
        list.valid.set(true);
    }

    /// 0-based position among siblings, reconciled against the parent
    pub fn sibling_index(&self, node_id: NodeId) -> Result<usize> {
        let node = self.get(node_id)?;
        if let Some(list) = node.parent.and_then(|p| self.child_list(p)) {
            if !list.valid.get() {
                self.reindex_children(list);
            }
        }
        Ok(node.sibling_index.get())
    }

    /// The parent's other children; empty for a root
    pub fn sibling_nodes(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let Some(parent) = self.get(node_id)?.parent else {
            return Ok(Vec::new());
        };
        Ok(self
            .get(parent)?
            .child_ids()
            .iter()
            .copied()
            .filter(|&id| id != node_id)
            .collect())
    }

    pub fn next_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let Some(parent) = self.get(node_id)?.parent else {
            return Ok(None);
        };
        let index = self.sibling_index(node_id)? + 1;
        Ok(self.get(parent)?.child_ids().get(index).copied())
    }

    pub fn previous_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let Some(parent) = self.get(node_id)?.parent else {
            return Ok(None);
        };
        let index = self.sibling_index(node_id)?;
        if index == 0 {
            return Ok(None);
        }
        Ok(self.get(parent)?.child_ids().get(index - 1).copied())
    }

    pub fn next_element_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let mut current = node_id;
        while let Some(next) = self.next_sibling(current)? {
            if self.is_element(next) {
                return Ok(Some(next));
            }
            current = next;
        }
        Ok(None)
    }

    pub fn previous_element_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let mut current = node_id;
        while let Some(prev) = self.previous_sibling(current)? {
            if self.is_element(prev) {
                return Ok(Some(prev));
            }
            current = prev;
        }
        Ok(None)
    }

    /// The parent's first child; an orphan is its own first sibling
    pub fn first_sibling(&self, node_id: NodeId) -> Result<NodeId> {
        match self.get(node_id)?.parent {
            Some(parent) => Ok(self.first_child(parent)?.unwrap_or(node_id)),
            None => Ok(node_id),
        }
    }

    pub fn last_sibling(&self, node_id: NodeId) -> Result<NodeId> {
        match self.get(node_id)?.parent {
            Some(parent) => Ok(self.last_child(parent)?.unwrap_or(node_id)),
            None => Ok(node_id),
        }
    }
}

pub(crate) fn kind_name(data: &NodeData) -> &'static str {
    match data {
        NodeData::Document(_) => NodeKind::Document.as_str(),
        NodeData::Element(_) => NodeKind::Element.as_str(),
        NodeData::Text(_) => NodeKind::Text.as_str(),
        NodeData::Comment(_) => NodeKind::Comment.as_str(),
        NodeData::Data(_) => NodeKind::Data.as_str(),
        NodeData::Doctype(_) => NodeKind::Doctype.as_str(),
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTree")
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}
