//! Core node types
//!
//! Key design principles:
//! 1. Use u32 for node identity (index into the arena, never a pointer)
//! 2. Parent links are plain ids; the child list is the only owning edge
//! 3. Use SmallVec for child lists (most nodes have <4 children)
//! 4. Children and attributes are `Option`s: absent until first needed

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::attributes::Attributes;
use crate::config::{OutputSettings, ParseSettings};
use crate::range::Range;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes per tree
pub type NodeId = u32;

/// Node variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeKind {
    Document = 1,
    Element = 2,
    Text = 3,
    Comment = 4,
    /// Raw script/style content, written without escaping
    Data = 5,
    Doctype = 6,
}

impl NodeKind {
    /// Containers may own children and attributes
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
            NodeKind::Data => "data",
            NodeKind::Doctype => "doctype",
        }
    }
}

/// A parent's ordered children plus the validity flag of their cached
/// sibling indexes
#[derive(Debug)]
pub struct ChildList {
    pub(crate) nodes: SmallVec<[NodeId; 4]>,
    pub(crate) valid: Cell<bool>,
}

impl ChildList {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SmallVec::new(),
            valid: Cell::new(true),
        }
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn invalidate(&self) {
        self.valid.set(false);
    }
}

/// Children and attributes shared by documents and elements
#[derive(Debug, Default)]
pub struct ContainerData {
    pub(crate) children: Option<ChildList>,
    pub(crate) attributes: Option<Box<Attributes>>,
}

impl ContainerData {
    /// Copy of the attributes only; the clone starts without children
    fn shallow_copy(&self) -> Self {
        Self {
            children: None,
            attributes: self.attributes.clone(),
        }
    }

    pub(crate) fn ensure_children(&mut self) -> &mut ChildList {
        self.children.get_or_insert_with(ChildList::new)
    }

    pub(crate) fn ensure_attributes(&mut self) -> &mut Attributes {
        self.attributes.get_or_insert_with(Default::default)
    }
}

#[derive(Debug)]
pub struct DocumentData {
    pub(crate) container: ContainerData,
    pub settings: ParseSettings,
    pub output: OutputSettings,
}

#[derive(Debug)]
pub struct ElementData {
    pub(crate) tag: String,
    pub(crate) container: ContainerData,
}

impl ElementData {
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctypeData {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    Document(Box<DocumentData>),
    Element(ElementData),
    Text(String),
    Comment(String),
    Data(String),
    Doctype(Box<DoctypeData>),
}

/// Start and end ranges of a node in its parsed source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRanges {
    pub start: Range,
    pub end: Range,
}

/// One node in the arena
///
/// Layout: parent link and cached index first, payload after. Source ranges
/// are boxed since most trees never track them.
#[derive(Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) sibling_index: Cell<usize>,
    pub(crate) data: NodeData,
    pub(crate) ranges: Option<Box<NodeRanges>>,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            sibling_index: Cell::new(0),
            data,
            ranges: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::Document(_) => NodeKind::Document,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::Data(_) => NodeKind::Data,
            NodeData::Doctype(_) => NodeKind::Doctype,
        }
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self.data, NodeData::Document(_))
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element(el) => Some(&el.tag),
            _ => None,
        }
    }

    /// `#text`, `#comment`, ... or the tag name
    pub fn node_name(&self) -> &str {
        match &self.data {
            NodeData::Document(_) => "#document",
            NodeData::Element(el) => &el.tag,
            NodeData::Text(_) => "#text",
            NodeData::Comment(_) => "#comment",
            NodeData::Data(_) => "#data",
            NodeData::Doctype(_) => "#doctype",
        }
    }

    /// Text, comment or data content; `""` for containers and doctypes
    pub fn node_value(&self) -> &str {
        match &self.data {
            NodeData::Text(s) | NodeData::Comment(s) | NodeData::Data(s) => s,
            _ => "",
        }
    }

    pub(crate) fn container(&self) -> Option<&ContainerData> {
        match &self.data {
            NodeData::Document(doc) => Some(&doc.container),
            NodeData::Element(el) => Some(&el.container),
            _ => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut ContainerData> {
        match &mut self.data {
            NodeData::Document(doc) => Some(&mut doc.container),
            NodeData::Element(el) => Some(&mut el.container),
            _ => None,
        }
    }

    pub(crate) fn children(&self) -> Option<&ChildList> {
        self.container()?.children.as_ref()
    }

    pub fn child_ids(&self) -> &[NodeId] {
        self.children().map(ChildList::as_slice).unwrap_or(&[])
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        self.container()?.attributes.as_deref()
    }

    /// Detached copy: same payload and attributes, no parent, no children
    pub(crate) fn shallow_copy(&self) -> Node {
        let data = match &self.data {
            NodeData::Document(doc) => NodeData::Document(Box::new(DocumentData {
                container: doc.container.shallow_copy(),
                settings: doc.settings,
                output: doc.output,
            })),
            NodeData::Element(el) => NodeData::Element(ElementData {
                tag: el.tag.clone(),
                container: el.container.shallow_copy(),
            }),
            NodeData::Text(s) => NodeData::Text(s.clone()),
            NodeData::Comment(s) => NodeData::Comment(s.clone()),
            NodeData::Data(s) => NodeData::Data(s.clone()),
            NodeData::Doctype(d) => NodeData::Doctype(d.clone()),
        };
        Node {
            parent: None,
            sibling_index: Cell::new(0),
            data,
            ranges: self.ranges.clone(),
        }
    }
}
