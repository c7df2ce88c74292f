//! Markup serializer - write a subtree back out as HTML or XML
//!
//! Output is compact: no indentation or line breaks are added, so a parsed
//! fragment serializes back to its normalized source.

use crate::arena::NodeTree;
use crate::config::{OutputSettings, Syntax};
use crate::entities;
use crate::error::Result;
use crate::traversal::NodeVisitor;
use crate::types::{NodeData, NodeId};
use crate::utils::is_void_element;

/// Writes nodes with fixed output settings
#[derive(Debug, Clone, Default)]
pub struct MarkupSerializer {
    settings: OutputSettings,
}

impl MarkupSerializer {
    pub fn new() -> Self {
        Self::with_settings(OutputSettings::default())
    }

    pub fn with_settings(settings: OutputSettings) -> Self {
        Self { settings }
    }

    /// Append the markup of `node_id` and its subtree to `output`
    pub fn serialize_to(&self, tree: &NodeTree, node_id: NodeId, output: &mut String) -> Result<()> {
        let mut writer = MarkupWriter {
            settings: &self.settings,
            output,
        };
        tree.traverse(node_id, &mut writer)
    }

    pub fn serialize(&self, tree: &NodeTree, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        self.serialize_to(tree, node_id, &mut output)?;
        Ok(output)
    }
}

struct MarkupWriter<'a> {
    settings: &'a OutputSettings,
    output: &'a mut String,
}

impl MarkupWriter<'_> {
    /// Elements written as `<tag>` (HTML void) or `<tag />` (empty XML)
    fn is_self_closing(&self, tree: &NodeTree, node_id: NodeId, tag: &str) -> Result<bool> {
        let empty = tree.get(node_id)?.child_ids().is_empty();
        Ok(empty
            && match self.settings.syntax {
                Syntax::Html => is_void_element(tag),
                Syntax::Xml => true,
            })
    }
}

impl NodeVisitor for MarkupWriter<'_> {
    fn head(&mut self, tree: &NodeTree, node_id: NodeId, _depth: usize) -> Result<()> {
        let node = tree.get(node_id)?;
        match node.data() {
            NodeData::Element(el) => {
                self.output.push('<');
                self.output.push_str(el.tag());
                if let Some(attrs) = node.attributes() {
                    attrs.html_to(self.output, self.settings);
                }
                if self.is_self_closing(tree, node_id, el.tag())? && self.settings.syntax == Syntax::Xml {
                    self.output.push_str(" />");
                } else {
                    self.output.push('>');
                }
            }
            NodeData::Text(text) => {
                entities::escape(text, self.output, false, self.settings.syntax);
            }
            NodeData::Data(data) => self.output.push_str(data),
            NodeData::Comment(data) => {
                self.output.push_str("<!--");
                self.output.push_str(data);
                self.output.push_str("-->");
            }
            NodeData::Doctype(doctype) => {
                self.output.push_str(match self.settings.syntax {
                    Syntax::Html => "<!doctype",
                    Syntax::Xml => "<!DOCTYPE",
                });
                if !doctype.name.is_empty() {
                    self.output.push(' ');
                    self.output.push_str(&doctype.name);
                }
                if !doctype.public_id.is_empty() {
                    self.output.push_str(" PUBLIC \"");
                    self.output.push_str(&doctype.public_id);
                    self.output.push('"');
                }
                if !doctype.system_id.is_empty() {
                    if doctype.public_id.is_empty() {
                        self.output.push_str(" SYSTEM");
                    }
                    self.output.push_str(" \"");
                    self.output.push_str(&doctype.system_id);
                    self.output.push('"');
                }
                self.output.push('>');
            }
            NodeData::Document(_) => {}
        }
        Ok(())
    }

    fn tail(&mut self, tree: &NodeTree, node_id: NodeId, _depth: usize) -> Result<()> {
        if let NodeData::Element(el) = tree.get(node_id)?.data() {
            if !self.is_self_closing(tree, node_id, el.tag())? {
                self.output.push_str("</");
                self.output.push_str(el.tag());
                self.output.push('>');
            }
        }
        Ok(())
    }
}

impl NodeTree {
    /// Markup of the node and its subtree, using the owning document's
    /// output settings
    pub fn outer_html(&self, node_id: NodeId) -> Result<String> {
        MarkupSerializer::with_settings(self.output_settings(node_id)).serialize(self, node_id)
    }

    /// Markup of the node's children only
    pub fn html(&self, node_id: NodeId) -> Result<String> {
        let serializer = MarkupSerializer::with_settings(self.output_settings(node_id));
        let mut output = String::new();
        for &child in self.get(node_id)?.child_ids() {
            serializer.serialize_to(self, child, &mut output)?;
        }
        Ok(output)
    }

    /// Content equality: same kind of node, serialized to the same markup.
    /// Position in the tree doesn't matter.
    pub fn has_same_value(&self, a: NodeId, b: NodeId) -> Result<bool> {
        if a == b {
            return Ok(true);
        }
        if self.kind(a)? != self.kind(b)? {
            return Ok(false);
        }
        Ok(self.outer_html(a)? == self.outer_html(b)?)
    }
}
