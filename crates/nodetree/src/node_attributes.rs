//! Node-level attribute access
//!
//! Reads are case-insensitive. Writes normalize the key with the owning
//! document's [`ParseSettings`](crate::config::ParseSettings) first. Only
//! containers own an attribute store; reading from a leaf yields empty
//! results, writing to one is an [`TreeError::InvalidNodeType`].

use serde_json::Value;

use crate::arena::NodeTree;
use crate::attributes::{is_internal_key, Attributes, BASE_URI_KEY};
use crate::error::{Result, TreeError};
use crate::range::{AttributeRange, Range};
use crate::types::{NodeId, NodeRanges};
use crate::utils::resolve_url;

const ABS_PREFIX: &str = "abs:";

impl NodeTree {
    /// The node's store, if it has been materialized
    pub fn attributes(&self, node_id: NodeId) -> Result<Option<&Attributes>> {
        Ok(self.get(node_id)?.attributes())
    }

    /// The node's store, created on first use
    pub fn attributes_mut(&mut self, node_id: NodeId) -> Result<&mut Attributes> {
        Ok(self.container_mut(node_id)?.ensure_attributes())
    }

    /// Number of attributes, not counting internal entries
    pub fn attributes_size(&self, node_id: NodeId) -> usize {
        self.attributes(node_id)
            .ok()
            .flatten()
            .map_or(0, Attributes::len)
    }

    /// Attribute value by case-insensitive key, or `""`.
    ///
    /// With an `abs:` prefix (and no attribute literally named so) the value
    /// is resolved against the base URI; see [`NodeTree::abs_url`].
    pub fn attr(&self, node_id: NodeId, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(TreeError::invalid_argument("attribute key must not be empty"));
        }
        if is_internal_key(key) {
            return Ok(String::new());
        }
        if let Some(attrs) = self.attributes(node_id)? {
            if attrs.has_key_ignore_case(key) {
                return Ok(attrs.get_ignore_case(key).to_string());
            }
        }
        match strip_abs_prefix(key) {
            Some(rel_key) => self.abs_url(node_id, rel_key),
            None => Ok(String::new()),
        }
    }

    /// Set an attribute. The key is normalized per the owning document's
    /// case policy, then matched case-insensitively.
    pub fn set_attr(&mut self, node_id: NodeId, key: &str, value: &str) -> Result<()> {
        let key = self.normalized_key(node_id, key)?;
        self.attributes_mut(node_id)?
            .put_ignore_case(&key, Some(value));
        Ok(())
    }

    /// Set (`true`) or remove (`false`) a boolean attribute
    pub fn set_boolean_attr(&mut self, node_id: NodeId, key: &str, value: bool) -> Result<()> {
        let key = self.normalized_key(node_id, key)?;
        self.attributes_mut(node_id)?.put_boolean(&key, value);
        Ok(())
    }

    fn normalized_key(&self, node_id: NodeId, key: &str) -> Result<String> {
        let key = self.parse_settings(node_id).normalize_attribute(key);
        if key.is_empty() {
            return Err(TreeError::invalid_argument("attribute key must not be empty"));
        }
        if is_internal_key(&key) {
            return Err(TreeError::invalid_argument(format!(
                "attribute key '{key}' is reserved"
            )));
        }
        Ok(key)
    }

    /// True if the attribute exists (any case). An `abs:` key is true only
    /// when the attribute exists and resolves to an absolute URL.
    pub fn has_attr(&self, node_id: NodeId, key: &str) -> bool {
        if key.is_empty() || is_internal_key(key) {
            return false;
        }
        let Ok(Some(attrs)) = self.attributes(node_id) else {
            return false;
        };
        if let Some(rel_key) = strip_abs_prefix(key) {
            if attrs.has_key_ignore_case(rel_key)
                && self.abs_url(node_id, rel_key).is_ok_and(|url| !url.is_empty())
            {
                return true;
            }
        }
        attrs.has_key_ignore_case(key)
    }

    pub fn remove_attr(&mut self, node_id: NodeId, key: &str) -> Result<()> {
        if is_internal_key(key) {
            return Ok(());
        }
        if let Some(container) = self.get_mut(node_id)?.container_mut() {
            if let Some(attrs) = container.attributes.as_deref_mut() {
                attrs.remove_ignore_case(key);
            }
        }
        Ok(())
    }

    /// Remove every attribute, keeping internal entries (base URI, user
    /// data)
    pub fn clear_attributes(&mut self, node_id: NodeId) -> Result<()> {
        let Some(container) = self.get_mut(node_id)?.container_mut() else {
            return Ok(());
        };
        let Some(attrs) = container.attributes.as_deref_mut() else {
            return Ok(());
        };
        let mut cursor = attrs.cursor();
        while cursor.next(attrs)?.is_some() {
            cursor.remove(attrs)?;
        }
        Ok(())
    }

    /// Absolute URL of the attribute's value against the node's base URI.
    /// `""` if the attribute is missing or the URL can't be resolved.
    pub fn abs_url(&self, node_id: NodeId, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(TreeError::invalid_argument("attribute key must not be empty"));
        }
        let Some(attrs) = self.attributes(node_id)? else {
            return Ok(String::new());
        };
        if !attrs.has_key_ignore_case(key) {
            return Ok(String::new());
        }
        let base = self.base_uri(node_id)?;
        Ok(resolve_url(&base, attrs.get_ignore_case(key)))
    }

    /// The base URI set on this node or the nearest ancestor, or `""`
    pub fn base_uri(&self, node_id: NodeId) -> Result<String> {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.get(id)?;
            if let Some(attrs) = node.attributes() {
                if attrs.has_key(BASE_URI_KEY) {
                    return Ok(attrs.get(BASE_URI_KEY).to_string());
                }
            }
            current = node.parent;
        }
        Ok(String::new())
    }

    /// Set the base URI for this node and its descendants. Ignored on
    /// leaves, which always inherit.
    pub fn set_base_uri(&mut self, node_id: NodeId, base_uri: &str) -> Result<()> {
        if let Some(container) = self.get_mut(node_id)?.container_mut() {
            container
                .ensure_attributes()
                .put(BASE_URI_KEY, Some(base_uri));
        }
        Ok(())
    }

    pub fn user_data(&self, node_id: NodeId, key: &str) -> Result<Option<&Value>> {
        Ok(self
            .attributes(node_id)?
            .and_then(|attrs| attrs.user_data(key)))
    }

    /// Attach caller data; `None` removes it
    pub fn set_user_data(&mut self, node_id: NodeId, key: &str, value: Option<Value>) -> Result<()> {
        if value.is_none() && self.attributes(node_id)?.is_none() {
            return Ok(());
        }
        self.attributes_mut(node_id)?.set_user_data(key, value);
        Ok(())
    }

    /// Source range of one attribute, `UNTRACKED` if unknown
    pub fn attribute_source_range(&self, node_id: NodeId, key: &str) -> Result<AttributeRange> {
        Ok(self
            .attributes(node_id)?
            .map_or(AttributeRange::UNTRACKED, |attrs| attrs.source_range(key)))
    }

    /// Where the node starts in its parsed source, `UNTRACKED` if unknown
    pub fn source_range(&self, node_id: NodeId) -> Result<Range> {
        Ok(self
            .get(node_id)?
            .ranges
            .as_ref()
            .map_or(Range::UNTRACKED, |r| r.start))
    }

    /// Where the node's end tag sits in its parsed source. Implicitly
    /// closed elements get a zero-width range.
    pub fn end_source_range(&self, node_id: NodeId) -> Result<Range> {
        Ok(self
            .get(node_id)?
            .ranges
            .as_ref()
            .map_or(Range::UNTRACKED, |r| r.end))
    }

    pub fn set_source_range(&mut self, node_id: NodeId, start: Range, end: Range) -> Result<()> {
        self.get_mut(node_id)?.ranges = Some(Box::new(NodeRanges { start, end }));
        Ok(())
    }

    pub(crate) fn set_end_source_range(&mut self, node_id: NodeId, end: Range) -> Result<()> {
        let node = self.get_mut(node_id)?;
        let ranges = node.ranges.get_or_insert_with(|| {
            Box::new(NodeRanges {
                start: Range::UNTRACKED,
                end: Range::UNTRACKED,
            })
        });
        ranges.end = end;
        Ok(())
    }
}

fn strip_abs_prefix(key: &str) -> Option<&str> {
    let prefix = key.get(..ABS_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(ABS_PREFIX) && key.len() > ABS_PREFIX.len() {
        Some(&key[ABS_PREFIX.len()..])
    } else {
        None
    }
}
