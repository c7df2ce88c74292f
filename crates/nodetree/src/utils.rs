//! Utility functions for tree processing

use url::Url;

use crate::arena::NodeTree;
use crate::error::Result;
use crate::types::{NodeData, NodeId};

/// HTML elements that never have content or an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Concatenated text of all descendant text nodes, trimmed
pub fn text_content(tree: &NodeTree, node_id: NodeId) -> Result<String> {
    let mut text = String::new();

    for id in tree.descendants(node_id)? {
        if let NodeData::Text(value) = tree.get(id)?.data() {
            text.push_str(value);
        }
    }

    Ok(text.trim().to_string())
}

pub fn first_element_child(tree: &NodeTree, node_id: NodeId) -> Result<Option<NodeId>> {
    Ok(tree
        .get(node_id)?
        .child_ids()
        .iter()
        .copied()
        .find(|&child| tree.is_element(child)))
}

/// Follow first element children down as far as they go
pub fn deep_child(tree: &NodeTree, node_id: NodeId) -> Result<NodeId> {
    let mut current = node_id;
    while let Some(child) = first_element_child(tree, current)? {
        current = child;
    }
    Ok(current)
}

/// Resolve `relative` against `base`. An already absolute `relative` is
/// returned normalized; anything unresolvable yields `""`.
pub fn resolve_url(base: &str, relative: &str) -> String {
    let relative = relative.trim();
    if let Ok(base) = Url::parse(base) {
        if let Ok(joined) = base.join(relative) {
            return joined.into();
        }
    }
    Url::parse(relative).map(String::from).unwrap_or_default()
}
