//! Parse and output configuration
//!
//! A document root carries one of each; everything beneath it resolves its
//! case policy and output rules from there.

use serde::{Deserialize, Serialize};

/// Target markup syntax for output and key validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Syntax {
    #[default]
    Html,
    Xml,
}

/// Case policy for tag and attribute names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseSettings {
    pub preserve_tag_case: bool,
    pub preserve_attribute_case: bool,
}

impl ParseSettings {
    /// HTML: tag and attribute names are lower-cased
    pub const HTML_DEFAULT: ParseSettings = ParseSettings {
        preserve_tag_case: false,
        preserve_attribute_case: false,
    };

    /// XML: names are kept exactly as written
    pub const PRESERVE_CASE: ParseSettings = ParseSettings {
        preserve_tag_case: true,
        preserve_attribute_case: true,
    };

    pub fn new(preserve_tag_case: bool, preserve_attribute_case: bool) -> Self {
        Self {
            preserve_tag_case,
            preserve_attribute_case,
        }
    }

    pub fn normalize_tag(&self, name: &str) -> String {
        let name = name.trim();
        if self.preserve_tag_case {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    pub fn normalize_attribute(&self, name: &str) -> String {
        let name = name.trim();
        if self.preserve_attribute_case {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self::HTML_DEFAULT
    }
}

/// Output rules used by the serializer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    pub syntax: Syntax,
}

impl OutputSettings {
    pub fn html() -> Self {
        Self {
            syntax: Syntax::Html,
        }
    }

    pub fn xml() -> Self {
        Self { syntax: Syntax::Xml }
    }
}
