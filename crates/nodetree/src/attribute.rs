//! A single attribute: key, optional value, and its markup form

use std::borrow::Cow;
use std::fmt;

use crate::config::{OutputSettings, Syntax};
use crate::entities;

const DATA_PREFIX: &str = "data-";

/// Attributes that HTML output may collapse to a bare key
const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen",
    "async",
    "autofocus",
    "checked",
    "compact",
    "declare",
    "default",
    "defer",
    "disabled",
    "formnovalidate",
    "hidden",
    "inert",
    "ismap",
    "itemscope",
    "multiple",
    "muted",
    "nohref",
    "noresize",
    "noshade",
    "novalidate",
    "nowrap",
    "open",
    "readonly",
    "required",
    "reversed",
    "seamless",
    "selected",
    "sortable",
    "truespeed",
    "typemustmatch",
];

/// An owned key/value pair detached from its store.
///
/// `value` is `None` for a boolean attribute (key present, no value).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    key: String,
    value: Option<String>,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// A boolean attribute: the key with no declared value
    pub fn boolean(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub(crate) fn from_parts(key: String, value: Option<String>) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value, or `""` for a boolean attribute
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    pub fn has_declared_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_data_attribute(&self) -> bool {
        is_data_key(&self.key)
    }

    pub fn is_boolean_attribute(&self) -> bool {
        is_boolean_key(&self.key)
    }

    /// Markup form, e.g. `href="/a"`; empty if the key can't be made valid
    pub fn html(&self, settings: &OutputSettings) -> String {
        let mut out = String::new();
        if let Some(key) = valid_key(&self.key, settings.syntax) {
            html_no_validate(&key, self.value.as_deref(), &mut out, settings);
        }
        out
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html(&OutputSettings::default()))
    }
}

pub(crate) fn is_data_key(key: &str) -> bool {
    key.len() > DATA_PREFIX.len() && key.starts_with(DATA_PREFIX)
}

pub fn is_boolean_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    BOOLEAN_ATTRIBUTES.binary_search(&lower.as_str()).is_ok()
}

fn is_valid_xml_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn is_invalid_html_key_char(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}' | ' ' | '"' | '\'' | '/' | '=')
}

fn is_valid_html_key(key: &str) -> bool {
    !key.is_empty() && !key.chars().any(is_invalid_html_key_char)
}

/// Repair `key` for `syntax` by replacing invalid characters with `_`.
///
/// Returns `None` if the key is still invalid after repair; such keys are
/// skipped on output rather than reported.
pub fn valid_key(key: &str, syntax: Syntax) -> Option<Cow<'_, str>> {
    match syntax {
        Syntax::Xml if !is_valid_xml_key(key) => {
            let repaired: String = key
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.') {
                        c
                    } else {
                        '_'
                    }
                })
                .collect();
            is_valid_xml_key(&repaired).then_some(Cow::Owned(repaired))
        }
        Syntax::Html if !is_valid_html_key(key) => {
            let repaired: String = key
                .chars()
                .map(|c| if is_invalid_html_key_char(c) { '_' } else { c })
                .collect();
            is_valid_html_key(&repaired).then_some(Cow::Owned(repaired))
        }
        _ => Some(Cow::Borrowed(key)),
    }
}

/// Write `key[="value"]` without validating the key
pub(crate) fn html_no_validate(
    key: &str,
    value: Option<&str>,
    out: &mut String,
    settings: &OutputSettings,
) {
    out.push_str(key);
    if should_collapse(key, value, settings) {
        return;
    }
    out.push_str("=\"");
    entities::escape(value.unwrap_or(""), out, true, settings.syntax);
    out.push('"');
}

fn should_collapse(key: &str, value: Option<&str>, settings: &OutputSettings) -> bool {
    if settings.syntax != Syntax::Html {
        return false;
    }
    match value {
        None => true,
        Some(v) => (v.is_empty() || v.eq_ignore_ascii_case(key)) && is_boolean_key(key),
    }
}
