//! Markup parser - main entry point for building trees from source
//!
//! This handles:
//! - Document parsing into a fresh document root
//! - Fragment parsing for `before`/`after`/`wrap`/`append`
//! - Tag and attribute case normalization per [`ParseSettings`]
//! - Duplicate attribute removal
//! - Optional source-position tracking
//!
//! Tree building is a plain open-element stack. There are no HTML insertion
//! modes: unmatched end tags are dropped, and an end tag closes every element
//! opened after its match.

use serde::{Deserialize, Serialize};

use crate::arena::NodeTree;
use crate::config::{OutputSettings, ParseSettings, Syntax};
use crate::error::Result;
use crate::range::{AttributeRange, LineIndex, Range};
use crate::tokenizer::{tokenize, Span, Token, TokenAttribute};
use crate::types::NodeId;
use crate::utils::is_void_element;

/// Tag of the transient element that fragment nodes are parsed into
const FRAGMENT_ROOT_TAG: &str = "html";

/// Configuration for the built-in parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    pub settings: ParseSettings,
    pub syntax: Syntax,
    /// Record node and attribute source ranges
    pub track_position: bool,
}

impl ParserConfig {
    pub fn html() -> Self {
        Self {
            settings: ParseSettings::HTML_DEFAULT,
            syntax: Syntax::Html,
            track_position: false,
        }
    }

    pub fn xml() -> Self {
        Self {
            settings: ParseSettings::PRESERVE_CASE,
            syntax: Syntax::Xml,
            track_position: false,
        }
    }

    pub fn with_track_position(mut self, track_position: bool) -> Self {
        self.track_position = track_position;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::html()
    }
}

/// Turns markup into nodes of a [`NodeTree`].
///
/// Implementations return the top-level nodes in order. They must all be
/// children of one parent that holds nothing else, so callers can move them
/// as a whole list.
///
/// `context` is the node the result is inserted under or wrapped around. It
/// may be a document; its owning document supplies the parse settings.
pub trait FragmentParser {
    fn parse_fragment(
        &self,
        tree: &mut NodeTree,
        markup: &str,
        context: Option<NodeId>,
        base_uri: &str,
    ) -> Result<Vec<NodeId>>;
}

/// Main markup parser
#[derive(Debug, Clone, Default)]
pub struct HtmlParser {
    config: ParserConfig,
}

impl HtmlParser {
    /// Create a parser with the HTML config
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a whole document into a new document root
    pub fn parse_document(&self, tree: &mut NodeTree, markup: &str, base_uri: &str) -> Result<NodeId> {
        let doc = tree.create_document_with(
            self.config.settings,
            OutputSettings {
                syntax: self.config.syntax,
            },
            base_uri,
        );
        self.build(tree, doc, markup, self.config.settings, self.config.syntax)?;
        Ok(doc)
    }

    fn build(
        &self,
        tree: &mut NodeTree,
        root: NodeId,
        markup: &str,
        settings: ParseSettings,
        syntax: Syntax,
    ) -> Result<()> {
        let mut builder = TreeBuilder {
            tree,
            settings,
            syntax,
            lines: self.config.track_position.then(|| LineIndex::new(markup)),
            open: vec![(root, String::new())],
        };
        for token in tokenize(markup, syntax) {
            builder.process(token)?;
        }
        builder.finish(markup.len())
    }
}

impl FragmentParser for HtmlParser {
    /// Settings come from the context's owning document when there is one
    /// (the context itself if it is a document), otherwise from this
    /// parser's config
    fn parse_fragment(
        &self,
        tree: &mut NodeTree,
        markup: &str,
        context: Option<NodeId>,
        base_uri: &str,
    ) -> Result<Vec<NodeId>> {
        let doc = match context {
            Some(ctx) => tree.owner_document(ctx)?,
            None => None,
        };
        let (settings, syntax) = match doc {
            Some(doc) => (tree.parse_settings(doc), tree.output_settings(doc).syntax),
            None => (self.config.settings, self.config.syntax),
        };

        let root = tree.create_element(FRAGMENT_ROOT_TAG);
        if !base_uri.is_empty() {
            tree.set_base_uri(root, base_uri)?;
        }
        self.build(tree, root, markup, settings, syntax)?;
        tree.children(root)
    }
}

struct TreeBuilder<'a> {
    tree: &'a mut NodeTree,
    settings: ParseSettings,
    syntax: Syntax,
    lines: Option<LineIndex>,
    /// Open elements with their normalized tags; the root sits at the bottom
    open: Vec<(NodeId, String)>,
}

impl TreeBuilder<'_> {
    fn current(&self) -> NodeId {
        self.open[self.open.len() - 1].0
    }

    fn range(&self, span: Span) -> Option<Range> {
        self.lines.as_ref().map(|l| l.range(span.start, span.end))
    }

    fn implicit_range(&self, pos: usize) -> Option<Range> {
        self.lines.as_ref().map(|l| l.range(pos, pos))
    }

    fn insert(&mut self, node: NodeId, span: Span) -> Result<()> {
        let parent = self.current();
        self.tree.append_child(parent, node)?;
        if let Some(range) = self.range(span) {
            self.tree.set_source_range(node, range, Range::UNTRACKED)?;
        }
        Ok(())
    }

    fn process(&mut self, token: Token) -> Result<()> {
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
                span,
            } => self.start_tag(&name, attributes, self_closing, span)?,
            Token::EndTag { name, span } => self.end_tag(&name, span)?,
            Token::Text { text, span } => {
                let node = self.tree.create_text(&text);
                self.insert(node, span)?;
            }
            Token::RawText { text, span } => {
                let node = self.tree.create_data(&text);
                self.insert(node, span)?;
            }
            Token::Comment { data, span } => {
                let node = self.tree.create_comment(&data);
                self.insert(node, span)?;
            }
            Token::Doctype {
                name,
                public_id,
                system_id,
                span,
            } => {
                let name = self.settings.normalize_tag(&name);
                let node = self.tree.create_doctype(&name, &public_id, &system_id);
                self.insert(node, span)?;
            }
        }
        Ok(())
    }

    fn start_tag(
        &mut self,
        name: &str,
        attributes: Vec<TokenAttribute>,
        self_closing: bool,
        span: Span,
    ) -> Result<()> {
        let tag = self.settings.normalize_tag(name);
        let element = self.tree.create_element(&tag);
        if !attributes.is_empty() {
            self.add_attributes(element, &tag, attributes)?;
        }
        self.insert(element, span)?;

        let void = self.syntax == Syntax::Html && is_void_element(&tag);
        if self_closing || void {
            if let Some(end) = self.implicit_range(span.end) {
                self.tree.set_end_source_range(element, end)?;
            }
        } else {
            self.open.push((element, tag));
        }
        Ok(())
    }

    fn add_attributes(&mut self, element: NodeId, tag: &str, attributes: Vec<TokenAttribute>) -> Result<()> {
        let keys: Vec<String> = attributes
            .iter()
            .map(|a| self.settings.normalize_attribute(&a.name))
            .collect();
        let ranges: Option<Vec<AttributeRange>> = self.lines.as_ref().map(|lines| {
            attributes
                .iter()
                .map(|a| {
                    AttributeRange::new(
                        lines.range(a.name_span.start, a.name_span.end),
                        lines.range(a.value_span.start, a.value_span.end),
                    )
                })
                .collect()
        });

        let attrs = self.tree.attributes_mut(element)?;
        for (key, attribute) in keys.iter().zip(&attributes) {
            attrs.add(key.as_str(), attribute.value.as_deref());
        }
        let dropped = attrs.deduplicate(self.settings.preserve_attribute_case);
        if dropped > 0 {
            tracing::debug!("Dropped {} duplicate attributes on <{}>", dropped, tag);
        }

        // the first occurrence of a key is the one that survived
        if let Some(ranges) = ranges {
            for (key, range) in keys.iter().zip(ranges) {
                if attrs.has_key(key) && !attrs.source_range(key).is_tracked() {
                    attrs.set_source_range(key, range);
                }
            }
        }
        Ok(())
    }

    fn end_tag(&mut self, name: &str, span: Span) -> Result<()> {
        let tag = self.settings.normalize_tag(name);
        let Some(index) = self.open.iter().skip(1).rposition(|(_, open)| *open == tag) else {
            tracing::trace!("Ignoring unmatched end tag </{}>", tag);
            return Ok(());
        };
        // rposition on the skipped iterator counts from the second entry
        let index = index + 1;

        while self.open.len() > index + 1 {
            let (element, _) = self.pop();
            if let Some(end) = self.implicit_range(span.start) {
                self.tree.set_end_source_range(element, end)?;
            }
        }
        let (element, _) = self.pop();
        if let Some(end) = self.range(span) {
            self.tree.set_end_source_range(element, end)?;
        }
        Ok(())
    }

    fn pop(&mut self) -> (NodeId, String) {
        // never the root: callers only pop above index 0
        self.open.pop().unwrap_or_default()
    }

    /// Elements left open at the end of input close implicitly there
    fn finish(mut self, end: usize) -> Result<()> {
        while self.open.len() > 1 {
            let (element, _) = self.pop();
            if let Some(range) = self.implicit_range(end) {
                self.tree.set_end_source_range(element, range)?;
            }
        }
        Ok(())
    }
}
