//! HTML/XML Node Tree Library
//!
//! In-memory document tree with arena storage: nodes, their attribute stores,
//! and the structural edits that keep the tree consistent.
//!
//! ## Philosophy
//!
//! - **Data structures first**: one `Vec<Node>`, ids instead of pointers
//! - **Lazy**: children and attributes don't exist until something needs them
//! - **Cheap moves**: whole child lists move in one step
//! - **Fail loudly**: contract violations are `Err`, expected misses are empty
//!
//! ## Core Design
//!
//! ```text
//! markup → Tokenizer → HtmlParser → NodeTree (arena) → traverse → MarkupSerializer
//!                                       ↓
//!                                NodeId (u32) + Attributes
//! ```
//!
//! ```
//! use nodetree::{HtmlParser, NodeTree};
//!
//! let mut tree = NodeTree::new();
//! let doc = HtmlParser::new()
//!     .parse_document(&mut tree, "<p>Hello</p>", "https://example.com/")
//!     .unwrap();
//! let p = tree.child(doc, 0).unwrap();
//! tree.wrap(p, "<div class=\"box\"></div>").unwrap();
//! assert_eq!(tree.outer_html(doc).unwrap(), "<div class=\"box\"><p>Hello</p></div>");
//! ```

pub mod arena;
pub mod attribute;
pub mod attributes;
pub mod cloning;
pub mod config;
pub mod entities;
pub mod error;
pub mod mutation;
pub mod node_attributes;
pub mod parser;
pub mod range;
pub mod serializer;
pub mod tokenizer;
pub mod traversal;
pub mod types;
pub mod utils;

pub use arena::NodeTree;
pub use attribute::Attribute;
pub use attributes::{AttributeCursor, Attributes};
pub use config::{OutputSettings, ParseSettings, Syntax};
pub use error::{Result, TreeError};
pub use parser::{FragmentParser, HtmlParser, ParserConfig};
pub use range::{AttributeRange, Position, Range};
pub use serializer::MarkupSerializer;
pub use traversal::{Descendants, NodeVisitor, NodeVisitorMut};
pub use types::*;
