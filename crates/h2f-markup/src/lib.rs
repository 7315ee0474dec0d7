//! Markup tree and parser for html2fortitude.
//!
//! Parses HTML (leniently) or XML (strictly) into an arena-backed [`Tree`] of
//! typed nodes: elements, text, comments, CDATA, processing instructions and
//! doctypes. [`parse_markup`] picks the parse mode from the input and retries
//! with another mode when the first one cannot represent it.
//!
//! The crate also carries the entity and escaping helpers shared by the
//! directive preprocessor and the renderer.

mod entities;
mod error;
mod parser;
mod tree;

pub use entities::{convert_html_entities, escape_html, unescape_html};
pub use error::ParseError;
pub use parser::{MarkupParser, ParseMode, parse_markup};
pub use tree::{Element, NodeId, NodeKind, Tree};
