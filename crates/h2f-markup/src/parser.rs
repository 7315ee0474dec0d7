//! Markup parser with HTML-lenient and XML-strict modes.
//!
//! Both modes run on quick-xml. HTML mode first rewrites the input so the
//! XML reader accepts it (raw `script`/`style` content is wrapped in CDATA,
//! stray `&` and `<` are escaped, named entities are decoded) and then
//! applies HTML rules while building the tree: lower-cased names, void
//! elements, implicit end tags, and libxml2-style dropping of ignorable
//! whitespace.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;

use crate::entities::{convert_html_entities, decode_entity};
use crate::error::ParseError;
use crate::tree::{Element, NodeId, NodeKind, Tree};

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "br", "col", "embed", "frame", "hr", "img", "input", "isindex",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements after which (or as first child of which) blank text is kept.
const ALLOW_PCDATA: &[&str] = &[
    "a", "abbr", "acronym", "address", "applet", "b", "bdo", "big", "blockquote", "body",
    "button", "caption", "center", "cite", "code", "dd", "del", "dfn", "div", "dt", "em", "font",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "i", "iframe", "ins", "kbd", "label", "legend",
    "li", "map", "menu", "object", "ol", "p", "pre", "q", "s", "samp", "small", "span", "strike",
    "strong", "td", "th", "tt", "u", "ul", "var",
];

/// Elements that may not appear inside an HTML fragment.
const DOCUMENT_ROOTS: &[&str] = &["html", "head", "body"];

/// Input that has to be parsed as a complete HTML document.
static DOCUMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*<!DOCTYPE|<html").expect("invalid document regex")
});

/// Start tag of a raw-text element, quote-aware.
static RAW_TEXT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(script|style)\b(?:[^>"']|"[^"]*"|'[^']*')*>"#)
        .expect("invalid raw text regex")
});

/// A well-formed entity reference at the start of the input.
static ENTITY_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z][A-Za-z0-9]*);")
        .expect("invalid entity reference regex")
});

/// How the input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Lenient HTML, parsed as a fragment.
    HtmlFragment,
    /// Lenient HTML, parsed as a complete document.
    HtmlDocument,
    /// Strict XML, parsed as a fragment.
    Xml,
}

impl ParseMode {
    fn is_html(self) -> bool {
        !matches!(self, Self::Xml)
    }
}

/// Parse markup, choosing the mode from the input and falling back as needed.
///
/// Input that starts with a doctype or contains an `<html` tag is parsed as a
/// document; anything else as a fragment. A fragment containing a document
/// root element is re-parsed as a document whose `html` element becomes the
/// fragment. Input with CDATA outside raw-text elements is re-parsed as XML.
///
/// # Example
///
/// ```
/// use h2f_markup::{NodeKind, parse_markup};
///
/// let tree = parse_markup("<p class=\"x\">hi</p>").unwrap();
/// let p = tree.children(tree.root())[0];
/// assert_eq!(tree.element(p).unwrap().attribute("class"), Some("x"));
/// assert_eq!(tree.inner_text(p), "hi");
/// assert_eq!(tree.kind(tree.root()), &NodeKind::Fragment);
/// ```
pub fn parse_markup(text: &str) -> Result<Tree, ParseError> {
    let mode = if DOCUMENT_PATTERN.is_match(text) {
        ParseMode::HtmlDocument
    } else {
        ParseMode::HtmlFragment
    };

    match parse_html_or_xml(text, mode) {
        Err(ParseError::MisplacedRoot(name)) => {
            tracing::debug!(element = %name, "Document root inside fragment, re-parsing as document");
            let mut tree = parse_html_or_xml(text, ParseMode::HtmlDocument)?;
            let html = tree
                .children(tree.root())
                .iter()
                .copied()
                .find(|&child| tree.is_element_named(child, "html"));
            tree.reroot_fragment(html);
            Ok(tree)
        }
        result => result,
    }
}

fn parse_html_or_xml(text: &str, mode: ParseMode) -> Result<Tree, ParseError> {
    match MarkupParser::new(mode).parse(text) {
        Err(ParseError::XmlModeRequired) => {
            tracing::debug!("CDATA outside raw text, re-parsing as XML");
            MarkupParser::new(ParseMode::Xml).parse(text)
        }
        result => result,
    }
}

/// Single-mode markup parser.
pub struct MarkupParser {
    mode: ParseMode,
}

impl MarkupParser {
    /// Create a parser for the given mode.
    #[must_use]
    pub fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    /// Parse text into a tree without any mode fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MisplacedRoot`] or [`ParseError::XmlModeRequired`]
    /// when HTML mode cannot represent the input, and [`ParseError::Xml`] for
    /// malformed input.
    pub fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        let prepared = if self.mode.is_html() {
            prepare_html(text)
        } else {
            convert_html_entities(text)
        };

        let mut reader = Reader::from_str(&prepared);
        let config = reader.config_mut();
        config.trim_text(false);
        config.expand_empty_elements = false;
        if self.mode.is_html() {
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
        }

        let mut builder = TreeBuilder::new(self.mode);
        let mut buf = Vec::new();

        loop {
            let start = usize::try_from(reader.buffer_position()).unwrap_or_default();
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let element = self.decode_element(&reader, &e);
                    builder.open(element, false)?;
                }
                Event::Empty(e) => {
                    let element = self.decode_element(&reader, &e);
                    builder.open(element, true)?;
                }
                Event::End(e) => {
                    let name = self.decode_name(&reader, e.name().as_ref());
                    builder.close(&name);
                }
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e)?;
                    builder.text(&text);
                }
                Event::GeneralRef(e) => {
                    let entity = reader.decoder().decode(&e)?;
                    builder.text(&decode_entity(&entity));
                }
                Event::CData(e) => {
                    let text = reader.decoder().decode(&e)?;
                    builder.cdata(&text)?;
                }
                Event::Comment(e) => {
                    let text = reader.decoder().decode(&e)?.into_owned();
                    builder.leaf(NodeKind::Comment(text));
                }
                Event::Decl(_) | Event::PI(_) => {
                    let end = usize::try_from(reader.buffer_position()).unwrap_or_default();
                    let literal = prepared.get(start..end).unwrap_or_default().trim();
                    builder.leaf(NodeKind::ProcessingInstruction(literal.to_owned()));
                }
                Event::DocType(e) => {
                    let text = reader.decoder().decode(&e)?;
                    builder.leaf(NodeKind::DocumentType(text.trim().to_owned()));
                }
                Event::Eof => break,
            }
            buf.clear();
        }

        Ok(builder.finish())
    }

    fn decode_element(&self, reader: &Reader<&[u8]>, e: &BytesStart) -> Element {
        let mut element = Element::new(self.decode_name(reader, e.name().as_ref()));
        let attributes = if self.mode.is_html() {
            e.html_attributes()
        } else {
            e.attributes()
        };
        for attr in attributes.flatten() {
            let key = self.decode_name(reader, attr.key.as_ref());
            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                Cow::into_owned,
            );
            element.push_attribute(key, value);
        }
        element
    }

    fn decode_name(&self, reader: &Reader<&[u8]>, name: &[u8]) -> String {
        let mut decoded = reader.decoder().decode(name).map_or_else(
            |_| String::from_utf8_lossy(name).into_owned(),
            Cow::into_owned,
        );
        if self.mode.is_html() {
            decoded.make_ascii_lowercase();
        }
        decoded
    }
}

/// Incremental tree construction with HTML recovery rules.
struct TreeBuilder {
    tree: Tree,
    mode: ParseMode,
    /// Open elements; the root is always at the bottom.
    stack: Vec<NodeId>,
    /// Text node written by the most recent event, if any.
    trailing_text: Option<NodeId>,
}

impl TreeBuilder {
    fn new(mode: ParseMode) -> Self {
        let root = if mode == ParseMode::HtmlDocument {
            NodeKind::Document
        } else {
            NodeKind::Fragment
        };
        let tree = Tree::new(root);
        let stack = vec![tree.root()];
        Self {
            tree,
            mode,
            stack,
            trailing_text: None,
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }

    fn current_name(&self) -> Option<&str> {
        self.tree
            .element(self.current())
            .map(|element| element.name.as_str())
    }

    fn open(&mut self, element: Element, empty: bool) -> Result<(), ParseError> {
        self.trailing_text = None;

        if self.mode == ParseMode::HtmlFragment && DOCUMENT_ROOTS.contains(&element.name.as_str())
        {
            return Err(ParseError::MisplacedRoot(element.name));
        }

        let void = self.mode.is_html() && VOID_ELEMENTS.contains(&element.name.as_str());
        if self.mode.is_html() {
            while self.stack.len() > 1
                && self
                    .current_name()
                    .is_some_and(|current| closes_implicitly(&element.name, current))
            {
                self.stack.pop();
            }
        }

        let id = self.tree.append(self.current(), NodeKind::Element(element));
        if !empty && !void {
            self.stack.push(id);
        }
        Ok(())
    }

    fn close(&mut self, name: &str) {
        self.trailing_text = None;
        let found = self
            .stack
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|&(_, &id)| self.tree.is_element_named(id, name))
            .map(|(position, _)| position);
        if let Some(position) = found {
            self.stack.truncate(position);
        }
    }

    fn text(&mut self, text: &str) {
        let id = self.tree.append_text(self.current(), text);
        self.trailing_text = Some(id);
    }

    fn cdata(&mut self, text: &str) -> Result<(), ParseError> {
        self.trailing_text = None;
        if !self.mode.is_html() {
            self.tree.append(self.current(), NodeKind::CData(text.to_owned()));
            return Ok(());
        }
        match self.current_name() {
            Some(name) if RAW_TEXT_ELEMENTS.contains(&name) => {
                self.tree.append_text(self.current(), text);
                Ok(())
            }
            _ => Err(ParseError::XmlModeRequired),
        }
    }

    fn leaf(&mut self, kind: NodeKind) {
        self.trailing_text = None;
        self.tree.append(self.current(), kind);
    }

    fn finish(mut self) -> Tree {
        if self.mode.is_html() {
            if let Some(id) = self.trailing_text
                && self.tree.text(id).is_some_and(is_blank)
            {
                self.tree.detach(id);
            }
            let root = self.tree.root();
            self.prune_blank_text(root);
        }
        self.tree
    }

    /// Drop whitespace-only text the HTML parser treats as ignorable.
    fn prune_blank_text(&mut self, parent: NodeId) {
        let children = self.tree.children(parent).to_vec();
        let mut previous: Option<NodeId> = None;

        for child in children {
            match self.tree.kind(child) {
                NodeKind::Comment(_) => continue,
                NodeKind::Text(text) if is_blank(text) => {
                    if self.is_ignorable(parent, previous) {
                        self.tree.detach(child);
                        continue;
                    }
                }
                NodeKind::Element(_) => self.prune_blank_text(child),
                _ => {}
            }
            previous = Some(child);
        }
    }

    fn is_ignorable(&self, parent: NodeId, previous: Option<NodeId>) -> bool {
        let parent_name = match self.tree.kind(parent) {
            NodeKind::Document => return true,
            NodeKind::Element(element) => element.name.as_str(),
            _ => "body",
        };
        if matches!(parent_name, "html" | "head") {
            return true;
        }

        let Some(previous) = previous else {
            return !ALLOW_PCDATA.contains(&parent_name);
        };
        match self.tree.kind(previous) {
            NodeKind::Text(_) => false,
            NodeKind::Element(element) => !ALLOW_PCDATA.contains(&element.name.as_str()),
            _ => true,
        }
    }
}

/// Whether opening `open` implicitly ends an open `current` element.
fn closes_implicitly(open: &str, current: &str) -> bool {
    match current {
        "p" => matches!(
            open,
            "p" | "div"
                | "ul"
                | "ol"
                | "dl"
                | "table"
                | "pre"
                | "blockquote"
                | "form"
                | "hr"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "section"
                | "article"
                | "aside"
                | "header"
                | "footer"
                | "nav"
                | "address"
                | "fieldset"
        ),
        "li" => open == "li",
        "dt" | "dd" => matches!(open, "dt" | "dd"),
        "option" => matches!(open, "option" | "optgroup"),
        "tr" => open == "tr",
        "td" | "th" => matches!(open, "td" | "th" | "tr"),
        _ => false,
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Rewrite lenient HTML into input the XML reader accepts.
fn prepare_html(text: &str) -> String {
    let converted = convert_html_entities(text);
    let wrapped = wrap_raw_text(&converted);
    escape_stray_markup(&wrapped)
}

/// Wrap the content of raw-text elements in CDATA sections.
fn wrap_raw_text(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some(caps) = RAW_TEXT_START.captures_at(text, pos) {
        let Some(tag) = caps.get(0) else { break };
        out.push_str(&text[pos..tag.end()]);
        pos = tag.end();
        if tag.as_str().ends_with("/>") {
            continue;
        }

        let closing = format!("</{}", caps[1].to_ascii_lowercase());
        let end = lower[pos..]
            .find(&closing)
            .map_or(text.len(), |offset| pos + offset);
        let content = &text[pos..end];
        if !content.is_empty() {
            out.push_str("<![CDATA[");
            out.push_str(&content.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        pos = end;
    }

    out.push_str(&text[pos..]);
    out
}

/// Escape `&` and `<` characters that cannot start markup.
///
/// CDATA sections, comments and processing instructions are copied through
/// untouched.
fn escape_stray_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(offset) = rest.find(['&', '<']) {
        out.push_str(&rest[..offset]);
        rest = &rest[offset..];

        if rest.starts_with('&') {
            if ENTITY_REF.is_match(rest) {
                out.push('&');
            } else {
                out.push_str("&amp;");
            }
            rest = &rest[1..];
            continue;
        }

        let verbatim = [("<![CDATA[", "]]>"), ("<!--", "-->"), ("<?", "?>")]
            .iter()
            .find(|(open, _)| rest.starts_with(open));
        if let Some((open, close)) = verbatim {
            let end = rest[open.len()..]
                .find(close)
                .map_or(rest.len(), |found| open.len() + found + close.len());
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        let starts_markup = rest[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '_'));
        if starts_markup {
            out.push('<');
        } else {
            out.push_str("&lt;");
        }
        rest = &rest[1..];
    }

    out.push_str(rest);
    out
}
