//! Markup tree to Fortitude statements.
//!
//! [`NodeRenderer`] walks the tree depth-first and emits one Ruby statement
//! per node, two spaces of indentation per nesting level. Decisions that
//! need a sibling or parent (inline arguments, `succeed`, loud blocks,
//! deferred `end`) are recorded in the [`RenderContext`] side tables
//! instead of mutating the tree.

use std::fmt::Write;

use h2f_erb::DirectiveTag;
use h2f_erb::tags::RAW_ATTRIBUTE;
use h2f_markup::{Element, NodeId, NodeKind, Tree};
use tracing::{debug, warn};

use crate::attributes::{attribute_values, format_pair};
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::raw::{heredoc_body, tag_fixme};
use crate::ruby::{
    indent, inspect, is_method_name, line_breaks, parenthesize_command, quote_text,
    trim_leading_blank_lines,
};

const JAVASCRIPT_TERMINATOR: &str = "END_OF_JAVASCRIPT_CONTENT";
const SCRIPT_TERMINATOR: &str = "END_OF_SCRIPT_CONTENT";
const STYLE_TERMINATOR: &str = "END_OF_STYLE_CONTENT";
const CDATA_TERMINATOR: &str = "END_OF_CDATA_CONTENT";

/// MIME types rendered with `javascript`.
const JAVASCRIPT_TYPES: &[&str] = &[
    "",
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
    "text/x-javascript",
    "text/ecmascript",
    "application/ecmascript",
];

/// Renders one markup tree as a Fortitude method body.
pub struct NodeRenderer<'t, 'c> {
    tree: &'t Tree,
    cx: RenderContext<'c>,
}

impl<'t, 'c> NodeRenderer<'t, 'c> {
    #[must_use]
    pub fn new(tree: &'t Tree, cx: RenderContext<'c>) -> Self {
        Self { tree, cx }
    }

    /// Render the whole tree at depth zero.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnknownDirectiveTag`] for a `directive_*`
    /// element other than the three known ones.
    pub fn render(&mut self) -> Result<String, RenderError> {
        self.node(self.tree.root(), 0)
    }

    /// Context after rendering, holding the collected needs.
    #[must_use]
    pub fn into_context(self) -> RenderContext<'c> {
        self.cx
    }

    fn node(&mut self, id: NodeId, depth: usize) -> Result<String, RenderError> {
        if self.cx.is_rendered(id) {
            return Ok(String::new());
        }
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Document | NodeKind::Fragment => self.children(id, depth),
            NodeKind::Text(text) => Ok(self.text(id, text, depth)),
            NodeKind::Comment(content) => Ok(format!(
                "{}comment {}\n",
                indent(depth),
                quote_text(content.trim())
            )),
            NodeKind::CData(content) => {
                let body = heredoc_body(content, depth, &mut self.cx);
                Ok(heredoc("cdata", CDATA_TERMINATOR, &[], &body, depth))
            }
            NodeKind::ProcessingInstruction(content) => {
                Ok(format!("{}rawtext({})\n", indent(depth), inspect(content)))
            }
            NodeKind::DocumentType(_) => Ok(format!("{}doctype!\n", indent(depth))),
            NodeKind::Element(element) => self.element(id, element, depth),
        }
    }

    fn children(&mut self, id: NodeId, depth: usize) -> Result<String, RenderError> {
        let tree = self.tree;
        let mut out = String::new();
        for &child in tree.children(id) {
            out.push_str(&self.node(child, depth)?);
        }
        Ok(out)
    }

    /// Directive kind of a node, when directives are enabled.
    fn directive(&self, id: NodeId) -> Option<DirectiveTag> {
        if !self.cx.options.directives {
            return None;
        }
        self.tree
            .element(id)
            .and_then(|element| DirectiveTag::from_name(&element.name))
    }

    fn is_directive(&self, id: Option<NodeId>) -> bool {
        id.and_then(|id| self.directive(id)).is_some()
    }

    // Text

    fn text(&mut self, id: NodeId, text: &str, depth: usize) -> String {
        let text = &text[self.cx.consumed_prefix(id).min(text.len())..];
        if text.is_empty() {
            return String::new();
        }
        if text.trim().is_empty() {
            return "\n".repeat(line_breaks(text));
        }

        let tree = self.tree;
        let mut content = text;
        if !self.is_directive(tree.previous_sibling(id)) {
            content = elide_leading(content);
        }
        let mut trailing_breaks = 0;
        if !self.is_directive(tree.next_sibling(id)) {
            (content, trailing_breaks) = elide_trailing(content);
        }
        format!(
            "{}text {}\n{}",
            indent(depth),
            quote_text(content),
            "\n".repeat(trailing_breaks)
        )
    }

    // Elements

    fn element(
        &mut self,
        id: NodeId,
        element: &Element,
        depth: usize,
    ) -> Result<String, RenderError> {
        if self.cx.options.directives && h2f_erb::tags::is_directive_tag(&element.name) {
            return match DirectiveTag::from_name(&element.name) {
                Some(DirectiveTag::Loud) => Ok(self.loud(id, element, depth)),
                Some(DirectiveTag::Silent) => Ok(self.silent(id, depth)),
                Some(DirectiveTag::Block) => self.block(id, depth),
                None => Err(RenderError::UnknownDirectiveTag(element.name.clone())),
            };
        }

        let mut out = String::new();
        let dropped = self.prepare_attributes(id, element);
        if !dropped.is_empty() {
            warn!(
                tag = %element.name,
                count = dropped.len(),
                "ERB code inside a start tag cannot be converted, leaving a FIXME comment"
            );
            out.push_str(&tag_fixme(&dropped, depth));
        }

        let mut inner_depth = depth;
        let succeed = self.succeed_word(id);
        let style = self.cx.options.block_style;
        if let Some(word) = &succeed {
            let _ = writeln!(out, "{}succeed({}) {}", indent(depth), inspect(word), style.open());
            inner_depth += 1;
        }

        let is_raw = matches!(element.name.as_str(), "script" | "style")
            && !self.tree.children(id).is_empty();
        if is_raw {
            out.push_str(&self.raw_element(id, element, inner_depth));
        } else {
            out.push_str(&self.tag(id, element, inner_depth)?);
        }

        if succeed.is_some() {
            let _ = writeln!(out, "{}{}", indent(depth), style.close());
        }
        Ok(out)
    }

    /// Punctuation glued to the end of an element, taken from the
    /// following text node.
    fn succeed_word(&mut self, id: NodeId) -> Option<String> {
        let tree = self.tree;
        let next = tree.next_sibling(id)?;
        let text = tree.text(next)?;
        let text = &text[self.cx.consumed_prefix(next).min(text.len())..];
        if !text.starts_with(|c: char| !c.is_whitespace()) {
            return None;
        }

        let at_boundary = match tree.previous_sibling(id) {
            None => true,
            Some(prev) => tree.text(prev).is_some_and(|prev_text| {
                !prev_text.ends_with(char::is_whitespace)
                    || (prev_text.trim().is_empty() && tree.previous_sibling(prev).is_none())
            }),
        };
        if at_boundary {
            return None;
        }

        let len = text.find(char::is_whitespace).unwrap_or(text.len());
        let word = text[..len].to_owned();
        self.cx.consume_prefix(next, len);
        Some(word)
    }

    fn tag(&mut self, id: NodeId, element: &Element, depth: usize) -> Result<String, RenderError> {
        let tree = self.tree;
        let name = element.name.as_str();
        if !is_method_name(name) {
            warn!(tag = name, "Tag name is not a Ruby method name, emitting as-is");
        }

        let attributes = self.attribute_pairs(id, None);
        let children = tree.children(id);

        if let [child] = children {
            let child = *child;
            if let Some(argument) = self.inline_argument(child, !attributes.is_empty()) {
                self.cx.mark_rendered(child);
                let args: Vec<String> = argument.into_iter().chain(attributes).collect();
                return Ok(format!("{}{}\n", indent(depth), call(name, &args)));
            }
        }

        let mut body = String::new();
        for &child in children {
            body.push_str(&self.node(child, depth + 1)?);
        }
        let body = trim_leading_blank_lines(&body).trim_end();

        let ind = indent(depth);
        let call = call(name, &attributes);
        if body.is_empty() {
            return Ok(format!("{ind}{call}\n"));
        }
        let style = self.cx.options.block_style;
        Ok(format!(
            "{ind}{call} {}\n{body}\n{ind}{}\n",
            style.open(),
            style.close()
        ))
    }

    /// Argument for an element's only child, if it can be passed inline.
    ///
    /// The outer `Option` says whether the child is inlined at all; the
    /// inner one is `None` for text that elides to nothing.
    #[allow(clippy::option_option)]
    fn inline_argument(&mut self, child: NodeId, has_attributes: bool) -> Option<Option<String>> {
        let tree = self.tree;
        match tree.kind(child) {
            NodeKind::Text(text) => {
                let (content, _) = elide_trailing(elide_leading(text));
                Some((!content.is_empty()).then(|| quote_text(content)))
            }
            NodeKind::Element(element) if self.directive(child) == Some(DirectiveTag::Loud) => {
                if element.has_attribute(RAW_ATTRIBUTE) && self.cx.options.raw_output {
                    return None;
                }
                let code = tree.inner_text(child);
                let code = code.trim();
                if code.is_empty()
                    || code.contains(['\n', '\r', ';'])
                    || self.cx.helpers.calls_self_outputting(code)
                {
                    return None;
                }
                let code = self.cx.extract_needs(code);
                Some(Some(if has_attributes {
                    parenthesize_command(&code)
                } else {
                    code
                }))
            }
            _ => None,
        }
    }

    fn raw_element(&mut self, id: NodeId, element: &Element, depth: usize) -> String {
        let (method, terminator, implied) = raw_kind(element);
        let content = self.tree.inner_text(id);
        let body = heredoc_body(&content, depth, &mut self.cx);
        let attributes = self.attribute_pairs(id, implied);
        heredoc(method, terminator, &attributes, &body, depth)
    }

    /// Classify the attributes of `id` once, returning the ERB source
    /// they could not hold.
    fn prepare_attributes(&mut self, id: NodeId, element: &Element) -> Vec<String> {
        let set = attribute_values(element, &mut self.cx);
        self.cx.attributes.insert(id, set.values);
        set.dropped
    }

    fn attribute_pairs(&self, id: NodeId, skip: Option<&str>) -> Vec<String> {
        let style = self.cx.options.hash_style;
        self.cx
            .attributes
            .get(&id)
            .map(|values| {
                values
                    .iter()
                    .filter(|(name, _)| Some(name.as_str()) != skip)
                    .map(|(name, value)| format_pair(name, value, style))
                    .collect()
            })
            .unwrap_or_default()
    }

    // Directives

    fn loud(&mut self, id: NodeId, element: &Element, depth: usize) -> String {
        let tree = self.tree;
        let code = self.cx.extract_needs(&tree.inner_text(id));
        let lines: Vec<&str> = code
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some((last, init)) = lines.split_last() else {
            debug!("Skipping empty output directive");
            return String::new();
        };

        let method = if element.has_attribute(RAW_ATTRIBUTE) && self.cx.options.raw_output {
            "rawtext"
        } else {
            "text"
        };
        let ind = indent(depth);
        let mut out = String::new();
        for line in init {
            let _ = writeln!(out, "{ind}{line}");
        }

        let block = tree
            .next_sibling(id)
            .filter(|&next| self.directive(next) == Some(DirectiveTag::Block));
        if let Some(block) = block {
            self.cx.mark_loud_block(block);
            let _ = writeln!(out, "{ind}{method}({last}");
        } else if init.is_empty() && self.cx.helpers.calls_self_outputting(last) {
            let _ = writeln!(out, "{ind}{last}");
        } else {
            let _ = writeln!(out, "{ind}{method}({last})");
        }
        out
    }

    fn silent(&mut self, id: NodeId, depth: usize) -> String {
        let code = self.cx.extract_needs(&self.tree.inner_text(id));
        let ind = indent(depth);
        let mut out = String::new();
        for line in code.split('\n').map(str::trim).filter(|line| !line.is_empty()) {
            let _ = writeln!(out, "{ind}{line}");
        }
        if self.cx.is_loud_block(id) && out.ends_with('\n') {
            out.pop();
            out.push_str(")\n");
        }
        out
    }

    fn block(&mut self, id: NodeId, depth: usize) -> Result<String, RenderError> {
        let tree = self.tree;
        let mut body = String::new();
        for &child in tree.children(id) {
            body.push_str(&self.node(child, depth + 1)?);
        }
        let body = trim_leading_blank_lines(&body).trim_end();

        let mut out = String::new();
        if !body.is_empty() {
            out.push_str(body);
            out.push('\n');
        }

        let loud = self.cx.is_loud_block(id);
        if let Some(continuation) = self.continuation(id) {
            if loud {
                let following = tree
                    .next_sibling(continuation)
                    .filter(|&next| self.directive(next) == Some(DirectiveTag::Block));
                self.cx.mark_loud_block(following.unwrap_or(continuation));
            }
            return Ok(out);
        }

        let _ = writeln!(out, "{}end{}", indent(depth), if loud { ")" } else { "" });
        Ok(out)
    }

    /// Statement that ends this block itself: a mid-block keyword such as
    /// `else`, or a closer with a trailing call such as `end.join`.
    fn continuation(&self, id: NodeId) -> Option<NodeId> {
        let next = self.tree.next_sibling(id)?;
        if self.directive(next) != Some(DirectiveTag::Silent) {
            return None;
        }
        let code = self.tree.inner_text(next);
        let classifier = self.cx.classifier;
        (classifier.is_mid_block(&code) || classifier.is_block_closer(&code)).then_some(next)
    }
}

/// Heredoc method, terminator and the attribute the method name implies.
fn raw_kind(element: &Element) -> (&'static str, &'static str, Option<&'static str>) {
    if element.name == "style" {
        return ("style", STYLE_TERMINATOR, None);
    }
    match (element.attribute("type"), element.attribute("language")) {
        (Some(mime), _) if JAVASCRIPT_TYPES.contains(&mime.trim().to_ascii_lowercase().as_str()) => {
            ("javascript", JAVASCRIPT_TERMINATOR, Some("type"))
        }
        (None, Some(language)) if language.to_ascii_lowercase().starts_with("javascript") => {
            ("javascript", JAVASCRIPT_TERMINATOR, Some("language"))
        }
        (None, None) => ("javascript", JAVASCRIPT_TERMINATOR, None),
        _ => ("script", SCRIPT_TERMINATOR, None),
    }
}

fn heredoc(
    method: &str,
    terminator: &str,
    attributes: &[String],
    body: &str,
    depth: usize,
) -> String {
    let ind = indent(depth);
    let mut out = format!("{ind}{method} <<-{terminator}");
    for attribute in attributes {
        out.push_str(", ");
        out.push_str(attribute);
    }
    out.push('\n');
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
    let _ = writeln!(out, "{ind}{terminator}");
    out
}

fn call(name: &str, args: &[String]) -> String {
    if args.is_empty() {
        name.to_owned()
    } else {
        format!("{name}({})", args.join(", "))
    }
}

/// Drop leading whitespace that contains a line break.
fn elide_leading(text: &str) -> &str {
    let rest = text.trim_start();
    if text[..text.len() - rest.len()].contains('\n') {
        rest
    } else {
        text
    }
}

/// Drop trailing whitespace that contains line breaks, returning how many.
fn elide_trailing(text: &str) -> (&str, usize) {
    let rest = text.trim_end();
    let breaks = line_breaks(&text[rest.len()..]);
    if breaks > 0 { (rest, breaks) } else { (text, 0) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::converter::Converter;
    use crate::error::ConvertError;
    use crate::options::{AssignsMode, BlockStyle, HashStyle};

    fn body(input: &str) -> String {
        body_with(Converter::builder(), input)
    }

    fn body_with(builder: crate::converter::ConverterBuilder, input: &str) -> String {
        let converter = builder.class_name("SpecClass").build().unwrap();
        converter.render_body(input).unwrap().body
    }

    fn fixme(code: &str) -> String {
        format!(
            "# HTML2FORTITUDE_FIXME_BEGIN: The following code was interpolated into this block using ERb;\n\
             # Fortitude isn't a simple string-manipulation engine, so you will have to find another\n\
             # way of accomplishing the same result here:\n\
             # <%\n\
             # {code}\n\
             # %>"
        )
    }

    fn tag_fixme(code: &[&str]) -> String {
        let mut out = "# HTML2FORTITUDE_FIXME_BEGIN: The following code was interpolated into this tag using ERb;\n\
                       # Fortitude builds attributes from a Ruby hash, so you will have to find another way of\n\
                       # accomplishing the same result here:\n"
            .to_owned();
        for line in code {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_elide_whitespace() {
        assert_eq!(elide_leading("\n  a"), "a");
        assert_eq!(elide_leading("  a"), "  a");
        assert_eq!(elide_trailing("a \n\n "), ("a", 2));
        assert_eq!(elide_trailing("a  "), ("a  ", 0));
    }

    #[test]
    fn test_raw_kind() {
        let script = Element::new("script");
        assert_eq!(raw_kind(&script).0, "javascript");
        let typed = Element::new("script").with_attribute("type", "text/x-template");
        assert_eq!(raw_kind(&typed), ("script", SCRIPT_TERMINATOR, None));
        let legacy = Element::new("script").with_attribute("language", "JavaScript1.2");
        assert_eq!(raw_kind(&legacy).2, Some("language"));
    }

    // Text

    #[test]
    fn test_simple_text() {
        assert_eq!(body("hello, world"), "text \"hello, world\"");
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(body("hello, \"world"), "text \"hello, \\\"world\"");
        assert_eq!(body("hello, 'world"), "text \"hello, 'world\"");
    }

    #[test]
    fn test_entities_and_interpolation_markers() {
        assert_eq!(body("<p>&lt;b&gt; &amp;&amp; #@foo</p>"), r#"p("<b> && \#@foo")"#);
        assert_eq!(body("<p>&hearts; &check;</p>"), "p(\"\u{2665} \u{2713}\")");
        assert_eq!(body("a #{b} #$c"), r#"text "a \#{b} \#$c""#);
    }

    #[test]
    fn test_text_around_statement() {
        assert_eq!(
            body("hello, <% abc %> world"),
            "text \"hello, \"\nabc\ntext \" world\""
        );
    }

    #[test]
    fn test_blank_lines_preserved() {
        assert_eq!(
            body("<p foo=\"bar\"/>\n\n<p bar=\"baz\"/>"),
            "p(:foo => \"bar\")\n\n\np(:bar => \"baz\")"
        );
    }

    // Tags

    #[test]
    fn test_empty_tag() {
        assert_eq!(body("<p/>"), "p");
        assert_eq!(body("<p></p>"), "p");
    }

    #[test]
    fn test_tag_attributes() {
        assert_eq!(body("<p foo=\"bar\"/>"), "p(:foo => \"bar\")");
        assert_eq!(
            body("<p foo=\"bar\" bar=\"baz\"/>"),
            "p(:bar => \"baz\", :foo => \"bar\")"
        );
        assert_eq!(body("<p foo-bar=\"baz\"/>"), "p(\"foo-bar\" => \"baz\")");
    }

    #[test]
    fn test_dynamic_attributes() {
        assert_eq!(body("<p foo=\"<%= bar %>\"/>"), "p(:foo => bar)");
        assert_eq!(
            body("<p foo=\"bar <%= baz %> quux\"/>"),
            "p(:foo => \"bar #{baz} quux\")"
        );
    }

    #[test]
    fn test_assign_attribute_unwrapped() {
        assert_eq!(body("<p title=\"<%= @t %>\"/>"), "p(:title => t)");
    }

    #[test]
    fn test_statement_in_attribute_value_leaves_fixme() {
        assert_eq!(
            body("<p class=\"<% if x %>a<% end %>\">t</p>"),
            format!("{}p(\"t\", :class => \"a\")", tag_fixme(&["<% if x %>", "<% end %>"]))
        );
    }

    #[test]
    fn test_directive_in_start_tag_leaves_fixme() {
        let rendered = body("<input <%= 'checked' if x %>>");
        assert_eq!(
            rendered,
            format!("{}input", tag_fixme(&["<%= 'checked' if x %>"]))
        );
        assert!(!rendered.contains("directive_"));

        assert_eq!(
            body("<div>\n  <input type=\"checkbox\" <% if x %>checked<% end %>>\n</div>"),
            format!(
                "div {{\n{}  input(:checked => \"\", :type => \"checkbox\")\n}}",
                tag_fixme(&["<% if x %>", "<% end %>"])
                    .lines()
                    .map(|line| format!("  {line}\n"))
                    .collect::<String>()
            )
        );
    }

    #[test]
    fn test_text_child_inlined() {
        assert_eq!(body("<p class=\"x\">hi</p>"), "p(\"hi\", :class => \"x\")");
        assert_eq!(body("<p>\n  hi\n</p>"), "p(\"hi\")");
    }

    #[test]
    fn test_nested_tags() {
        assert_eq!(body("<p><span>hi</span></p>"), "p {\n  span(\"hi\")\n}");
    }

    #[test]
    fn test_nested_tags_do_end() {
        let builder = Converter::builder().block_style(BlockStyle::DoEnd);
        assert_eq!(
            body_with(builder, "<p><span>hi</span></p>"),
            "p do\n  span(\"hi\")\nend"
        );
    }

    #[test]
    fn test_modern_hashes() {
        let builder = Converter::builder().hash_style(HashStyle::Modern);
        assert_eq!(body_with(builder, "<p class=\"foo\"/>"), "p(class: \"foo\")");
    }

    #[test]
    fn test_succeed_punctuation() {
        assert_eq!(
            body("<p>see <a href=\"/x\">here</a>.</p>"),
            "p {\n  text \"see \"\n  succeed(\".\") {\n    a(\"here\", :href => \"/x\")\n  }\n}"
        );
    }

    #[test]
    fn test_no_succeed_after_word() {
        assert_eq!(
            body("<p>x<b>y</b>z</p>"),
            "p {\n  text \"x\"\n  b(\"y\")\n  text \"z\"\n}"
        );
    }

    // Other nodes

    #[test]
    fn test_processing_instruction() {
        assert_eq!(
            body("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"),
            "rawtext(\"<?xml version=\\\"1.0\\\" encoding=\\\"UTF-8\\\"?>\")"
        );
    }

    #[test]
    fn test_cdata() {
        assert_eq!(
            body("hello <![CDATA[\nfoo\nbar\n]]>\nworld"),
            "text \"hello \"\ncdata <<-END_OF_CDATA_CONTENT\nfoo\nbar\nEND_OF_CDATA_CONTENT\ntext \"world\""
        );
    }

    #[test]
    fn test_doctype() {
        assert_eq!(body("<!DOCTYPE html>"), "doctype!");
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            body("hello <!-- something here --> world"),
            "text \"hello \"\ncomment \"something here\"\ntext \" world\""
        );
        assert_eq!(
            body("hello <!-- something\nhere\nyo --> world"),
            "text \"hello \"\ncomment %{something\nhere\nyo}\ntext \" world\""
        );
    }

    // ERB

    #[test]
    fn test_erb_block() {
        assert_eq!(
            body("<% foo do %>\nbar\n<p class=\"baz\"/>\n<% end %>"),
            "foo do\n  text \"bar\"\n\n  p(:class => \"baz\")\nend"
        );
    }

    #[test]
    fn test_erb_block_followed_by_text() {
        assert_eq!(
            body("<% foo do %>\nbar\n<p class=\"baz\"/>\n<% end %>\nhello, world"),
            "foo do\n  text \"bar\"\n\n  p(:class => \"baz\")\nend\ntext \"hello, world\""
        );
    }

    #[test]
    fn test_loud_block() {
        assert_eq!(
            body("<%= form_for do |f| %>\n  <%= f.text_field :name %>\n  <p class=\"baz\"/>\n<% end %>"),
            "text(form_for do |f|\n  text(f.text_field :name)\n  p(:class => \"baz\")\nend)"
        );
    }

    #[test]
    fn test_multiline_loud_block() {
        assert_eq!(
            body(
                "<%= foo + bar\nform_for do |f| %>\n  <%= f.text_field :name %>\n  <p class=\"baz\"/>\n<% end %>"
            ),
            "foo + bar\ntext(form_for do |f|\n  text(f.text_field :name)\n  p(:class => \"baz\")\nend)"
        );
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            body("<% if a %>\n<p/>\n<% else %>\n<br/>\n<% end %>"),
            "if a\n  p\nelse\n  br\nend"
        );
    }

    #[test]
    fn test_elsif_chain() {
        assert_eq!(
            body("<% if a %>x<% elsif b %>y<% else %>z<% end %>"),
            "if a\n  text \"x\"\nelsif b\n  text \"y\"\nelse\n  text \"z\"\nend"
        );
    }

    #[test]
    fn test_case_when_chain() {
        assert_eq!(
            body("<% case v %><% when 1 %>one<% when 2 %>two<% else %>many<% end %>"),
            "case v\nwhen 1\n  text \"one\"\nwhen 2\n  text \"two\"\nelse\n  text \"many\"\nend"
        );
    }

    #[test]
    fn test_closer_with_trailing_call() {
        assert_eq!(
            body("<% items.map do |i| %>x<% end.join(\", \") %>"),
            "items.map do |i|\n  text \"x\"\nend.join(\", \")"
        );
    }

    #[test]
    fn test_loud_block_closer_with_trailing_call() {
        assert_eq!(
            body("<%= items.map do |i| %>x<% end.join(\", \") %>"),
            "text(items.map do |i|\n  text \"x\"\nend.join(\", \"))"
        );
    }

    #[test]
    fn test_interpolated_assign_in_loud() {
        assert_eq!(body("<%= \"#@foo\" %>"), "text(\"#{foo}\")");
    }

    #[test]
    fn test_unknown_directive_element() {
        let converter = Converter::builder().class_name("SpecClass").build().unwrap();
        let err = converter
            .render_body("<p><directive_other>x</directive_other></p>")
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Render(RenderError::UnknownDirectiveTag(ref name)) if name == "directive_other"
        ));
        assert_eq!(err.to_string(), "unknown directive element <directive_other>");
    }

    #[test]
    fn test_script_interpolation() {
        assert_eq!(
            body("<script type=\"text/javascript\">\nfoo\n<%= bar %>\nbaz\n</script>"),
            "javascript <<-END_OF_JAVASCRIPT_CONTENT\nfoo\n#{bar}\nbaz\nEND_OF_JAVASCRIPT_CONTENT"
        );
    }

    #[test]
    fn test_style_interpolation() {
        assert_eq!(
            body("<style type=\"text/css\">\nfoo\n<%= bar %>\nbaz\n</style>"),
            "style <<-END_OF_STYLE_CONTENT, :type => \"text/css\"\nfoo\n#{bar}\nbaz\nEND_OF_STYLE_CONTENT"
        );
    }

    #[test]
    fn test_script_statement_fixme() {
        assert_eq!(
            body("<script type=\"text/javascript\">\nbar\n<% baz %>\nquux\n</script>"),
            format!(
                "javascript <<-END_OF_JAVASCRIPT_CONTENT\nbar\n\n{}\nquux\nEND_OF_JAVASCRIPT_CONTENT",
                fixme(" baz")
            )
        );
    }

    #[test]
    fn test_style_block_fixme() {
        assert_eq!(
            body("<style type=\"text/css\">\nbar\n<% if foo %>\nquux\n<% else %>\nbar\n<% end %>\nquux\n</style>"),
            format!(
                "style <<-END_OF_STYLE_CONTENT, :type => \"text/css\"\nbar\n\n{}\n\n{}\n\n{}\n\n{}\nquux\nEND_OF_STYLE_CONTENT",
                fixme(" if foo"),
                fixme("quux"),
                fixme(" else"),
                fixme("bar")
            )
        );
    }

    #[test]
    fn test_empty_script_is_plain_element() {
        assert_eq!(
            body("<script src=\"/app.js\"></script>"),
            "script(:src => \"/app.js\")"
        );
    }

    // Needs

    #[test]
    fn test_needs_rewritten() {
        assert_eq!(
            body("hello, <%= @foo + @bar %>, <%= @baz %>"),
            "text \"hello, \"\ntext(foo + bar)\ntext \", \"\ntext(baz)"
        );
        assert_eq!(body("hello, <% @foo %>"), "text \"hello, \"\nfoo");
        assert_eq!(body("<p><%= @foo %></p>"), "p(foo)");
    }

    #[test]
    fn test_instance_variables_kept() {
        let builder = Converter::builder().assigns(AssignsMode::InstanceVariables);
        assert_eq!(
            body_with(builder, "hello, <%= @foo + @bar %>"),
            "text \"hello, \"\ntext(@foo + @bar)"
        );
    }

    // Helpers

    #[test]
    fn test_helper_output() {
        assert_eq!(
            body("<%= distance_of_time_in_words 5.minutes.from_now %>"),
            "text(distance_of_time_in_words 5.minutes.from_now)"
        );
        assert_eq!(body("<%= image_tag 'foo' %>"), "image_tag 'foo'");
    }

    #[test]
    fn test_helper_not_inlined() {
        assert_eq!(body("<p><%= link_to 'x', y %></p>"), "p {\n  link_to 'x', y\n}");
    }

    #[test]
    fn test_loud_child_with_attributes_parenthesized() {
        assert_eq!(
            body("<p class=\"x\"><%= t :title %></p>"),
            "p(t(:title), :class => \"x\")"
        );
    }

    #[test]
    fn test_raw_output() {
        assert_eq!(body("<%== foo %>"), "rawtext(foo)");
        let builder = Converter::builder().raw_output(false);
        assert_eq!(body_with(builder, "<%== foo %>"), "text(foo)");
    }

    #[test]
    fn test_directives_disabled() {
        let builder = Converter::builder().directives(false);
        assert_eq!(body_with(builder, "<p>hi</p>"), "p(\"hi\")");
    }
}
