//! Raw content: `script`/`style` bodies, CDATA and attribute values.
//!
//! These are strings rather than subtrees, so directive elements inside
//! them are still in their synthetic-tag text form. [`split_directives`]
//! recovers the directive structure; the heredoc formatter turns it into
//! interpolations and warning comments.

use std::fmt::Write;
use std::sync::LazyLock;

use h2f_erb::DirectiveTag;
use h2f_erb::tags::RAW_ATTRIBUTE;
use h2f_markup::unescape_html;
use regex::Regex;

use crate::context::RenderContext;
use crate::ruby::{escape_heredoc, indent};

/// Opening or closing synthetic tag.
static DIRECTIVE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)(directive_(?:loud|silent|block))((?:\s[^>]*)?)>")
        .expect("invalid directive tag regex")
});

/// Heading of the comment that replaces untranslatable directives.
const FIXME_HEADER: &str = "# HTML2FORTITUDE_FIXME_BEGIN: The following code was interpolated into this block using ERb;\n\
# Fortitude isn't a simple string-manipulation engine, so you will have to find another\n\
# way of accomplishing the same result here:\n";

/// Heading of the comment listing ERB code dropped from a start tag.
const TAG_FIXME_HEADER: &[&str] = &[
    "# HTML2FORTITUDE_FIXME_BEGIN: The following code was interpolated into this tag using ERb;",
    "# Fortitude builds attributes from a Ruby hash, so you will have to find another way of",
    "# accomplishing the same result here:",
];

/// Piece of raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Text(String),
    Loud { code: String, raw: bool },
    Silent(String),
    Block(Vec<Segment>),
}

/// Split raw content at synthetic directive tags.
///
/// Unclosed blocks end with the content; stray closing tags are ignored.
pub(crate) fn split_directives(content: &str) -> Vec<Segment> {
    let mut stack: Vec<Vec<Segment>> = vec![Vec::new()];
    let mut pos = 0;

    while let Some(caps) = DIRECTIVE_TAG.captures_at(content, pos) {
        let Some(tag) = caps.get(0) else { break };
        push_text(&mut stack, &content[pos..tag.start()]);
        pos = tag.end();

        let closing = !caps[1].is_empty();
        let Some(kind) = DirectiveTag::from_name(&caps[2]) else { continue };
        match (kind, closing) {
            (DirectiveTag::Block, false) => stack.push(Vec::new()),
            (DirectiveTag::Block, true) => {
                if stack.len() > 1 {
                    let inner = stack.pop().unwrap_or_default();
                    current(&mut stack).push(Segment::Block(inner));
                }
            }
            (_, true) => {}
            (DirectiveTag::Loud | DirectiveTag::Silent, false) => {
                let close = format!("</{}>", kind.name());
                let end = content[pos..].find(&close).map_or(content.len(), |i| pos + i);
                let code = content[pos..end].to_owned();
                pos = (end + close.len()).min(content.len());
                current(&mut stack).push(if kind == DirectiveTag::Loud {
                    Segment::Loud {
                        code,
                        raw: caps[3].contains(RAW_ATTRIBUTE),
                    }
                } else {
                    Segment::Silent(code)
                });
            }
        }
    }
    push_text(&mut stack, &content[pos..]);

    while stack.len() > 1 {
        let inner = stack.pop().unwrap_or_default();
        current(&mut stack).push(Segment::Block(inner));
    }
    stack.pop().unwrap_or_default()
}

fn current(stack: &mut Vec<Vec<Segment>>) -> &mut Vec<Segment> {
    if stack.is_empty() {
        stack.push(Vec::new());
    }
    let last = stack.len() - 1;
    &mut stack[last]
}

fn push_text(stack: &mut Vec<Vec<Segment>>, text: &str) {
    if !text.is_empty() {
        current(stack).push(Segment::Text(text.to_owned()));
    }
}

/// Whether raw content holds any synthetic directive tag.
pub(crate) fn has_directives(content: &str) -> bool {
    DIRECTIVE_TAG.is_match(content)
}

/// Heredoc body for raw content at `depth`.
///
/// With directives enabled, loud directives become `#{code}` and every
/// other directive becomes a FIXME comment. Directive code inside raw
/// content is still HTML-escaped and is decoded here.
pub(crate) fn heredoc_body(content: &str, depth: usize, cx: &mut RenderContext<'_>) -> String {
    let mut body = String::with_capacity(content.len());
    if cx.options.directives {
        for segment in split_directives(content) {
            interpolate_segment(&segment, &mut body, cx);
        }
    } else {
        body.push_str(&escape_heredoc(content));
    }
    reindent(&body, depth)
}

fn interpolate_segment(segment: &Segment, out: &mut String, cx: &mut RenderContext<'_>) {
    match segment {
        Segment::Text(text) => out.push_str(&escape_heredoc(text)),
        Segment::Loud { code, .. } => {
            let code = cx.extract_needs(unescape_html(code).trim());
            if !code.is_empty() {
                let _ = write!(out, "#{{{code}}}");
            }
        }
        Segment::Silent(code) => {
            tracing::warn!(code = code.trim(), "ERB statement inside raw content");
            fixme(out, &unescape_html(code));
        }
        Segment::Block(inner) => {
            tracing::warn!("ERB block inside raw content");
            let mut original = String::new();
            erb_source(inner, &mut original);
            fixme(out, &original);
        }
    }
}

/// Reconstruct ERB source from segments.
fn erb_source(segments: &[Segment], out: &mut String) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Loud { code, raw } => {
                let marker = if *raw { "<%==" } else { "<%=" };
                let _ = write!(out, "{marker}{}%>", unescape_html(code));
            }
            Segment::Silent(code) => {
                let _ = write!(out, "<%{}%>", unescape_html(code));
            }
            Segment::Block(inner) => erb_source(inner, out),
        }
    }
}

/// Warning comment listing code that cannot be expressed in a heredoc.
fn fixme(out: &mut String, code: &str) {
    out.push('\n');
    out.push_str(FIXME_HEADER);
    out.push_str("# <%\n");
    for line in code.trim_end_matches(['\n', '\r']).split('\n') {
        let _ = writeln!(out, "# {}", line.trim_end());
    }
    out.push_str("# %>\n");
}

/// Comment statement listing ERB code that had no place in a start tag,
/// one `# ` line per source line, at `depth`.
pub(crate) fn tag_fixme(sources: &[String], depth: usize) -> String {
    let ind = indent(depth);
    let mut out = String::new();
    for line in TAG_FIXME_HEADER {
        let _ = writeln!(out, "{ind}{line}");
    }
    for line in sources.iter().flat_map(|source| source.lines()) {
        let _ = writeln!(out, "{ind}# {}", line.trim_end());
    }
    out
}

/// Re-indent heredoc content to `depth`.
///
/// Leading blank lines and trailing whitespace go. When every line shares
/// the first line's indentation it is swapped for the depth's
/// indentation; otherwise the content is left-stripped and every line
/// indented.
pub(crate) fn reindent(content: &str, depth: usize) -> String {
    let content = strip_leading_blank_lines(content);
    let original: String = content
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    let prefix = indent(depth);
    let consistent = content
        .split('\n')
        .all(|line| line.trim().is_empty() || line.starts_with(&original));

    let mut out = String::with_capacity(content.len());
    let (content, strip) = if consistent {
        (content, original.len())
    } else {
        (content.trim_start(), 0)
    };
    for (index, line) in content.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let line = if line.trim().is_empty() {
            ""
        } else {
            &line[strip.min(line.len())..]
        };
        if !line.is_empty() {
            out.push_str(&prefix);
        }
        out.push_str(line);
    }
    out.truncate(out.trim_end().len());
    out
}

/// Drop whitespace up to the last line break of the leading whitespace.
fn strip_leading_blank_lines(content: &str) -> &str {
    let leading = content.len() - content.trim_start().len();
    match content[..leading].rfind('\n') {
        Some(index) => &content[index + 1..],
        None => content,
    }
}
