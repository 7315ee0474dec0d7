//! ERB directive preprocessing.
//!
//! Rewrites `<% %>` directives into synthetic markup elements so the markup
//! parser sees one uniform tree. Directive scanning follows Erubis: the same
//! tag grammar, the same trim mode for statements alone on their line, and
//! the same handling of `-%>` and `=%>` tails.
//!
//! Block structure is encoded with `directive_block` elements wrapping
//! everything between an opener and its closer:
//!
//! ```
//! use h2f_erb::{DirectivePreprocessor, RubyClassifier};
//!
//! let preprocessor = DirectivePreprocessor::new(&RubyClassifier);
//! assert_eq!(
//!     preprocessor.process("<% if a %>x<% end %>"),
//!     "<directive_silent> if a </directive_silent><directive_block>x</directive_block>"
//! );
//! ```
//!
//! A directive inside a start tag cannot become an element. It is kept
//! as a `directive_code_N` attribute holding its source instead.

use std::sync::LazyLock;

use h2f_markup::escape_html;
use regex::Regex;

use crate::classifier::BlockClassifier;
use crate::tags::{BLOCK_TAG, LOUD_TAG, RAW_ATTRIBUTE, SILENT_TAG, TAG_CODE_ATTRIBUTE};

/// Erubis directive pattern: indicator, code, tail character, trailing line break.
static DIRECTIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<%(=+|-|#|%)?(.*?)([-=])?%>([ \t]*\r?\n)?").expect("invalid directive regex")
});

/// Converts ERB source into markup with synthetic directive tags.
#[derive(Debug)]
pub struct DirectivePreprocessor<'a, C: ?Sized> {
    classifier: &'a C,
}

impl<'a, C: BlockClassifier + ?Sized> DirectivePreprocessor<'a, C> {
    /// Create a preprocessor using `classifier` for block detection.
    #[must_use]
    pub fn new(classifier: &'a C) -> Self {
        Self { classifier }
    }

    /// Rewrite every directive in `template`.
    #[must_use]
    pub fn process(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len() + template.len() / 4);
        let mut pos = 0;
        let mut at_line_start = true;
        let mut markup = MarkupScanner::default();
        let mut tag_code = 0;

        for caps in DIRECTIVE_PATTERN.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            let indicator = caps.get(1).map(|m| m.as_str());
            let code = caps.get(2).map_or("", |m| m.as_str());
            let tail = caps.get(3).map(|m| m.as_str());
            let mut rspace = caps.get(4).map(|m| m.as_str());

            let mut text = &template[pos..whole.start()];
            pos = whole.end();
            markup.advance(text);

            if markup.in_start_tag() {
                out.push_str(text);
                if indicator != Some("#") {
                    tag_code += 1;
                    let end = caps.get(4).map_or(whole.end(), |m| m.start());
                    push_tag_code(&mut out, tag_code, &template[whole.start()..end]);
                }
                out.push_str(rspace.unwrap_or_default());
                at_line_start = rspace.is_some();
                continue;
            }

            let is_expression = indicator.is_some_and(|i| i.starts_with('='));
            let lspace = if is_expression {
                None
            } else {
                detect_spaces_at_line_start(&mut text, at_line_start)
            };
            at_line_start = rspace.is_some();
            out.push_str(text);

            match indicator {
                Some(equals) if is_expression => {
                    if tail.is_some() {
                        rspace = None;
                    }
                    self.add_expression(&mut out, code, equals.len());
                    out.push_str(rspace.unwrap_or_default());
                }
                Some("#") => {
                    let lines = code.matches('\n').count() + usize::from(rspace.is_some());
                    let newlines = "\n".repeat(lines);
                    if lspace.is_some() && rspace.is_some() {
                        self.add_statement(&mut out, &newlines);
                    } else {
                        out.push_str(lspace.unwrap_or_default());
                        self.add_statement(&mut out, &newlines);
                        out.push_str(rspace.unwrap_or_default());
                    }
                }
                Some("%") => {
                    out.push_str(lspace.unwrap_or_default());
                    out.push_str("<%");
                    out.push_str(code);
                    out.push_str(tail.unwrap_or_default());
                    out.push_str("%>");
                    out.push_str(rspace.unwrap_or_default());
                }
                _ => {
                    if let (Some(left), Some(right)) = (lspace, rspace) {
                        self.add_statement(&mut out, &format!("{left}{code}{right}"));
                    } else {
                        out.push_str(lspace.unwrap_or_default());
                        self.add_statement(&mut out, code);
                        out.push_str(rspace.unwrap_or_default());
                    }
                }
            }
        }

        out.push_str(&template[pos..]);
        out
    }

    /// Statement: may close the current block, open a new one, or both.
    fn add_statement(&self, out: &mut String, code: &str) {
        let closes = self.classifier.is_block_closer(code);
        let mid = self.classifier.is_mid_block(code);
        let opens = self.classifier.is_block_opener(code);

        if closes || mid {
            push_close(out, BLOCK_TAG);
        }
        if !(closes && code.trim() == "end") {
            push_open(out, SILENT_TAG, false);
            out.push_str(&escape_html(code));
            push_close(out, SILENT_TAG);
        }
        if opens || mid {
            push_open(out, BLOCK_TAG, false);
        }
    }

    /// Expression: `=` is output, `==` is raw output, longer runs are
    /// debug expressions and dropped.
    fn add_expression(&self, out: &mut String, code: &str, equals: usize) {
        if equals > 2 {
            tracing::debug!(code, "Dropping ERB debug expression");
            return;
        }
        push_open(out, LOUD_TAG, equals == 2);
        out.push_str(&escape_html(code));
        push_close(out, LOUD_TAG);
        if self.classifier.is_block_opener(code) {
            push_open(out, BLOCK_TAG, false);
        }
    }
}

fn push_open(out: &mut String, tag: &str, raw: bool) {
    out.push('<');
    out.push_str(tag);
    if raw {
        out.push(' ');
        out.push_str(RAW_ATTRIBUTE);
        out.push_str("=\"");
        out.push_str(RAW_ATTRIBUTE);
        out.push('"');
    }
    out.push('>');
}

fn push_close(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn push_tag_code(out: &mut String, index: usize, source: &str) {
    tracing::debug!(code = source, "ERB directive inside a start tag");
    out.push(' ');
    out.push_str(TAG_CODE_ATTRIBUTE);
    out.push_str(&index.to_string());
    out.push_str("=\"");
    out.push_str(&escape_html(source));
    out.push_str("\" ");
}

/// Lexical position in the markup between directives.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum MarkupState {
    #[default]
    Text,
    /// Right after `<`.
    Open,
    /// Tag name and attributes of a start tag.
    StartTag,
    Quoted(char),
    /// End tags, doctypes and processing instructions.
    Declaration,
    Comment,
    /// `script` or `style` content, up to the given end tag.
    RawText(&'static str),
}

/// Tracks whether a directive would land inside a start tag.
#[derive(Debug, Default)]
struct MarkupScanner {
    state: MarkupState,
    tag: String,
    naming: bool,
    /// Last few characters, lowercased, for end-marker checks.
    recent: Vec<char>,
}

impl MarkupScanner {
    const RECENT: usize = 9;

    fn in_start_tag(&self) -> bool {
        self.state == MarkupState::StartTag
    }

    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            let previous = self.recent.last().copied();
            if self.recent.len() == Self::RECENT {
                self.recent.remove(0);
            }
            self.recent.push(c.to_ascii_lowercase());
            self.state = self.next_state(c, previous);
        }
    }

    fn next_state(&mut self, c: char, previous: Option<char>) -> MarkupState {
        match self.state {
            MarkupState::Text => {
                if c == '<' {
                    MarkupState::Open
                } else {
                    MarkupState::Text
                }
            }
            MarkupState::Open => match c {
                c if c.is_ascii_alphabetic() => {
                    self.tag.clear();
                    self.tag.push(c.to_ascii_lowercase());
                    self.naming = true;
                    MarkupState::StartTag
                }
                '/' | '!' | '?' => MarkupState::Declaration,
                '<' => MarkupState::Open,
                _ => MarkupState::Text,
            },
            MarkupState::StartTag => {
                if self.naming && (c.is_ascii_alphanumeric() || c == '-' || c == ':') {
                    self.tag.push(c.to_ascii_lowercase());
                    return MarkupState::StartTag;
                }
                self.naming = false;
                match c {
                    '"' | '\'' => MarkupState::Quoted(c),
                    '>' => match self.tag.as_str() {
                        "script" if previous != Some('/') => MarkupState::RawText("</script"),
                        "style" if previous != Some('/') => MarkupState::RawText("</style"),
                        _ => MarkupState::Text,
                    },
                    _ => MarkupState::StartTag,
                }
            }
            MarkupState::Quoted(quote) => {
                if c == quote {
                    MarkupState::StartTag
                } else {
                    self.state
                }
            }
            MarkupState::Declaration => {
                if self.recent_ends_with("<!--") {
                    MarkupState::Comment
                } else if c == '>' {
                    MarkupState::Text
                } else {
                    MarkupState::Declaration
                }
            }
            MarkupState::Comment => {
                if self.recent_ends_with("-->") {
                    MarkupState::Text
                } else {
                    MarkupState::Comment
                }
            }
            MarkupState::RawText(end_tag) => {
                if self.recent_ends_with(end_tag) {
                    MarkupState::Declaration
                } else {
                    self.state
                }
            }
        }
    }

    fn recent_ends_with(&self, marker: &str) -> bool {
        let count = marker.chars().count();
        self.recent.len() >= count && self.recent[self.recent.len() - count..].iter().copied().eq(marker.chars())
    }
}

/// Split off the indentation preceding a directive that starts its line.
///
/// Returns `Some("")` when the directive sits right after a line break,
/// `Some(indent)` when only spaces and tabs precede it on its line (the
/// indent is removed from `text`), and `None` otherwise.
fn detect_spaces_at_line_start<'t>(text: &mut &'t str, at_line_start: bool) -> Option<&'t str> {
    let current = *text;
    if current.is_empty() {
        return at_line_start.then_some("");
    }
    if current.ends_with('\n') {
        return Some("");
    }
    let (head, tail) = match current.rfind('\n') {
        Some(index) => current.split_at(index + 1),
        None if at_line_start => ("", current),
        None => return None,
    };
    if tail.chars().all(|c| c == ' ' || c == '\t') {
        *text = head;
        Some(tail)
    } else {
        None
    }
}
