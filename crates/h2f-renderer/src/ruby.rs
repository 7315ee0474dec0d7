//! Ruby source text helpers: quoting, escaping and indentation.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::options::HashStyle;

/// Identifier usable as a bare Ruby method name.
static METHOD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_][A-Za-z0-9_]*[?!]?$").expect("invalid method name regex")
});

/// Identifier usable as a symbol or hash label without quotes.
static SYMBOL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid symbol regex"));

/// Indentation for a nesting depth.
pub(crate) fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Whether a tag name can be called as a Ruby method.
pub(crate) fn is_method_name(name: &str) -> bool {
    METHOD_NAME.is_match(name)
}

/// Double-quoted literal escaping `\`, `"` and interpolation markers.
pub(crate) fn double_quoted(text: &str) -> String {
    format!("\"{}\"", escape_double_quoted(text))
}

/// Body of a double-quoted literal.
pub(crate) fn escape_double_quoted(text: &str) -> String {
    escape_interpolation(&text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `%{}` literal escaping `\`, `}` and interpolation markers.
pub(crate) fn percent_quoted(text: &str) -> String {
    let escaped = escape_interpolation(&text.replace('\\', "\\\\").replace('}', "\\}"));
    format!("%{{{escaped}}}")
}

/// Quote text for `text` and `comment`: `%{}` when it spans lines.
pub(crate) fn quote_text(text: &str) -> String {
    if text.contains(['\n', '\r']) {
        percent_quoted(text)
    } else {
        double_quoted(text)
    }
}

/// Literal text inside a heredoc: `\` and interpolation markers are escaped.
pub(crate) fn escape_heredoc(text: &str) -> String {
    escape_interpolation(&text.replace('\\', "\\\\"))
}

/// Whether `#` followed by `next` starts interpolation (`#{`, `#@`, `#$`).
fn starts_interpolation(next: Option<&char>) -> bool {
    matches!(next, Some('{' | '@' | '$'))
}

/// Prefix every interpolating `#` with a backslash.
fn escape_interpolation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '#' && starts_interpolation(chars.peek()) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Ruby `String#inspect`.
pub(crate) fn inspect(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '#' if starts_interpolation(chars.peek()) => out.push_str("\\#"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0007}' => out.push_str("\\a"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000b}' => out.push_str("\\v"),
            '\u{000c}' => out.push_str("\\f"),
            '\u{001b}' => out.push_str("\\e"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Hash key followed by its separator: `:name => `, `name: ` or `"na-me" => `.
pub(crate) fn hash_key(name: &str, style: HashStyle) -> String {
    if !SYMBOL_NAME.is_match(name) {
        return format!("{} => ", inspect(name));
    }
    match style {
        HashStyle::Legacy => format!(":{name} => "),
        HashStyle::Modern => format!("{name}: "),
    }
}

/// Command call with arguments, such as `link_to "x", y`.
static COMMAND_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([a-z_][A-Za-z0-9_]*[?!]?)[ \t]+([A-Za-z0-9_@$:"'\[(].*)$"#)
        .expect("invalid command call regex")
});

/// Words that continue an expression rather than start an argument.
const CONTINUATION_WORDS: &[&str] = &["and", "or", "if", "unless", "while", "until", "rescue", "do"];

/// Add parentheses to a command call: `link_to "x", y` becomes `link_to("x", y)`.
///
/// Anything else is returned unchanged.
pub(crate) fn parenthesize_command(code: &str) -> String {
    let Some(caps) = COMMAND_CALL.captures(code) else {
        return code.to_owned();
    };
    let arguments = &caps[2];
    let first_word = arguments
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or_default();
    if CONTINUATION_WORDS.contains(&first_word) {
        return code.to_owned();
    }
    format!("{}({arguments})", &caps[1])
}

/// Count of line breaks in a string.
pub(crate) fn line_breaks(text: &str) -> usize {
    text.matches('\n').count()
}

/// Drop leading lines that hold only whitespace.
pub(crate) fn trim_leading_blank_lines(text: &str) -> &str {
    let mut rest = text;
    while let Some(end) = rest.find('\n') {
        if rest[..end].trim().is_empty() {
            rest = &rest[end + 1..];
        } else {
            break;
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_quoted() {
        assert_eq!(double_quoted("hello, \"world"), r#""hello, \"world""#);
        assert_eq!(double_quoted("a #{b} \\"), r#""a \#{b} \\""#);
    }

    #[test]
    fn test_interpolation_markers_escaped() {
        assert_eq!(double_quoted("#@foo #$1 #@@x #a"), r#""\#@foo \#$1 \#@@x #a""#);
        assert_eq!(percent_quoted("#@foo\n#$1"), "%{\\#@foo\n\\#$1}");
        assert_eq!(escape_heredoc("a #@x #$1 #{y}"), r"a \#@x \#$1 \#{y}");
        assert_eq!(inspect("#@foo #$1"), r#""\#@foo \#$1""#);
    }

    #[test]
    fn test_quote_text_multiline() {
        assert_eq!(quote_text("a\nb}"), "%{a\nb\\}}");
        assert_eq!(quote_text("one line"), "\"one line\"");
    }

    #[test]
    fn test_inspect() {
        assert_eq!(
            inspect("<?xml version=\"1.0\"?>"),
            r#""<?xml version=\"1.0\"?>""#
        );
        assert_eq!(inspect("a\tb\n#{c} #d \u{1}"), r#""a\tb\n\#{c} #d \u0001""#);
    }

    #[test]
    fn test_hash_key() {
        assert_eq!(hash_key("class", HashStyle::Legacy), ":class => ");
        assert_eq!(hash_key("class", HashStyle::Modern), "class: ");
        assert_eq!(hash_key("foo-bar", HashStyle::Modern), "\"foo-bar\" => ");
        assert_eq!(hash_key("1x", HashStyle::Legacy), "\"1x\" => ");
    }

    #[test]
    fn test_is_method_name() {
        assert!(is_method_name("p"));
        assert!(is_method_name("h1"));
        assert!(!is_method_name("my-widget"));
        assert!(!is_method_name("svg:rect"));
    }

    #[test]
    fn test_parenthesize_command() {
        assert_eq!(parenthesize_command("link_to 'x', y"), "link_to('x', y)");
        assert_eq!(parenthesize_command("t :title"), "t(:title)");
        assert_eq!(parenthesize_command("foo + bar"), "foo + bar");
        assert_eq!(parenthesize_command("foo if bar"), "foo if bar");
        assert_eq!(parenthesize_command("foo.bar baz"), "foo.bar baz");
        assert_eq!(parenthesize_command("title"), "title");
    }

    #[test]
    fn test_trim_leading_blank_lines() {
        assert_eq!(trim_leading_blank_lines("\n  \n  foo\n"), "  foo\n");
        assert_eq!(trim_leading_blank_lines("foo"), "foo");
        assert_eq!(trim_leading_blank_lines("\n\n"), "");
    }
}
