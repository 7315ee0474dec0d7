//! HTML entity handling and escaping.
//!
//! Named HTML entities are converted to Unicode before XML parsing, since
//! the XML reader only knows the five predefined entities. The same module
//! carries the escape/unescape pair used for code embedded in synthetic tags.

use std::sync::LazyLock;

use regex::Regex;

/// Regex pattern for matching named HTML entities.
static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex"));

/// Regex pattern for any entity reference, named or numeric.
static ANY_ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex")
});

/// Predefined XML entities, left for the XML reader.
const XML_ENTITIES: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

/// Convert named HTML entities to Unicode characters.
///
/// Standard XML entities (amp, lt, gt, quot, apos) and unknown names are
/// left unchanged. Names that decode to `&` or `<` are re-escaped so the
/// XML reader still sees well-formed markup.
pub fn convert_html_entities(html: &str) -> String {
    ENTITY_PATTERN
        .replace_all(html, |caps: &regex::Captures| {
            if XML_ENTITIES.contains(&&caps[1]) {
                return caps[0].to_owned();
            }
            match html_escape::decode_html_entities(&caps[0]) {
                decoded if decoded == caps[0] => caps[0].to_owned(),
                decoded => decoded.replace('&', "&amp;").replace('<', "&lt;"),
            }
        })
        .into_owned()
}

/// Escape text for inclusion in markup.
///
/// Escapes `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode XML, numeric and named HTML entity references.
///
/// Unknown references are preserved as-is.
pub fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    ANY_ENTITY_PATTERN
        .replace_all(text, |caps: &regex::Captures| decode_entity(&caps[1]))
        .into_owned()
}

/// Decode the name of an entity reference (without `&` and `;`).
pub(crate) fn decode_entity(entity: &str) -> String {
    let reference = format!("&{entity};");
    html_escape::decode_html_entities(&reference).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_nbsp() {
        assert_eq!(
            convert_html_entities("Hello&nbsp;World"),
            "Hello\u{00a0}World"
        );
    }

    #[test]
    fn test_preserve_xml_entities() {
        assert_eq!(convert_html_entities("&amp;&lt;&gt;"), "&amp;&lt;&gt;");
    }

    #[test]
    fn test_convert_full_entity_table() {
        assert_eq!(convert_html_entities("&hearts;"), "\u{2665}");
        assert_eq!(convert_html_entities("&check;"), "\u{2713}");
        assert_eq!(convert_html_entities("a&NewLine;b"), "a\nb");
        assert_eq!(convert_html_entities("&euro;"), "\u{20ac}");
    }

    #[test]
    fn test_preserve_unknown_entities() {
        assert_eq!(convert_html_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"a < b && c > "d" 'e'"#),
            "a &lt; b &amp;&amp; c &gt; &quot;d&quot; &#39;e&#39;"
        );
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(
            unescape_html("a &lt; b &amp;&amp; &quot;d&quot; &#39;e&#x27; &copy; &hearts;"),
            "a < b && \"d\" 'e' \u{00a9} \u{2665}"
        );
    }

    #[test]
    fn test_unescape_preserves_unknown() {
        assert_eq!(unescape_html("&bogus; & done"), "&bogus; & done");
    }

    #[test]
    fn test_decode_numeric() {
        assert_eq!(decode_entity("#65"), "A");
    }
}
