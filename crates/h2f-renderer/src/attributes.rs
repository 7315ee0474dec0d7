//! Element attributes as Ruby hash pairs.

use h2f_erb::tags::is_tag_code_attribute;
use h2f_markup::Element;

use crate::context::{AttrValue, RenderContext};
use crate::options::HashStyle;
use crate::raw::{Segment, has_directives, split_directives};
use crate::ruby::{escape_double_quoted, hash_key, inspect};

/// Attributes of one element ready for rendering.
#[derive(Debug, Default)]
pub(crate) struct AttributeSet {
    /// Values sorted by name.
    pub(crate) values: Vec<(String, AttrValue)>,
    /// ERB source that has no place in a Ruby hash, in document order.
    pub(crate) dropped: Vec<String>,
}

/// Attribute values of an element, sorted by name.
///
/// Directives that sat inside the start tag itself, and statements inside
/// attribute values, are collected in [`AttributeSet::dropped`].
pub(crate) fn attribute_values(element: &Element, cx: &mut RenderContext<'_>) -> AttributeSet {
    let mut set = AttributeSet::default();
    for (name, value) in &element.attributes {
        if cx.options.directives && is_tag_code_attribute(name) {
            set.dropped.push(value.trim().to_owned());
        } else {
            let value = attribute_value(value, cx, &mut set.dropped);
            set.values.push((name.clone(), value));
        }
    }
    set.values.sort_by(|(a, _), (b, _)| a.cmp(b));
    set
}

/// Classify one attribute value.
///
/// A value that is exactly one loud directive holding a bare expression
/// (after the `@name` rewrite) becomes that expression; other values with
/// directives become an interpolated string. Statements cannot be
/// interpolated and are pushed to `dropped`.
pub(crate) fn attribute_value(
    value: &str,
    cx: &mut RenderContext<'_>,
    dropped: &mut Vec<String>,
) -> AttrValue {
    if !cx.options.directives || !has_directives(value) {
        return AttrValue::Literal(value.to_owned());
    }

    let segments = split_directives(value);
    if let [Segment::Loud { code, .. }] = segments.as_slice() {
        let code = cx.extract_needs(code.trim());
        if cx.classifier.is_bare_expression(&code) {
            return AttrValue::Expression(code);
        }
    }

    let mut body = String::new();
    interpolate(&segments, &mut body, cx, dropped);
    AttrValue::Expression(format!("\"{}\"", body.trim()))
}

fn interpolate(
    segments: &[Segment],
    out: &mut String,
    cx: &mut RenderContext<'_>,
    dropped: &mut Vec<String>,
) {
    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Text(text) => out.push_str(&escape_double_quoted(text)),
            Segment::Loud { code, .. } => {
                let code = cx.extract_needs(code.trim());
                if !code.is_empty() {
                    out.push_str("#{");
                    out.push_str(&code);
                    out.push('}');
                }
            }
            Segment::Silent(code) => {
                tracing::warn!(code = code.trim(), "Dropping ERB statement inside attribute value");
                dropped.push(format!("<% {} %>", code.trim()));
            }
            Segment::Block(inner) => {
                interpolate(inner, out, cx, dropped);
                // A bare `end` leaves no segment of its own.
                if !matches!(segments.get(index + 1), Some(Segment::Silent(_))) {
                    dropped.push("<% end %>".to_owned());
                }
            }
        }
    }
}

/// `key => value` pair in the given hash style.
pub(crate) fn format_pair(name: &str, value: &AttrValue, style: HashStyle) -> String {
    let value = match value {
        AttrValue::Literal(text) => inspect(text),
        AttrValue::Expression(code) => code.clone(),
    };
    format!("{}{value}", hash_key(name, style))
}
