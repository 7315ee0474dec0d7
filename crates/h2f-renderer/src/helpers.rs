//! Helpers whose return value Fortitude outputs on its own.
//!
//! Fortitude wraps most Rails view helpers so that calling them writes their
//! result to the page. Loud directives calling such helpers are emitted as
//! bare calls instead of `text(...)`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Helpers Fortitude outputs automatically.
const DEFAULT_HELPERS: &[&str] = &[
    // rendering
    "render",
    "yield",
    "content_for",
    "provide",
    // asset tags
    "audio_tag",
    "auto_discovery_link_tag",
    "favicon_link_tag",
    "image_tag",
    "javascript_include_tag",
    "stylesheet_link_tag",
    "video_tag",
    // urls
    "button_to",
    "link_to",
    "link_to_if",
    "link_to_unless",
    "link_to_unless_current",
    "mail_to",
    // tags
    "cdata_section",
    "content_tag",
    "tag",
    "javascript_tag",
    "csrf_meta_tags",
    "csp_meta_tag",
    // form tags
    "button_tag",
    "check_box_tag",
    "color_field_tag",
    "date_field_tag",
    "email_field_tag",
    "field_set_tag",
    "file_field_tag",
    "form_tag",
    "hidden_field_tag",
    "image_submit_tag",
    "label_tag",
    "number_field_tag",
    "password_field_tag",
    "radio_button_tag",
    "range_field_tag",
    "search_field_tag",
    "select_tag",
    "submit_tag",
    "telephone_field_tag",
    "text_area_tag",
    "text_field_tag",
    "url_field_tag",
    "utf8_enforcer_tag",
    // form builders
    "form_for",
    "form_with",
    "fields_for",
    "fields",
    // form options
    "collection_select",
    "grouped_collection_select",
    "options_for_select",
    "options_from_collection_for_select",
    "time_zone_select",
    // text
    "simple_format",
    "concat",
    "safe_concat",
];

/// Leading method name of a call such as `image_tag 'x'` or `render(:foo)`.
static LEADING_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z_][A-Za-z0-9_]*[?!]?)(?:\s|\(|$)").expect("invalid leading call regex")
});

type Lookup = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Allow-list of self-outputting helpers.
///
/// Starts from the Fortitude defaults; more names can be added, and a
/// lookup function can answer for names outside the list.
///
/// ```
/// use h2f_renderer::HelperRegistry;
///
/// let helpers = HelperRegistry::new()
///     .with_helper("widget_tag")
///     .with_lookup(|name| name.ends_with("_button"));
/// assert!(helpers.is_self_outputting("image_tag"));
/// assert!(helpers.is_self_outputting("widget_tag"));
/// assert!(helpers.is_self_outputting("save_button"));
/// assert!(!helpers.is_self_outputting("pluralize"));
/// ```
#[derive(Clone)]
pub struct HelperRegistry {
    names: BTreeSet<String>,
    lookup: Option<Lookup>,
}

impl HelperRegistry {
    /// Registry holding the default helpers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: DEFAULT_HELPERS.iter().map(|&name| name.to_owned()).collect(),
            lookup: None,
        }
    }

    /// Registry without any helpers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
            lookup: None,
        }
    }

    /// Add a helper name.
    #[must_use]
    pub fn with_helper(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    /// Add several helper names.
    #[must_use]
    pub fn with_helpers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Consult `lookup` for names outside the allow-list.
    #[must_use]
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.lookup = Some(Arc::new(lookup));
        self
    }

    /// Whether calling `name` outputs its result.
    #[must_use]
    pub fn is_self_outputting(&self, name: &str) -> bool {
        self.names.contains(name) || self.lookup.as_ref().is_some_and(|lookup| lookup(name))
    }

    /// Whether a line of code starts with a call to a self-outputting helper.
    #[must_use]
    pub fn calls_self_outputting(&self, code: &str) -> bool {
        LEADING_CALL
            .captures(code.trim())
            .is_some_and(|caps| self.is_self_outputting(&caps[1]))
    }
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("names", &self.names.len())
            .field("lookup", &self.lookup.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calls_self_outputting() {
        let helpers = HelperRegistry::new();
        assert!(helpers.calls_self_outputting("image_tag 'foo'"));
        assert!(helpers.calls_self_outputting("render(:partial => 'x')"));
        assert!(helpers.calls_self_outputting(" render "));
        assert!(!helpers.calls_self_outputting("distance_of_time_in_words 5.minutes.from_now"));
        assert!(!helpers.calls_self_outputting("f.text_field :name"));
        assert!(!helpers.calls_self_outputting("image_tag_for_user"));
    }

    #[test]
    fn test_empty_registry() {
        let helpers = HelperRegistry::empty().with_helpers(["a", "b"]);
        assert!(helpers.is_self_outputting("a"));
        assert!(!helpers.is_self_outputting("image_tag"));
    }

    #[test]
    fn test_debug_does_not_list_names() {
        let debug = format!("{:?}", HelperRegistry::empty());
        assert_eq!(debug, "HelperRegistry { names: 0, lookup: false }");
    }
}
