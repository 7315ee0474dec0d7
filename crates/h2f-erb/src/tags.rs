//! Synthetic tag names produced by the directive preprocessor.

/// Expression whose value is output: `<%= code %>` and `<%== code %>`.
pub const LOUD_TAG: &str = "directive_loud";

/// Statement: `<% code %>`.
pub const SILENT_TAG: &str = "directive_silent";

/// Body of a Ruby block opened by a directive.
pub const BLOCK_TAG: &str = "directive_block";

/// Attribute marking a loud directive whose output is not escaped.
pub const RAW_ATTRIBUTE: &str = "raw";

/// Prefix of the attributes carrying a directive found inside a start tag.
/// The value is the directive's original source.
pub const TAG_CODE_ATTRIBUTE: &str = "directive_code_";

/// Whether a tag name is one of the synthetic directive tags.
#[must_use]
pub fn is_directive_tag(name: &str) -> bool {
    name.starts_with("directive_")
}

/// Whether an attribute holds a directive that sat inside a start tag.
#[must_use]
pub fn is_tag_code_attribute(name: &str) -> bool {
    name.starts_with(TAG_CODE_ATTRIBUTE)
}

/// Synthetic tag kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveTag {
    /// `directive_loud`
    Loud,
    /// `directive_silent`
    Silent,
    /// `directive_block`
    Block,
}

impl DirectiveTag {
    /// Parse a tag name, `None` for anything but the three synthetic tags.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            LOUD_TAG => Some(Self::Loud),
            SILENT_TAG => Some(Self::Silent),
            BLOCK_TAG => Some(Self::Block),
            _ => None,
        }
    }

    /// Tag name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Loud => LOUD_TAG,
            Self::Silent => SILENT_TAG,
            Self::Block => BLOCK_TAG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(DirectiveTag::from_name("directive_loud"), Some(DirectiveTag::Loud));
        assert_eq!(DirectiveTag::from_name("directive_other"), None);
        assert!(is_directive_tag("directive_other"));
        assert!(!is_directive_tag("div"));
        assert!(is_tag_code_attribute("directive_code_3"));
        assert!(!is_tag_code_attribute("class"));
    }

    #[test]
    fn test_name_roundtrip() {
        for tag in [DirectiveTag::Loud, DirectiveTag::Silent, DirectiveTag::Block] {
            assert_eq!(DirectiveTag::from_name(tag.name()), Some(tag));
        }
    }
}
