//! Rendering options.

use std::fmt;
use std::str::FromStr;

/// How widget assigns are declared and referenced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AssignsMode {
    /// `needs :foo => nil`: every assign is optional.
    #[default]
    NeedsDefaultedToNil,
    /// `needs :foo`: the widget refuses to render without every assign.
    RequiredNeeds,
    /// Assigns stay `@foo`; the widget base class maps them to instance variables.
    InstanceVariables,
    /// No declarations; the widget base class accepts extra assigns.
    NoNeeds,
}

impl AssignsMode {
    /// All modes, in documentation order.
    pub const ALL: [Self; 4] = [
        Self::NeedsDefaultedToNil,
        Self::RequiredNeeds,
        Self::InstanceVariables,
        Self::NoNeeds,
    ];

    /// Name used on the command line and in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NeedsDefaultedToNil => "needs_defaulted_to_nil",
            Self::RequiredNeeds => "required_needs",
            Self::InstanceVariables => "instance_variables",
            Self::NoNeeds => "no_needs",
        }
    }

    /// Whether `@foo` references are rewritten to `foo`.
    #[must_use]
    pub fn rewrites_references(self) -> bool {
        self != Self::InstanceVariables
    }

    /// Whether `needs` declarations are written.
    #[must_use]
    pub fn declares_needs(self) -> bool {
        self != Self::NoNeeds
    }
}

impl fmt::Display for AssignsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized assigns mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown assigns mode '{0}' (expected one of: needs_defaulted_to_nil, required_needs, instance_variables, no_needs)")]
pub struct ParseAssignsModeError(String);

impl FromStr for AssignsMode {
    type Err = ParseAssignsModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ParseAssignsModeError(s.to_owned()))
    }
}

/// Delimiters of blocks passed to tag methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlockStyle {
    /// `p { ... }`
    #[default]
    Brace,
    /// `p do ... end`
    DoEnd,
}

impl BlockStyle {
    pub(crate) fn open(self) -> &'static str {
        match self {
            Self::Brace => "{",
            Self::DoEnd => "do",
        }
    }

    pub(crate) fn close(self) -> &'static str {
        match self {
            Self::Brace => "}",
            Self::DoEnd => "end",
        }
    }
}

/// Syntax of attribute hashes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HashStyle {
    /// `:class => "foo"`
    #[default]
    Legacy,
    /// `class: "foo"`
    Modern,
}

/// Flags controlling a single render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Treat `directive_*` elements as ERB directives.
    pub directives: bool,
    /// Block delimiters for tag content.
    pub block_style: BlockStyle,
    /// Attribute hash syntax.
    pub hash_style: HashStyle,
    /// Assign declaration and reference style.
    pub assigns: AssignsMode,
    /// Render `<%== %>` output with `rawtext` instead of `text`.
    pub raw_output: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            directives: true,
            block_style: BlockStyle::default(),
            hash_style: HashStyle::default(),
            assigns: AssignsMode::default(),
            raw_output: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigns_mode_from_str() {
        for mode in AssignsMode::ALL {
            assert_eq!(mode.as_str().parse::<AssignsMode>(), Ok(mode));
        }
        let err = "bogus".parse::<AssignsMode>().unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_assigns_mode_flags() {
        assert!(AssignsMode::NoNeeds.rewrites_references());
        assert!(!AssignsMode::NoNeeds.declares_needs());
        assert!(!AssignsMode::InstanceVariables.rewrites_references());
        assert!(AssignsMode::InstanceVariables.declares_needs());
    }

    #[test]
    fn test_block_style_delimiters() {
        assert_eq!(BlockStyle::Brace.open(), "{");
        assert_eq!(BlockStyle::DoEnd.close(), "end");
    }
}
