//! Error types for rendering and conversion.

use h2f_markup::ParseError;

/// Error raised while walking a markup tree.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// A `directive_*` element the renderer does not know.
    ///
    /// The preprocessor only produces the three known tags, so this means
    /// the preprocessor and renderer disagree.
    #[error("unknown directive element <{0}>")]
    UnknownDirectiveTag(String),
}

/// Error raised by [`Converter`](crate::Converter).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// A required option is missing or empty.
    #[error("invalid converter configuration: {0}")]
    Configuration(String),

    /// The markup could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The markup tree could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),
}
