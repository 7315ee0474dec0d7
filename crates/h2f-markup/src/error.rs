//! Error types for markup parsing.

/// Error while building a markup tree.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Encoding error during XML parsing.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// An `html`, `head` or `body` element appeared inside a fragment.
    ///
    /// The fragment has to be re-parsed as a whole document.
    #[error("misplaced <{0}> element in HTML fragment")]
    MisplacedRoot(String),

    /// A CDATA section appeared where HTML does not allow one.
    ///
    /// The input has to be re-parsed in XML mode.
    #[error("CDATA section requires XML mode")]
    XmlModeRequired,
}
