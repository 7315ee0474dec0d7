//! ERB support for html2fortitude.
//!
//! [`DirectivePreprocessor`] turns `<% %>`, `<%= %>` and `<%== %>` directives
//! into `directive_silent`, `directive_loud` and `directive_block` elements.
//! [`RubyClassifier`] decides which directive code opens, continues or
//! closes a Ruby block and which code is a bare value.

mod classifier;
mod lexer;
mod preprocessor;
pub mod tags;

pub use classifier::{BlockClassifier, CodeClassifier, ExpressionClassifier, RubyClassifier};
pub use preprocessor::DirectivePreprocessor;
pub use tags::DirectiveTag;
