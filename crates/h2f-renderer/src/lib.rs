//! Fortitude widget renderer for HTML/ERB templates.
//!
//! The pipeline has four stages:
//!
//! 1. [`h2f_erb::DirectivePreprocessor`] rewrites ERB directives into
//!    synthetic `directive_*` elements.
//! 2. [`h2f_markup::parse_markup`] parses the result into a [`h2f_markup::Tree`].
//! 3. [`NodeRenderer`] walks the tree and emits Ruby statements, collecting
//!    the assigns the template references into a [`RenderContext`].
//! 4. [`DocumentAssembler`] wraps the statements in a widget class with
//!    `needs` declarations.
//!
//! [`Converter`] runs all four stages.
//!
//! # Example
//!
//! ```
//! use h2f_renderer::{BlockStyle, Converter};
//!
//! let converter = Converter::builder()
//!     .class_name("Views::Posts::Show")
//!     .block_style(BlockStyle::DoEnd)
//!     .build()
//!     .unwrap();
//! let body = converter.render_body("<div><h1><%= @post.title %></h1></div>").unwrap();
//! assert_eq!(body.body, "div do\n  h1(post.title)\nend");
//! assert_eq!(body.needs, ["post"]);
//! ```

mod assembler;
mod attributes;
mod context;
mod converter;
mod error;
mod helpers;
mod needs;
mod options;
mod raw;
mod render;
mod ruby;

pub use assembler::DocumentAssembler;
pub use context::RenderContext;
pub use converter::{
    ConvertResult, Converter, ConverterBuilder, DEFAULT_METHOD, DEFAULT_SUPERCLASS, RenderedBody,
};
pub use error::{ConvertError, RenderError};
pub use helpers::HelperRegistry;
pub use needs::extract_needs;
pub use options::{AssignsMode, BlockStyle, HashStyle, ParseAssignsModeError, RenderOptions};
pub use render::NodeRenderer;
