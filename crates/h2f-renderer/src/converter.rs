//! One-call HTML/ERB to widget conversion.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use h2f_erb::{CodeClassifier, DirectivePreprocessor, RubyClassifier};
use h2f_markup::parse_markup;

use crate::assembler::DocumentAssembler;
use crate::context::RenderContext;
use crate::error::ConvertError;
use crate::helpers::HelperRegistry;
use crate::options::{AssignsMode, BlockStyle, HashStyle, RenderOptions};
use crate::render::NodeRenderer;

/// Superclass used when none is configured.
pub const DEFAULT_SUPERCLASS: &str = "Fortitude::Widget::Html5";

/// Widget method used when none is configured.
pub const DEFAULT_METHOD: &str = "content";

/// Result of converting one template.
#[derive(Clone, Debug)]
pub struct ConvertResult {
    /// Complete widget class source.
    pub output: String,
    /// Assigns the template references, sorted.
    pub needs: Vec<String>,
}

impl ConvertResult {
    /// Number of lines in the generated source.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.output.lines().count()
    }
}

/// Rendered method body without the class wrapper.
#[derive(Clone, Debug)]
pub struct RenderedBody {
    /// Statements at depth zero, without trailing whitespace.
    pub body: String,
    /// Assigns the template references, sorted.
    pub needs: Vec<String>,
}

/// Converts HTML/ERB templates into Fortitude widget classes.
///
/// A converter holds only immutable settings; every call to
/// [`convert`](Self::convert) builds its own [`RenderContext`], so one
/// converter can be shared between threads.
///
/// # Example
///
/// ```
/// use h2f_renderer::Converter;
///
/// let converter = Converter::builder().class_name("Views::Hello").build().unwrap();
/// let result = converter.convert("<p class=\"greeting\">Hello, <%= @name %></p>").unwrap();
/// assert_eq!(result.needs, ["name"]);
/// assert!(result.output.starts_with("class Views::Hello < Fortitude::Widget::Html5\n"));
/// ```
#[derive(Clone)]
pub struct Converter {
    assembler: DocumentAssembler,
    options: RenderOptions,
    helpers: HelperRegistry,
    classifier: Arc<dyn CodeClassifier>,
}

impl Converter {
    /// Start configuring a converter.
    #[must_use]
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::default()
    }

    /// Rendering options in effect.
    #[must_use]
    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Convert a template into widget class source.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Parse`] when the markup cannot be parsed and
    /// [`ConvertError::Render`] when the tree holds an unknown directive.
    pub fn convert(&self, source: &str) -> Result<ConvertResult, ConvertError> {
        let (body, needs) = self.render(source)?;
        let output = self.assembler.assemble(&body, &needs);
        Ok(ConvertResult {
            output,
            needs: needs.into_iter().collect(),
        })
    }

    /// Render only the method body.
    ///
    /// # Errors
    ///
    /// Same as [`convert`](Self::convert).
    pub fn render_body(&self, source: &str) -> Result<RenderedBody, ConvertError> {
        let (body, needs) = self.render(source)?;
        Ok(RenderedBody {
            body: body.trim_end().to_owned(),
            needs: needs.into_iter().collect(),
        })
    }

    fn render(&self, source: &str) -> Result<(String, BTreeSet<String>), ConvertError> {
        let markup = if self.options.directives {
            DirectivePreprocessor::new(self.classifier.as_ref()).process(source)
        } else {
            source.to_owned()
        };
        let tree = parse_markup(&markup)?;
        tracing::debug!(nodes = tree.len(), "Parsed template");

        let cx = RenderContext::new(self.options, self.classifier.as_ref(), &self.helpers);
        let mut renderer = NodeRenderer::new(&tree, cx);
        let body = renderer.render()?;
        Ok((body, renderer.into_context().into_needs()))
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("assembler", &self.assembler)
            .field("options", &self.options)
            .field("helpers", &self.helpers)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Converter`].
#[derive(Default)]
pub struct ConverterBuilder {
    class_name: Option<String>,
    superclass: Option<String>,
    method_name: Option<String>,
    options: RenderOptions,
    helpers: Option<HelperRegistry>,
    classifier: Option<Arc<dyn CodeClassifier>>,
}

impl ConverterBuilder {
    /// Name of the generated class, such as `Views::Users::Show`.
    #[must_use]
    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    /// Superclass of the generated class.
    #[must_use]
    pub fn superclass(mut self, name: impl Into<String>) -> Self {
        self.superclass = Some(name.into());
        self
    }

    /// Name of the generated method.
    #[must_use]
    pub fn method_name(mut self, name: impl Into<String>) -> Self {
        self.method_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn assigns(mut self, mode: AssignsMode) -> Self {
        self.options.assigns = mode;
        self
    }

    #[must_use]
    pub fn block_style(mut self, style: BlockStyle) -> Self {
        self.options.block_style = style;
        self
    }

    #[must_use]
    pub fn hash_style(mut self, style: HashStyle) -> Self {
        self.options.hash_style = style;
        self
    }

    /// Translate ERB directives. When off, the input is treated as plain HTML.
    #[must_use]
    pub fn directives(mut self, enabled: bool) -> Self {
        self.options.directives = enabled;
        self
    }

    /// Render `<%== %>` with `rawtext`.
    #[must_use]
    pub fn raw_output(mut self, enabled: bool) -> Self {
        self.options.raw_output = enabled;
        self
    }

    /// Replace all rendering options at once.
    #[must_use]
    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Helpers whose calls output their own result.
    #[must_use]
    pub fn helpers(mut self, helpers: HelperRegistry) -> Self {
        self.helpers = Some(helpers);
        self
    }

    /// Classifier for directive code. Defaults to [`RubyClassifier`].
    #[must_use]
    pub fn classifier(mut self, classifier: Arc<dyn CodeClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Finish configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Configuration`] when the class name is
    /// missing or any name is empty.
    pub fn build(self) -> Result<Converter, ConvertError> {
        let class_name = required("class name", self.class_name)?;
        let superclass = required(
            "superclass",
            Some(self.superclass.unwrap_or_else(|| DEFAULT_SUPERCLASS.to_owned())),
        )?;
        let method_name = required(
            "method name",
            Some(self.method_name.unwrap_or_else(|| DEFAULT_METHOD.to_owned())),
        )?;

        Ok(Converter {
            assembler: DocumentAssembler {
                class_name,
                superclass,
                method_name,
                assigns: self.options.assigns,
                hash_style: self.options.hash_style,
            },
            options: self.options,
            helpers: self.helpers.unwrap_or_default(),
            classifier: self.classifier.unwrap_or_else(|| Arc::new(RubyClassifier)),
        })
    }
}

fn required(what: &str, value: Option<String>) -> Result<String, ConvertError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        Some(_) => Err(ConvertError::Configuration(format!("{what} must not be empty"))),
        None => Err(ConvertError::Configuration(format!("{what} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use h2f_erb::{BlockClassifier, ExpressionClassifier};
    use pretty_assertions::assert_eq;

    use super::*;

    fn converter() -> Converter {
        Converter::builder().class_name("SpecClass").build().unwrap()
    }

    #[test]
    fn test_missing_class_name() {
        let err = Converter::builder().build().unwrap_err();
        assert!(matches!(err, ConvertError::Configuration(_)));
        assert_eq!(err.to_string(), "invalid converter configuration: class name is required");
    }

    #[test]
    fn test_empty_superclass() {
        let err = Converter::builder()
            .class_name("A")
            .superclass("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConvertError::Configuration(_)));
    }

    #[test]
    fn test_full_output() {
        let result = converter().convert("hello, <%= @foo %>").unwrap();
        assert_eq!(
            result.output,
            "class SpecClass < Fortitude::Widget::Html5\n  needs :foo => nil\n\n  def content\n    text \"hello, \"\n    text(foo)\n  end\nend\n"
        );
        assert_eq!(result.needs, ["foo"]);
        assert_eq!(result.line_count(), 8);
    }

    #[test]
    fn test_custom_class_settings() {
        let converter = Converter::builder()
            .class_name("Some::Other::ClassName")
            .superclass("My::Base")
            .method_name("foobar")
            .build()
            .unwrap();
        let output = converter.convert("hello, world").unwrap().output;
        assert!(output.starts_with("class Some::Other::ClassName < My::Base\n  def foobar\n"));
    }

    #[test]
    fn test_needs_modes() {
        let body = |mode: AssignsMode| {
            let converter = Converter::builder()
                .class_name("SpecClass")
                .assigns(mode)
                .build()
                .unwrap();
            converter.convert("hello, <%= @foo + @bar %>").unwrap().output
        };

        let required = body(AssignsMode::RequiredNeeds);
        assert!(required.contains("  needs :bar\n  needs :foo\n"));
        assert!(required.contains("text(foo + bar)"));

        let none = body(AssignsMode::NoNeeds);
        assert!(!none.contains("needs"));
        assert!(none.contains("text(foo + bar)"));

        let ivars = body(AssignsMode::InstanceVariables);
        assert!(ivars.contains("  needs :bar => nil\n  needs :foo => nil\n"));
        assert!(ivars.contains("text(@foo + @bar)"));
    }

    #[test]
    fn test_needs_are_order_independent() {
        let a = converter().render_body("<%= @a + @b %>").unwrap();
        let b = converter().render_body("<%= @b + @a %>").unwrap();
        assert_eq!(a.needs, ["a", "b"]);
        assert_eq!(a.needs, b.needs);
    }

    #[test]
    fn test_conversion_is_repeatable() {
        let converter = converter();
        let input = "<ul><% items.each do |item| %><li><%= item %></li><% end %></ul>";
        let first = converter.convert(input).unwrap();
        let second = converter.convert(input).unwrap();
        assert_eq!(first.output, second.output);
    }

    struct NoBlocks;

    impl BlockClassifier for NoBlocks {
        fn is_block_opener(&self, _code: &str) -> bool {
            false
        }

        fn is_block_closer(&self, _code: &str) -> bool {
            false
        }

        fn is_mid_block(&self, _code: &str) -> bool {
            false
        }
    }

    impl ExpressionClassifier for NoBlocks {
        fn is_bare_expression(&self, _code: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_custom_classifier() {
        let converter = Converter::builder()
            .class_name("SpecClass")
            .classifier(Arc::new(NoBlocks))
            .build()
            .unwrap();
        assert_eq!(
            converter.render_body("<% foo do %>x<% end %>").unwrap().body,
            "foo do\ntext \"x\"\nend"
        );
    }

    #[test]
    fn test_converter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Converter>();
    }
}
