//! Per-render mutable state.

use std::collections::{BTreeSet, HashMap, HashSet};

use h2f_erb::CodeClassifier;
use h2f_markup::NodeId;

use crate::helpers::HelperRegistry;
use crate::needs::extract_needs;
use crate::options::RenderOptions;

/// Attribute value after directive handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrValue {
    /// Static text, quoted on output.
    Literal(String),
    /// Ruby expression emitted verbatim.
    Expression(String),
}

/// State owned by one render pass.
///
/// Holds the options and collaborators, the accumulated needs and the
/// side tables that replace in-place node mutation: which nodes a parent
/// already consumed, which directive blocks return their value as output,
/// how much of a text node a `succeed` call took, and the cached attribute
/// values of each element. A context is never shared between documents.
pub struct RenderContext<'a> {
    pub(crate) options: RenderOptions,
    pub(crate) classifier: &'a dyn CodeClassifier,
    pub(crate) helpers: &'a HelperRegistry,
    needs: BTreeSet<String>,
    rendered: HashSet<NodeId>,
    loud_blocks: HashSet<NodeId>,
    consumed: HashMap<NodeId, usize>,
    pub(crate) attributes: HashMap<NodeId, Vec<(String, AttrValue)>>,
}

impl<'a> RenderContext<'a> {
    /// Fresh context for one document.
    #[must_use]
    pub fn new(
        options: RenderOptions,
        classifier: &'a dyn CodeClassifier,
        helpers: &'a HelperRegistry,
    ) -> Self {
        Self {
            options,
            classifier,
            helpers,
            needs: BTreeSet::new(),
            rendered: HashSet::new(),
            loud_blocks: HashSet::new(),
            consumed: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    /// Needs collected so far, sorted.
    #[must_use]
    pub fn needs(&self) -> &BTreeSet<String> {
        &self.needs
    }

    /// Take the collected needs.
    #[must_use]
    pub fn into_needs(self) -> BTreeSet<String> {
        self.needs
    }

    /// Record the assigns referenced by `code`, rewriting them per the
    /// assigns mode.
    pub(crate) fn extract_needs(&mut self, code: &str) -> String {
        extract_needs(
            code,
            &mut self.needs,
            self.options.assigns.rewrites_references(),
        )
    }

    /// Mark a node as emitted by its parent.
    pub(crate) fn mark_rendered(&mut self, id: NodeId) {
        self.rendered.insert(id);
    }

    pub(crate) fn is_rendered(&self, id: NodeId) -> bool {
        self.rendered.contains(&id)
    }

    /// The block's value is output by a preceding loud directive.
    pub(crate) fn mark_loud_block(&mut self, id: NodeId) {
        self.loud_blocks.insert(id);
    }

    pub(crate) fn is_loud_block(&self, id: NodeId) -> bool {
        self.loud_blocks.contains(&id)
    }

    /// Record that the first `bytes` of a text node were emitted elsewhere.
    pub(crate) fn consume_prefix(&mut self, id: NodeId, bytes: usize) {
        *self.consumed.entry(id).or_default() += bytes;
    }

    pub(crate) fn consumed_prefix(&self, id: NodeId) -> usize {
        self.consumed.get(&id).copied().unwrap_or_default()
    }
}
