//! Arena-backed markup tree.
//!
//! Nodes are stored in a flat vector and addressed by [`NodeId`]. Parent and
//! child links are indices, so sibling lookups are positions within the
//! parent's child list rather than owned back-references.

/// Index of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Markup element: a tag name with ordered attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name (lower-cased in HTML mode).
    pub name: String,
    /// Attributes in source order. Duplicate names keep the first value.
    pub attributes: Vec<(String, String)>,
}

impl Element {
    /// Create an element without attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute unless one with the same name already exists.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_attribute(name.into(), value.into());
        self
    }

    pub(crate) fn push_attribute(&mut self, name: String, value: String) {
        if self.attribute(&name).is_none() {
            self.attributes.push((name, value));
        }
    }

    /// Look up an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the element carries an attribute with this name.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

/// Kind and payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a complete document.
    Document,
    /// Root of a document fragment.
    Fragment,
    /// Element with children.
    Element(Element),
    /// Character data.
    Text(String),
    /// `<!-- ... -->` content.
    Comment(String),
    /// `<![CDATA[ ... ]]>` content.
    CData(String),
    /// Literal source of a processing instruction, including `<?` and `?>`.
    ProcessingInstruction(String),
    /// Doctype declaration content (e.g. `html`).
    DocumentType(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Parsed markup tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create a tree containing only a root node of the given kind.
    #[must_use]
    pub fn new(root: NodeKind) -> Self {
        Self {
            nodes: vec![Node {
                kind: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Create an empty fragment tree.
    #[must_use]
    pub fn fragment() -> Self {
        Self::new(NodeKind::Fragment)
    }

    /// Root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena, including detached ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds nothing besides its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Kind and payload of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Children of a node, in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent of a node, `None` for the root or detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Element payload, if the node is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Text payload, if the node is a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the node is an element with the given tag name.
    #[must_use]
    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|element| element.name == name)
    }

    /// Sibling immediately before the node.
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|&child| child == id)?;
        position.checked_sub(1).map(|prev| siblings[prev])
    }

    /// Sibling immediately after the node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|&child| child == id)?;
        siblings.get(position + 1).copied()
    }

    /// Concatenated text and CDATA content of all descendants.
    #[must_use]
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) | NodeKind::CData(text) => out.push_str(text),
            _ => {
                for &child in &self.nodes[id.0].children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Append a new node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append text to `parent`, merging with a trailing text child.
    ///
    /// Returns the id of the text node that received the content.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeKind::Text(existing) = &mut self.nodes[last.0].kind
        {
            existing.push_str(text);
            return last;
        }
        self.append(parent, NodeKind::Text(text.to_owned()))
    }

    /// Remove a node from its parent's child list.
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    /// Turn the root into a fragment holding the children of `element`.
    ///
    /// Everything else directly under the root is dropped. Without an
    /// element the root keeps its children and only changes kind.
    pub(crate) fn reroot_fragment(&mut self, element: Option<NodeId>) {
        self.nodes[0].kind = NodeKind::Fragment;
        let Some(element) = element else { return };

        let children = std::mem::take(&mut self.nodes[element.0].children);
        for &child in &children {
            self.nodes[child.0].parent = Some(NodeId(0));
        }
        for old in std::mem::take(&mut self.nodes[0].children) {
            self.nodes[old.0].parent = None;
        }
        self.nodes[0].children = children;
    }
}
