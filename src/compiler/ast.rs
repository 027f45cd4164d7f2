//! The template AST.
//!
//! Nodes live in an arena owned by [`Ast`] and reference each other by
//! [`NodeId`]. Children are stored as id lists and the parent link is a
//! non-owning optional id, so the tree carries back-references without
//! ownership cycles.
//!
//! The root is a synthetic `Program` element. A template may have several
//! top-level elements only when they are chained with `wx:if` /
//! `wx:elif` / `wx:else`; the chain is folded into the first element's
//! condition list and the root keeps a single child.

use rustc_hash::FxHashMap;

/// Index of a node inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// A raw `(name, value)` attribute pair as received from the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// One entry of a folded conditional chain: the condition expression
/// (`None` marks the trailing `wx:else`) and the element it guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfCondition {
    pub exp: Option<String>,
    pub block: NodeId,
}

/// An element node.
///
/// Directive extractors remove their recognized attributes from
/// `attribute_list` and record the extracted semantics in the dedicated
/// fields below. `attribute_map` keeps every name that was ever seen
/// (last write wins) and is not touched by extraction.
#[derive(Debug, Default)]
pub struct Element {
    pub tag: String,
    pub attribute_list: Vec<Attribute>,
    pub attribute_map: FxHashMap<String, String>,
    pub ns: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    /// A disallowed tag (`<style>`, or `<script>` without a non-JS type).
    pub forbidden: bool,
    /// Inside a `v-pre` verbatim region.
    pub pre: bool,
    /// No key and no attributes left after structural extraction.
    pub plain: bool,
    pub once: bool,
    pub key: Option<String>,

    /// Loop binding: iterable expression, item alias, index alias.
    pub for_source: Option<String>,
    pub alias: Option<String>,
    pub iterator: Option<String>,

    /// Conditional markers and the chain owned by the chain head.
    pub if_cond: Option<String>,
    pub elseif_cond: Option<String>,
    pub is_else: bool,
    pub if_conditions: Vec<IfCondition>,

    /// Scoped slots registered on this element, keyed by slot name
    /// (names are stored in their JSON-escaped form, default `"default"`).
    pub scoped_slots: FxHashMap<String, NodeId>,
    pub slot_target: Option<String>,
    pub slot_scope: Option<String>,

    pub include: Option<String>,
    pub import: Option<String>,

    /// Named template definition (`<template name="...">`).
    pub name: Option<String>,
    /// Dynamic template selector (`<template is="...">`).
    pub component: Option<String>,
    /// Data binding expression.
    pub data: Option<String>,

    /// Processed generic attributes, or verbatim JSON-escaped pairs when the
    /// element sits inside a `v-pre` region.
    pub attrs: Vec<Attribute>,
}

impl Element {
    pub(crate) fn new(
        tag: &str,
        attribute_list: Vec<Attribute>,
        attribute_map: FxHashMap<String, String>,
        ns: Option<String>,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            tag: tag.to_string(),
            attribute_list,
            attribute_map,
            ns,
            parent,
            ..Self::default()
        }
    }
}

/// A compiled interpolation: the raw source text plus the `+`-joined compiled
/// expression string produced by the interpolation scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub text: String,
    pub expression: String,
}

/// A retained comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

/// A node of the template tree.
#[derive(Debug)]
pub enum Node {
    Element(Element),
    Text(Text),
    Comment(Comment),
}

impl Node {
    /// Returns the element data, if this is an element node.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// The arena-backed tree produced by compilation.
#[derive(Debug)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    /// Creates an empty tree holding only the synthetic `Program` root.
    pub(crate) fn new() -> Self {
        let root = Element::new("Program", Vec::new(), FxHashMap::default(), None, None);
        Self {
            nodes: vec![Node::Element(root)],
            root: NodeId(0),
        }
    }

    /// The synthetic `Program` root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// The element behind `id`.
    ///
    /// Panics if `id` names a text or comment node; ids handed out by the
    /// builder's element paths always refer to elements.
    pub fn element(&self, id: NodeId) -> &Element {
        match self.node(id) {
            Node::Element(el) => el,
            _ => panic!("node {id:?} is not an element"),
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> &mut Element {
        match self.node_mut(id) {
            Node::Element(el) => el,
            _ => panic!("node {id:?} is not an element"),
        }
    }
}
