//! Compilation options and shared per-compilation state.
//!
//! Nothing here lives in module-level mutable state: [`CompileOptions`] is
//! immutable for the duration of a build, and [`CompilerContext`] carries
//! the mutable shared state (the
//! expression dedup table, the named-template registry and the diagnostic
//! collector). The context is created once per top-level compilation and
//! passed by `&mut` into any nested compilation, e.g. when surrounding
//! tooling resolves an `<import>`.

use rustc_hash::{FxHashMap, FxHashSet};

use super::ast::{Element, NodeId};
use super::error::CompileError;
use super::parser::parse_text;

/// Diagnostic sink callback; receives each newly collected message.
pub type WarnSink = Box<dyn Fn(&str)>;
/// Tag-name predicate (pre tags, void tags, left-open tags).
pub type TagPredicate = Box<dyn Fn(&str) -> bool>;
/// Resolves the namespace of a tag that has no parent namespace.
pub type NamespaceResolver = Box<dyn Fn(&str) -> Option<String>>;
/// An element rewrite hook, run before or after directive extraction.
pub type ElementTransform = Box<dyn Fn(&mut Element)>;

/// Configuration for one compilation. Immutable once constructed.
pub struct CompileOptions {
    /// Optional external sink; deduplicated messages are forwarded here in
    /// addition to being collected on the context.
    pub warn: Option<WarnSink>,
    /// Identifies verbatim-text elements (`<pre>`-like tags).
    pub is_pre_tag: Option<TagPredicate>,
    /// Platform tag-namespace lookup.
    pub get_tag_namespace: Option<NamespaceResolver>,
    /// Collapse whitespace-only text to a single space instead of dropping
    /// it, when the element already has children. Defaults to `true`.
    pub preserve_whitespace: bool,
    /// Retain comments as comment nodes.
    pub keep_comments: bool,
    /// Hooks run on each element before directive extraction.
    pub pre_transforms: Vec<ElementTransform>,
    /// Hooks run on each element after it has been attached.
    pub post_transforms: Vec<ElementTransform>,
    /// Custom interpolation delimiter pair; `{{` / `}}` when absent.
    pub delimiters: Option<(String, String)>,
    /// Suppress the duplicate-attribute diagnostic (legacy platform compat).
    pub tolerate_duplicate_attrs: bool,

    // Flags consumed only by the tokenizer collaborator.
    pub expect_html: bool,
    pub should_decode_newlines: bool,
    pub is_void_tag: Option<TagPredicate>,
    pub can_be_left_open: Option<TagPredicate>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            warn: None,
            is_pre_tag: None,
            get_tag_namespace: None,
            preserve_whitespace: true,
            keep_comments: false,
            pre_transforms: Vec::new(),
            post_transforms: Vec::new(),
            delimiters: None,
            tolerate_duplicate_attrs: false,
            expect_html: false,
            should_decode_newlines: false,
            is_void_tag: None,
            can_be_left_open: None,
        }
    }
}

impl CompileOptions {
    pub(crate) fn is_pre(&self, tag: &str) -> bool {
        self.is_pre_tag.as_ref().is_some_and(|pred| pred(tag))
    }

    pub(crate) fn namespace_of(&self, tag: &str) -> Option<String> {
        self.get_tag_namespace.as_ref().and_then(|lookup| lookup(tag))
    }
}

/// Collected diagnostics, deduplicated by message identity in first-seen
/// order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    seen: FxHashSet<String>,
    messages: Vec<String>,
}

impl Diagnostics {
    /// Records a message unless an identical one was already collected.
    /// Returns whether the message was new.
    fn push(&mut self, message: String) -> bool {
        if !self.seen.insert(message.clone()) {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Shared state of one top-level compilation: the expression dedup table,
/// the named-template registry and the diagnostic collector.
///
/// Slot indices are assigned in first-seen order, so the compiled-expression
/// list is deterministic for a fixed input and context. The empty expression
/// text maps to slot `-1` and owns no list entry.
#[derive(Debug, Default)]
pub struct CompilerContext {
    map: FxHashMap<String, isize>,
    props: Vec<Option<String>>,
    templates: FxHashMap<String, NodeId>,
    diagnostics: Diagnostics,
}

impl CompilerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot index assigned to an expression text, if registered.
    pub fn slot_of(&self, exp: &str) -> Option<isize> {
        self.map.get(exp).copied()
    }

    /// The ordered compiled-expression list, indexed by slot. An entry is
    /// `None` when the registered text contained no interpolation region.
    pub fn props(&self) -> &[Option<String>] {
        &self.props
    }

    /// Named template definitions registered during compilation. Node ids
    /// index into the [`Ast`](super::ast::Ast) returned by the compilation
    /// that registered them.
    pub fn templates(&self) -> &FxHashMap<String, NodeId> {
        &self.templates
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn register_template(&mut self, name: String, element: NodeId) {
        self.templates.insert(name, element);
    }

    /// Registers an expression text in the dedup table, compiling it on
    /// first sight.
    ///
    /// When `compile_source` is given it is the text run through the
    /// interpolation scanner instead of `exp` itself (conditionals register
    /// the bare expression but compile the delimiter-wrapped match).
    /// Registration always uses the default delimiter matcher.
    pub(crate) fn register(
        &mut self,
        exp: &str,
        compile_source: Option<&str>,
    ) -> Result<(), CompileError> {
        if self.map.contains_key(exp) {
            return Ok(());
        }
        if exp.is_empty() {
            self.map.insert(String::new(), -1);
            return Ok(());
        }
        let compiled = parse_text(compile_source.unwrap_or(exp), None)?;
        self.map.insert(exp.to_string(), self.props.len() as isize);
        self.props.push(compiled);
        Ok(())
    }

    /// Collects a diagnostic, forwarding it to the configured sink when it
    /// has not been seen before.
    pub(crate) fn warn(&mut self, options: &CompileOptions, message: String) {
        if self.diagnostics.push(message.clone())
            && let Some(sink) = options.warn.as_ref()
        {
            sink(&message);
        }
    }
}
