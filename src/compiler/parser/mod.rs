//! The tag-tree builder.
//!
//! Consumes tokenizer events and assembles the template AST: element nodes
//! with their directives extracted, compiled-interpolation text nodes, and
//! retained comments. The builder owns the open-element stack, the verbatim
//! (`v-pre` / platform pre-tag) state and the multi-root condition-chain
//! attachment algorithm.

mod directives;
mod helpers;
mod interpolation;
mod js_expr;
mod lower;

pub use directives::Directive;

pub(crate) use interpolation::parse_text;

use html_escape::decode_html_entities;

use super::ast::{Ast, Attribute, Comment, Element, IfCondition, Node, NodeId, Text};
use super::context::{CompileOptions, CompilerContext};
use super::error::CompileError;
use super::tokenizer::{TokenSink, TokenizerOptions, tokenize};
use helpers::{is_forbidden_tag, is_text_tag, make_attrs_map};

/// Builds the AST for `template`, registering expressions and named
/// templates into `ctx`.
pub(crate) fn build(
    template: &str,
    ctx: &mut CompilerContext,
    options: &CompileOptions,
) -> Result<Ast, CompileError> {
    let tokenizer_options = TokenizerOptions {
        expect_html: options.expect_html,
        should_decode_newlines: options.should_decode_newlines,
        keep_comments: options.keep_comments,
        is_void_tag: options.is_void_tag.as_deref(),
        can_be_left_open: options.can_be_left_open.as_deref(),
    };
    let mut builder = TreeBuilder::new(template, ctx, options);
    tokenize(template, &tokenizer_options, &mut builder)?;
    Ok(builder.finish())
}

pub(crate) struct TreeBuilder<'a> {
    ast: Ast,
    ctx: &'a mut CompilerContext,
    options: &'a CompileOptions,
    source: &'a str,
    /// Open, not-yet-closed elements.
    stack: Vec<NodeId>,
    current_parent: Option<NodeId>,
    /// The element that owns the active top-level condition chain.
    chain_head: NodeId,
    /// Inside a `v-pre` subtree.
    in_v_pre: bool,
    /// Inside a platform pre tag.
    in_pre: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str, ctx: &'a mut CompilerContext, options: &'a CompileOptions) -> Self {
        let ast = Ast::new();
        let chain_head = ast.root();
        Self {
            ast,
            ctx,
            options,
            source,
            stack: Vec::new(),
            current_parent: None,
            chain_head,
            in_v_pre: false,
            in_pre: false,
        }
    }

    fn finish(self) -> Ast {
        self.ast
    }

    fn warn(&mut self, message: String) {
        self.ctx.warn(self.options, message);
    }

    fn add_if_condition(&mut self, target: NodeId, exp: Option<String>, block: NodeId) {
        self.ast
            .element_mut(target)
            .if_conditions
            .push(IfCondition { exp, block });
    }

    /// Attaches a freshly processed element to the tree.
    ///
    /// The first element becomes the sole top-level child and the chain
    /// head. Later top-level elements either fold into the head's condition
    /// chain (`elif`/`else` after an `if`) or start a new chain as an extra
    /// top-level child. Nested elements fold into a sibling chain, register
    /// as a scoped slot, or append as a regular child. Forbidden elements
    /// are processed but never attached.
    fn attach(&mut self, id: NodeId) {
        let root = self.ast.root();
        if self.ast.element(root).children.is_empty() {
            self.ast.element_mut(root).children.push(id);
            self.chain_head = id;
        } else if self.stack.is_empty() {
            let head_has_if = self.ast.element(self.chain_head).if_cond.is_some();
            let (elseif, is_else) = {
                let el = self.ast.element(id);
                (el.elseif_cond.clone(), el.is_else)
            };
            if head_has_if && (elseif.is_some() || is_else) {
                self.add_if_condition(self.chain_head, elseif, id);
            } else {
                self.ast.element_mut(root).children.push(id);
                self.chain_head = id;
            }
        }

        if let Some(parent) = self.current_parent
            && !self.ast.element(id).forbidden
        {
            let (elseif, is_else, slot_scope, slot_target) = {
                let el = self.ast.element(id);
                (
                    el.elseif_cond.clone(),
                    el.is_else,
                    el.slot_scope.clone(),
                    el.slot_target.clone(),
                )
            };
            if elseif.is_some() || is_else {
                self.process_if_conditions(id, parent);
            } else if slot_scope.is_some() {
                let name = slot_target.unwrap_or_else(|| "\"default\"".to_string());
                let parent_el = self.ast.element_mut(parent);
                parent_el.plain = false;
                parent_el.scoped_slots.insert(name, id);
            } else {
                self.ast.element_mut(parent).children.push(id);
                self.ast.element_mut(id).parent = Some(parent);
            }
        }
    }

    /// Folds an `elif`/`else` element into the condition chain of its
    /// nearest preceding `if` sibling, or diagnoses it as orphaned. Either
    /// way the element is not appended as a regular child.
    fn process_if_conditions(&mut self, id: NodeId, parent: NodeId) {
        let prev = self.find_prev_element(parent);
        if let Some(prev) = prev
            && self.ast.element(prev).if_cond.is_some()
        {
            let exp = self.ast.element(id).elseif_cond.clone();
            self.add_if_condition(prev, exp, id);
        } else {
            let el = self.ast.element(id);
            let marker = match &el.elseif_cond {
                Some(exp) => format!("wx:elif=\"{exp}\""),
                None => "wx:else".to_string(),
            };
            let tag = el.tag.clone();
            self.warn(format!(
                "{marker} used on element <{tag}> without corresponding wx:if."
            ));
        }
    }

    /// Walks backward through the parent's children to the nearest element
    /// sibling, discarding trailing non-element nodes (with a diagnostic
    /// when they are more than a collapsed space).
    fn find_prev_element(&mut self, parent: NodeId) -> Option<NodeId> {
        loop {
            let last = *self.ast.element(parent).children.last()?;
            let text = match self.ast.node(last) {
                Node::Element(_) => return Some(last),
                Node::Text(t) => t.text.clone(),
                Node::Comment(c) => c.text.clone(),
            };
            if text != " " {
                self.warn(format!(
                    "text \"{}\" between wx:if and wx:else(-if) will be ignored.",
                    text.trim()
                ));
            }
            self.ast.element_mut(parent).children.pop();
        }
    }

    /// Leaves verbatim state when the element that opened it closes.
    fn end_pre(&mut self, id: NodeId) {
        let el = self.ast.element(id);
        if el.pre {
            self.in_v_pre = false;
        }
        if self.options.is_pre(&el.tag) {
            self.in_pre = false;
        }
    }
}

impl TokenSink for TreeBuilder<'_> {
    fn start_tag(
        &mut self,
        tag: &str,
        attrs: Vec<Attribute>,
        self_closing: bool,
    ) -> Result<(), CompileError> {
        // inherit the parent namespace, else ask the platform
        let ns = self
            .current_parent
            .and_then(|p| self.ast.element(p).ns.clone())
            .or_else(|| self.options.namespace_of(tag));

        let mut duplicates = Vec::new();
        let map = make_attrs_map(&attrs, |name| duplicates.push(name.to_string()));
        if !self.options.tolerate_duplicate_attrs {
            for name in duplicates {
                self.warn(format!("duplicate attribute: {name}"));
            }
        }

        let id = self.ast.alloc(Node::Element(Element::new(
            tag,
            attrs,
            map,
            ns,
            self.current_parent,
        )));

        if is_forbidden_tag(self.ast.element(id)) {
            self.ast.element_mut(id).forbidden = true;
            self.warn(format!(
                "Templates should only be responsible for mapping the state to the UI. \
                 Avoid placing tags with side-effects in your templates, such as <{tag}>, \
                 as they will not be parsed."
            ));
        }

        for hook in &self.options.pre_transforms {
            hook(self.ast.element_mut(id));
        }

        if !self.in_v_pre {
            self.process_pre(id);
            if self.ast.element(id).pre {
                self.in_v_pre = true;
            }
        }
        if self.options.is_pre(tag) {
            self.in_pre = true;
        }

        if self.in_v_pre {
            self.process_raw_attrs(id);
        } else {
            self.process_for(id)?;
            self.process_if(id)?;
            self.process_once(id);
            self.process_key(id);
            {
                // plain after structural extraction, before include/import
                let el = self.ast.element_mut(id);
                el.plain = el.key.is_none() && el.attribute_list.is_empty();
            }
            self.process_slot(id);
            self.process_include(id)?;
            self.process_import(id)?;
            self.process_component(id)?;
            self.process_attrs(id)?;
        }

        self.attach(id);

        if !self_closing {
            self.current_parent = Some(id);
            self.stack.push(id);
        } else {
            self.end_pre(id);
        }

        for hook in &self.options.post_transforms {
            hook(self.ast.element_mut(id));
        }
        Ok(())
    }

    fn end_tag(&mut self, _tag: &str) -> Result<(), CompileError> {
        let Some(&element) = self.stack.last() else {
            return Ok(());
        };
        // trim a single trailing collapsed space
        if !self.in_pre {
            let last_child = self.ast.element(element).children.last().copied();
            if let Some(last) = last_child
                && let Node::Text(t) = self.ast.node(last)
                && t.text == " "
            {
                self.ast.element_mut(element).children.pop();
            }
        }
        self.stack.pop();
        self.current_parent = self.stack.last().copied();
        self.end_pre(element);
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), CompileError> {
        let Some(parent) = self.current_parent else {
            if text == self.source {
                self.warn(
                    "Component template requires a root element, rather than just text."
                        .to_string(),
                );
            } else {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    self.warn(format!(
                        "text \"{trimmed}\" outside root element will be ignored."
                    ));
                }
            }
            return Ok(());
        };

        let (opaque, has_children) = {
            let el = self.ast.element(parent);
            (is_text_tag(&el.tag), !el.children.is_empty())
        };
        let text: String = if self.in_pre || !text.trim().is_empty() {
            if opaque {
                text.to_string()
            } else {
                decode_html_entities(text).into_owned()
            }
        } else if self.options.preserve_whitespace && has_children {
            " ".to_string()
        } else {
            String::new()
        };
        if text.is_empty() {
            return Ok(());
        }

        if !self.in_v_pre && text != " " {
            let delimiters = self
                .options
                .delimiters
                .as_ref()
                .map(|(open, close)| (open.as_str(), close.as_str()));
            if let Some(expression) = parse_text(&text, delimiters)? {
                self.ctx.register(&text, None)?;
                let node = self.ast.alloc(Node::Text(Text {
                    text: text.clone(),
                    expression,
                }));
                self.ast.element_mut(parent).children.push(node);
            }
            // Text with no interpolation region produces no node at all;
            // downstream generation only consumes compiled expressions.
        }
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), CompileError> {
        if let Some(parent) = self.current_parent {
            let node = self.ast.alloc(Node::Comment(Comment {
                text: text.to_string(),
            }));
            self.ast.element_mut(parent).children.push(node);
        }
        Ok(())
    }
}
