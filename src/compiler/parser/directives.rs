//! Directive extraction.
//!
//! Each extractor removes its recognized attributes from the element's raw
//! attribute list (an attribute is extracted exactly once and never reaches
//! the generic pass) and records the extracted semantics on the element.
//! Extraction order is fixed by the builder; see `start_tag`.

use super::*;
use super::helpers::{get_and_remove_attr, get_binding_attr, json_string, match_template_bracket};

/// The closed set of structural directives understood by the extractors.
///
/// Legacy directive families (event bindings, two-way bindings, filters,
/// refs) are deliberately absent; extending the language means adding a
/// variant here and teaching the builder about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    For,
    If,
    ElseIf,
    Else,
    Once,
    Key,
    Pre,
    Include,
    Import,
    ComponentBinding,
}

impl Directive {
    /// The attribute spellings recognized for this directive, in lookup
    /// order. `For` keeps two legacy spellings for the iterable expression.
    pub fn spellings(self) -> &'static [&'static str] {
        match self {
            Directive::For => &["wx:for", "wx:for-items"],
            Directive::If => &["wx:if"],
            Directive::ElseIf => &["wx:elif"],
            Directive::Else => &["wx:else"],
            Directive::Once => &["v-once"],
            Directive::Key => &["key"],
            Directive::Pre => &["v-pre"],
            Directive::Include => &["src"],
            Directive::Import => &["src"],
            Directive::ComponentBinding => &["name", "is", "data"],
        }
    }
}

impl TreeBuilder<'_> {
    /// Removes the first non-empty attribute among `names`. Names checked
    /// before a hit are removed as well, so legacy spellings never leak into
    /// the generic attribute pass.
    fn take_first(el: &mut Element, names: &[&str]) -> Option<String> {
        for name in names {
            if let Some(value) = get_and_remove_attr(el, name)
                && !value.is_empty()
            {
                return Some(value);
            }
        }
        None
    }

    /// `v-pre`: presence flips the subtree into verbatim mode.
    pub(super) fn process_pre(&mut self, id: NodeId) {
        if get_and_remove_attr(self.ast.element_mut(id), Directive::Pre.spellings()[0]).is_some() {
            self.ast.element_mut(id).pre = true;
        }
    }

    /// Inside a verbatim region attributes are copied through untouched as
    /// raw JSON-escaped strings; no directive extraction happens.
    pub(super) fn process_raw_attrs(&mut self, id: NodeId) {
        let el = self.ast.element_mut(id);
        if !el.attribute_list.is_empty() {
            el.attrs = el
                .attribute_list
                .iter()
                .map(|attr| Attribute {
                    name: attr.name.clone(),
                    value: json_string(&attr.value),
                })
                .collect();
        } else if !el.pre {
            // attribute-less node below the pre root
            el.plain = true;
        }
    }

    /// `wx:for` / `wx:for-items` with `wx:for-item`, `wx:for-index` and
    /// `wx:key` refinements. `<import>` tags consume and discard their loop
    /// attributes instead of binding them.
    pub(super) fn process_for(&mut self, id: NodeId) -> Result<(), CompileError> {
        if self.ast.element(id).tag == "import" {
            let el = self.ast.element_mut(id);
            for name in Directive::For.spellings() {
                let _ = get_and_remove_attr(el, name);
            }
            return Ok(());
        }
        let Some(exp) = Self::take_first(self.ast.element_mut(id), Directive::For.spellings())
        else {
            return Ok(());
        };
        if match_template_bracket(&exp).is_none() {
            self.warn(format!("Invalid wx:for expression: {exp}"));
            return Ok(());
        }

        self.ast.element_mut(id).for_source = Some(exp.clone());
        self.ctx.register(&exp, None)?;

        match Self::take_first(self.ast.element_mut(id), &["wx:for-item"]) {
            Some(alias) => {
                self.ast.element_mut(id).alias = Some(alias.clone());
                self.ctx.register(&alias, None)?;
            }
            None => self.ast.element_mut(id).alias = Some("item".to_string()),
        }
        match Self::take_first(self.ast.element_mut(id), &["wx:for-index"]) {
            Some(index) => {
                self.ast.element_mut(id).iterator = Some(index.clone());
                self.ctx.register(&index, None)?;
            }
            None => self.ast.element_mut(id).iterator = Some("index".to_string()),
        }
        match Self::take_first(self.ast.element_mut(id), &["wx:key"]) {
            Some(key) => {
                self.ast.element_mut(id).key = Some(key.clone());
                self.ctx.register(&key, None)?;
            }
            None => self.ast.element_mut(id).key = Some("index".to_string()),
        }
        Ok(())
    }

    /// `wx:if` / `wx:elif` / `wx:else`. An `if` seeds the element's own
    /// condition chain with itself; an `elif` only stores its expression for
    /// the attachment pass to fold; `else` is a bare presence marker.
    pub(super) fn process_if(&mut self, id: NodeId) -> Result<(), CompileError> {
        if let Some(exp) = Self::take_first(self.ast.element_mut(id), Directive::If.spellings()) {
            let Some((full, inner)) = match_template_bracket(&exp) else {
                self.warn(format!("Invalid wx:if expression: {exp}"));
                return Ok(());
            };
            self.ast.element_mut(id).if_cond = Some(inner.clone());
            // keyed by the bare expression, compiled from the delimited match
            self.ctx.register(&inner, Some(&full))?;
            self.add_if_condition(id, Some(inner), id);
        } else {
            if get_and_remove_attr(self.ast.element_mut(id), Directive::Else.spellings()[0])
                .is_some()
            {
                self.ast.element_mut(id).is_else = true;
            }
            if let Some(exp) =
                Self::take_first(self.ast.element_mut(id), Directive::ElseIf.spellings())
            {
                let Some((full, inner)) = match_template_bracket(&exp) else {
                    self.warn(format!("Invalid wx:elif expression: {exp}"));
                    return Ok(());
                };
                self.ast.element_mut(id).elseif_cond = Some(inner.clone());
                self.ctx.register(&inner, Some(&full))?;
            }
        }
        Ok(())
    }

    /// `v-once`: presence marker.
    pub(super) fn process_once(&mut self, id: NodeId) {
        if get_and_remove_attr(self.ast.element_mut(id), Directive::Once.spellings()[0]).is_some() {
            self.ast.element_mut(id).once = true;
        }
    }

    /// `key` binding attribute. Keys are diagnosed (but kept) on template
    /// definitions, where they have nothing stable to key.
    pub(super) fn process_key(&mut self, id: NodeId) {
        if let Some(exp) = get_binding_attr(self.ast.element_mut(id), Directive::Key.spellings()[0])
            && !exp.is_empty()
        {
            if self.ast.element(id).tag == "template" {
                self.warn(
                    "<template> cannot be keyed. Place the key on real elements instead."
                        .to_string(),
                );
            }
            self.ast.element_mut(id).key = Some(exp);
        }
    }

    /// `slot` / `scope`: captures the scoped-slot declaration consumed by
    /// the attachment pass. An empty slot name means the default slot.
    pub(super) fn process_slot(&mut self, id: NodeId) {
        if let Some(target) = get_binding_attr(self.ast.element_mut(id), "slot")
            && !target.is_empty()
        {
            let name = if target == "\"\"" {
                "\"default\"".to_string()
            } else {
                target
            };
            self.ast.element_mut(id).slot_target = Some(name);
        }
        if self.ast.element(id).tag == "template" {
            let scope = get_and_remove_attr(self.ast.element_mut(id), "scope");
            self.ast.element_mut(id).slot_scope = scope;
        }
    }

    /// `<include src="...">`. A missing source path is fatal.
    pub(super) fn process_include(&mut self, id: NodeId) -> Result<(), CompileError> {
        if self.ast.element(id).tag != "include" {
            return Ok(());
        }
        match Self::take_first(self.ast.element_mut(id), Directive::Include.spellings()) {
            Some(src) => {
                self.ast.element_mut(id).include = Some(src);
                Ok(())
            }
            None => Err(CompileError::missing_src("include")),
        }
    }

    /// `<import src="...">`. A missing source path is fatal.
    pub(super) fn process_import(&mut self, id: NodeId) -> Result<(), CompileError> {
        if self.ast.element(id).tag != "import" {
            return Ok(());
        }
        match Self::take_first(self.ast.element_mut(id), Directive::Import.spellings()) {
            Some(src) => {
                self.ast.element_mut(id).import = Some(src);
                Ok(())
            }
            None => Err(CompileError::missing_src("import")),
        }
    }

    /// Template definitions and bindings: `<template name=...>` registers a
    /// named definition, `<template is=...>` captures a dynamic selector,
    /// and a `data` attribute on any element captures a data binding.
    pub(super) fn process_component(&mut self, id: NodeId) -> Result<(), CompileError> {
        let &[name_attr, is_attr, data_attr] = Directive::ComponentBinding.spellings() else {
            unreachable!("component binding has three spellings");
        };
        if self.ast.element(id).tag == "template" {
            if let Some(name) = Self::take_first(self.ast.element_mut(id), &[name_attr]) {
                self.ast.element_mut(id).name = Some(name.clone());
                self.ctx.register_template(name, id);
            } else if let Some(binding) = Self::take_first(self.ast.element_mut(id), &[is_attr]) {
                self.ast.element_mut(id).component = Some(binding.clone());
                self.ctx.register(&binding, None)?;
            }
        }
        if let Some(data) = Self::take_first(self.ast.element_mut(id), &[data_attr]) {
            self.ast.element_mut(id).data = Some(data.clone());
            self.ctx.register(&data, None)?;
        }
        Ok(())
    }

    /// Remaining attributes: sorted by name for deterministic code
    /// generation, each value registered in the dedup table, stored as plain
    /// pairs.
    pub(super) fn process_attrs(&mut self, id: NodeId) -> Result<(), CompileError> {
        let list = {
            let el = self.ast.element_mut(id);
            el.attribute_list.sort_by(|a, b| a.name.cmp(&b.name));
            el.attribute_list.clone()
        };
        for attr in &list {
            self.ctx.register(&attr.value, None)?;
        }
        self.ast.element_mut(id).attrs = list;
        Ok(())
    }
}
