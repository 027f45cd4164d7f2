//! WXML template compiler front end.
//!
//! This crate parses WXML-style template markup into an annotated element
//! tree ready for render-function generation. It covers the front half of a
//! template compiler:
//!
//! - a forgiving markup tokenizer with HTML-compatible error recovery
//! - a tree builder that extracts the structural directives (`wx:for`,
//!   `wx:if`/`wx:elif`/`wx:else`, `wx:key`, includes, imports and template
//!   definitions)
//! - an interpolation scanner that compiles `{{ ... }}` regions into a
//!   compact instruction encoding via a real ES expression parse
//! - a compilation context that deduplicates every registered expression
//!   into a shared table and collects diagnostics
//!
//! # Example
//!
//! ```
//! use wxml_compiler::{CompileOptions, CompilerContext, compile};
//!
//! let mut ctx = CompilerContext::default();
//! let options = CompileOptions::default();
//! let ast = compile("<view>hello {{ name }}</view>", &mut ctx, &options)?;
//! let root = ast.root();
//! assert_eq!(ast.element(ast.element(root).children[0]).tag, "view");
//! assert_eq!(ctx.slot_of("hello {{ name }}"), Some(0));
//! # Ok::<(), wxml_compiler::CompileError>(())
//! ```

pub mod compiler;

pub use compiler::{
    Ast, Attribute, CompileError, CompileErrorKind, CompileOptions, CompilerContext, Diagnostics,
    Element, IfCondition, Node, NodeId, Text, compile,
};
