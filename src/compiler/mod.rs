//! Compiler front end for WXML templates.
//!
//! The front end turns template markup into an annotated element tree plus
//! a per-compilation expression table:
//! - Tokenizer: walks the markup once and emits flat tag/text/comment events
//! - Parser: assembles the tree, extracts directives and compiles
//!   interpolation regions into lowered expression instructions
//! - Context: deduplicates expressions and collects diagnostics across the
//!   whole compilation

pub mod ast;
pub mod context;
pub mod error;
pub mod parser;
mod tokenizer;
#[cfg(test)]
mod tests;

pub use ast::{Ast, Attribute, Comment, Element, IfCondition, Node, NodeId, Text};
pub use context::{CompileOptions, CompilerContext, Diagnostics};
pub use error::{CompileError, CompileErrorKind};
pub use parser::Directive;

/// Compiles `template` into its element tree.
///
/// Expressions and named template definitions land in `ctx`, which may be
/// shared across several templates of one build so the expression table is
/// deduplicated globally. Recoverable problems accumulate as diagnostics in
/// `ctx`; only a missing include/import source or an unparseable expression
/// aborts the compilation.
pub fn compile(
    template: &str,
    ctx: &mut CompilerContext,
    options: &CompileOptions,
) -> Result<Ast, CompileError> {
    parser::build(template, ctx, options)
}
