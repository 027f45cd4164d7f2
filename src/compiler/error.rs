//! Error types for template compilation.
//!
//! Compilation distinguishes two tiers of failure. Recoverable problems
//! (malformed directive expressions, duplicate attributes, stray text) are
//! reported through the diagnostic collector on the compiler context and the
//! offending construct is skipped. Unrecoverable problems abort the whole
//! compilation with a [`CompileError`] and no partial tree is returned.

use std::fmt;

/// The kind of fatal compile error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// An `<include>` or `<import>` tag is missing its mandatory `src`
    /// attribute.
    MissingSrcAttribute,
    /// An embedded expression failed to parse both as an expression statement
    /// and as the value of an object-literal assignment.
    ExpressionSyntax,
}

impl CompileErrorKind {
    /// Returns a human-readable description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingSrcAttribute => "missing mandatory src attribute",
            Self::ExpressionSyntax => "embedded expression has a syntax error",
        }
    }
}

/// A fatal compilation error.
///
/// Emitting one of these aborts the build immediately; anything recoverable
/// goes through [`Diagnostics`](super::context::Diagnostics) instead.
#[derive(Debug, Clone)]
pub struct CompileError {
    /// The kind of error.
    pub kind: CompileErrorKind,
    /// The offending tag name or expression text.
    pub detail: String,
}

impl CompileError {
    /// Creates a "missing src attribute" error for the given tag.
    pub(crate) fn missing_src(tag: &str) -> Self {
        Self {
            kind: CompileErrorKind::MissingSrcAttribute,
            detail: tag.to_string(),
        }
    }

    /// Creates an "expression syntax" error for the given expression text.
    pub(crate) fn expression_syntax(expr: &str) -> Self {
        Self {
            kind: CompileErrorKind::ExpressionSyntax,
            detail: expr.to_string(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CompileErrorKind::MissingSrcAttribute => {
                write!(f, "must have src attribute in {} tag", self.detail)
            }
            CompileErrorKind::ExpressionSyntax => {
                write!(f, "expression `{}` contains a syntax error", self.detail)
            }
        }
    }
}

impl std::error::Error for CompileError {}
