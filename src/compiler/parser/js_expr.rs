//! Embedded-expression parsing.
//!
//! Interpolation regions carry plain script expressions. They are parsed
//! with SWC's ES parser; any conforming expression parser could be
//! substituted behind [`parse_expr_statement`], which is the only seam the
//! rest of the compiler sees.

use std::rc::Rc;

use swc_core::common::{FileName, SourceMap};
use swc_core::ecma::ast::{EsVersion, Expr, Stmt};
use swc_core::ecma::parser::{Parser, StringInput, Syntax, lexer::Lexer};

/// Parses `source` as a script and returns the expression of its first
/// statement, or `None` when the source does not parse cleanly as an
/// expression statement.
pub(crate) fn parse_expr_statement(source: &str) -> Option<Box<Expr>> {
    let cm: Rc<SourceMap> = Rc::new(SourceMap::default());
    let fm = cm.new_source_file(
        FileName::Custom("template-expr.js".into()).into(),
        source.to_string(),
    );
    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        EsVersion::latest(),
        StringInput::from(&*fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);
    let script = parser.parse_script().ok()?;
    if !parser.take_errors().is_empty() {
        return None;
    }
    match script.body.into_iter().next()? {
        Stmt::Expr(stmt) => Some(stmt.expr),
        _ => None,
    }
}
