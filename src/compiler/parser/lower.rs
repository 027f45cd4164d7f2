//! Lowering of embedded expressions into the runtime instruction format.
//!
//! The downstream render runtime consumes expressions as compact tagged
//! arrays: `[[2, "op"], ...]` for operator application, `[[7],[3, "name"]]`
//! for a scope lookup and `[1, raw]` for a literal. [`lower`] converts the
//! parsed expression AST into that shape.
//!
//! Coverage is deliberately the minimal operator subset the runtime needs:
//! logical, binary and unary operators, identifiers and literals. Member
//! access, calls, ternaries and object/array literals lower to the empty
//! instruction.

use std::fmt;

use swc_core::ecma::ast::{BinaryOp, Expr, Lit, UnaryOp};

use super::helpers::json_string;

/// A lowered expression instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Short-circuiting operator application (`&&`, `||`, `??`).
    Logical {
        op: &'static str,
        left: Box<Instruction>,
        right: Box<Instruction>,
    },
    /// Eager binary operator application.
    Binary {
        op: &'static str,
        left: Box<Instruction>,
        right: Box<Instruction>,
    },
    /// Prefix operator application.
    Unary {
        op: &'static str,
        operand: Box<Instruction>,
    },
    /// Lookup of a name in the render scope.
    ScopeLookup { name: String },
    /// A literal carried as its raw source text.
    Literal { raw: String },
    /// Unsupported expression kind; renders as nothing.
    Empty,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The spacing differs between the logical and binary forms; the
        // runtime's reference decoder is byte-for-byte sensitive to it.
        match self {
            Instruction::Logical { op, left, right } => {
                write!(f, "[[2, \"{op}\"],{left},{right}]")
            }
            Instruction::Binary { op, left, right } => {
                write!(f, "[[2, \"{op}\"], {left}, {right}]")
            }
            Instruction::Unary { op, operand } => write!(f, "[[2, \"{op}\"], {operand}]"),
            Instruction::ScopeLookup { name } => write!(f, "[[7],[3, \"{name}\"]]"),
            Instruction::Literal { raw } => write!(f, "[1, {raw}]"),
            Instruction::Empty => Ok(()),
        }
    }
}

/// Recursively lowers an expression AST node into an [`Instruction`].
pub(crate) fn lower(expr: &Expr) -> Instruction {
    match expr {
        // parenthesis nodes are transparent to the instruction encoding
        Expr::Paren(paren) => lower(&paren.expr),
        Expr::Bin(bin) => {
            let op = binary_op_str(bin.op);
            let left = Box::new(lower(&bin.left));
            let right = Box::new(lower(&bin.right));
            if is_logical(bin.op) {
                Instruction::Logical { op, left, right }
            } else {
                Instruction::Binary { op, left, right }
            }
        }
        Expr::Unary(unary) => Instruction::Unary {
            op: unary_op_str(unary.op),
            operand: Box::new(lower(&unary.arg)),
        },
        Expr::Ident(ident) => Instruction::ScopeLookup {
            name: ident.sym.to_string(),
        },
        Expr::Lit(lit) => match literal_raw(lit) {
            Some(raw) => Instruction::Literal { raw },
            None => Instruction::Empty,
        },
        _ => Instruction::Empty,
    }
}

fn is_logical(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
    )
}

fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::EqEq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::EqEqEq => "===",
        BinaryOp::NotEqEq => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::LShift => "<<",
        BinaryOp::RShift => ">>",
        BinaryOp::ZeroFillRShift => ">>>",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::BitAnd => "&",
        BinaryOp::LogicalOr => "||",
        BinaryOp::LogicalAnd => "&&",
        BinaryOp::In => "in",
        BinaryOp::InstanceOf => "instanceof",
        BinaryOp::Exp => "**",
        BinaryOp::NullishCoalescing => "??",
    }
}

fn unary_op_str(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Minus => "-",
        UnaryOp::Plus => "+",
        UnaryOp::Bang => "!",
        UnaryOp::Tilde => "~",
        UnaryOp::TypeOf => "typeof",
        UnaryOp::Void => "void",
        UnaryOp::Delete => "delete",
    }
}

/// Reconstructs the raw source form of a literal.
fn literal_raw(lit: &Lit) -> Option<String> {
    match lit {
        Lit::Str(s) => Some(match s.raw.as_ref() {
            Some(raw) => raw.to_string(),
            None => json_string(&s.value.to_string_lossy()),
        }),
        Lit::Num(n) => Some(match n.raw.as_ref() {
            Some(raw) => raw.to_string(),
            None => n.value.to_string(),
        }),
        Lit::Bool(b) => Some(b.value.to_string()),
        Lit::Null(_) => Some("null".to_string()),
        Lit::BigInt(b) => b.raw.as_ref().map(|raw| raw.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::js_expr::parse_expr_statement;

    fn lowered(source: &str) -> String {
        let expr = parse_expr_statement(source).expect("expression should parse");
        lower(&expr).to_string()
    }

    #[test]
    fn identifier_lowers_to_scope_lookup() {
        assert_eq!(lowered("name"), "[[7],[3, \"name\"]]");
    }

    #[test]
    fn literal_keeps_raw_text() {
        assert_eq!(lowered("42"), "[1, 42]");
        assert_eq!(lowered("'hi'"), "[1, 'hi']");
        assert_eq!(lowered("true"), "[1, true]");
        assert_eq!(lowered("null"), "[1, null]");
    }

    #[test]
    fn binary_operator_has_spaced_operands() {
        assert_eq!(
            lowered("a + 1"),
            "[[2, \"+\"], [[7],[3, \"a\"]], [1, 1]]"
        );
    }

    #[test]
    fn logical_operator_has_compact_operands() {
        assert_eq!(
            lowered("a && b"),
            "[[2, \"&&\"],[[7],[3, \"a\"]],[[7],[3, \"b\"]]]"
        );
    }

    #[test]
    fn unary_operator() {
        assert_eq!(lowered("!done"), "[[2, \"!\"], [[7],[3, \"done\"]]]");
    }

    #[test]
    fn nested_operators_lower_recursively() {
        assert_eq!(
            lowered("a > 1 && b"),
            "[[2, \"&&\"],[[2, \">\"], [[7],[3, \"a\"]], [1, 1]],[[7],[3, \"b\"]]]"
        );
    }

    #[test]
    fn parentheses_are_transparent() {
        assert_eq!(lowered("(name)"), "[[7],[3, \"name\"]]");
    }

    #[test]
    fn unsupported_kinds_lower_to_nothing() {
        assert_eq!(lowered("a.b"), "");
        assert_eq!(lowered("f(x)"), "");
        assert_eq!(lowered("a ? b : c"), "");
        assert_eq!(lowered("[1, 2]"), "");
    }
}
