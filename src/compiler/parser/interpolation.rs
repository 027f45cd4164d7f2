//! Interpolation scanning and expression compiling.
//!
//! [`parse_text`] finds delimiter-bound expression regions in a text string
//! and compiles the whole string into a single `+`-joined expression:
//! JSON-escaped literal segments for the gaps, and `_s(<lowered>)` (runtime
//! string coercion around the lowered expression) for each region, in source
//! order. Text without any region compiles to nothing.
//!
//! The default matcher tolerates quoted strings and balanced braces inside a
//! region, because a bare object-literal interpolation such as
//! `{{ {a: 1} }}` contains braces of its own.

use super::helpers::json_string;
use super::js_expr::parse_expr_statement;
use super::lower::lower;
use crate::compiler::error::CompileError;
use swc_core::ecma::ast::Expr;

/// A matched interpolation region: byte range of the whole match plus the
/// inner expression text.
struct Region<'a> {
    start: usize,
    end: usize,
    inner: &'a str,
}

/// Compiles interpolation regions found in `text`.
///
/// Returns `Ok(None)` when no region is found. A region whose expression
/// fails both parse strategies is a fatal error.
pub(crate) fn parse_text(
    text: &str,
    delimiters: Option<(&str, &str)>,
) -> Result<Option<String>, CompileError> {
    let regions = match delimiters {
        Some((open, close)) => find_delimited_regions(text, open, close),
        None => find_default_regions(text),
    };
    if regions.is_empty() {
        return Ok(None);
    }

    let mut tokens = Vec::new();
    let mut last = 0;
    for region in regions {
        if region.start > last {
            tokens.push(json_string(&text[last..region.start]));
        }
        let exp = parse_exp(region.inner.trim())?;
        tokens.push(format!("_s({exp})"));
        last = region.end;
    }
    if last < text.len() {
        tokens.push(json_string(&text[last..]));
    }
    Ok(Some(tokens.join("+")))
}

/// Parses an expression under two interpretations, tried in order:
/// (a) as a standalone expression statement; (b) as the value of an
/// object-literal assignment, which rescues a bare interpolation whose whole
/// content is an object body (a statement-level parse misreads `a: 1` as a
/// label). Both failing is fatal.
fn parse_exp(text: &str) -> Result<String, CompileError> {
    if let Some(expr) = parse_expr_statement(text) {
        return Ok(lower(&expr).to_string());
    }
    if let Some(expr) = parse_expr_statement(&format!("x={{{text}}}"))
        && let Expr::Assign(assign) = *expr
    {
        return Ok(lower(&assign.right).to_string());
    }
    Err(CompileError::expression_syntax(text))
}

/// Finds `{{ ... }}` regions, honoring quotes and balanced inner braces.
fn find_default_regions(text: &str) -> Vec<Region<'_>> {
    let bytes = text.as_bytes();
    let mut regions = Vec::new();
    let mut search = 0;
    while let Some(found) = text[search..].find("{{") {
        let open = search + found;
        match scan_region_close(bytes, open + 2) {
            Some(close) => {
                let inner = &text[open + 2..close];
                search = close + 2;
                // An empty region never matches; it stays literal text.
                if !inner.trim().is_empty() {
                    regions.push(Region {
                        start: open,
                        end: close + 2,
                        inner,
                    });
                }
            }
            None => break,
        }
    }
    regions
}

/// Scans forward from `pos` for the `}}` that closes a region, skipping
/// quoted runs and balanced brace pairs. Returns the byte offset of the
/// closing `}}`.
fn scan_region_close(bytes: &[u8], mut pos: usize) -> Option<usize> {
    let mut depth = 0usize;
    while pos < bytes.len() {
        match bytes[pos] {
            quote @ (b'\'' | b'"') => {
                pos += 1;
                while pos < bytes.len() && bytes[pos] != quote {
                    pos += 1;
                }
                if pos >= bytes.len() {
                    return None;
                }
            }
            b'{' => depth += 1,
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                } else if bytes.get(pos + 1) == Some(&b'}') {
                    return Some(pos);
                }
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Finds regions bound by a caller-supplied delimiter pair, shortest match
/// first.
fn find_delimited_regions<'a>(text: &'a str, open: &str, close: &str) -> Vec<Region<'a>> {
    if open.is_empty() || close.is_empty() {
        return Vec::new();
    }
    let mut regions = Vec::new();
    let mut search = 0;
    while let Some(found) = text[search..].find(open) {
        let start = search + found;
        let inner_start = start + open.len();
        // The region must contain at least one character, which may be
        // multibyte; scan for the close past its full width.
        let Some(first) = text[inner_start..].chars().next() else {
            break;
        };
        let scan_from = inner_start + first.len_utf8();
        let Some(rel_close) = text[scan_from..].find(close) else {
            break;
        };
        let close_at = scan_from + rel_close;
        regions.push(Region {
            start,
            end: close_at + close.len(),
            inner: &text[inner_start..close_at],
        });
        search = close_at + close.len();
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_compiles_to_nothing() {
        assert_eq!(parse_text("static text", None).unwrap(), None);
        assert_eq!(parse_text("   ", None).unwrap(), None);
    }

    #[test]
    fn single_region_with_surrounding_text() {
        assert_eq!(
            parse_text("hello {{ name }}!", None).unwrap().unwrap(),
            "\"hello \"+_s([[7],[3, \"name\"]])+\"!\""
        );
    }

    #[test]
    fn scanning_is_idempotent() {
        let first = parse_text("hello {{ name }}!", None).unwrap();
        let second = parse_text("hello {{ name }}!", None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn multiple_regions_keep_source_order() {
        assert_eq!(
            parse_text("{{a}}-{{b}}", None).unwrap().unwrap(),
            "_s([[7],[3, \"a\"]])+\"-\"+_s([[7],[3, \"b\"]])"
        );
    }

    #[test]
    fn braces_inside_quotes_do_not_close_the_region() {
        assert_eq!(
            parse_text("{{ '}}' }}", None).unwrap().unwrap(),
            "_s([1, '}}'])"
        );
    }

    #[test]
    fn object_literal_body_uses_the_assignment_strategy() {
        // Lowers through the object-assignment rescue; object literals are
        // outside the lowerer's coverage, so the region compiles to _s().
        assert_eq!(parse_text("{{ a: 1, b: 2 }}", None).unwrap().unwrap(), "_s()");
    }

    #[test]
    fn custom_delimiters() {
        assert_eq!(
            parse_text("hi %[name]%", Some(("%[", "]%"))).unwrap().unwrap(),
            "\"hi \"+_s([[7],[3, \"name\"]])"
        );
    }

    #[test]
    fn region_starting_with_a_multibyte_character() {
        assert_eq!(
            parse_text("hi %[é]% and %[b]%", Some(("%[", "]%")))
                .unwrap()
                .unwrap(),
            "\"hi \"+_s([[7],[3, \"é\"]])+\" and \"+_s([[7],[3, \"b\"]])"
        );
    }

    #[test]
    fn custom_delimiters_disable_default_braces() {
        assert_eq!(parse_text("{{ name }}", Some(("%[", "]%"))).unwrap(), None);
    }

    #[test]
    fn broken_expression_is_fatal() {
        let err = parse_text("{{ a +* b }}", None).unwrap_err();
        assert_eq!(
            err.kind,
            crate::compiler::error::CompileErrorKind::ExpressionSyntax
        );
    }

    #[test]
    fn unterminated_region_stays_literal() {
        assert_eq!(parse_text("hello {{ name", None).unwrap(), None);
    }
}
