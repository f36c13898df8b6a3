//! Canonicalizer: lowers the parsed AST into the symbolic expression tree
//!
//! Leaf normalization is intentionally lossy: dots in leaf names become
//! underscores, so `a.b` and `a_b` are indistinguishable downstream. The
//! canonical names are the sole variable-binding mechanism between the two
//! predicates of a comparison.
//!
//! Arithmetic lowers to an associative/commutative-friendly form:
//! `a - b` becomes `a + (-1)*b` and `a / b` becomes `a * b^-1`, so the
//! simplifier can treat sums and products uniformly.

use crate::ast::AstNode;
use crate::expr::{Expr, RelOp};
use num::{BigInt, BigRational};
use thiserror::Error;

/// Canonicalization error: an AST shape the lowering stage cannot map to
/// a symbolic form. Fatal and propagated; never recovered into a verdict.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LowerError {
    #[error("cannot lower operator '{value}' to a symbolic form")]
    UnsupportedOperator { value: String },

    #[error("operator '{value}' applied to {found} operands")]
    ArityMismatch { value: String, found: usize },
}

/// Well-known domain leaves mapped to fixed canonical symbols
const WELL_KNOWN: &[(&str, &str)] = &[("msg.sender", "msg_sender"), ("msg.origin", "msg_origin")];

/// Lower an AST into a symbolic expression.
pub fn lower(node: &AstNode) -> Result<Expr, LowerError> {
    if node.children.is_empty() && !is_application(&node.value) {
        return Ok(lower_leaf(&node.value));
    }

    let args: Vec<Expr> = node.children.iter().map(lower).collect::<Result<_, _>>()?;

    match (node.value.as_str(), args.len()) {
        ("&&", 2) => Ok(Expr::and(args)),
        ("||", 2) => Ok(Expr::or(args)),
        ("!", 1) => Ok(one(args, Expr::not)),
        ("==", 2) => Ok(relation(RelOp::Eq, args)),
        ("!=", 2) => Ok(relation(RelOp::Ne, args)),
        (">", 2) => Ok(relation(RelOp::Gt, args)),
        (">=", 2) => Ok(relation(RelOp::Ge, args)),
        ("<", 2) => Ok(relation(RelOp::Lt, args)),
        ("<=", 2) => Ok(relation(RelOp::Le, args)),
        ("+", 1) => Ok(one(args, |a| a)),
        ("+", 2) => Ok(Expr::add(args)),
        ("-", 1) => Ok(one(args, |a| Expr::mul(vec![Expr::int(-1), a]))),
        ("-", 2) => {
            let [a, b] = two(args);
            Ok(Expr::add(vec![a, Expr::mul(vec![Expr::int(-1), b])]))
        }
        ("*", 2) => Ok(Expr::mul(args)),
        ("/", 2) => {
            let [a, b] = two(args);
            Ok(Expr::mul(vec![a, Expr::pow(b, Expr::int(-1))]))
        }
        ("&&" | "||" | "!" | "==" | "!=" | ">" | ">=" | "<" | "<=" | "+" | "-" | "*" | "/", n) => {
            Err(LowerError::ArityMismatch { value: node.value.clone(), found: n })
        }
        _ if is_application(&node.value) => Ok(Expr::call(node.value.clone(), args)),
        _ => Err(LowerError::UnsupportedOperator { value: node.value.clone() }),
    }
}

/// Call and index applications keep their full access path as the key;
/// comparability downstream requires identical name and arity.
fn is_application(value: &str) -> bool {
    value.ends_with("()") || value.ends_with("[]")
}

fn lower_leaf(value: &str) -> Expr {
    for (source, canonical) in WELL_KNOWN {
        if value == *source {
            return Expr::sym(*canonical);
        }
    }
    if let Some(number) = parse_number(value) {
        return Expr::Num(number);
    }
    Expr::sym(value.replace('.', "_"))
}

/// Parse decimal integer or `digits.digits` literal text into an exact
/// rational. Anything else (hex literals, identifiers) is not a number.
fn parse_number(text: &str) -> Option<BigRational> {
    match text.split_once('.') {
        None => {
            let n: BigInt = text.parse().ok()?;
            Some(BigRational::from_integer(n))
        }
        Some((whole, frac)) => {
            if whole.is_empty() || frac.is_empty() {
                return None;
            }
            let whole: BigInt = whole.parse().ok()?;
            let frac_digits: BigInt = frac.parse().ok()?;
            if frac_digits.sign() == num::bigint::Sign::Minus {
                return None;
            }
            let scale = BigInt::from(10u8).pow(frac.len() as u32);
            Some(BigRational::new(whole * &scale + frac_digits, scale))
        }
    }
}

fn relation(op: RelOp, args: Vec<Expr>) -> Expr {
    let [lhs, rhs] = two(args);
    Expr::rel(op, lhs, rhs)
}

fn one(args: Vec<Expr>, build: impl FnOnce(Expr) -> Expr) -> Expr {
    let mut args = args;
    build(args.pop().unwrap())
}

fn two(args: Vec<Expr>) -> [Expr; 2] {
    let mut args = args;
    let b = args.pop().unwrap();
    let a = args.pop().unwrap();
    [a, b]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, Tokenizer};

    fn lowered(input: &str) -> Expr {
        let tokens = Tokenizer::new().tokenize(input).unwrap();
        let ast = Parser::new(tokens).parse().unwrap();
        lower(&ast).unwrap()
    }

    #[test]
    fn test_well_known_symbols() {
        let e = lowered("msg.sender == msg.origin");
        assert_eq!(e, Expr::rel(RelOp::Eq, Expr::sym("msg_sender"), Expr::sym("msg_origin")));
    }

    #[test]
    fn test_dot_replacement_is_lossy() {
        assert_eq!(lowered("a.b"), lowered("a_b"));
    }

    #[test]
    fn test_integer_literal() {
        assert_eq!(lowered("42"), Expr::int(42));
    }

    #[test]
    fn test_float_literal_exact() {
        let e = lowered("3.14");
        assert_eq!(e, Expr::Num(BigRational::new(157.into(), 50.into())));
    }

    #[test]
    fn test_hex_literal_becomes_symbol() {
        let e = lowered("salt != 0x1f2f");
        match e {
            Expr::Rel { rhs, .. } => assert_eq!(*rhs, Expr::sym("0x1f2f")),
            _ => panic!("expected relation"),
        }
    }

    #[test]
    fn test_boolean_literals_become_symbols() {
        let e = lowered("flag == true");
        match e {
            Expr::Rel { rhs, .. } => assert!(rhs.is_true_sym()),
            _ => panic!("expected relation"),
        }
    }

    #[test]
    fn test_subtraction_rewritten() {
        let e = lowered("a - b");
        assert_eq!(
            e,
            Expr::add(vec![
                Expr::sym("a"),
                Expr::mul(vec![Expr::int(-1), Expr::sym("b")]),
            ])
        );
    }

    #[test]
    fn test_division_rewritten() {
        let e = lowered("c / a");
        assert_eq!(
            e,
            Expr::mul(vec![Expr::sym("c"), Expr::pow(Expr::sym("a"), Expr::int(-1))])
        );
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(lowered("-a"), Expr::mul(vec![Expr::int(-1), Expr::sym("a")]));
    }

    #[test]
    fn test_unary_plus_is_identity() {
        assert_eq!(lowered("+a"), Expr::sym("a"));
    }

    #[test]
    fn test_index_becomes_uninterpreted_application() {
        let e = lowered("used[salt]");
        assert_eq!(e, Expr::call("used[]", vec![Expr::sym("salt")]));
    }

    #[test]
    fn test_call_becomes_uninterpreted_application() {
        let e = lowered("allowance(from, to)");
        assert_eq!(e, Expr::call("allowance()", vec![Expr::sym("from"), Expr::sym("to")]));
    }

    #[test]
    fn test_modulus_is_a_lowering_error() {
        let tokens = Tokenizer::new().tokenize("a % b == 0").unwrap();
        let ast = Parser::new(tokens).parse().unwrap();
        let err = lower(&ast).unwrap_err();
        assert_eq!(err, LowerError::UnsupportedOperator { value: "%".to_string() });
    }

    #[test]
    fn test_connectives() {
        let e = lowered("a == b && c == d || !e");
        match e {
            Expr::Or(operands) => {
                assert!(matches!(operands[0], Expr::And(_)));
                assert!(matches!(operands[1], Expr::Not(_)));
            }
            _ => panic!("expected disjunction at the root"),
        }
    }
}
