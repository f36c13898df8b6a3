//! Algebraic and logical simplifier
//!
//! Arithmetic subtrees normalize through a polynomial form: a map from
//! monomials (products of non-constant atoms with integer exponents) to
//! exact rational coefficients. Rebuilding an expression from that form
//! flattens sums and products, folds constants, collects like terms, and
//! orders terms canonically, so structurally different but algebraically
//! identical inputs (`x < y` vs `x - y < 0`) converge.
//!
//! Connectives flatten and deduplicate but keep their operand order:
//! same-shape conjunction matching downstream is deliberately
//! order-sensitive, and sorting here would silently strengthen it.

use crate::expr::{Expr, RelOp};
use num::{BigRational, Integer, One, Signed, Zero};
use std::collections::BTreeMap;
use thiserror::Error;

/// Raised when an algebraic operation is asked of a non-algebraic
/// expression. Callers in the implication engine treat this as "rule
/// inapplicable", never as a verdict.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimplifyError {
    #[error("expression is not purely algebraic: {0}")]
    NonArithmetic(String),
}

/// A product of non-constant atoms with integer exponents. The empty
/// monomial is the constant term.
pub type Monomial = BTreeMap<Expr, i64>;

/// Sparse polynomial over monomials with exact rational coefficients.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Poly {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Poly {
    pub(crate) fn constant(value: BigRational) -> Self {
        let mut poly = Poly::default();
        if !value.is_zero() {
            poly.terms.insert(Monomial::new(), value);
        }
        poly
    }

    /// A single opaque atom with exponent one
    pub(crate) fn atom(expr: Expr) -> Self {
        let mut monomial = Monomial::new();
        monomial.insert(expr, 1);
        let mut poly = Poly::default();
        poly.terms.insert(monomial, BigRational::one());
        poly
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// The coefficient of the empty monomial
    pub(crate) fn constant_part(&self) -> BigRational {
        self.terms.get(&Monomial::new()).cloned().unwrap_or_else(BigRational::zero)
    }

    /// Check that only the constant term remains
    pub(crate) fn is_constant(&self) -> bool {
        self.terms.keys().all(|m| m.is_empty())
    }

    pub(crate) fn terms(&self) -> impl Iterator<Item = (&Monomial, &BigRational)> {
        self.terms.iter()
    }

    /// Non-constant terms in canonical order
    pub(crate) fn variable_terms(&self) -> impl Iterator<Item = (&Monomial, &BigRational)> {
        self.terms.iter().filter(|(m, _)| !m.is_empty())
    }

    fn insert_term(&mut self, monomial: Monomial, coefficient: BigRational) {
        if coefficient.is_zero() {
            return;
        }
        let entry = self.terms.entry(monomial);
        match entry {
            std::collections::btree_map::Entry::Vacant(v) => {
                v.insert(coefficient);
            }
            std::collections::btree_map::Entry::Occupied(mut o) => {
                let sum = o.get() + coefficient;
                if sum.is_zero() {
                    o.remove();
                } else {
                    *o.get_mut() = sum;
                }
            }
        }
    }

    pub(crate) fn add(&self, other: &Poly) -> Poly {
        let mut result = self.clone();
        for (monomial, coefficient) in &other.terms {
            result.insert_term(monomial.clone(), coefficient.clone());
        }
        result
    }

    pub(crate) fn sub(&self, other: &Poly) -> Poly {
        self.add(&other.scale(&-BigRational::one()))
    }

    pub(crate) fn scale(&self, factor: &BigRational) -> Poly {
        if factor.is_zero() {
            return Poly::default();
        }
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), c * factor))
                .collect(),
        }
    }

    pub(crate) fn mul(&self, other: &Poly) -> Poly {
        let mut result = Poly::default();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &other.terms {
                let mut monomial = m1.clone();
                for (atom, exp) in m2 {
                    let combined = monomial.get(atom).copied().unwrap_or(0) + exp;
                    if combined == 0 {
                        monomial.remove(atom);
                    } else {
                        monomial.insert(atom.clone(), combined);
                    }
                }
                result.insert_term(monomial, c1 * c2);
            }
        }
        result
    }

    /// Raise to an integer power. Negative exponents only invert
    /// single-term polynomials; anything else is not expressible and
    /// returns `None` so the caller keeps the power opaque.
    fn int_pow(&self, exponent: i64) -> Option<Poly> {
        if exponent == 0 {
            return Some(Poly::constant(BigRational::one()));
        }
        let base = if exponent < 0 {
            if self.terms.len() != 1 {
                return None;
            }
            let (monomial, coefficient) = self.terms.iter().next().unwrap();
            if coefficient.is_zero() {
                return None;
            }
            let inverted: Monomial = monomial.iter().map(|(a, e)| (a.clone(), -e)).collect();
            let mut poly = Poly::default();
            poly.insert_term(inverted, coefficient.recip());
            poly
        } else {
            self.clone()
        };
        let mut magnitude = exponent.unsigned_abs();
        if magnitude > 16 {
            // Arbitrarily large powers explode the term count; keep opaque
            return None;
        }
        let mut result = Poly::constant(BigRational::one());
        while magnitude > 0 {
            result = result.mul(&base);
            magnitude -= 1;
        }
        Some(result)
    }
}

/// Simplify an expression to canonical form. Total: never fails, returns
/// the input shape unchanged where no rule applies. Idempotent.
pub fn simplify(expr: &Expr) -> Expr {
    match expr {
        Expr::Num(_) | Expr::Sym(_) => expr.clone(),
        Expr::Call { name, args } => {
            Expr::call(name.clone(), args.iter().map(simplify).collect())
        }
        Expr::Not(operand) => match simplify(operand) {
            Expr::Not(inner) => *inner,
            other => Expr::not(other),
        },
        Expr::And(operands) => simplify_connective(operands, true),
        Expr::Or(operands) => simplify_connective(operands, false),
        Expr::Rel { op, lhs, rhs } => simplify_rel(*op, simplify(lhs), simplify(rhs)),
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow { .. } => {
            let node = rebuild_arithmetic(expr);
            from_poly(&to_poly(&node))
        }
    }
}

/// Difference `e1 - e2` in canonical form. Both inputs must already be
/// simplified; non-algebraic operands are an error.
pub fn algebraic_difference(e1: &Expr, e2: &Expr) -> Result<Expr, SimplifyError> {
    if !e1.is_arithmetic() {
        return Err(SimplifyError::NonArithmetic(e1.to_string()));
    }
    if !e2.is_arithmetic() {
        return Err(SimplifyError::NonArithmetic(e2.to_string()));
    }
    Ok(from_poly(&to_poly(e1).sub(&to_poly(e2))))
}

/// Convert an already-simplified arithmetic expression to polynomial
/// form. Non-arithmetic nodes become opaque atoms.
pub(crate) fn to_poly(expr: &Expr) -> Poly {
    match expr {
        Expr::Num(n) => Poly::constant(n.clone()),
        Expr::Add(terms) => terms
            .iter()
            .fold(Poly::default(), |acc, t| acc.add(&to_poly(t))),
        Expr::Mul(factors) => factors
            .iter()
            .fold(Poly::constant(BigRational::one()), |acc, f| acc.mul(&to_poly(f))),
        Expr::Pow { base, exp } => {
            if let Expr::Num(n) = exp.as_ref() {
                if n.is_integer() {
                    if let Ok(k) = i64::try_from(n.to_integer()) {
                        if let Some(poly) = to_poly(base).int_pow(k) {
                            return poly;
                        }
                    }
                }
            }
            Poly::atom(expr.clone())
        }
        other => Poly::atom(other.clone()),
    }
}

/// Rebuild a canonical expression from polynomial form
pub(crate) fn from_poly(poly: &Poly) -> Expr {
    let mut terms = Vec::new();
    for (monomial, coefficient) in poly.terms() {
        terms.push(term_expr(monomial, coefficient));
    }
    match terms.len() {
        0 => Expr::int(0),
        1 => terms.pop().unwrap(),
        _ => Expr::add(terms),
    }
}

fn term_expr(monomial: &Monomial, coefficient: &BigRational) -> Expr {
    let mut factors = Vec::new();
    if !coefficient.is_one() || monomial.is_empty() {
        factors.push(Expr::Num(coefficient.clone()));
    }
    for (atom, exponent) in monomial {
        if *exponent == 1 {
            factors.push(atom.clone());
        } else {
            factors.push(Expr::pow(atom.clone(), Expr::int(*exponent)));
        }
    }
    match factors.len() {
        1 => factors.pop().unwrap(),
        _ => Expr::mul(factors),
    }
}

/// Re-simplify the direct arithmetic children of an Add/Mul/Pow node so
/// `to_poly` sees canonical atoms
fn rebuild_arithmetic(expr: &Expr) -> Expr {
    match expr {
        Expr::Add(terms) => Expr::add(terms.iter().map(simplify).collect()),
        Expr::Mul(factors) => Expr::mul(factors.iter().map(simplify).collect()),
        Expr::Pow { base, exp } => Expr::pow(simplify(base), simplify(exp)),
        other => simplify(other),
    }
}

/// Flatten same-shape nesting and drop duplicate operands, preserving
/// first-occurrence order. Singletons unwrap.
fn simplify_connective(operands: &[Expr], conjunction: bool) -> Expr {
    let mut flat: Vec<Expr> = Vec::new();
    for operand in operands {
        let simplified = simplify(operand);
        let nested = match (&simplified, conjunction) {
            (Expr::And(inner), true) => Some(inner.clone()),
            (Expr::Or(inner), false) => Some(inner.clone()),
            _ => None,
        };
        match nested {
            Some(inner) => {
                for e in inner {
                    if !flat.contains(&e) {
                        flat.push(e);
                    }
                }
            }
            None => {
                if !flat.contains(&simplified) {
                    flat.push(simplified);
                }
            }
        }
    }
    match flat.len() {
        1 => flat.pop().unwrap(),
        _ if conjunction => Expr::and(flat),
        _ => Expr::or(flat),
    }
}

/// Canonicalize a relation over arithmetic sides: move everything left,
/// scale variable coefficients to primitive integers, make the leading
/// coefficient positive (flipping direction operators), then split terms
/// back into lhs/rhs. Constant relations fold to the boolean symbols.
fn simplify_rel(op: RelOp, lhs: Expr, rhs: Expr) -> Expr {
    if !lhs.is_arithmetic() || !rhs.is_arithmetic() {
        return Expr::rel(op, lhs, rhs);
    }

    let mut diff = to_poly(&lhs).sub(&to_poly(&rhs));
    let mut op = op;

    if diff.is_constant() {
        let c = diff.constant_part();
        let zero = BigRational::zero();
        let holds = match op {
            RelOp::Eq => c == zero,
            RelOp::Ne => c != zero,
            RelOp::Gt => c > zero,
            RelOp::Ge => c >= zero,
            RelOp::Lt => c < zero,
            RelOp::Le => c <= zero,
        };
        return Expr::sym(if holds { "true" } else { "false" });
    }

    // Primitive scale across the variable coefficients
    let mut gcd: Option<BigRational> = None;
    for (_, coefficient) in diff.variable_terms() {
        let value = coefficient.abs();
        gcd = Some(match gcd {
            None => value,
            Some(g) => rational_gcd(&g, &value),
        });
    }
    let gcd = gcd.expect("non-constant polynomial has a variable term");
    if !gcd.is_one() {
        diff = diff.scale(&gcd.recip());
    }

    // Leading coefficient positive
    let leading_negative = diff
        .variable_terms()
        .next()
        .map(|(_, c)| c.is_negative())
        .unwrap_or(false);
    if leading_negative {
        diff = diff.scale(&-BigRational::one());
        op = op.flipped();
    }

    // Split: positive variable terms left, the rest negated right
    let mut left = Poly::default();
    let mut right = Poly::default();
    for (monomial, coefficient) in diff.variable_terms() {
        if coefficient.is_negative() {
            right.insert_term(monomial.clone(), -coefficient);
        } else {
            left.insert_term(monomial.clone(), coefficient.clone());
        }
    }
    let constant = diff.constant_part();
    if !constant.is_zero() {
        right.insert_term(Monomial::new(), -constant);
    }

    Expr::rel(op, from_poly(&left), from_poly(&right))
}

fn rational_gcd(a: &BigRational, b: &BigRational) -> BigRational {
    BigRational::new(a.numer().gcd(b.numer()), a.denom().lcm(b.denom()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower;
    use crate::parser::{Parser, Tokenizer};

    fn canonical(input: &str) -> Expr {
        let tokens = Tokenizer::new().tokenize(input).unwrap();
        let ast = Parser::new(tokens).parse().unwrap();
        simplify(&lower(&ast).unwrap())
    }

    #[test]
    fn test_symmetric_equality_converges() {
        assert_eq!(canonical("msg.sender == msg.origin"), canonical("msg.origin == msg.sender"));
    }

    #[test]
    fn test_relation_direction_converges() {
        assert_eq!(canonical("a >= b"), canonical("b <= a"));
        assert_eq!(canonical("a > b"), canonical("b < a"));
    }

    #[test]
    fn test_moved_terms_converge() {
        assert_eq!(canonical("x < y"), canonical("x - y < 0"));
    }

    #[test]
    fn test_primitive_scaling() {
        assert_eq!(canonical("2*x < 2*y"), canonical("x < y"));
        assert_eq!(
            canonical("2*x < 5"),
            Expr::rel(
                RelOp::Lt,
                Expr::sym("x"),
                Expr::Num(BigRational::new(5.into(), 2.into()))
            )
        );
    }

    #[test]
    fn test_constant_folding_in_sums() {
        assert_eq!(canonical("1 + 2 + x"), canonical("x + 3"));
    }

    #[test]
    fn test_like_terms_collect() {
        assert_eq!(canonical("x + x"), canonical("2 * x"));
        assert_eq!(canonical("x - x"), Expr::int(0));
    }

    #[test]
    fn test_division_cancels() {
        // c/a == b and c == a*b share the canonical form modulo scaling
        assert_eq!(canonical("x * y / y"), Expr::sym("x"));
    }

    #[test]
    fn test_constant_relation_folds() {
        assert_eq!(canonical("1 < 2"), Expr::sym("true"));
        assert_eq!(canonical("2 < 1"), Expr::sym("false"));
        assert_eq!(canonical("3 == 3"), Expr::sym("true"));
        assert_eq!(canonical("3 != 3"), Expr::sym("false"));
    }

    #[test]
    fn test_connective_flattening() {
        let e = canonical("(a == 1 && b == 2) && c == 3");
        match e {
            Expr::And(operands) => assert_eq!(operands.len(), 3),
            other => panic!("expected flat conjunction, got {other}"),
        }
    }

    #[test]
    fn test_idempotent_operands_dedupe() {
        let e = canonical("a == 1 && a == 1");
        assert_eq!(e, canonical("a == 1"));
    }

    #[test]
    fn test_operand_order_preserved() {
        // No commutative sorting of connectives: order sensitivity of
        // same-shape matching is documented behavior
        let ab = canonical("a == 1 && b == 2");
        let ba = canonical("b == 2 && a == 1");
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_double_negation() {
        assert_eq!(canonical("!!flag"), Expr::sym("flag"));
    }

    #[test]
    fn test_idempotence() {
        for input in [
            "msg.sender == msg.origin && a >= b",
            "x - y < 0",
            "used[salt] == false",
            "a > 12 || b / c == 2",
            "!(x == y)",
        ] {
            let once = canonical(input);
            assert_eq!(simplify(&once), once, "{input}");
        }
    }

    #[test]
    fn test_algebraic_difference_zero() {
        let a = canonical("x + y");
        let b = canonical("y + x");
        assert!(algebraic_difference(&a, &b).unwrap().is_zero());
    }

    #[test]
    fn test_algebraic_difference_rejects_boolean() {
        let a = canonical("x == y");
        let b = canonical("x");
        assert!(algebraic_difference(&a, &b).is_err());
        assert!(algebraic_difference(&b, &a).is_err());
    }

    #[test]
    fn test_uninterpreted_atoms_survive() {
        let e = canonical("used[salt] == false");
        match e {
            Expr::Rel { op: RelOp::Eq, lhs, rhs } => {
                assert!(lhs.is_false_sym());
                assert_eq!(*rhs, Expr::call("used[]", vec![Expr::sym("salt")]));
            }
            other => panic!("unexpected canonical form {other}"),
        }
    }
}
