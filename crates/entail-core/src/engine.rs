//! Implication engine and four-way comparison verdicts
//!
//! `implies` works down an ordered rule list; the first applicable rule
//! decides. Reasoning is deliberately one-sided: a rule proving the
//! implication returns true, and exhausting the list returns false,
//! which means "no proof found", never a refutation. Prover failures are
//! recovered locally by falling through; only pipeline errors (lexing,
//! parsing, lowering) abort a comparison.

use crate::expr::{Expr, RelOp};
use crate::lower::lower;
use crate::parser::{Parser, Tokenizer};
use crate::simplify::{algebraic_difference, simplify};
use crate::solver::{satisfiable, translate, Constraint, SolverError};
use crate::trace::{Component, Silent, TraceSink};
use crate::Result;
use std::fmt;

/// Outcome of comparing two predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Equivalent,
    FirstStronger,
    SecondStronger,
    Incomparable,
}

impl Verdict {
    pub fn classify(forward: bool, backward: bool) -> Verdict {
        match (forward, backward) {
            (true, true) => Verdict::Equivalent,
            (true, false) => Verdict::FirstStronger,
            (false, true) => Verdict::SecondStronger,
            (false, false) => Verdict::Incomparable,
        }
    }

    /// The fixed user-facing phrase for this verdict
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Equivalent => "The predicates are equivalent.",
            Verdict::FirstStronger => "The first predicate is stronger.",
            Verdict::SecondStronger => "The second predicate is stronger.",
            Verdict::Incomparable => {
                "The predicates are not equivalent and neither is stronger."
            }
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One tier of the relational reasoning strategy. `Err` means the pair is
/// outside this prover's fragment; the engine then tries the next tier.
pub trait ImplicationProver {
    fn try_implies(&self, e1: &Expr, e2: &Expr) -> std::result::Result<bool, SolverError>;
}

/// Fast tier: relations whose four operands are all scalar atoms.
/// Rejects pairs where exactly one side is an equality, leaving those to
/// the general tier.
pub struct AtomicRelationProver;

impl ImplicationProver for AtomicRelationProver {
    fn try_implies(&self, e1: &Expr, e2: &Expr) -> std::result::Result<bool, SolverError> {
        let (Expr::Rel { op: op1, lhs: l1, rhs: r1 }, Expr::Rel { op: op2, lhs: l2, rhs: r2 }) =
            (e1, e2)
        else {
            return Err(SolverError::Unsupported(format!("{e1} vs {e2}")));
        };
        if !(l1.is_atom() && r1.is_atom() && l2.is_atom() && r2.is_atom()) {
            return Err(SolverError::Unsupported(format!("{e1} vs {e2}")));
        }
        if (*op1 == RelOp::Eq) != (*op2 == RelOp::Eq) {
            return Err(SolverError::Unsupported(format!(
                "mixed equality/inequality pair {e1} vs {e2}"
            )));
        }
        decide(translate(e1)?, translate(e2)?)
    }
}

/// General tier: any relational pair whose sides translate to linear
/// constraints, including the mixed equality/inequality pairs the atomic
/// tier rejects.
pub struct RelationProver;

impl ImplicationProver for RelationProver {
    fn try_implies(&self, e1: &Expr, e2: &Expr) -> std::result::Result<bool, SolverError> {
        decide(translate(e1)?, translate(e2)?)
    }
}

/// E1 entails E2 exactly when E1 ∧ ¬E2 has no solution
fn decide(c1: Constraint, c2: Constraint) -> std::result::Result<bool, SolverError> {
    Ok(!satisfiable(&[c1, c2.negated()]))
}

/// Compares two predicate strings through the full pipeline.
pub struct Comparator {
    tokenizer: Tokenizer,
    provers: Vec<Box<dyn ImplicationProver>>,
    sink: Box<dyn TraceSink>,
}

impl Default for Comparator {
    fn default() -> Self {
        Comparator::new()
    }
}

impl Comparator {
    pub fn new() -> Self {
        Comparator::with_sink(Box::new(Silent))
    }

    pub fn with_sink(sink: Box<dyn TraceSink>) -> Self {
        Comparator {
            tokenizer: Tokenizer::new(),
            provers: vec![Box::new(AtomicRelationProver), Box::new(RelationProver)],
            sink,
        }
    }

    /// Run both predicates through tokenize/parse/lower/simplify, check
    /// entailment in both directions, and classify.
    pub fn compare(&self, predicate1: &str, predicate2: &str) -> Result<Verdict> {
        let e1 = self.canonicalize(predicate1)?;
        let e2 = self.canonicalize(predicate2)?;
        let forward = self.implies(&e1, &e2);
        let backward = self.implies(&e2, &e1);
        Ok(Verdict::classify(forward, backward))
    }

    fn canonicalize(&self, input: &str) -> Result<Expr> {
        let tokens = self.tokenizer.tokenize(input)?;
        self.sink
            .emit(Component::Tokenizer, &format!("{:?} -> {} tokens", input, tokens.len()));
        let ast = Parser::new(tokens).parse()?;
        self.sink.emit(Component::Parser, &ast.to_string());
        let expr = simplify(&lower(&ast)?);
        self.sink.emit(Component::Simplifier, &expr.to_string());
        Ok(expr)
    }

    /// Whether `e1` entails `e2`. Both inputs must be in canonical
    /// (simplified) form. False means "no proof found", not a refutation.
    pub fn implies(&self, e1: &Expr, e2: &Expr) -> bool {
        // Structural identity after canonicalization
        if e1 == e2 {
            return true;
        }

        // Algebraic identity: a zero difference proves both directions
        if let Ok(difference) = algebraic_difference(e1, e2) {
            if difference.is_zero() {
                return true;
            }
        }

        // Boolean idiom rewriting: !x ≡ (x == false), bare symbol ≡ (x == true)
        if let Some(result) = self.boolean_idiom(e1, e2) {
            return result;
        }

        // Same-shape connectives with equal arity match pairwise in the
        // given operand order; no permutation search
        match (e1, e2) {
            (Expr::And(a), Expr::And(b)) | (Expr::Or(a), Expr::Or(b)) if a.len() == b.len() => {
                return a.iter().zip(b).all(|(x, y)| self.implies(x, y));
            }
            _ => {}
        }

        // One-sided entailment decomposition. The conjunction-on-the-left
        // direction is sound but incomplete: no single operand entailing
        // e2 does not refute the implication, it just proves nothing.
        if let Expr::And(operands) = e2 {
            return operands.iter().all(|operand| self.implies(e1, operand));
        }
        if let Expr::And(operands) = e1 {
            return operands.iter().any(|operand| self.implies(operand, e2));
        }
        if let Expr::Or(operands) = e2 {
            return operands.iter().any(|operand| self.implies(e1, operand));
        }
        if let Expr::Or(operands) = e1 {
            return operands.iter().all(|operand| self.implies(operand, e2));
        }

        // Uninterpreted applications: comparable only with identical name
        // and arity, then argument-wise
        if let (Expr::Call { name: n1, args: a1 }, Expr::Call { name: n2, args: a2 }) = (e1, e2) {
            if n1 == n2 && a1.len() == a2.len() {
                return a1.iter().zip(a2).all(|(x, y)| self.implies(x, y));
            }
            return false;
        }

        // Bare symbols bind by canonical name only; inequality was already
        // ruled out by structural identity
        if let (Expr::Sym(_), Expr::Sym(_)) = (e1, e2) {
            return false;
        }

        // Relational tiers, in order. A prover error means the pair is
        // outside that tier's fragment, never a verdict.
        for prover in &self.provers {
            match prover.try_implies(e1, e2) {
                Ok(result) => {
                    self.sink
                        .emit(Component::Solver, &format!("{e1} -> {e2}: {result}"));
                    return result;
                }
                Err(error) => {
                    self.sink
                        .emit(Component::Solver, &format!("tier inapplicable: {error}"));
                }
            }
        }

        false
    }

    fn boolean_idiom(&self, e1: &Expr, e2: &Expr) -> Option<bool> {
        if let (Expr::Not(inner), Expr::Rel { op: RelOp::Eq, lhs, rhs }) = (e1, e2) {
            if rhs.is_false_sym() {
                return Some(self.implies(inner, lhs));
            }
            if lhs.is_false_sym() {
                return Some(self.implies(inner, rhs));
            }
        }
        if let (Expr::Rel { op: RelOp::Eq, lhs, rhs }, Expr::Not(inner)) = (e1, e2) {
            if rhs.is_false_sym() {
                return Some(self.implies(inner, lhs));
            }
            if lhs.is_false_sym() {
                return Some(self.implies(inner, rhs));
            }
        }
        if let (Expr::Sym(_), Expr::Rel { op: RelOp::Eq, lhs, rhs }) = (e1, e2) {
            if rhs.is_true_sym() {
                return Some(self.implies(e1, lhs));
            }
            if lhs.is_true_sym() {
                return Some(self.implies(e1, rhs));
            }
        }
        if let (Expr::Rel { op: RelOp::Eq, lhs, rhs }, Expr::Sym(_)) = (e1, e2) {
            if rhs.is_true_sym() {
                return Some(self.implies(e2, lhs));
            }
            if lhs.is_true_sym() {
                return Some(self.implies(e2, rhs));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Capture;
    use std::rc::Rc;

    fn verdict(p1: &str, p2: &str) -> Verdict {
        Comparator::new().compare(p1, p2).unwrap()
    }

    #[test]
    fn test_symmetric_equality_is_equivalent() {
        assert_eq!(
            verdict("msg.sender == msg.origin", "msg.origin == msg.sender"),
            Verdict::Equivalent
        );
    }

    #[test]
    fn test_extra_conjunct_is_stronger() {
        assert_eq!(
            verdict("msg.sender == msg.origin && a >= b", "msg.sender == msg.origin"),
            Verdict::FirstStronger
        );
    }

    #[test]
    fn test_extra_disjunct_is_weaker() {
        assert_eq!(
            verdict("msg.sender == msg.origin || a < b", "a < b"),
            Verdict::SecondStronger
        );
    }

    #[test]
    fn test_tighter_bound_is_stronger() {
        assert_eq!(verdict("a > 12", "a > 13"), Verdict::SecondStronger);
    }

    #[test]
    fn test_negation_idiom_is_equivalent() {
        assert_eq!(verdict("used[salt]==false", "!used[salt]"), Verdict::Equivalent);
    }

    #[test]
    fn test_unrelated_relations_are_incomparable() {
        assert_eq!(verdict("msg.sender != msg.origin", "a >= b"), Verdict::Incomparable);
    }

    #[test]
    fn test_bare_symbol_vs_eq_true() {
        assert_eq!(verdict("flag", "flag == true"), Verdict::Equivalent);
    }

    #[test]
    fn test_reflexive() {
        for p in ["a > 12", "used[salt]==false", "x && y || !z", "a + b * 2 <= c"] {
            assert_eq!(verdict(p, p), Verdict::Equivalent);
        }
    }

    #[test]
    fn test_antisymmetric_verdicts() {
        let forward = verdict("a > 12 && b < 3", "a > 12");
        let backward = verdict("a > 12", "a > 12 && b < 3");
        assert_eq!(forward, Verdict::FirstStronger);
        assert_eq!(backward, Verdict::SecondStronger);
    }

    #[test]
    fn test_reordered_conjunction_not_recognized() {
        // Same-shape matching walks operands in the given order; logically
        // identical but reordered conjunctions are not recognized
        assert_ne!(
            verdict("a == 1 && b == 2", "b == 2 && a == 1"),
            Verdict::Equivalent
        );
    }

    #[test]
    fn test_lex_error_propagates() {
        assert!(Comparator::new().compare("a § b", "a").is_err());
    }

    #[test]
    fn test_parse_error_propagates() {
        assert!(Comparator::new().compare("a >", "a > 1").is_err());
    }

    #[test]
    fn test_lower_error_propagates() {
        assert!(Comparator::new().compare("a % b == 0", "a == 0").is_err());
    }

    #[test]
    fn test_error_on_either_side_aborts() {
        assert!(Comparator::new().compare("a > 1", "a >").is_err());
    }

    #[test]
    fn test_mixed_pair_reaches_general_tier() {
        // Eq vs Ge is rejected by the atomic tier and decided by the
        // general one
        assert_eq!(verdict("a == b", "a >= b"), Verdict::FirstStronger);
    }

    #[test]
    fn test_call_arity_mismatch_is_false() {
        assert_eq!(verdict("f(x)", "f(x, y)"), Verdict::Incomparable);
    }

    #[test]
    fn test_verdict_messages() {
        assert_eq!(Verdict::Equivalent.message(), "The predicates are equivalent.");
        assert_eq!(Verdict::FirstStronger.message(), "The first predicate is stronger.");
        assert_eq!(Verdict::SecondStronger.message(), "The second predicate is stronger.");
        assert_eq!(
            Verdict::Incomparable.message(),
            "The predicates are not equivalent and neither is stronger."
        );
    }

    #[test]
    fn test_trace_sink_receives_stages() {
        let sink = Rc::new(Capture::new());
        let comparator = Comparator::with_sink(Box::new(SharedSink(Rc::clone(&sink))));
        comparator.compare("a > 1", "a > 2").unwrap();
        let components: Vec<Component> = sink.lines().iter().map(|(c, _)| *c).collect();
        assert!(components.contains(&Component::Tokenizer));
        assert!(components.contains(&Component::Parser));
        assert!(components.contains(&Component::Simplifier));
        assert!(components.contains(&Component::Solver));
    }

    struct SharedSink(Rc<Capture>);

    impl TraceSink for SharedSink {
        fn emit(&self, component: Component, message: &str) {
            self.0.emit(component, message);
        }
    }
}
