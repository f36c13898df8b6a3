//! Linear-arithmetic satisfiability over the reals
//!
//! Constraints are polynomial forms compared against zero. Deciding a set:
//! disequalities case-split into the two strict orderings, equalities are
//! eliminated by substitution, and the remaining inequalities go through
//! Fourier–Motzkin elimination. Non-linear monomials are kept as opaque
//! variables, which over-approximates the solution set, so UNSAT answers
//! (the ones entailment conclusions rest on) stay sound.

use crate::expr::{Expr, RelOp};
use crate::simplify::{to_poly, Monomial, Poly};
use num::{BigRational, One, Signed, Zero};
use thiserror::Error;

/// Raised when an expression has no linear-constraint translation. Caught
/// by the implication engine and treated as "rule inapplicable"; never
/// propagated to callers of the comparison API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("no linear constraint translation for: {0}")]
    Unsupported(String),
}

/// A constraint `form ⋈ 0`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub form: Poly,
    pub op: RelOp,
}

impl Constraint {
    /// The constraint satisfied exactly when `self` is not
    pub fn negated(&self) -> Constraint {
        Constraint { form: self.form.clone(), op: self.op.negated() }
    }
}

/// Translate a relation over arithmetic sides into `lhs - rhs ⋈ 0`.
pub fn translate(expr: &Expr) -> Result<Constraint, SolverError> {
    match expr {
        Expr::Rel { op, lhs, rhs } if lhs.is_arithmetic() && rhs.is_arithmetic() => {
            Ok(Constraint { form: to_poly(lhs).sub(&to_poly(rhs)), op: *op })
        }
        other => Err(SolverError::Unsupported(other.to_string())),
    }
}

/// Decide whether the conjunction of the constraints has a real solution.
pub fn satisfiable(constraints: &[Constraint]) -> bool {
    // Disequality case split: c ≠ 0 iff c < 0 or c > 0
    if let Some(index) = constraints.iter().position(|c| c.op == RelOp::Ne) {
        return [RelOp::Lt, RelOp::Gt].into_iter().any(|op| {
            let mut branch = constraints.to_vec();
            branch[index].op = op;
            satisfiable(&branch)
        });
    }

    let minus_one = -BigRational::one();
    let mut equalities: Vec<Poly> = Vec::new();
    // (form, strict): form ≤ 0, or form < 0 when strict
    let mut bounds: Vec<(Poly, bool)> = Vec::new();
    for constraint in constraints {
        match constraint.op {
            RelOp::Eq => equalities.push(constraint.form.clone()),
            RelOp::Le => bounds.push((constraint.form.clone(), false)),
            RelOp::Lt => bounds.push((constraint.form.clone(), true)),
            RelOp::Ge => bounds.push((constraint.form.scale(&minus_one), false)),
            RelOp::Gt => bounds.push((constraint.form.scale(&minus_one), true)),
            RelOp::Ne => unreachable!("disequalities split above"),
        }
    }

    // Gaussian substitution: solve each equality for its first variable
    // and eliminate it everywhere else
    while let Some(equality) = equalities.pop() {
        match equality.variable_terms().next() {
            None => {
                if !equality.constant_part().is_zero() {
                    return false;
                }
            }
            Some((monomial, coefficient)) => {
                let monomial = monomial.clone();
                let coefficient = coefficient.clone();
                for other in &mut equalities {
                    substitute(other, &equality, &monomial, &coefficient);
                }
                for (form, _) in &mut bounds {
                    substitute(form, &equality, &monomial, &coefficient);
                }
            }
        }
    }

    // Fourier–Motzkin on the inequalities
    loop {
        let mut remaining: Vec<(Poly, bool)> = Vec::new();
        for (form, strict) in bounds {
            if form.is_constant() {
                let value = form.constant_part();
                let holds = if strict { value.is_negative() } else { !value.is_positive() };
                if !holds {
                    return false;
                }
            } else {
                remaining.push((form, strict));
            }
        }

        let variable = match remaining
            .iter()
            .flat_map(|(form, _)| form.variable_terms())
            .next()
        {
            None => return true,
            Some((monomial, _)) => monomial.clone(),
        };

        let mut uppers: Vec<(Poly, bool, BigRational)> = Vec::new();
        let mut lowers: Vec<(Poly, bool, BigRational)> = Vec::new();
        let mut rest: Vec<(Poly, bool)> = Vec::new();
        for (form, strict) in remaining {
            let coefficient = coefficient_of(&form, &variable);
            if coefficient.is_zero() {
                rest.push((form, strict));
            } else if coefficient.is_positive() {
                uppers.push((form, strict, coefficient));
            } else {
                lowers.push((form, strict, coefficient));
            }
        }

        // Each lower/upper pair yields a variable-free-in-v consequence:
        // positive scalings keep the inequality direction
        for (upper, upper_strict, upper_coeff) in &uppers {
            for (lower, lower_strict, lower_coeff) in &lowers {
                let combined = upper
                    .scale(&-lower_coeff.clone())
                    .add(&lower.scale(upper_coeff));
                rest.push((combined, *upper_strict || *lower_strict));
            }
        }

        bounds = rest;
    }
}

fn coefficient_of(form: &Poly, monomial: &Monomial) -> BigRational {
    form.terms()
        .find(|(m, _)| *m == monomial)
        .map(|(_, c)| c.clone())
        .unwrap_or_else(BigRational::zero)
}

/// Eliminate `monomial` from `target` using the pivot equality
/// `pivot = 0`, whose coefficient for the monomial is `coefficient`.
fn substitute(target: &mut Poly, pivot: &Poly, monomial: &Monomial, coefficient: &BigRational) {
    let present = coefficient_of(target, monomial);
    if !present.is_zero() {
        *target = target.sub(&pivot.scale(&(present / coefficient)));
    }
}
