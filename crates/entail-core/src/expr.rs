//! Canonical symbolic expression tree
//!
//! Closed operator set over which the canonicalizer, simplifier, and
//! implication engine do exhaustive matching. Trees are built fresh per
//! comparison and never mutated afterwards.
//!
//! Boolean literals are the well-known symbols `true` and `false`; the
//! engine's idiom-rewrite rule gives them meaning, so no dedicated
//! variant exists for them.

use num::BigRational;
use std::fmt;

/// Relational operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl RelOp {
    /// The operator satisfied exactly when `self` is not
    pub fn negated(self) -> Self {
        match self {
            RelOp::Eq => RelOp::Ne,
            RelOp::Ne => RelOp::Eq,
            RelOp::Gt => RelOp::Le,
            RelOp::Ge => RelOp::Lt,
            RelOp::Lt => RelOp::Ge,
            RelOp::Le => RelOp::Gt,
        }
    }

    /// The operator with its direction reversed, as when both sides of a
    /// relation are negated. Symmetric operators are unchanged.
    pub fn flipped(self) -> Self {
        match self {
            RelOp::Eq => RelOp::Eq,
            RelOp::Ne => RelOp::Ne,
            RelOp::Gt => RelOp::Lt,
            RelOp::Ge => RelOp::Le,
            RelOp::Lt => RelOp::Gt,
            RelOp::Le => RelOp::Ge,
        }
    }

    /// Check if this is `==` or `!=`
    pub fn is_equality(self) -> bool {
        matches!(self, RelOp::Eq | RelOp::Ne)
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
        };
        write!(f, "{}", s)
    }
}

/// A symbolic expression
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    /// Exact numeric constant
    Num(BigRational),
    /// Canonical symbol; the sole variable-binding mechanism between the
    /// two predicates of a comparison is textual equality of these names
    Sym(String),
    /// Uninterpreted application, keyed by name and arity
    Call { name: String, args: Vec<Expr> },
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Rel { op: RelOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow { base: Box<Expr>, exp: Box<Expr> },
}

impl Expr {
    /// Integer constant
    pub fn int(n: i64) -> Self {
        Expr::Num(BigRational::from_integer(n.into()))
    }

    /// Symbol
    pub fn sym(name: impl Into<String>) -> Self {
        Expr::Sym(name.into())
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Not(Box::new(operand))
    }

    pub fn and(operands: Vec<Expr>) -> Self {
        Expr::And(operands)
    }

    pub fn or(operands: Vec<Expr>) -> Self {
        Expr::Or(operands)
    }

    pub fn rel(op: RelOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Rel { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn add(operands: Vec<Expr>) -> Self {
        Expr::Add(operands)
    }

    pub fn mul(operands: Vec<Expr>) -> Self {
        Expr::Mul(operands)
    }

    pub fn pow(base: Expr, exp: Expr) -> Self {
        Expr::Pow { base: Box::new(base), exp: Box::new(exp) }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call { name: name.into(), args }
    }

    /// The well-known boolean symbols
    pub fn is_true_sym(&self) -> bool {
        matches!(self, Expr::Sym(name) if name == "true")
    }

    pub fn is_false_sym(&self) -> bool {
        matches!(self, Expr::Sym(name) if name == "false")
    }

    /// Check if this is the numeric constant zero
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(n) if n == &BigRational::from_integer(0.into()))
    }

    /// Check if this is an atomic scalar (symbol or numeric constant)
    pub fn is_atom(&self) -> bool {
        matches!(self, Expr::Num(_) | Expr::Sym(_))
    }

    /// Check that no boolean connective or relation occurs anywhere in
    /// this expression, i.e. it is a purely algebraic term
    pub fn is_arithmetic(&self) -> bool {
        match self {
            Expr::Num(_) | Expr::Sym(_) => true,
            Expr::Call { args, .. } => args.iter().all(Expr::is_arithmetic),
            Expr::Not(_) | Expr::And(_) | Expr::Or(_) | Expr::Rel { .. } => false,
            Expr::Add(terms) | Expr::Mul(terms) => terms.iter().all(Expr::is_arithmetic),
            Expr::Pow { base, exp } => base.is_arithmetic() && exp.is_arithmetic(),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[Expr], sep: &str) -> fmt::Result {
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", operand)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Sym(name) => write!(f, "{}", name),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                write_joined(f, args, ", ")?;
                write!(f, ")")
            }
            Expr::Not(operand) => write!(f, "!({})", operand),
            Expr::And(operands) => {
                write!(f, "(")?;
                write_joined(f, operands, " && ")?;
                write!(f, ")")
            }
            Expr::Or(operands) => {
                write!(f, "(")?;
                write_joined(f, operands, " || ")?;
                write!(f, ")")
            }
            Expr::Rel { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            Expr::Add(terms) => {
                write!(f, "(")?;
                write_joined(f, terms, " + ")?;
                write!(f, ")")
            }
            Expr::Mul(factors) => {
                write!(f, "(")?;
                write_joined(f, factors, "*")?;
                write!(f, ")")
            }
            Expr::Pow { base, exp } => write!(f, "{}^{}", base, exp),
        }
    }
}
