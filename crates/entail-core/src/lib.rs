//! Decides whether two boolean/arithmetic predicates, written in a
//! restricted C-like expression grammar, are logically equivalent, whether
//! one strictly entails the other, or neither.
//!
//! Pipeline: predicate string -> tokens -> AST -> canonical symbolic
//! expression -> implication engine -> four-way verdict.

pub mod ast;
pub mod engine;
pub mod expr;
pub mod lower;
pub mod parser;
pub mod simplify;
pub mod solver;
pub mod trace;

pub use ast::AstNode;
pub use engine::{Comparator, Verdict};
pub use expr::{Expr, RelOp};
pub use trace::{Component, LogSink, Silent, TraceConfig, TraceSink};

use thiserror::Error;

/// Failures surfaced by the comparison pipeline.
///
/// Lexing, parsing, and lowering failures for either predicate are fatal
/// and propagate verbatim; no default verdict is ever substituted. Solver
/// and simplifier failures are recovered inside the implication engine and
/// never reach this level.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] parser::LexError),

    #[error(transparent)]
    Syntax(#[from] parser::ParseError),

    #[error(transparent)]
    Lower(#[from] lower::LowerError),
}

pub type Result<T> = std::result::Result<T, Error>;
