//! AST node for parsed predicates
//!
//! A deliberately uniform tree: each node holds an operator symbol or leaf
//! text plus its owned children. The canonicalizer gives this shape a
//! typed interpretation; the parser only guarantees arity (0 for leaves,
//! 1 for unary operators, 2 for binary operators, argument count for
//! folded call/index leaves).

use std::fmt;

/// A node in the predicate AST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    /// Operator symbol (`&&`, `==`, `+`, …) or leaf text
    pub value: String,
    /// Ordered owned children
    pub children: Vec<AstNode>,
}

impl AstNode {
    /// Create an interior node
    pub fn new(value: impl Into<String>, children: Vec<AstNode>) -> Self {
        Self { value: value.into(), children }
    }

    /// Create a leaf node
    pub fn leaf(value: impl Into<String>) -> Self {
        Self { value: value.into(), children: Vec::new() }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "({}", self.value)?;
            for child in &self.children {
                write!(f, " {}", child)?;
            }
            write!(f, ")")
        }
    }
}
