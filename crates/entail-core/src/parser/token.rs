//! Token definitions for the predicate grammar

use std::fmt;

/// A token with its source lexeme and byte position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The lexeme. For folded literals (time units, scientific notation)
    /// this holds the expanded integer value, not the source text.
    pub text: String,
    /// Byte offset into the predicate string (0-indexed)
    pub position: usize,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self { kind, text: text.into(), position }
    }
}

/// The closed set of token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Domain keywords
    MsgSender,
    MsgOrigin,
    Require,

    // Comparison operators
    Eq,   // ==
    Ne,   // !=
    Ge,   // >=
    Le,   // <=
    Gt,   // >
    Lt,   // <

    // Logical operators
    AndAnd, // &&
    OrOr,   // ||
    Bang,   // !

    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Other operators
    Ampersand,
    Question,
    Colon,
    Assign,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,

    // Literals
    Int,
    Float,
    Str,
    Address,
    Bytes,
    True,
    False,

    // Identifiers
    Ident,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::MsgSender => "msg.sender",
            TokenKind::MsgOrigin => "msg.origin",
            TokenKind::Require => "require",
            TokenKind::Eq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Ge => ">=",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Lt => "<",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Bang => "!",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Ampersand => "&",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Assign => "=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Str => "string literal",
            TokenKind::Address => "address literal",
            TokenKind::Bytes => "bytes literal",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Ident => "identifier",
        };
        write!(f, "{}", s)
    }
}

impl TokenKind {
    /// Check if this token is a domain keyword
    pub fn is_keyword(&self) -> bool {
        matches!(self, TokenKind::MsgSender | TokenKind::MsgOrigin | TokenKind::Require)
    }

    /// Check if this token is a comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::Ne
                | TokenKind::Ge
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Lt
        )
    }

    /// Check if this token is a literal
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Str
                | TokenKind::Address
                | TokenKind::Bytes
                | TokenKind::True
                | TokenKind::False
        )
    }
}
