//! Tokenizer and recursive-descent parser for the predicate grammar

mod lexer;
mod parse;
mod token;

pub use lexer::{LexError, Tokenizer};
pub use parse::{ParseError, ParseResult, Parser};
pub use token::{Token, TokenKind};
