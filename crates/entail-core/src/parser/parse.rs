//! Recursive-descent parser for the predicate grammar

use super::token::{Token, TokenKind};
use crate::ast::AstNode;
use thiserror::Error;

/// Syntax error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token '{got}' at position {position}, expected {expected}")]
    UnexpectedToken { expected: String, got: String, position: usize },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parser over a token sequence.
///
/// Precedence, low to high: `&&`/`||` (one level, left-chained), `==`/`!=`,
/// `>`/`<`/`>=`/`<=`, `+`/`-`, `*`/`/`/`%`, unary `!`/`+`/`-`, primary.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a parser from a token sequence
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, position: 0 }
    }

    /// Parse the full token sequence into an AST.
    ///
    /// Trailing tokens after a complete expression are a syntax error.
    pub fn parse(&mut self) -> ParseResult<AstNode> {
        self.position = 0;
        let node = self.expression()?;
        if let Some(token) = self.peek() {
            return Err(ParseError::UnexpectedToken {
                expected: "end of input".to_string(),
                got: token.text.clone(),
                position: token.position,
            });
        }
        Ok(node)
    }

    /// expression := equality (("&&" | "||") equality)*
    ///
    /// Both connectives share one precedence level and chain left, so
    /// `a && b || c` parses as `(a && b) || c`.
    fn expression(&mut self) -> ParseResult<AstNode> {
        let mut node = self.equality()?;
        while let Some(op) = self.match_any(&[TokenKind::AndAnd, TokenKind::OrOr]) {
            let right = self.equality()?;
            node = AstNode::new(op, vec![node, right]);
        }
        Ok(node)
    }

    /// equality := relational (("==" | "!=") relational)*
    fn equality(&mut self) -> ParseResult<AstNode> {
        let mut node = self.relational()?;
        while let Some(op) = self.match_any(&[TokenKind::Eq, TokenKind::Ne]) {
            let right = self.relational()?;
            node = AstNode::new(op, vec![node, right]);
        }
        Ok(node)
    }

    /// relational := additive ((">" | "<" | ">=" | "<=") additive)*
    fn relational(&mut self) -> ParseResult<AstNode> {
        let mut node = self.additive()?;
        while let Some(op) =
            self.match_any(&[TokenKind::Gt, TokenKind::Lt, TokenKind::Ge, TokenKind::Le])
        {
            let right = self.additive()?;
            node = AstNode::new(op, vec![node, right]);
        }
        Ok(node)
    }

    /// additive := term (("+" | "-") term)*
    fn additive(&mut self) -> ParseResult<AstNode> {
        let mut node = self.term()?;
        while let Some(op) = self.match_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let right = self.term()?;
            node = AstNode::new(op, vec![node, right]);
        }
        Ok(node)
    }

    /// term := unary (("*" | "/" | "%") unary)*
    fn term(&mut self) -> ParseResult<AstNode> {
        let mut node = self.unary()?;
        while let Some(op) =
            self.match_any(&[TokenKind::Star, TokenKind::Slash, TokenKind::Percent])
        {
            let right = self.unary()?;
            node = AstNode::new(op, vec![node, right]);
        }
        Ok(node)
    }

    /// unary := ("!" | "+" | "-") unary | primary
    fn unary(&mut self) -> ParseResult<AstNode> {
        if let Some(op) = self.match_any(&[TokenKind::Bang, TokenKind::Plus, TokenKind::Minus]) {
            let operand = self.unary()?;
            return Ok(AstNode::new(op, vec![operand]));
        }
        self.primary()
    }

    /// primary := "(" expression ")" | literal | path-leaf postfix*
    fn primary(&mut self) -> ParseResult<AstNode> {
        let token = self.peek().cloned().ok_or_else(|| ParseError::UnexpectedEnd {
            expected: "expression".to_string(),
        })?;

        match token.kind {
            TokenKind::LParen => {
                self.advance();
                let node = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(node)
            }
            // Literals that never take postfix chains
            TokenKind::True
            | TokenKind::False
            | TokenKind::Address
            | TokenKind::Bytes
            | TokenKind::Str => {
                self.advance();
                Ok(AstNode::leaf(token.text))
            }
            // Leaves that may start a postfix chain
            TokenKind::Ident
            | TokenKind::MsgSender
            | TokenKind::MsgOrigin
            | TokenKind::Require
            | TokenKind::Int
            | TokenKind::Float => {
                self.advance();
                self.postfix(AstNode::leaf(token.text))
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                got: token.text,
                position: token.position,
            }),
        }
    }

    /// Fold a postfix chain into a single leaf whose textual value encodes
    /// the access path. Member access extends the name; indexing and call
    /// syntax append `[]`/`()` to the name and retain their argument
    /// subtrees as children, keeping the application atomic for the
    /// implication engine.
    fn postfix(&mut self, mut node: AstNode) -> ParseResult<AstNode> {
        loop {
            match self.peek().map(|t| t.kind) {
                Some(TokenKind::Dot) => {
                    self.advance();
                    let member = self.expect(TokenKind::Ident)?;
                    node = AstNode::new(format!("{}.{}", node.value, member.text), node.children);
                }
                Some(TokenKind::LBracket) => {
                    self.advance();
                    let index = self.expression()?;
                    self.expect(TokenKind::RBracket)?;
                    let mut children = node.children;
                    children.push(index);
                    node = AstNode::new(format!("{}[]", node.value), children);
                }
                Some(TokenKind::LParen) => {
                    self.advance();
                    let mut children = node.children;
                    if !self.check(TokenKind::RParen) {
                        loop {
                            children.push(self.expression()?);
                            if self.check(TokenKind::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    node = AstNode::new(format!("{}()", node.value), children);
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().map(|t| t.kind == kind).unwrap_or(false)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Consume and return the operator lexeme if the next token is one of
    /// `kinds`
    fn match_any(&mut self, kinds: &[TokenKind]) -> Option<String> {
        let token = self.peek()?;
        if kinds.contains(&token.kind) {
            let text = token.text.clone();
            self.advance();
            Some(text)
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.advance();
                Ok(token)
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: kind.to_string(),
                got: token.text.clone(),
                position: token.position,
            }),
            None => Err(ParseError::UnexpectedEnd { expected: kind.to_string() }),
        }
    }
}
