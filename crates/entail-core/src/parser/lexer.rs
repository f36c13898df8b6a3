//! Tokenizer for the predicate grammar
//!
//! Lexes a predicate string into an ordered token sequence by trying an
//! ordered pattern table at each position; the first matching pattern wins.
//! Longest-match is not globally enforced: precedence is encoded by the
//! order of the table itself, so more specific patterns (multi-character
//! operators, domain keywords, fixed-width hex literals, unit-suffixed
//! numbers) must come before their more general prefixes.

use super::token::{Token, TokenKind};
use num::BigInt;
use regex::Regex;
use thiserror::Error;

/// Lex error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("numeric literal '{lexeme}' at position {position} is too large to expand")]
    LiteralOverflow { lexeme: String, position: usize },
}

/// What to do when a pattern matches
enum Rule {
    /// Emit a token of this kind with the matched lexeme
    Emit(TokenKind),
    /// Fold `<n> <unit>` into a single integer token holding seconds
    TimeUnit,
    /// Fold `<m>e<n>` into a single integer token holding the expanded value
    Scientific,
    /// Discard the match (whitespace)
    Skip,
}

/// Tokenizer holding the ordered pattern table
pub struct Tokenizer {
    rules: Vec<(Regex, Rule)>,
}

impl Tokenizer {
    /// Build the pattern table. Order is load-bearing.
    pub fn new() -> Self {
        let table: Vec<(&str, Rule)> = vec![
            // Domain keywords before the generic identifier pattern
            (r"^msg\.sender\b", Rule::Emit(TokenKind::MsgSender)),
            (r"^msg\.origin\b", Rule::Emit(TokenKind::MsgOrigin)),
            (r"^require\b", Rule::Emit(TokenKind::Require)),
            // Multi-character operators before their single-character prefixes
            (r"^==", Rule::Emit(TokenKind::Eq)),
            (r"^!=", Rule::Emit(TokenKind::Ne)),
            (r"^>=", Rule::Emit(TokenKind::Ge)),
            (r"^<=", Rule::Emit(TokenKind::Le)),
            (r"^>", Rule::Emit(TokenKind::Gt)),
            (r"^<", Rule::Emit(TokenKind::Lt)),
            (r"^&&", Rule::Emit(TokenKind::AndAnd)),
            (r"^\|\|", Rule::Emit(TokenKind::OrOr)),
            (r"^!", Rule::Emit(TokenKind::Bang)),
            (r"^&", Rule::Emit(TokenKind::Ampersand)),
            (r"^\?", Rule::Emit(TokenKind::Question)),
            (r"^:", Rule::Emit(TokenKind::Colon)),
            (r"^\(", Rule::Emit(TokenKind::LParen)),
            (r"^\)", Rule::Emit(TokenKind::RParen)),
            (r"^\+", Rule::Emit(TokenKind::Plus)),
            (r"^-", Rule::Emit(TokenKind::Minus)),
            (r"^\*", Rule::Emit(TokenKind::Star)),
            (r"^/", Rule::Emit(TokenKind::Slash)),
            (r"^%", Rule::Emit(TokenKind::Percent)),
            (r"^,", Rule::Emit(TokenKind::Comma)),
            (r"^=", Rule::Emit(TokenKind::Assign)),
            (r"^\[", Rule::Emit(TokenKind::LBracket)),
            (r"^\]", Rule::Emit(TokenKind::RBracket)),
            (r#"^"[^"]*""#, Rule::Emit(TokenKind::Str)),
            // Fixed-width address literals before general hex literals
            (r"^0x[0-9a-fA-F]{40}\b", Rule::Emit(TokenKind::Address)),
            (r"^0x[0-9a-fA-F]+", Rule::Emit(TokenKind::Bytes)),
            // Numeric literals: the folded forms must precede the plain
            // integer pattern or they can never match
            (r"^\d+\.\d+\b", Rule::Emit(TokenKind::Float)),
            (r"^(\d+)\s*(seconds|minutes|hours|days|weeks)\b", Rule::TimeUnit),
            (r"^(\d+)e(\d+)\b", Rule::Scientific),
            (r"^\d+\b", Rule::Emit(TokenKind::Int)),
            (r"^true\b", Rule::Emit(TokenKind::True)),
            (r"^false\b", Rule::Emit(TokenKind::False)),
            (r"^[a-zA-Z_]\w*", Rule::Emit(TokenKind::Ident)),
            // The dot pattern must follow the numeric and keyword patterns
            // that contain literal dots
            (r"^\.", Rule::Emit(TokenKind::Dot)),
            (r"^\s+", Rule::Skip),
        ];

        let rules = table
            .into_iter()
            .map(|(pattern, rule)| {
                // Patterns are fixed at compile time; a failure here is a bug.
                (Regex::new(pattern).unwrap(), rule)
            })
            .collect();

        Self { rules }
    }

    /// Tokenize a predicate string.
    ///
    /// Fails with a [`LexError`] on the first character no pattern matches.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut position = 0;

        while position < input.len() {
            let rest = &input[position..];
            let mut matched = None;

            for (regex, rule) in &self.rules {
                if let Some(caps) = regex.captures(rest) {
                    let whole = caps.get(0).unwrap();
                    debug_assert_eq!(whole.start(), 0);
                    match rule {
                        Rule::Emit(kind) => {
                            tokens.push(Token::new(*kind, whole.as_str(), position));
                        }
                        Rule::TimeUnit => {
                            let count: BigInt = caps[1].parse().unwrap();
                            let unit = seconds_per_unit(&caps[2]);
                            let value = count * unit;
                            tokens.push(Token::new(TokenKind::Int, value.to_string(), position));
                        }
                        Rule::Scientific => {
                            let mantissa: BigInt = caps[1].parse().unwrap();
                            let exponent: u32 = caps[2].parse().map_err(|_| {
                                LexError::LiteralOverflow {
                                    lexeme: whole.as_str().to_string(),
                                    position,
                                }
                            })?;
                            let value = mantissa * BigInt::from(10u8).pow(exponent);
                            tokens.push(Token::new(TokenKind::Int, value.to_string(), position));
                        }
                        Rule::Skip => {}
                    }
                    matched = Some(whole.end());
                    break;
                }
            }

            match matched {
                Some(len) => position += len,
                None => {
                    // rest is non-empty here, so the char exists
                    let character = rest.chars().next().unwrap();
                    return Err(LexError::UnexpectedCharacter { character, position });
                }
            }
        }

        Ok(tokens)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

fn seconds_per_unit(unit: &str) -> u64 {
    match unit {
        "seconds" => 1,
        "minutes" => 60,
        "hours" => 3_600,
        "days" => 86_400,
        "weeks" => 604_800,
        // The pattern only admits the five alternatives above
        _ => unreachable!("unit {unit} not in pattern table"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        let tokens = Tokenizer::new().tokenize("").unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_simple_predicate() {
        let tokens = Tokenizer::new().tokenize("msg.sender == msg.origin").unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::MsgSender, TokenKind::Eq, TokenKind::MsgOrigin]);
        assert_eq!(texts(&tokens), vec!["msg.sender", "==", "msg.origin"]);
    }

    #[test]
    fn test_complex_predicate() {
        let tokens = Tokenizer::new()
            .tokenize("require(msg.sender != msg.origin && balance >= 100)")
            .unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Require,
                TokenKind::LParen,
                TokenKind::MsgSender,
                TokenKind::Ne,
                TokenKind::MsgOrigin,
                TokenKind::AndAnd,
                TokenKind::Ident,
                TokenKind::Ge,
                TokenKind::Int,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_arithmetic_predicate() {
        let tokens = Tokenizer::new().tokenize("c/a==b").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Ident,
                TokenKind::Slash,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn test_index_access() {
        let tokens = Tokenizer::new().tokenize("value<=_balances[from]").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Ident,
                TokenKind::Le,
                TokenKind::Ident,
                TokenKind::LBracket,
                TokenKind::Ident,
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn test_multi_char_before_single_char() {
        let tokens = Tokenizer::new().tokenize("a >= b <= c != d == e").unwrap();
        assert_eq!(
            kinds(&tokens)
                .into_iter()
                .filter(|k| k.is_comparison())
                .collect::<Vec<_>>(),
            vec![TokenKind::Ge, TokenKind::Le, TokenKind::Ne, TokenKind::Eq]
        );
    }

    #[test]
    fn test_logical_operators() {
        let tokens = Tokenizer::new().tokenize("a && b || !c & d").unwrap();
        let ops: Vec<TokenKind> =
            kinds(&tokens).into_iter().filter(|k| *k != TokenKind::Ident).collect();
        assert_eq!(
            ops,
            vec![TokenKind::AndAnd, TokenKind::OrOr, TokenKind::Bang, TokenKind::Ampersand]
        );
    }

    #[test]
    fn test_time_unit_folds_to_integer() {
        let tokens = Tokenizer::new().tokenize("elapsed >= 7 days").unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Ident, TokenKind::Ge, TokenKind::Int]);
        assert_eq!(tokens[2].text, "604800");
    }

    #[test]
    fn test_all_time_units() {
        let cases = [
            ("30 seconds", "30"),
            ("5 minutes", "300"),
            ("2 hours", "7200"),
            ("1 days", "86400"),
            ("3 weeks", "1814400"),
        ];
        let tokenizer = Tokenizer::new();
        for (input, expected) in cases {
            let tokens = tokenizer.tokenize(input).unwrap();
            assert_eq!(tokens.len(), 1, "{input}");
            assert_eq!(tokens[0].kind, TokenKind::Int);
            assert_eq!(tokens[0].text, expected);
        }
    }

    #[test]
    fn test_scientific_notation_folds_to_integer() {
        let tokens = Tokenizer::new().tokenize("supply == 1e3").unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Ident, TokenKind::Eq, TokenKind::Int]);
        assert_eq!(tokens[2].text, "1000");
    }

    #[test]
    fn test_float_literal() {
        let tokens = Tokenizer::new().tokenize("rate > 0.5").unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Ident, TokenKind::Gt, TokenKind::Float]);
        assert_eq!(tokens[2].text, "0.5");
    }

    #[test]
    fn test_address_literal() {
        let addr = "0x52908400098527886E0F7030069857D2E4169EE7";
        let tokens = Tokenizer::new().tokenize(addr).unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Address]);
    }

    #[test]
    fn test_bytes_literal() {
        let tokens = Tokenizer::new().tokenize("salt != 0x1f2f").unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Ident, TokenKind::Ne, TokenKind::Bytes]);
    }

    #[test]
    fn test_address_width_is_exact() {
        // 41 hex digits: not an address, falls through to the bytes pattern
        let tokens = Tokenizer::new()
            .tokenize("0x52908400098527886E0F7030069857D2E4169EE7a")
            .unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Bytes]);
    }

    #[test]
    fn test_boolean_literals() {
        let tokens = Tokenizer::new().tokenize("flag == true || done == false").unwrap();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::True));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::False));
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        // "requirement" must not lex as the `require` keyword plus "ment"
        let tokens = Tokenizer::new().tokenize("requirement > 0").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "requirement");
        // Same for "truely"
        let tokens = Tokenizer::new().tokenize("truely").unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Ident]);
    }

    #[test]
    fn test_whitespace_discarded() {
        let tokens = Tokenizer::new().tokenize("  a\t ==\t\tb ").unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Ident, TokenKind::Eq, TokenKind::Ident]);
    }

    #[test]
    fn test_positions() {
        let tokens = Tokenizer::new().tokenize("a == b").unwrap();
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].position, 2);
        assert_eq!(tokens[2].position, 5);
    }

    #[test]
    fn test_unexpected_character() {
        let err = Tokenizer::new().tokenize("a @ b").unwrap_err();
        assert_eq!(err, LexError::UnexpectedCharacter { character: '@', position: 2 });
    }

    #[test]
    fn test_string_literal() {
        let tokens = Tokenizer::new().tokenize(r#"name == "alice""#).unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Ident, TokenKind::Eq, TokenKind::Str]);
        assert_eq!(tokens[2].text, r#""alice""#);
    }

    #[test]
    fn test_dot_after_identifier() {
        let tokens = Tokenizer::new().tokenize("block.timestamp").unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Ident, TokenKind::Dot, TokenKind::Ident]);
    }
}
