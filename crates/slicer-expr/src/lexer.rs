//! Lexical analysis for value formulas using logos.
//!
//! The token set is the Python expression subset that printer definitions
//! use. Keywords (`if`, `else`, `and`, `or`, `not`, `in`) and the constants
//! `True`, `False`, `None` are reserved; everything else alphanumeric is an
//! [`Token::Ident`].

use crate::error::ParseError;
use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Formula token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // === Keywords ===
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("in")]
    In,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    None,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("//")]
    SlashSlash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    // === Literals ===
    /// Integer literal. Overflowing literals fail to lex.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unquote(lex.slice()))]
    Str(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::If => "if",
            Token::Else => "else",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::In => "in",
            Token::True => "True",
            Token::False => "False",
            Token::None => "None",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::StarStar => "**",
            Token::Slash => "/",
            Token::SlashSlash => "//",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Int(n) => return write!(f, "{n}"),
            Token::Float(x) => return write!(f, "{x}"),
            Token::Str(s) => return write!(f, "{s:?}"),
            Token::Ident(id) => return write!(f, "{id}"),
        };
        f.write_str(text)
    }
}

/// Strip the surrounding quotes and resolve backslash escapes.
///
/// Unknown escapes keep their backslash, matching how the definitions were
/// authored.
fn unquote(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Tokenize a formula, pairing each token with its byte span.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, ParseError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let text = &source[span.clone()];
                return Err(ParseError::new(
                    format!("invalid token '{text}'"),
                    span.start,
                ));
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(
            lex("1 if not flag else None"),
            vec![
                Token::Int(1),
                Token::If,
                Token::Not,
                Token::Ident("flag".into()),
                Token::Else,
                Token::None,
            ]
        );
    }

    #[test]
    fn identifier_with_keyword_prefix() {
        assert_eq!(lex("infill_sparse_density"), vec![Token::Ident("infill_sparse_density".into())]);
        assert_eq!(lex("origin"), vec![Token::Ident("origin".into())]);
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(
            lex("3 0.2 .5 1e3 2."),
            vec![
                Token::Int(3),
                Token::Float(0.2),
                Token::Float(0.5),
                Token::Float(1000.0),
                Token::Float(2.0),
            ]
        );
    }

    #[test]
    fn compound_operators_take_longest_match() {
        assert_eq!(
            lex("a ** b // c <= d"),
            vec![
                Token::Ident("a".into()),
                Token::StarStar,
                Token::Ident("b".into()),
                Token::SlashSlash,
                Token::Ident("c".into()),
                Token::LtEq,
                Token::Ident("d".into()),
            ]
        );
    }

    #[test]
    fn string_literals_with_either_quote() {
        assert_eq!(
            lex(r#"'layer_height' "it\'s""#),
            vec![Token::Str("layer_height".into()), Token::Str("it's".into())]
        );
    }

    #[test]
    fn math_access_is_three_tokens() {
        assert_eq!(
            lex("math.pi"),
            vec![Token::Ident("math".into()), Token::Dot, Token::Ident("pi".into())]
        );
    }

    #[test]
    fn invalid_character_reports_offset() {
        let err = tokenize("a $ b").unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(err.message.contains('$'));
    }
}
