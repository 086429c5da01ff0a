//! Atomic and postfix expressions - literals, names, lists, calls, subscripts.

use super::parse_expr;
use super::stream::TokenStream;
use crate::ast::{Callee, Expr};
use crate::error::ParseError;
use crate::lexer::Token;

/// The one namespace that supports dotted access.
const MATH_MODULE: &str = "math";

/// Parse postfix expressions (calls, subscripts, `math.name`).
pub(super) fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut expr = parse_atom(stream)?;

    loop {
        match stream.peek() {
            Some(Token::Dot) => {
                let offset = stream.offset();
                if !matches!(&expr, Expr::Name(n) if n == MATH_MODULE) {
                    return Err(ParseError::new("attribute access is not supported", offset));
                }
                stream.advance();
                let attr = match stream.advance() {
                    Some(Token::Ident(id)) => id.clone(),
                    _ => return Err(ParseError::new("expected name after 'math.'", offset)),
                };
                expr = if stream.check(&Token::LParen) {
                    Expr::Call {
                        callee: Callee::Math(attr),
                        args: parse_call_args(stream)?,
                    }
                } else {
                    Expr::MathAttr(attr)
                };
            }
            Some(Token::LParen) => {
                let callee = match &expr {
                    Expr::Name(n) => Callee::Name(n.clone()),
                    _ => return Err(stream.error("only named functions can be called")),
                };
                expr = Expr::Call {
                    callee,
                    args: parse_call_args(stream)?,
                };
            }
            Some(Token::LBracket) => {
                stream.advance();
                let index = parse_expr(stream)?;
                stream.expect(Token::RBracket)?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            }
            _ => break,
        }
    }

    Ok(expr)
}

/// Parse atomic expressions (literals, names, lists, parenthesized).
fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let expr = match stream.peek() {
        Some(Token::True) => Expr::Bool(true),
        Some(Token::False) => Expr::Bool(false),
        Some(Token::None) => Expr::None,
        Some(Token::Int(n)) => Expr::Int(*n),
        Some(Token::Float(x)) => Expr::Float(*x),
        Some(Token::Str(s)) => {
            // Adjacent string literals concatenate
            let mut text = s.clone();
            stream.advance();
            while let Some(Token::Str(next)) = stream.peek() {
                text.push_str(next);
                stream.advance();
            }
            return Ok(Expr::Str(text));
        }
        Some(Token::Ident(id)) => Expr::Name(id.clone()),
        Some(Token::LBracket) => return parse_sequence(stream, Token::LBracket, Token::RBracket),
        Some(Token::LParen) => return parse_parenthesized(stream),
        _ => return Err(stream.error("expected expression")),
    };
    stream.advance();
    Ok(expr)
}

/// Parse `( expr )`; a comma makes it a tuple, which is treated as a list.
fn parse_parenthesized(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    if matches!(stream.peek_nth(1), Some(Token::RParen)) {
        stream.advance();
        stream.advance();
        return Ok(Expr::List(Vec::new()));
    }

    stream.expect(Token::LParen)?;
    let first = parse_expr(stream)?;
    if stream.check(&Token::RParen) {
        stream.advance();
        return Ok(first);
    }

    let mut items = vec![first];
    while stream.check(&Token::Comma) {
        stream.advance();
        if stream.check(&Token::RParen) {
            break;
        }
        items.push(parse_expr(stream)?);
    }
    stream.expect(Token::RParen)?;
    Ok(Expr::List(items))
}

/// Parse a delimited, comma-separated sequence with optional trailing comma.
fn parse_sequence(stream: &mut TokenStream, open: Token, close: Token) -> Result<Expr, ParseError> {
    stream.expect(open)?;
    let mut items = Vec::new();
    while !stream.check(&close) {
        items.push(parse_expr(stream)?);
        if !stream.check(&close) {
            stream.expect(Token::Comma)?;
        }
    }
    stream.expect(close)?;
    Ok(Expr::List(items))
}

/// Parse function call arguments.
fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    match parse_sequence(stream, Token::LParen, Token::RParen)? {
        Expr::List(args) => Ok(args),
        _ => Err(stream.error("expected argument list")),
    }
}
