//! Pratt parser core - precedence climbing for binary and unary operators.

use super::atoms;
use super::stream::TokenStream;
use crate::ast::{BinaryOp, BoolOp, CompareOp, Expr, UnaryOp};
use crate::error::ParseError;
use crate::lexer::Token;

const PREC_OR: u8 = 10;
const PREC_AND: u8 = 20;
const PREC_NOT: u8 = 30;
const PREC_COMPARE: u8 = 40;
const PREC_POW: u8 = 70;
const PREC_UNARY: u8 = 60;

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Infix operator classes sharing one precedence table.
#[derive(Debug, Clone, Copy)]
enum Infix {
    Arith(BinaryOp),
    Logic(BoolOp),
    Compare(CompareOp),
}

/// Get infix operator metadata at the current position.
///
/// Returns (precedence, associativity, operator, token count) where higher
/// precedence binds tighter. `not in` spans two tokens.
fn infix_info(stream: &TokenStream) -> Option<(u8, Assoc, Infix, usize)> {
    let info = match stream.peek()? {
        Token::Or => (PREC_OR, Assoc::Left, Infix::Logic(BoolOp::Or), 1),
        Token::And => (PREC_AND, Assoc::Left, Infix::Logic(BoolOp::And), 1),
        Token::EqEq => (PREC_COMPARE, Assoc::Left, Infix::Compare(CompareOp::Eq), 1),
        Token::BangEq => (PREC_COMPARE, Assoc::Left, Infix::Compare(CompareOp::Ne), 1),
        Token::Lt => (PREC_COMPARE, Assoc::Left, Infix::Compare(CompareOp::Lt), 1),
        Token::LtEq => (PREC_COMPARE, Assoc::Left, Infix::Compare(CompareOp::Le), 1),
        Token::Gt => (PREC_COMPARE, Assoc::Left, Infix::Compare(CompareOp::Gt), 1),
        Token::GtEq => (PREC_COMPARE, Assoc::Left, Infix::Compare(CompareOp::Ge), 1),
        Token::In => (PREC_COMPARE, Assoc::Left, Infix::Compare(CompareOp::In), 1),
        Token::Not if matches!(stream.peek_nth(1), Some(Token::In)) => {
            (PREC_COMPARE, Assoc::Left, Infix::Compare(CompareOp::NotIn), 2)
        }
        Token::Plus => (50, Assoc::Left, Infix::Arith(BinaryOp::Add), 1),
        Token::Minus => (50, Assoc::Left, Infix::Arith(BinaryOp::Sub), 1),
        Token::Star => (55, Assoc::Left, Infix::Arith(BinaryOp::Mul), 1),
        Token::Slash => (55, Assoc::Left, Infix::Arith(BinaryOp::Div), 1),
        Token::SlashSlash => (55, Assoc::Left, Infix::Arith(BinaryOp::FloorDiv), 1),
        Token::Percent => (55, Assoc::Left, Infix::Arith(BinaryOp::Mod), 1),
        Token::StarStar => (PREC_POW, Assoc::Right, Infix::Arith(BinaryOp::Pow), 1),
        _ => return None,
    };
    Some(info)
}

/// Pratt parser - handles infix operators with precedence climbing.
pub(super) fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    stream.enter()?;
    let mut left = parse_prefix(stream)?;

    while let Some((prec, assoc, infix, width)) = infix_info(stream) {
        if prec < min_prec {
            break;
        }
        for _ in 0..width {
            stream.advance();
        }

        let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
        left = match infix {
            Infix::Arith(op) => {
                // `2 ** -1` is valid: the right operand of `**` may be unary
                let right = if op == BinaryOp::Pow {
                    parse_power_operand(stream)?
                } else {
                    parse_pratt(stream, next_prec)?
                };
                Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            Infix::Logic(op) => {
                let right = parse_pratt(stream, next_prec)?;
                Expr::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            Infix::Compare(op) => parse_comparison_chain(stream, left, op)?,
        };
    }

    stream.leave();
    Ok(left)
}

/// Collect `a < b <= c` into one chained comparison node.
fn parse_comparison_chain(
    stream: &mut TokenStream,
    first: Expr,
    first_op: CompareOp,
) -> Result<Expr, ParseError> {
    let mut rest = vec![(first_op, parse_pratt(stream, PREC_COMPARE + 1)?)];

    while let Some((PREC_COMPARE, _, Infix::Compare(op), width)) = infix_info(stream) {
        for _ in 0..width {
            stream.advance();
        }
        rest.push((op, parse_pratt(stream, PREC_COMPARE + 1)?));
    }

    Ok(Expr::Compare {
        first: Box::new(first),
        rest,
    })
}

fn parse_power_operand(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek() {
        Some(Token::Minus) | Some(Token::Plus) => parse_unary(stream),
        _ => parse_pratt(stream, PREC_POW),
    }
}

/// Parse prefix expressions (unary operators, atoms).
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek() {
        Some(Token::Minus) | Some(Token::Plus) => parse_unary(stream),
        Some(Token::Not) => {
            stream.advance();
            let operand = parse_pratt(stream, PREC_NOT)?;
            Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            })
        }
        _ => atoms::parse_postfix(stream),
    }
}

/// Parse arithmetic unary operators.
fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let op = match stream.advance() {
        Some(Token::Minus) => UnaryOp::Neg,
        Some(Token::Plus) => UnaryOp::Pos,
        _ => return Err(stream.error("expected unary operator")),
    };

    let operand = parse_pratt(stream, PREC_UNARY)?;
    Ok(Expr::Unary {
        op,
        operand: Box::new(operand),
    })
}
