//! Formula parser using Pratt parsing (precedence climbing).
//!
//! ## Precedence Levels (lowest to highest)
//!
//! 1. `x if c else y` - conditional, right associative
//! 2. `or`
//! 3. `and`
//! 4. `not` - prefix
//! 5. `== != < <= > >= in, not in` - chained comparisons
//! 6. `+`, `-`
//! 7. `*`, `/`, `//`, `%`
//! 8. Unary `-`, `+` - prefix
//! 9. `**` - right associative
//! 10. Postfix: `(args)`, `[index]`, `math.name`

mod atoms;
mod pratt;
mod stream;

use crate::ast::Expr;
use crate::error::ParseError;
use crate::lexer::{Token, tokenize};
use stream::TokenStream;

/// Longest formula accepted, in tokens.
///
/// Operator chains such as `1 + 1 + ... + 1` are built in a loop rather than
/// by recursion, so the nesting limit alone does not bound the tree depth.
/// Capping the token count does.
pub const MAX_TOKENS: usize = 512;

/// Parse a complete formula.
///
/// The whole input must be consumed; trailing tokens are an error.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::new("empty expression", 0));
    }
    if tokens.len() > MAX_TOKENS {
        return Err(ParseError::new(
            format!("expression too long ({} tokens, limit {MAX_TOKENS})", tokens.len()),
            tokens[MAX_TOKENS].1.start,
        ));
    }

    let mut stream = TokenStream::new(&tokens, source.len());
    let expr = parse_expr(&mut stream)?;
    if !stream.at_end() {
        return Err(stream.error("expected end of expression"));
    }
    Ok(expr)
}

/// Parse an expression including the conditional form.
fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    stream.enter()?;
    let body = pratt::parse_pratt(stream, 0)?;

    let expr = if stream.check(&Token::If) {
        stream.advance();
        let test = pratt::parse_pratt(stream, 0)?;
        stream.expect(Token::Else)?;
        let orelse = parse_expr(stream)?;
        Expr::Conditional {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        }
    } else {
        body
    };

    stream.leave();
    Ok(expr)
}
