//! Token stream wrapper for the hand-written parser.

use crate::error::ParseError;
use crate::lexer::Token;
use std::ops::Range;

/// Deepest nesting the parser accepts before giving up.
const MAX_DEPTH: usize = 256;

/// Token stream with lookahead and position tracking.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
    source_len: usize,
    depth: usize,
}

impl<'src> TokenStream<'src> {
    pub fn new(tokens: &'src [(Token, Range<usize>)], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
            depth: 0,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&'src Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&'src Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token's kind.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Expect a specific token and advance if it matches.
    pub fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Byte offset of the current token, or the end of input.
    pub fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source_len)
    }

    /// Build an error describing what was found at the current position.
    pub fn error(&self, context: &str) -> ParseError {
        let found = match self.peek() {
            Some(token) => format!("'{token}'"),
            None => "end of input".to_string(),
        };
        ParseError::new(format!("{context}, found {found}"), self.offset())
    }

    /// Enter a nested construct, failing past the nesting limit.
    pub fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::new("expression nested too deeply", self.offset()));
        }
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
