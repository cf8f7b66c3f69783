use crate::frontend::token::{Token, TokenKind};

/// Read position over a token slice, shared by the bytecode compiler and the
/// tree parser.
///
/// Never moves past the final `Eof`; an empty slice behaves like a lone `Eof`.
pub struct TokenCursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    eof: Token,
}

impl<'t> TokenCursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        let last_line = tokens.last().map(|t| t.line).unwrap_or(1);
        Self {
            tokens,
            pos: 0,
            eof: Token::eof(last_line),
        }
    }

    pub fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    pub fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Kind of the token after the current one.
    pub fn peek_next_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// The most recently consumed token.
    pub fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    /// Index of the current token; used to detect that a rule made progress.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    pub fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it is one of `kinds`.
    pub fn match_any(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.contains(&self.peek_kind()) {
            Some(self.advance())
        } else {
            None
        }
    }
}
