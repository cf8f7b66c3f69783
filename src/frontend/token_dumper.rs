use std::fmt::Write;

use crate::frontend::token::{Token, TokenKind};

/// Renders a token stream, one token per line, for `pulsar tokens` and the
/// debug dump.
pub struct TokenDumper {
    pub color: bool,
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self { color: true }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const RED: &'static str = "\x1b[31m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn dump(&self, tokens: &[Token]) -> String {
        let mut output = String::new();
        for token in tokens {
            self.dump_one(&mut output, token);
        }
        output
    }

    fn dump_one(&self, output: &mut String, token: &Token) {
        let colr = if self.color { Self::color(token.kind) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };

        let _ = match (&token.literal, token.kind) {
            (Some(message), TokenKind::Error) => writeln!(
                output,
                "[{:03}] {}{:<16} {}{}",
                token.line,
                colr,
                token.kind.name(),
                message,
                reset
            ),
            (Some(text), _) => writeln!(
                output,
                "[{:03}] {}{:<16} '{}'{}",
                token.line,
                colr,
                token.kind.name(),
                text,
                reset
            ),
            (None, _) => writeln!(
                output,
                "[{:03}] {}{}{}",
                token.line,
                colr,
                token.kind.name(),
                reset
            ),
        };
    }

    fn color(kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Eof => Self::DIM,
            Error => Self::RED,
            Integer | Double | True | False | Null => Self::CYN,
            Identifier => Self::YEL,
            Var | Print | If | Else | While | TypeInt | TypeDouble | TypeBool => Self::MAG,
            _ => Self::RESET,
        }
    }
}
