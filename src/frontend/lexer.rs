use crate::frontend::token::{Token, TokenKind};

/// Turn source text into tokens.
///
/// Never fails: lexical problems become [`TokenKind::Error`] tokens carrying
/// the message, and the result always ends with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
        }
        self.pos += 1;
        ch
    }

    /// Skip whitespace, newlines and `//` comments.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek() == Some('/') => {
                    while let Some(ch) = self.current() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let line = self.line;
        let mut digits = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot {
                // Only a decimal point if a digit follows
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    has_dot = true;
                    digits.push('.');
                    self.advance();
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        if has_dot {
            return Token::with_literal(TokenKind::Double, digits, line);
        }

        // The compiler relies on integer literals fitting in an i64.
        if digits.parse::<i64>().is_err() {
            return Token::with_literal(
                TokenKind::Error,
                format!("integer literal '{}' is out of range", digits),
                line,
            );
        }

        Token::with_literal(TokenKind::Integer, digits, line)
    }

    fn read_identifier(&mut self) -> Token {
        let line = self.line;
        let mut ident = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match ident.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "var" => TokenKind::Var,
            "print" => TokenKind::Print,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "int" => TokenKind::TypeInt,
            "double" => TokenKind::TypeDouble,
            "bool" => TokenKind::TypeBool,
            _ => return Token::with_literal(TokenKind::Identifier, ident, line),
        };

        Token::new(kind, line)
    }

    fn read_operator(&mut self) -> Token {
        let line = self.line;
        let ch = self.advance().unwrap_or('\0');
        let next = self.current();

        let (kind, wide) = match (ch, next) {
            ('!', Some('=')) => (TokenKind::BangEqual, true),
            ('=', Some('=')) => (TokenKind::EqualEqual, true),
            ('<', Some('=')) => (TokenKind::LessEqual, true),
            ('>', Some('=')) => (TokenKind::GreaterEqual, true),
            ('&', Some('&')) => (TokenKind::AndAnd, true),
            ('|', Some('|')) => (TokenKind::OrOr, true),
            ('(', _) => (TokenKind::LeftParen, false),
            (')', _) => (TokenKind::RightParen, false),
            ('{', _) => (TokenKind::LeftBrace, false),
            ('}', _) => (TokenKind::RightBrace, false),
            (':', _) => (TokenKind::Colon, false),
            (';', _) => (TokenKind::Semicolon, false),
            ('+', _) => (TokenKind::Plus, false),
            ('-', _) => (TokenKind::Minus, false),
            ('*', _) => (TokenKind::Star, false),
            ('/', _) => (TokenKind::Slash, false),
            ('%', _) => (TokenKind::Percent, false),
            ('!', _) => (TokenKind::Bang, false),
            ('=', _) => (TokenKind::Equal, false),
            ('<', _) => (TokenKind::Less, false),
            ('>', _) => (TokenKind::Greater, false),
            _ => {
                return Token::with_literal(
                    TokenKind::Error,
                    format!("unexpected character '{}'", ch),
                    line,
                );
            }
        };

        if wide {
            self.advance();
        }
        Token::new(kind, line)
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia();

            let token = match self.current() {
                None => {
                    tokens.push(Token::eof(self.line));
                    break;
                }
                Some(ch) if ch.is_ascii_digit() => self.read_number(),
                Some(ch) if ch.is_alphabetic() || ch == '_' => self.read_identifier(),
                Some(_) => self.read_operator(),
            };
            tokens.push(token);
        }

        tokens
    }
}
