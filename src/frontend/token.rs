/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Colon,
    Semicolon,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Comparison and logic
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    AndAnd,
    OrOr,

    // Literals
    Identifier,
    Integer,
    Double,
    True,
    False,
    Null,

    // Keywords
    Var,
    Print,
    If,
    Else,
    While,

    // Type names
    TypeInt,
    TypeDouble,
    TypeBool,

    // Special
    Error,
    Eof,
}

impl TokenKind {
    /// Name used by the token dumper, in the `TK_*` style.
    pub fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            LeftParen => "TK_LPAREN",
            RightParen => "TK_RPAREN",
            LeftBrace => "TK_LBRACE",
            RightBrace => "TK_RBRACE",
            Colon => "TK_COLON",
            Semicolon => "TK_SEMICOLON",
            Plus => "TK_PLUS",
            Minus => "TK_MINUS",
            Star => "TK_MULTIPLICATION",
            Slash => "TK_DIVISION",
            Percent => "TK_MODULUS",
            Bang => "TK_NOT",
            BangEqual => "TK_NOTEQUAL",
            Equal => "TK_EQUAL",
            EqualEqual => "TK_EQUALEQUAL",
            Greater => "TK_GT",
            GreaterEqual => "TK_GTEQUAL",
            Less => "TK_LT",
            LessEqual => "TK_LTEQUAL",
            AndAnd => "TK_LOGICALAND",
            OrOr => "TK_LOGICALOR",
            Identifier => "TK_IDENTIFIER",
            Integer => "TK_INTEGER",
            Double => "TK_DOUBLE",
            True => "TK_TRUE",
            False => "TK_FALSE",
            Null => "TK_NULL",
            Var => "TK_VAR",
            Print => "TK_PRINT",
            If => "TK_IF",
            Else => "TK_ELSE",
            While => "TK_WHILE",
            TypeInt => "TK_INT",
            TypeDouble => "TK_DOUBLE_TYPE",
            TypeBool => "TK_BOOL",
            Error => "TK_ERROR",
            Eof => "TK_EOF",
        }
    }

    /// Keywords that can only begin a statement. Used as resync points.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Var | TokenKind::Print | TokenKind::If | TokenKind::While
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::Double
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A lexed token.
///
/// `literal` holds the source text for numbers and identifiers, and the
/// diagnostic message for [`TokenKind::Error`] tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Option<String>,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize) -> Self {
        Self {
            kind,
            literal: None,
            line,
        }
    }

    pub fn with_literal(kind: TokenKind, literal: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            literal: Some(literal.into()),
            line,
        }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenKind::Eof, line)
    }

    /// Text used when pointing at this token in a diagnostic.
    pub fn lexeme(&self) -> String {
        match (&self.literal, self.kind) {
            (_, TokenKind::Eof) => "end".to_string(),
            (_, TokenKind::Error) => String::new(),
            (Some(text), _) => text.clone(),
            (None, kind) => fixed_lexeme(kind).to_string(),
        }
    }
}

fn fixed_lexeme(kind: TokenKind) -> &'static str {
    use TokenKind::*;
    match kind {
        LeftParen => "(",
        RightParen => ")",
        LeftBrace => "{",
        RightBrace => "}",
        Colon => ":",
        Semicolon => ";",
        Plus => "+",
        Minus => "-",
        Star => "*",
        Slash => "/",
        Percent => "%",
        Bang => "!",
        BangEqual => "!=",
        Equal => "=",
        EqualEqual => "==",
        Greater => ">",
        GreaterEqual => ">=",
        Less => "<",
        LessEqual => "<=",
        AndAnd => "&&",
        OrOr => "||",
        True => "true",
        False => "false",
        Null => "null",
        Var => "var",
        Print => "print",
        If => "if",
        Else => "else",
        While => "while",
        TypeInt => "int",
        TypeDouble => "double",
        TypeBool => "bool",
        Identifier | Integer | Double | Error | Eof => "",
    }
}
