/// The kinds of syntax error the compiler (and the tree parser) can report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileErrorKind {
    /// A required punctuation token was missing, e.g. the statement `;`.
    #[error("expected {expected} {context}")]
    MissingCharacter {
        expected: &'static str,
        context: &'static str,
    },

    #[error("expected an expression")]
    ExpectedExpression,

    #[error("expected a variable name")]
    ExpectedVariableName,

    #[error("expected a type name (int, double or bool)")]
    ExpectedTypeName,

    #[error("invalid assignment target")]
    InvalidAssignmentTarget,

    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("variable '{0}' is already declared in this scope")]
    AlreadyDeclared(String),

    #[error("cannot read local variable '{0}' in its own initializer")]
    ReadInOwnInitializer(String),

    #[error("too many local variables in one scope (limit {limit})")]
    TooManyLocals { limit: usize },

    /// An error token produced by the lexer.
    #[error("{0}")]
    Lexical(String),

    /// Internal compiler error (shouldn't happen in normal use)
    #[error("internal error: {0}")]
    Internal(String),
}

impl CompileErrorKind {
    pub fn missing(expected: &'static str, context: &'static str) -> Self {
        CompileErrorKind::MissingCharacter { expected, context }
    }

    /// Category label shown in diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            CompileErrorKind::MissingCharacter { .. } => "Missing Character",
            CompileErrorKind::Lexical(_) => "Lexical Error",
            CompileErrorKind::Internal(_) => "Internal Error",
            _ => "Syntax Error",
        }
    }
}

/// A syntax error with the line and text of the offending token.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub line: usize,
    /// Offending token text; empty when the token has no meaningful text.
    pub lexeme: String,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, line: usize, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            lexeme: lexeme.into(),
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[line {}] {}", self.line, self.kind.category())?;
        if !self.lexeme.is_empty() {
            write!(f, " at '{}'", self.lexeme)?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for CompileError {}
