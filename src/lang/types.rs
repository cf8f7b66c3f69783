use crate::frontend::token::TokenKind;

/// Static type of an expression, as computed by the type checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Integer,
    Double,
    Boolean,
    Null,

    /// An expression that already failed to check. Operations on it yield
    /// `Error` again without reporting anything new.
    Error,
}

impl PrimitiveType {
    /// Type named by a declaration's annotation token (`int`, `double`, `bool`).
    pub fn from_annotation(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::TypeInt => Some(PrimitiveType::Integer),
            TokenKind::TypeDouble => Some(PrimitiveType::Double),
            TokenKind::TypeBool => Some(PrimitiveType::Boolean),
            _ => None,
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrimitiveType::Integer => "int",
            PrimitiveType::Double => "double",
            PrimitiveType::Boolean => "bool",
            PrimitiveType::Null => "null",
            PrimitiveType::Error => "<error>",
        };
        write!(f, "{}", name)
    }
}
