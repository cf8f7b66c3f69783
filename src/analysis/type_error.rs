use crate::lang::types::PrimitiveType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeErrorKind {
    #[error("bool operands may not be used with '{op}'")]
    BooleanOperand { op: &'static str },

    #[error("null operands may not be used with '{op}'")]
    NullOperand { op: &'static str },

    #[error("operands of '{op}' have different types ({left} and {right})")]
    MismatchedOperands {
        op: &'static str,
        left: PrimitiveType,
        right: PrimitiveType,
    },

    #[error("'{op}' needs bool operands, found {left} and {right}")]
    NonBooleanLogical {
        op: &'static str,
        left: PrimitiveType,
        right: PrimitiveType,
    },

    #[error("'!' needs a bool operand, found {found}")]
    NonBooleanNot { found: PrimitiveType },

    #[error("'-' cannot negate a {found} operand")]
    InvalidNegation { found: PrimitiveType },

    #[error("variable '{name}' is declared {declared} but initialized with {found}")]
    WrongInitializer {
        name: String,
        declared: PrimitiveType,
        found: PrimitiveType,
    },

    #[error("variable '{name}' is declared {declared} but assigned {found}")]
    WrongAssignment {
        name: String,
        declared: PrimitiveType,
        found: PrimitiveType,
    },

    #[error("{construct} condition must be bool, found {found}")]
    NonBooleanCondition {
        construct: &'static str,
        found: PrimitiveType,
    },
}

/// A static analysis diagnostic.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[line {line}] Static Analysis Error: {kind}")]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub line: usize,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, line: usize) -> Self {
        Self { kind, line }
    }
}
