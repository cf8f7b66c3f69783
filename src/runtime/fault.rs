use crate::bytecode::stack_check::StackCheckError;
use crate::lang::value::Value;

/// What went wrong when the VM stopped abnormally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FaultKind {
    #[error("stack overflow (capacity {capacity})")]
    StackOverflow { capacity: usize },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("operator '{op}' cannot be applied to {lhs} and {rhs}")]
    InvalidOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("operator '{op}' cannot be applied to {operand}")]
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("{op} expects a bool condition, found {found}")]
    ExpectedBoolean {
        op: &'static str,
        found: &'static str,
    },

    #[error("global '{name}' (slot {slot}) was used before it was defined")]
    UndefinedGlobal { slot: usize, name: String },

    #[error("malformed {op} instruction: {reason}")]
    MalformedInstruction { op: &'static str, reason: String },

    #[error("invalid program: {0}")]
    InvalidProgram(#[from] StackCheckError),

    #[error("execution step limit exceeded ({limit})")]
    StepLimit { limit: usize },

    #[error("could not write output: {0}")]
    Output(String),
}

impl FaultKind {
    pub fn invalid_operands(op: &'static str, lhs: &Value, rhs: &Value) -> Self {
        FaultKind::InvalidOperands {
            op,
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }
    }

    pub fn invalid_operand(op: &'static str, operand: &Value) -> Self {
        FaultKind::InvalidOperand {
            op,
            operand: operand.type_name(),
        }
    }

    pub fn malformed(op: &'static str, reason: impl Into<String>) -> Self {
        FaultKind::MalformedInstruction {
            op,
            reason: reason.into(),
        }
    }
}

/// A fatal runtime fault. No instruction runs after one is raised.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[line {line}] Runtime Error | {kind}")]
pub struct Fault {
    pub kind: FaultKind,
    /// Index of the faulting instruction.
    pub ip: usize,
    /// Source line of the faulting instruction (0 when not tied to one).
    pub line: usize,
}

impl Fault {
    pub fn new(kind: FaultKind, ip: usize, line: usize) -> Self {
        Self { kind, ip, line }
    }
}
