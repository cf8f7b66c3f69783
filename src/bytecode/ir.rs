use crate::bytecode::Op;
use crate::lang::value::Value;
use serde::{Deserialize, Serialize};

/// One bytecode instruction and the source line it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Op,
    pub line: usize,
}

impl Instruction {
    pub fn new(op: Op, line: usize) -> Self {
        Self { op, line }
    }

    pub fn operand(&self) -> Option<usize> {
        self.op.operand()
    }
}

/// A compiled program: the only artifact handed from the compiler to the VM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub code: Vec<Instruction>,

    /// Literal pool referenced by `Op::Constant`.
    pub constants: Vec<Value>,

    /// Global name table: slot `i` holds the global named `globals[i]`.
    pub globals: Vec<String>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Constant referenced by the instruction at `ip`, if it is a `Constant`.
    pub fn constant_at(&self, ip: usize) -> Option<&Value> {
        match self.code.get(ip)?.op {
            Op::Constant(index) => self.constants.get(index),
            _ => None,
        }
    }

    pub fn ops(&self) -> impl Iterator<Item = Op> + '_ {
        self.code.iter().map(|i| i.op)
    }
}
