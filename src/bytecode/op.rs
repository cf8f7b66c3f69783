use serde::{Deserialize, Serialize};

// =============================================================================
// OP - Bytecode instructions
// =============================================================================

/// A bytecode operation. The payload, where present, is the operand.
///
/// Jump targets are absolute instruction indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    // literals
    /// Push `constants[index]`.
    Constant(usize),
    Null,

    // arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
    Not,

    // comparison
    CompareEqual,
    CompareGreater,
    CompareLesser,

    // control flow
    Jump(usize),
    /// Peek a boolean; jump when it is true. The value stays on the stack.
    JumpIfTrue(usize),
    /// Peek a boolean; jump when it is false. The value stays on the stack.
    JumpIfFalse(usize),

    // stack
    Pop,
    Print,

    // variables
    /// Bind the value on top of the stack as local `slot`.
    NewLocal(usize),
    GetLocal(usize),
    SetLocal(usize),
    /// Pop the top of the stack into global `slot`.
    NewGlobal(usize),
    LoadGlobal(usize),
    StoreGlobal(usize),
}

impl Op {
    /// Returns (pops, pushes) for this op.
    pub fn stack_effect(&self) -> (usize, usize) {
        use Op::*;
        match self {
            Constant(_) | Null | GetLocal(_) | LoadGlobal(_) => (0, 1),

            Add | Subtract | Multiply | Divide | Modulo => (2, 1),
            CompareEqual | CompareGreater | CompareLesser => (2, 1),
            Negate | Not => (1, 1),

            Jump(_) => (0, 0),
            JumpIfTrue(_) | JumpIfFalse(_) => (1, 1),

            Pop | Print | NewGlobal(_) => (1, 0),
            NewLocal(_) | SetLocal(_) | StoreGlobal(_) => (1, 1),
        }
    }

    pub fn operand(&self) -> Option<usize> {
        use Op::*;
        match *self {
            Constant(i) | Jump(i) | JumpIfTrue(i) | JumpIfFalse(i) => Some(i),
            NewLocal(i) | GetLocal(i) | SetLocal(i) => Some(i),
            NewGlobal(i) | LoadGlobal(i) | StoreGlobal(i) => Some(i),
            _ => None,
        }
    }

    pub fn jump_target(&self) -> Option<usize> {
        match *self {
            Op::Jump(t) | Op::JumpIfTrue(t) | Op::JumpIfFalse(t) => Some(t),
            _ => None,
        }
    }

    /// The same jump with its target replaced, or `None` for non-jumps.
    pub fn retarget(&self, target: usize) -> Option<Op> {
        match self {
            Op::Jump(_) => Some(Op::Jump(target)),
            Op::JumpIfTrue(_) => Some(Op::JumpIfTrue(target)),
            Op::JumpIfFalse(_) => Some(Op::JumpIfFalse(target)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        use Op::*;
        match self {
            Constant(_) => "OP_CONSTANT",
            Null => "OP_NULL",
            Add => "OP_ADD",
            Subtract => "OP_SUBTRACT",
            Multiply => "OP_MULTIPLY",
            Divide => "OP_DIVIDE",
            Modulo => "OP_MODULO",
            Negate => "OP_NEGATE",
            Not => "OP_NOT",
            CompareEqual => "OP_COMPARE_EQUAL",
            CompareGreater => "OP_COMPARE_GREATER",
            CompareLesser => "OP_COMPARE_LESSER",
            Jump(_) => "OP_JUMP",
            JumpIfTrue(_) => "OP_JUMP_IF_TRUE",
            JumpIfFalse(_) => "OP_JUMP_IF_FALSE",
            Pop => "OP_POP",
            Print => "OP_PRINT",
            NewLocal(_) => "OP_NEW_LOCAL",
            GetLocal(_) => "OP_GET_LOCAL",
            SetLocal(_) => "OP_SET_LOCAL",
            NewGlobal(_) => "OP_NEW_GLOBAL",
            LoadGlobal(_) => "OP_LOAD_GLOBAL",
            StoreGlobal(_) => "OP_STORE_GLOBAL",
        }
    }
}
