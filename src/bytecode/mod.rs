pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod image;
pub mod ir;
pub mod op;
pub mod stack_check;

pub use ir::{Instruction, Program};
pub use op::Op;
