pub mod fault;
pub mod vm;

pub use fault::{Fault, FaultKind};
pub use vm::{Vm, VmConfig};
