//! # Pulsar language model
//!
//! Runtime values shared by the compiler and the VM, plus the tree and type
//! vocabulary used by static analysis.
//!
//! ## Documentation conventions
//!
//! - Type names are written the way the language spells them: `int`,
//!   `double`, `bool`, `null`.

pub mod node;
pub mod types;
pub mod value;
