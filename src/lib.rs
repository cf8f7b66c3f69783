//! # Pulsar
//!
//! A small statically typed scripting language with a single-pass bytecode
//! compiler and a stack virtual machine.
//!
//! ```text
//! source ──tokenize──▶ tokens ──compile──▶ Program ──Vm::run──▶ output
//!                        │
//!                        └──parse──▶ tree ──type check──▶ diagnostics
//! ```
//!
//! The compiler never builds a tree: it climbs operator precedence directly
//! over the token stream, emitting instructions as it goes and backpatching
//! forward jumps for `&&`, `||`, `if` and `while`. The tree is only built when
//! static type checking is requested.

pub mod analysis;
pub mod bytecode;
pub mod cli;
pub mod driver;
pub mod frontend;
pub mod lang;
pub mod runtime;

pub use driver::{Compiled, Options, Pulsar, PulsarError, Session};
