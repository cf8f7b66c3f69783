//! Shared helpers for the integration tests.

#![allow(dead_code)]

use pulsar::{
    Options, Pulsar, PulsarError,
    bytecode::{Program, compile::compile},
    frontend::lexer::tokenize,
    runtime::vm::VmConfig,
};

/// Compile and run `source`, returning everything it printed.
pub fn run(source: &str) -> Result<String, PulsarError> {
    run_with(&Pulsar::default(), source)
}

pub fn run_with(pulsar: &Pulsar, source: &str) -> Result<String, PulsarError> {
    let mut out = Vec::new();
    pulsar.run(source, &mut out)?;
    Ok(String::from_utf8(out).expect("utf-8 output"))
}

/// Run with a small stack so overflow tests stay cheap.
pub fn run_with_stack(source: &str, stack_capacity: usize) -> Result<String, PulsarError> {
    let pulsar = Pulsar::new(Options {
        vm: VmConfig {
            stack_capacity,
            ..VmConfig::default()
        },
        ..Options::default()
    });
    run_with(&pulsar, source)
}

/// Compile `source`, panicking on syntax errors.
pub fn program(source: &str) -> Program {
    let compilation = compile(&tokenize(source));
    assert!(
        !compilation.has_errors(),
        "unexpected syntax errors: {:?}",
        compilation.errors
    );
    compilation.program
}
