//! End-to-end tests: source text through the compiler and the VM.

mod common;

use common::{program, run, run_with, run_with_stack};
use pulsar::{
    Options, Pulsar, PulsarError,
    analysis::TypeErrorKind,
    bytecode::{Op, compile::compile, disasm::disassemble},
    frontend::lexer::tokenize,
    runtime::{
        fault::{Fault, FaultKind},
        vm::{Vm, VmConfig},
    },
};

// =============================================================================
// Expressions
// =============================================================================

#[test]
fn arithmetic_follows_value_rules() {
    assert_eq!(run("print 2 + 3 * 4;").unwrap(), "14\n");
    assert_eq!(run("print 7 % 2;").unwrap(), "1\n");
    assert_eq!(run("print 1.5 + 1;").unwrap(), "2.5\n");
    assert_eq!(run("print 7 / 2;").unwrap(), "3\n");
    assert_eq!(run("print 7.0 / 2;").unwrap(), "3.5\n");
    assert_eq!(run("print (1 + 2) * -3;").unwrap(), "-9\n");
}

#[test]
fn integer_overflow_wraps() {
    let source = r#"
var min: int = -9223372036854775807 - 1;
print min / -1;
print min % -1;
print 9223372036854775807 + 1;
print -min;
"#;
    assert_eq!(
        run(source).unwrap(),
        "-9223372036854775808\n0\n-9223372036854775808\n-9223372036854775808\n"
    );
}

#[test]
fn comparisons_and_equality() {
    let output = run("print 1 == 1.0;\nprint 2 >= 3;\nprint 2 <= 3;\nprint 1 != 2;\nprint null == null;")
        .unwrap();
    assert_eq!(output, "true\nfalse\ntrue\ntrue\ntrue\n");
}

#[test]
fn nested_negation_does_not_grow_the_stack() {
    assert_eq!(run_with_stack("print ----1;", 2).unwrap(), "1\n");
    assert_eq!(run_with_stack("print !!!true;", 2).unwrap(), "false\n");
}

// =============================================================================
// Short circuit
// =============================================================================

#[test]
fn false_and_skips_right_operand() {
    assert_eq!(run("print false && 1 / 0 > 0;").unwrap(), "false\n");
}

#[test]
fn true_or_skips_right_operand() {
    assert_eq!(run("print true || 1 / 0 > 0;").unwrap(), "true\n");
}

#[test]
fn skipped_operand_has_no_side_effects() {
    let source = "var x: int = 0;\nfalse && (x = 1) == 1;\ntrue || (x = 2) == 2;\nprint x;";
    assert_eq!(run(source).unwrap(), "0\n");
}

#[test]
fn evaluated_operand_can_fault() {
    let err = run("print true && 1 / 0 > 0;").unwrap_err();
    assert!(matches!(
        err,
        PulsarError::Runtime(Fault {
            kind: FaultKind::DivisionByZero,
            line: 1,
            ..
        })
    ));
}

// =============================================================================
// Jump backpatching
// =============================================================================

#[test]
fn logical_jumps_point_forward() {
    let program = program("print true || false && true || false && false;");

    let mut jumps = 0;
    for (ip, op) in program.ops().enumerate() {
        if let Some(target) = op.jump_target() {
            jumps += 1;
            assert!(target > ip + 1, "jump at {} targets {}", ip, target);
            assert!(target <= program.len());
        }
    }
    assert_eq!(jumps, 4);
}

#[test]
fn logical_chain_never_revisits_code() {
    let program = program("print true || false && true || false && false;");

    // every instruction runs at most once
    let mut vm = Vm::with_output(
        VmConfig {
            max_steps: Some(program.len()),
            ..VmConfig::default()
        },
        Vec::new(),
    );
    vm.run(&program).unwrap();
    assert_eq!(vm.output(), b"true\n");
}

#[test]
fn loop_jumps_back_to_condition() {
    let program = program("var i: int = 0;\nwhile (i < 3) i = i + 1;");

    let back_edges: Vec<_> = program
        .ops()
        .enumerate()
        .filter(|(ip, op)| matches!(op, Op::Jump(target) if target <= ip))
        .collect();
    assert_eq!(back_edges.len(), 1);
}

// =============================================================================
// Faults
// =============================================================================

#[test]
fn deep_nesting_overflows_cleanly() {
    let err = run_with_stack("print 1 + (1 + (1 + (1 + (1 + 1))));", 4).unwrap_err();
    assert!(matches!(
        err,
        PulsarError::Runtime(Fault {
            kind: FaultKind::StackOverflow { capacity: 4 },
            ..
        })
    ));
    assert_eq!(err.exit_code(), 70);
}

#[test]
fn default_stack_handles_modest_nesting() {
    let source = format!("print {}1{};", "(1 + ".repeat(100), ")".repeat(100));
    assert_eq!(run(&source).unwrap(), "101\n");
}

#[test]
fn invalid_operands_fault_at_runtime() {
    let err = run("print true + 1;").unwrap_err();
    assert!(matches!(
        err,
        PulsarError::Runtime(Fault {
            kind: FaultKind::InvalidOperands { .. },
            ..
        })
    ));
}

#[test]
fn non_boolean_condition_faults() {
    let err = run("if (1) print 1;").unwrap_err();
    assert!(matches!(
        err,
        PulsarError::Runtime(Fault {
            kind: FaultKind::ExpectedBoolean { .. },
            ..
        })
    ));
}

#[test]
fn output_before_fault_is_kept() {
    let mut out = Vec::new();
    let err = Pulsar::default()
        .run("print 1;\nprint 2 % 0;\nprint 3;", &mut out)
        .unwrap_err();
    assert!(matches!(
        err,
        PulsarError::Runtime(Fault {
            kind: FaultKind::ModuloByZero,
            line: 2,
            ..
        })
    ));
    assert_eq!(out, b"1\n");
}

#[test]
fn step_limit_stops_infinite_loops() {
    let pulsar = Pulsar::new(Options {
        vm: VmConfig {
            max_steps: Some(1_000),
            ..VmConfig::default()
        },
        ..Options::default()
    });
    let err = run_with(&pulsar, "while (true) {}").unwrap_err();
    assert!(matches!(
        err,
        PulsarError::Runtime(Fault {
            kind: FaultKind::StepLimit { limit: 1_000 },
            ..
        })
    ));
}

// =============================================================================
// Error recovery
// =============================================================================

#[test]
fn two_malformed_statements_give_two_errors() {
    let source = "print 1 +;\nprint 2;\nvar = 3;\nprint 4;";
    let compilation = compile(&tokenize(source));

    assert_eq!(compilation.errors.len(), 2);
    assert_eq!(compilation.errors[0].line, 1);
    assert_eq!(compilation.errors[1].line, 3);
}

#[test]
fn syntax_errors_render_with_location() {
    let err = run("print 1 +;").unwrap_err();
    assert_eq!(err.exit_code(), 65);
    assert!(
        err.to_string().starts_with("[line 1] Syntax Error at ';'"),
        "got: {}",
        err
    );
}

#[test]
fn syntax_errors_prevent_execution() {
    let mut out = Vec::new();
    let result = Pulsar::default().run("print 1;\nprint ;", &mut out);
    assert!(matches!(result, Err(PulsarError::Syntax(_))));
    assert!(out.is_empty());
}

// =============================================================================
// Disassembly
// =============================================================================

#[test]
fn disassembly_keeps_constant_indexes_and_lines() {
    let program = program("print 1.5 + 2;\n\nprint 7;");
    let text = disassemble(&program);

    for (ip, instruction) in program.code.iter().enumerate() {
        let row = text
            .lines()
            .find(|l| l.starts_with(&format!("{:04} ", ip)))
            .expect("one row per instruction");

        if let Op::Constant(index) = instruction.op {
            let value = &program.constants[index];
            assert!(row.contains(&format!("{:4} '{}'", index, value)), "row: {}", row);
        }
        if ip == 0 || program.code[ip - 1].line != instruction.line {
            assert!(row.contains(&format!("{:4}", instruction.line)), "row: {}", row);
        }
    }
    assert!(text.contains("'7'"));
    assert!(text.lines().any(|l| l.starts_with("0004    3")));
}

// =============================================================================
// Variables and control flow
// =============================================================================

#[test]
fn block_scoping_and_shadowing() {
    let source = r#"
var a: int = 1;
{
    var a: int = 2;
    print a;
    {
        var b: int = a + 10;
        print b;
    }
}
print a;
"#;
    assert_eq!(run(source).unwrap(), "2\n12\n1\n");
}

#[test]
fn while_loop_sums() {
    let source = r#"
var i: int = 0;
var sum: int = 0;
while (i < 5) {
    sum = sum + i;
    i = i + 1;
}
print sum;
"#;
    assert_eq!(run(source).unwrap(), "10\n");
}

#[test]
fn if_else_branches() {
    let source = "var n: int = 7;\nif (n % 2 == 0) print 0; else print n;\nif (n > 5) print true;";
    assert_eq!(run(source).unwrap(), "7\ntrue\n");
}

#[test]
fn locals_leave_the_stack_balanced() {
    let program = program("{ var a: int = 1; var b: int = 2; print a + b; }");
    let mut vm = Vm::with_output(VmConfig::default(), Vec::new());
    vm.run(&program).unwrap();
    assert!(vm.stack().is_empty());
    assert_eq!(vm.output(), b"3\n");
}

#[test]
fn uninitialized_variable_is_null() {
    assert_eq!(run("var d: double;\nprint d;").unwrap(), "null\n");
}

// =============================================================================
// Type checking
// =============================================================================

#[test]
fn type_errors_are_reported_together() {
    let compiled = Pulsar::default()
        .compile("var a: int = true;\nprint 1 + 2.5;\nprint !3;")
        .unwrap();

    let lines: Vec<usize> = compiled.type_errors.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![1, 2, 3]);
    assert!(matches!(
        compiled.type_errors[0].kind,
        TypeErrorKind::WrongInitializer { .. }
    ));
}

#[test]
fn type_errors_do_not_cascade() {
    let compiled = Pulsar::default().compile("print (true + 1) * 2 - 3;").unwrap();
    assert_eq!(compiled.type_errors.len(), 1);
}

#[test]
fn gated_type_errors_block_the_run() {
    let pulsar = Pulsar::new(Options {
        gate_on_type_errors: true,
        ..Options::default()
    });
    let mut out = Vec::new();
    let err = pulsar.run("print 1;\nprint 1 + true;", &mut out).unwrap_err();
    assert!(matches!(err, PulsarError::Type(_)));
    assert_eq!(err.exit_code(), 65);
    assert!(out.is_empty());
}

// =============================================================================
// Images and sessions
// =============================================================================

#[test]
fn image_runs_like_source() {
    let source = "var x: int = 3;\nwhile (x > 0) { print x; x = x - 1; }";
    let pulsar = Pulsar::default();

    let image = pulsar.build(source).unwrap();
    let mut out = Vec::new();
    pulsar.exec(&image, &mut out).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), run(source).unwrap());
}

#[test]
fn truncated_image_is_rejected() {
    let pulsar = Pulsar::default();
    let image = pulsar.build("print 1 + 2;").unwrap();
    let err = pulsar.exec(&image[..image.len() - 1], Vec::new()).unwrap_err();
    assert!(matches!(err, PulsarError::Image(_)));
}

#[test]
fn session_defines_then_uses_globals() {
    let mut session = Pulsar::default().session(Vec::new());
    session.eval("var total: double = 0.5;").unwrap();
    session.eval("var step: double = 0.25;").unwrap();
    session.eval("while (total < 1.0) total = total + step;").unwrap();
    session.eval("print total;").unwrap();
    assert_eq!(session.vm().output(), b"1.0\n");
}
