use std::fmt::Write;

use crate::bytecode::Op;
use crate::bytecode::ir::{Instruction, Program};

/// Return the disassembly of a whole program as a String.
///
/// One line per instruction: index, source line (`|` when unchanged from the
/// previous instruction), op name and operand. Jump targets are marked with
/// `►` and a rule above them; constants and globals are resolved inline.
pub fn disassemble(program: &Program) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "════════════════════════════════════════");
    let _ = writeln!(
        output,
        " {} instructions, {} constants, {} globals",
        program.code.len(),
        program.constants.len(),
        program.globals.len()
    );
    let _ = writeln!(output, "════════════════════════════════════════");

    let jump_targets = collect_jump_targets(program);
    let mut last_line = None;

    for (ip, instruction) in program.code.iter().enumerate() {
        let is_target = jump_targets.contains(&ip);
        if is_target {
            output.push_str("           ┌──────────────────────────────────\n");
        }

        let line = if last_line == Some(instruction.line) {
            "   |".to_string()
        } else {
            format!("{:4}", instruction.line)
        };
        last_line = Some(instruction.line);

        let marker = if is_target { "► " } else { "  " };
        let _ = writeln!(
            output,
            "{:04} {} {}{}",
            ip,
            line,
            marker,
            format_op(program, ip, *instruction)
        );
    }

    // a jump may target one past the last instruction
    if jump_targets.contains(&program.code.len()) {
        let _ = writeln!(output, "{:04}      ► <end>", program.code.len());
    }

    output
}

fn collect_jump_targets(program: &Program) -> Vec<usize> {
    let mut targets = Vec::new();

    for op in program.ops() {
        if let Some(target) = op.jump_target() {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }

    targets
}

fn format_op(program: &Program, ip: usize, instruction: Instruction) -> String {
    let op = instruction.op;
    let name = op.name();

    match op {
        Op::Constant(index) => match program.constant_at(ip) {
            Some(value) => format!("{:<20} {:4} '{}'", name, index, value),
            None => format!("{:<20} {:4} <out of range>", name, index),
        },
        Op::Jump(target) | Op::JumpIfTrue(target) | Op::JumpIfFalse(target) => {
            let direction = if target <= ip { "↑" } else { "↓" };
            format!("{:<20} {:4} {} (→ {:04})", name, target, direction, target)
        }
        Op::NewGlobal(slot) | Op::LoadGlobal(slot) | Op::StoreGlobal(slot) => {
            match program.globals.get(slot) {
                Some(global) => format!("{:<20} {:4} {}", name, slot, global),
                None => format!("{:<20} {:4} <unknown>", name, slot),
            }
        }
        // locals print the bare slot
        _ => match instruction.operand() {
            Some(slot) => format!("{:<20} {:4}", name, slot),
            None => name.to_string(),
        },
    }
}
