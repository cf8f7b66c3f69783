use crate::bytecode::Op;
use crate::bytecode::ir::Program;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("stack-check error at ip={ip}: {message}")]
pub struct StackCheckError {
    pub ip: usize,
    pub message: String,
}

impl StackCheckError {
    fn new(ip: usize, message: impl Into<String>) -> Self {
        Self {
            ip,
            message: message.into(),
        }
    }
}

/// Statically verify a program before it runs.
///
/// Follows every control-flow edge from instruction 0 and tracks the stack
/// height on entry to each instruction. Rejects:
/// - underflow on any path
/// - two paths reaching one instruction with different heights
/// - jump targets past the end of the code
/// - constant, global or local operands that cannot be valid
///
/// Returns the maximum stack height any path reaches.
pub fn check_program(program: &Program) -> Result<usize, StackCheckError> {
    let code = &program.code;
    // heights[len] is the height on reaching the end of the program.
    let mut heights: Vec<Option<usize>> = vec![None; code.len() + 1];
    let mut worklist = vec![(0usize, 0usize)];
    let mut max_height = 0;

    while let Some((ip, height)) = worklist.pop() {
        match heights[ip] {
            Some(seen) if seen == height => continue,
            Some(seen) => {
                return Err(StackCheckError::new(
                    ip,
                    format!(
                        "inconsistent stack height at join point ({} vs {})",
                        seen, height
                    ),
                ));
            }
            None => heights[ip] = Some(height),
        }

        let Some(instruction) = code.get(ip) else {
            continue;
        };
        let op = instruction.op;

        let (pops, pushes) = op.stack_effect();
        let Some(base) = height.checked_sub(pops) else {
            return Err(StackCheckError::new(
                ip,
                format!(
                    "stack underflow in {}: needed {} items, had {}",
                    op.name(),
                    pops,
                    height
                ),
            ));
        };
        check_operand(program, ip, op, height)?;

        let after = base + pushes;
        max_height = max_height.max(after);

        match op {
            Op::Jump(target) => worklist.push((target, after)),
            Op::JumpIfTrue(target) | Op::JumpIfFalse(target) => {
                worklist.push((target, after));
                worklist.push((ip + 1, after));
            }
            _ => worklist.push((ip + 1, after)),
        }
    }

    Ok(max_height)
}

/// `height` is the stack height before `op` runs.
fn check_operand(program: &Program, ip: usize, op: Op, height: usize) -> Result<(), StackCheckError> {
    let fail = |message: String| Err(StackCheckError::new(ip, message));

    match op {
        Op::Constant(index) if index >= program.constants.len() => fail(format!(
            "constant index {} out of range (pool has {})",
            index,
            program.constants.len()
        )),
        Op::Jump(target) | Op::JumpIfTrue(target) | Op::JumpIfFalse(target)
            if target > program.code.len() =>
        {
            fail(format!(
                "jump target {} is past the end of the code ({})",
                target,
                program.code.len()
            ))
        }
        Op::NewGlobal(slot) | Op::LoadGlobal(slot) | Op::StoreGlobal(slot)
            if slot >= program.globals.len() =>
        {
            fail(format!(
                "global slot {} out of range (table has {})",
                slot,
                program.globals.len()
            ))
        }
        Op::NewLocal(slot) if height.checked_sub(1) != Some(slot) => fail(format!(
            "local slot {} does not match the stack top ({})",
            slot, height
        )),
        Op::GetLocal(slot) if slot >= height => fail(format!(
            "local slot {} is above the stack top ({})",
            slot, height
        )),
        // the assigned value sits on top of the local
        Op::SetLocal(slot) if slot >= height.saturating_sub(1) => fail(format!(
            "local slot {} is not below the assigned value ({})",
            slot, height
        )),
        _ => Ok(()),
    }
}
