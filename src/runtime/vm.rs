use std::io::{self, Write};

use tracing::{trace, warn};

use crate::bytecode::Op;
use crate::bytecode::ir::Program;
use crate::bytecode::stack_check::check_program;
use crate::lang::value::Value;
use crate::runtime::fault::{Fault, FaultKind};

/// Default operand stack capacity.
pub const STACK_MAX: usize = 1024;

#[derive(Debug, Clone)]
pub struct VmConfig {
    pub stack_capacity: usize,
    pub max_steps: Option<usize>,
    /// Run the static stack check before executing.
    pub verify: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            stack_capacity: STACK_MAX,
            max_steps: None,
            verify: true,
        }
    }
}

/// Stack machine executing a compiled `Program`.
///
/// Locals live on the operand stack below the temporaries, addressed from
/// `frame_base`. Globals live in a separate slot table that survives between
/// runs, so a REPL can feed one VM a program per line.
pub struct Vm<W: Write = io::Stdout> {
    stack: Vec<Value>,
    globals: Vec<Option<Value>>,
    frame_base: usize,
    config: VmConfig,
    steps: usize,
    out: W,
}

impl Vm<io::Stdout> {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self::with_output(config, io::stdout())
    }
}

impl Default for Vm<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Vm<W> {
    /// A VM whose `PRINT` output goes to `out`.
    pub fn with_output(config: VmConfig, out: W) -> Self {
        Self {
            stack: Vec::with_capacity(config.stack_capacity.min(STACK_MAX)),
            globals: Vec::new(),
            frame_base: 0,
            config,
            steps: 0,
            out,
        }
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn globals(&self) -> &[Option<Value>] {
        &self.globals
    }

    pub fn global(&self, slot: usize) -> Option<&Value> {
        self.globals.get(slot).and_then(Option::as_ref)
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn reset_execution_state(&mut self) {
        self.steps = 0;
        self.stack.clear();
        self.frame_base = 0;
    }

    /// Execute `program` to completion or until the first fault.
    ///
    /// Globals defined by earlier runs keep their values; the program's name
    /// table must extend the one those runs used.
    pub fn run(&mut self, program: &Program) -> Result<(), Fault> {
        self.reset_execution_state();

        let result = self.verify(program).and_then(|()| {
            if self.globals.len() < program.globals.len() {
                self.globals.resize(program.globals.len(), None);
            }
            self.execute(program)
        });

        if let Err(fault) = &result {
            warn!(ip = fault.ip, line = fault.line, "{}", fault);
        }
        result
    }

    fn verify(&self, program: &Program) -> Result<(), Fault> {
        if !self.config.verify {
            return Ok(());
        }
        check_program(program).map(|_| ()).map_err(|e| {
            let ip = e.ip;
            let line = program.code.get(ip).map(|i| i.line).unwrap_or(0);
            Fault::new(FaultKind::InvalidProgram(e), ip, line)
        })
    }

    // Execution

    fn execute(&mut self, program: &Program) -> Result<(), Fault> {
        let code = &program.code;
        let mut ip: usize = 0;

        while ip < code.len() {
            let instruction = code[ip];
            let fault = |kind| Fault::new(kind, ip, instruction.line);

            self.check_limits().map_err(fault)?;

            trace!(
                ip,
                op = instruction.op.name(),
                depth = self.stack.len(),
                "dispatch"
            );

            if let Some(target) = self.dispatch(program, instruction.op).map_err(fault)? {
                // lands on `target` after the increment below
                ip = target.wrapping_sub(1);
            }
            ip = ip.wrapping_add(1);
        }

        Ok(())
    }

    fn check_limits(&mut self) -> Result<(), FaultKind> {
        self.steps += 1;

        if let Some(limit) = self.config.max_steps {
            if self.steps > limit {
                return Err(FaultKind::StepLimit { limit });
            }
        }

        Ok(())
    }

    /// Execute one instruction. Returns the jump target when control moves.
    fn dispatch(&mut self, program: &Program, op: Op) -> Result<Option<usize>, FaultKind> {
        match op {
            // Literals
            Op::Constant(index) => {
                let value = program.constants.get(index).cloned().ok_or_else(|| {
                    FaultKind::malformed(
                        op.name(),
                        format!("constant index {} out of range", index),
                    )
                })?;
                self.push(value)?;
            }
            Op::Null => self.push(Value::Null)?,

            // Arithmetic
            Op::Add => self.binary(Value::plus)?,
            Op::Subtract => self.binary(Value::minus)?,
            Op::Multiply => self.binary(Value::times)?,
            Op::Divide => self.binary(Value::div)?,
            Op::Modulo => self.binary(Value::rem)?,
            Op::Negate => {
                let a = self.pop()?;
                self.push(a.negate()?)?;
            }
            Op::Not => {
                let a = self.pop()?;
                self.push(a.not()?)?;
            }

            // Comparison
            Op::CompareEqual => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(Value::Boolean(a.equals(&b)))?;
            }
            Op::CompareGreater => self.binary(Value::compare_greater)?,
            Op::CompareLesser => self.binary(Value::compare_lesser)?,

            // Control flow
            Op::Jump(target) => return self.jump(program, op, target).map(Some),
            Op::JumpIfTrue(target) => {
                if self.peek_bool(op)? {
                    return self.jump(program, op, target).map(Some);
                }
            }
            Op::JumpIfFalse(target) => {
                if !self.peek_bool(op)? {
                    return self.jump(program, op, target).map(Some);
                }
            }

            // Stack
            Op::Pop => {
                self.pop()?;
            }
            Op::Print => {
                let value = self.pop()?;
                writeln!(self.out, "{}", value).map_err(|e| FaultKind::Output(e.to_string()))?;
            }

            // Locals
            Op::NewLocal(slot) => {
                // the initializer is already sitting in the slot
                if self.local_index(slot) != self.stack.len().checked_sub(1) {
                    return Err(FaultKind::malformed(
                        op.name(),
                        format!(
                            "local slot {} does not match stack height {}",
                            slot,
                            self.stack.len()
                        ),
                    ));
                }
            }
            Op::GetLocal(slot) => {
                let value = self
                    .local_index(slot)
                    .and_then(|index| self.stack.get(index))
                    .cloned()
                    .ok_or_else(|| bad_local(op, slot))?;
                self.push(value)?;
            }
            Op::SetLocal(slot) => {
                let value = self.peek()?.clone();
                // the local must sit below the assigned value
                let below_top = self.stack.len().saturating_sub(1);
                let index = self
                    .local_index(slot)
                    .filter(|&index| index < below_top)
                    .ok_or_else(|| bad_local(op, slot))?;
                self.stack[index] = value;
            }

            // Globals
            Op::NewGlobal(slot) => {
                let value = self.pop()?;
                match self.globals.get_mut(slot) {
                    Some(global) => *global = Some(value),
                    None => return Err(bad_global(op, slot)),
                }
            }
            Op::LoadGlobal(slot) => {
                let value = match self.globals.get(slot) {
                    Some(Some(value)) => value.clone(),
                    Some(None) => return Err(undefined_global(program, slot)),
                    None => return Err(bad_global(op, slot)),
                };
                self.push(value)?;
            }
            Op::StoreGlobal(slot) => {
                let value = self.peek()?.clone();
                match self.globals.get_mut(slot) {
                    Some(Some(global)) => *global = value,
                    Some(None) => return Err(undefined_global(program, slot)),
                    None => return Err(bad_global(op, slot)),
                }
            }
        }

        Ok(None)
    }

    fn local_index(&self, slot: usize) -> Option<usize> {
        self.frame_base.checked_add(slot)
    }

    fn jump(&self, program: &Program, op: Op, target: usize) -> Result<usize, FaultKind> {
        if target > program.code.len() {
            return Err(FaultKind::malformed(
                op.name(),
                format!("jump target {} out of range", target),
            ));
        }
        Ok(target)
    }

    // Stack operations

    fn push(&mut self, value: Value) -> Result<(), FaultKind> {
        if self.stack.len() >= self.config.stack_capacity {
            return Err(FaultKind::StackOverflow {
                capacity: self.config.stack_capacity,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, FaultKind> {
        self.stack.pop().ok_or(FaultKind::StackUnderflow)
    }

    fn peek(&self) -> Result<&Value, FaultKind> {
        self.stack.last().ok_or(FaultKind::StackUnderflow)
    }

    /// Conditional jumps inspect the condition without consuming it.
    fn peek_bool(&self, op: Op) -> Result<bool, FaultKind> {
        match self.peek()? {
            Value::Boolean(b) => Ok(*b),
            other => Err(FaultKind::ExpectedBoolean {
                op: op.name(),
                found: other.type_name(),
            }),
        }
    }

    fn binary(
        &mut self,
        apply: fn(&Value, &Value) -> Result<Value, FaultKind>,
    ) -> Result<(), FaultKind> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(apply(&a, &b)?)
    }
}

fn bad_local(op: Op, slot: usize) -> FaultKind {
    FaultKind::malformed(op.name(), format!("local slot {} out of range", slot))
}

fn bad_global(op: Op, slot: usize) -> FaultKind {
    FaultKind::malformed(op.name(), format!("global slot {} out of range", slot))
}

fn undefined_global(program: &Program, slot: usize) -> FaultKind {
    FaultKind::UndefinedGlobal {
        slot,
        name: program.globals.get(slot).cloned().unwrap_or_default(),
    }
}
