use std::{fs::read_to_string, io, io::Write, path::Path};

use tracing::{debug, info_span};

use crate::{
    analysis::{TypeChecker, TypeError},
    bytecode::{
        Program,
        compile::{Compilation, Compiler},
        compile_error::CompileError,
        disasm::disassemble,
        image::{self, ImageError},
    },
    frontend::{lexer::tokenize, parser::parse, token::Token, token_dumper::TokenDumper},
    runtime::{
        fault::Fault,
        vm::{Vm, VmConfig},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum PulsarError {
    #[error("{}", display_errors(.0))]
    Syntax(Vec<CompileError>),

    #[error("{}", display_errors(.0))]
    Type(Vec<TypeError>),

    #[error(transparent)]
    Runtime(#[from] Fault),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("{0}")]
    Io(#[from] io::Error),
}

fn display_errors<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<String>>()
        .join("\n")
}

impl PulsarError {
    /// Process exit status for this error, in the sysexits style.
    pub fn exit_code(&self) -> i32 {
        match self {
            PulsarError::Syntax(_) | PulsarError::Type(_) => 65,
            PulsarError::Runtime(_) => 70,
            PulsarError::Image(_) | PulsarError::Io(_) => 74,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Dump tokens and disassembly before running.
    pub debug: bool,
    /// Build the tree and run the static type checker.
    pub type_check: bool,
    /// Refuse to run a program with type errors.
    pub gate_on_type_errors: bool,
    pub vm: VmConfig,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            debug: false,
            type_check: true,
            gate_on_type_errors: false,
            vm: VmConfig::default(),
        }
    }
}

/// A program that compiled cleanly, plus the type errors found in it when
/// they did not block execution.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub tokens: Vec<Token>,
    pub program: Program,
    pub type_errors: Vec<TypeError>,
}

/// Pipeline entry point: source text in, compiled program or output out.
pub struct Pulsar {
    options: Options,
}

impl Default for Pulsar {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Pulsar {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn read_source<P: AsRef<Path>>(&self, path: P) -> Result<String, PulsarError> {
        let span = info_span!("pipeline.read_input");
        let _enter = span.enter();

        let source = read_to_string(path.as_ref())?;
        debug!(path = ?path.as_ref(), bytes = source.len(), "loaded input source");
        Ok(source)
    }

    /// Tokenize, compile and (optionally) type check `source`.
    pub fn compile(&self, source: &str) -> Result<Compiled, PulsarError> {
        let tokens = tokenize(source);
        let compilation = {
            let span = info_span!("pipeline.compile");
            let _enter = span.enter();
            crate::bytecode::compile::compile(&tokens)
        };
        self.finish(tokens, compilation, &mut TypeChecker::new())
    }

    fn finish(
        &self,
        tokens: Vec<Token>,
        compilation: Compilation,
        checker: &mut TypeChecker,
    ) -> Result<Compiled, PulsarError> {
        if compilation.has_errors() {
            return Err(PulsarError::Syntax(compilation.errors));
        }

        let type_errors = if self.options.type_check {
            let span = info_span!("pipeline.type_check");
            let _enter = span.enter();
            // the compiler accepted these tokens, so the tree parser will too
            checker.check(&parse(&tokens).statements)
        } else {
            Vec::new()
        };

        if self.options.gate_on_type_errors && !type_errors.is_empty() {
            return Err(PulsarError::Type(type_errors));
        }

        Ok(Compiled {
            tokens,
            program: compilation.program,
            type_errors,
        })
    }

    /// Token dump followed by disassembly.
    pub fn debug_dump(&self, compiled: &Compiled) -> String {
        let mut dump = String::from("-- Tokens --\n");
        dump.push_str(&TokenDumper::new().no_color().dump(&compiled.tokens));
        dump.push_str("\n-- Disassembled Bytecode --\n");
        dump.push_str(&disassemble(&compiled.program));
        dump
    }

    /// Run an already compiled program, printing to `out`.
    pub fn execute<W: Write>(&self, program: &Program, out: W) -> Result<(), PulsarError> {
        let span = info_span!("pipeline.execute", instructions = program.len());
        let _enter = span.enter();

        let mut vm = Vm::with_output(self.options.vm.clone(), out);
        vm.run(program)?;
        Ok(())
    }

    /// Compile and run `source`. With `debug` set, the token dump and
    /// disassembly are written to `out` first.
    pub fn run<W: Write>(&self, source: &str, mut out: W) -> Result<Compiled, PulsarError> {
        let compiled = self.compile(source)?;
        if self.options.debug {
            out.write_all(self.debug_dump(&compiled).as_bytes())?;
        }
        self.execute(&compiled.program, out)?;
        Ok(compiled)
    }

    /// Compile `source` to a bytecode image.
    pub fn build(&self, source: &str) -> Result<Vec<u8>, PulsarError> {
        let compiled = self.compile(source)?;
        let span = info_span!("pipeline.encode");
        let _enter = span.enter();
        Ok(image::encode(&compiled.program)?)
    }

    /// Decode and run a bytecode image.
    pub fn exec<W: Write>(&self, bytes: &[u8], out: W) -> Result<(), PulsarError> {
        let program = {
            let span = info_span!("pipeline.decode", bytes = bytes.len());
            let _enter = span.enter();
            image::decode(bytes)?
        };
        self.execute(&program, out)
    }

    pub fn session<W: Write>(&self, out: W) -> Session<W> {
        Session::new(self.options.clone(), out)
    }
}

/// Interactive session: each line is compiled and run on its own, while
/// globals (names, slots, values and declared types) carry over.
pub struct Session<W: Write> {
    pulsar: Pulsar,
    vm: Vm<W>,
    globals: Vec<String>,
    checker: TypeChecker,
}

impl<W: Write> Session<W> {
    pub fn new(options: Options, out: W) -> Self {
        let vm = Vm::with_output(options.vm.clone(), out);
        Self {
            pulsar: Pulsar::new(options),
            vm,
            globals: Vec::new(),
            checker: TypeChecker::new(),
        }
    }

    pub fn vm(&self) -> &Vm<W> {
        &self.vm
    }

    /// Evaluate one chunk of input. Returns the type errors that did not
    /// block execution.
    pub fn eval(&mut self, source: &str) -> Result<Vec<TypeError>, PulsarError> {
        let tokens = tokenize(source);
        let compilation = Compiler::with_globals(&tokens, self.globals.clone()).compile();
        let compiled = self.pulsar.finish(tokens, compilation, &mut self.checker)?;

        if self.pulsar.options.debug {
            let dump = self.pulsar.debug_dump(&compiled);
            self.vm.output_mut().write_all(dump.as_bytes())?;
        }

        // keep new names even if the run faults; their slots stay undefined
        self.globals = compiled.program.globals.clone();
        self.vm.run(&compiled.program)?;
        Ok(compiled.type_errors)
    }
}
