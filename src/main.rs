use std::{
    fs,
    io::{self, Write},
    path::Path,
    process::ExitCode,
};

use anyhow::Context;
use palc::Parser;
use pulsar::{
    Options, Pulsar, PulsarError,
    analysis::TypeError,
    bytecode::disasm::disassemble,
    cli::{Cli, Mode},
    frontend::{lexer::tokenize, token_dumper::TokenDumper},
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    match dispatch(Cli::parse().mode) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PULSAR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<PulsarError>() {
        Some(err) => err.exit_code() as u8,
        // everything else is file handling
        None => 74,
    }
}

fn dispatch(mode: Mode) -> anyhow::Result<()> {
    match mode {
        Mode::Run {
            path,
            debug,
            strict,
        } => {
            let pulsar = Pulsar::new(Options {
                debug,
                gate_on_type_errors: strict,
                ..Options::default()
            });
            let compiled = pulsar.compile(&load(&pulsar, &path)?)?;
            report_type_errors(&compiled.type_errors);

            let mut out = io::stdout().lock();
            if debug {
                out.write_all(pulsar.debug_dump(&compiled).as_bytes())?;
            }
            pulsar.execute(&compiled.program, out)?;
        }
        Mode::Check { path } => {
            let pulsar = Pulsar::default();
            let compiled = pulsar.compile(&load(&pulsar, &path)?)?;
            if !compiled.type_errors.is_empty() {
                return Err(PulsarError::Type(compiled.type_errors).into());
            }
            println!("{}: no errors", path.display());
        }
        Mode::Disasm { path } => {
            let pulsar = Pulsar::new(Options {
                type_check: false,
                ..Options::default()
            });
            let compiled = pulsar.compile(&load(&pulsar, &path)?)?;
            print!("{}", disassemble(&compiled.program));
        }
        Mode::Tokens { path } => {
            let pulsar = Pulsar::default();
            let tokens = tokenize(&load(&pulsar, &path)?);
            print!("{}", TokenDumper::new().dump(&tokens));
        }
        Mode::Build { path, output } => {
            let pulsar = Pulsar::default();
            let image = pulsar.build(&load(&pulsar, &path)?)?;
            fs::write(&output, image)
                .with_context(|| format!("failed to write image '{}'", output.display()))?;
        }
        Mode::Exec { path } => {
            let bytes = fs::read(&path)
                .with_context(|| format!("failed to read image '{}'", path.display()))?;
            Pulsar::default().exec(&bytes, io::stdout().lock())?;
        }
        Mode::Repl => run_prompt(&Pulsar::default()),
    }

    Ok(())
}

fn load(pulsar: &Pulsar, path: &Path) -> anyhow::Result<String> {
    pulsar
        .read_source(path)
        .with_context(|| format!("failed to read source file '{}'", path.display()))
}

fn report_type_errors(errors: &[TypeError]) {
    for error in errors {
        eprintln!("{}", error);
    }
}

fn run_prompt(pulsar: &Pulsar) {
    let mut session = pulsar.session(io::stdout());
    let mut input = String::new();
    let stdin = io::stdin();

    loop {
        input.clear();
        print!("> ");
        if let Err(e) = io::stdout().flush() {
            eprintln!("failed to flush stdout: {e}");
        }
        match stdin.read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("failed to read line: {e}");
                continue;
            }
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        match session.eval(line) {
            Ok(warnings) => report_type_errors(&warnings),
            Err(e) => eprintln!("{e}"),
        }
    }
}
