use std::path::PathBuf;

use palc::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pulsar",
    after_long_help = "Compile and run Pulsar programs on the bytecode VM."
)]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Compile and run a source file
    Run {
        path: PathBuf,
        /// Print tokens and disassembly before running
        #[arg(long)]
        debug: bool,
        /// Do not run a program that has type errors
        #[arg(long)]
        strict: bool,
    },
    /// Report syntax and type errors without running
    Check { path: PathBuf },
    /// Print the compiled bytecode
    Disasm { path: PathBuf },
    /// Print the token stream
    Tokens { path: PathBuf },
    /// Compile a source file to a bytecode image
    Build { path: PathBuf, output: PathBuf },
    /// Run a bytecode image
    Exec { path: PathBuf },
    /// Interactive prompt
    Repl,
}
