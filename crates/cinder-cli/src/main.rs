// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Cinder CLI
//!
//! The `cinder` binary: a REPL, a file runner and a bytecode disassembler
//! built on top of the `cinder-reader` / `cinder-compiler` / `cinder-vm`
//! library crates. Everything this binary does is a convenience layer
//! around those three; none of the language's own semantics live here.

mod builtins;
mod disasm;
mod printer;
mod repl;
mod run;

use clap::{Parser, Subcommand};

const DEFAULT_HEAP_OBJECTS: usize = 1 << 16;

#[derive(Parser)]
#[command(name = "cinder", about = "Cinder: a self-hosted Lisp compiler and bytecode VM")]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Number of heap object slots to reserve up front.
    #[arg(long, default_value_t = DEFAULT_HEAP_OBJECTS, global = true)]
    heap_objects: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive read-eval-print loop.
    Repl,
    /// Compile and run a source file, printing its final value.
    Run {
        file: String,
    },
    /// Compile a source file and print its assembled bytecode.
    Disassemble {
        file: String,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("cinder={level},cinder_compiler={level},cinder_vm={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Command::Repl) {
        Command::Repl => repl::run(cli.heap_objects),
        Command::Run { file } => run::run_file(&file, cli.heap_objects),
        Command::Disassemble { file } => {
            let source = std::fs::read_to_string(&file)?;
            let mut compiler = cinder_compiler::Compiler::new(cli.heap_objects);
            let forms = cinder_reader::read_source(&source, &mut compiler.heap, &mut compiler.symtab)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            let code = compiler.compile_program(&forms).map_err(|e| anyhow::anyhow!("{e}"))?;
            print!("{}", disasm::disassemble(&code));
            Ok(())
        }
    }
}
