// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `cinder repl`: read-eval-print loop over stdin/stdout.
//!
//! One `Compiler` and one `Vm` live for the whole session, so `defun`/
//! `defmacro` at the top level persist across submissions the same way
//! they would across forms in a single file (both install into VM
//! globals via `set-static`). A top-level `(var ...)`'s binding is local
//! to the submission that creates it: the runtime scope is reset to a
//! fresh, empty one before every submission is compiled, so no submission
//! ever sees a stale local from an earlier one still occupying a stack
//! slot the fresh bytecode knows nothing about.

use std::io::{self, BufRead, Write};
use std::rc::Rc;

use cinder_core::object::{Bytecode, Object};
use cinder_compiler::{Compiler, SubCompileState};
use cinder_vm::{run as vm_run, RunOutcome, Vm};

use crate::builtins;
use crate::printer::format_value;

const PROMPT: &str = "cinder> ";
const CONTINUE_PROMPT: &str = "     -> ";

pub fn run(heap_objects: usize) -> anyhow::Result<()> {
    let mut compiler = Compiler::new(heap_objects);
    let mut vm = Vm::new();
    builtins::install(&mut compiler, &mut vm)?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut buffer = String::new();

    loop {
        print_prompt(if buffer.is_empty() { PROMPT } else { CONTINUE_PROMPT })?;
        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        let line = line?;
        if buffer.is_empty() && matches!(line.trim(), ":quit" | ":q") {
            return Ok(());
        }

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&line);

        if !is_balanced(&buffer) {
            continue;
        }
        let submission = std::mem::take(&mut buffer);
        if submission.trim().is_empty() {
            continue;
        }

        if let Err(e) = eval_submission(&mut compiler, &mut vm, &submission) {
            eprintln!("error: {e}");
        }
    }
}

fn print_prompt(p: &str) -> anyhow::Result<()> {
    print!("{p}");
    io::stdout().flush()?;
    Ok(())
}

/// A submission is ready to compile once every paren opened outside a
/// string literal has been closed. Deliberately simple: it does not
/// validate that the source is otherwise well-formed, only that reading
/// it won't run off the end looking for a missing `)`.
fn is_balanced(src: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in src.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

fn eval_submission(compiler: &mut Compiler, vm: &mut Vm, source: &str) -> anyhow::Result<()> {
    compiler.runtime = SubCompileState::new();
    compiler.runtime.scopes.push(true);

    let forms = cinder_reader::read_source(source, &mut compiler.heap, &mut compiler.symtab)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let code = compiler.compile_program(&forms).map_err(|e| anyhow::anyhow!("{e}"))?;

    let bytecode_ref = compiler
        .heap
        .alloc(Object::Bytecode(Bytecode { code: Rc::new(code) }))
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    vm.load(&compiler.heap, bytecode_ref);

    match vm_run(vm, &mut compiler.heap).map_err(|e| anyhow::anyhow!("{e}"))? {
        RunOutcome::Halted(v) => {
            println!("{}", format_value(&compiler.heap, v));
            Ok(())
        }
        RunOutcome::Yielded => {
            eprintln!("(yielded without halting)");
            Ok(())
        }
    }
}
