// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `cinder run <file>`: compile a whole source file as one top-level
//! program and execute it to completion, printing the final form's value.

use std::rc::Rc;

use anyhow::{bail, Context};
use cinder_core::object::{Bytecode, Object};
use cinder_compiler::Compiler;
use cinder_vm::{run as vm_run, RunOutcome, Vm};

use crate::builtins;
use crate::printer::format_value;

pub fn run_file(path: &str, heap_objects: usize) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;

    let mut compiler = Compiler::new(heap_objects);
    let mut vm = Vm::new();
    builtins::install(&mut compiler, &mut vm).context("registering host callbacks")?;

    let forms = cinder_reader::read_source(&source, &mut compiler.heap, &mut compiler.symtab)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("reading source")?;
    let code = compiler
        .compile_program(&forms)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("compiling source")?;

    let bytecode_ref = compiler
        .heap
        .alloc(Object::Bytecode(Bytecode { code: Rc::new(code) }))
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("allocating assembled bytecode")?;
    vm.load(&compiler.heap, bytecode_ref);

    match vm_run(&mut vm, &mut compiler.heap).map_err(|e| anyhow::anyhow!("{e}"))? {
        RunOutcome::Halted(v) => {
            println!("{}", format_value(&compiler.heap, v));
            Ok(())
        }
        RunOutcome::Yielded => bail!("program yielded at top level instead of halting"),
    }
}
