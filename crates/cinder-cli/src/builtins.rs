// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Host callbacks the CLI links in before running a program (§6.1). The
//! language itself has no I/O; `print` is the one callback the REPL and
//! file runner both install so a loaded program can write to stdout.

use cinder_core::heap::Heap;
use cinder_compiler::Compiler;
use cinder_vm::{RuntimeError, Vm};

use crate::printer::format_value;

/// Register every CLI-provided host callback into both `compiler` (so
/// `print` compiles to `ccall` rather than a dynamic-scope lookup) and
/// `vm` (so the symbol actually resolves to something at runtime).
pub fn install(compiler: &mut Compiler, vm: &mut Vm) -> Result<(), cinder_compiler::CompileError> {
    compiler.register_host_builtin("print")?;
    let sym = compiler.symtab.lookup("print").expect("just registered");
    vm.link_c_function(sym.id, Box::new(print_builtin));
    Ok(())
}

/// Pops its one argument, writes it to stdout, and pushes it back as its
/// own return value (so `(print x)` reads naturally as "x, printed").
fn print_builtin(vm: &mut Vm, heap: &mut Heap) -> Result<(), RuntimeError> {
    let v = vm.pop()?;
    println!("{}", format_value(heap, v));
    vm.push(v);
    Ok(())
}
