// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The macro bridge (§4.9): `defmacro` compiles its body as an ordinary
//! lambda under the comptime sub-state and installs it as a comptime
//! global; a macro call quote-wraps its arguments, invokes that global on
//! the comptime `Vm`, and recompiles whatever `Value` tree comes back in
//! the call's place. Source and data share one representation (the reader
//! is homoiconic), so the macro's return value needs no translation before
//! being fed straight back into the expression compiler.

use cinder_core::refs::SymbolId;
use cinder_core::Value;

use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::exprc;
use crate::generators;
use crate::ir::Instr;
use crate::substate::Target;

pub fn compile_defmacro(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let (name_form, rest) = args
        .split_first()
        .ok_or(CompileError::MalformedForm("defmacro needs a name"))?;
    let name_sym = match name_form {
        Value::Symbol(s) => *s,
        _ => return Err(CompileError::MalformedForm("defmacro's name must be a symbol")),
    };
    let name = exprc::symbol_name(&compiler.heap, &name_sym)?.to_string();
    let id = compiler.intern(&name)?.id;

    let prev = compiler.switch_to(Target::Comptime);
    compiler.comptime.emitter.take_instrs();

    generators::compile_lambda(compiler, rest)?;
    compiler.state().emit(Instr::SetStatic { src_offset: 0, symbol: id });
    compiler.state().emit(Instr::Halt);

    let instrs = compiler.comptime.emitter.take_instrs();
    compiler.run_comptime(&instrs)?;
    compiler.switch_to(prev);

    compiler.runtime.scopes.bind_macro(&name, id.0);
    compiler.comptime.scopes.bind_macro(&name, id.0);
    Ok(())
}

/// Expand a macro call: run `name`'s transform function on the comptime
/// `Vm` with each argument passed unevaluated (quoted), then compile
/// whatever it returns in place of the original call.
pub fn expand_and_compile(compiler: &mut Compiler, macro_symbol_id: u32, args: &[Value]) -> Result<(), CompileError> {
    let prev = compiler.switch_to(Target::Comptime);
    compiler.comptime.emitter.take_instrs();

    compiler.state().emit(Instr::PushGlobal(SymbolId(macro_symbol_id)));
    for a in args {
        exprc::compile_quoted(compiler, *a)?;
    }
    let argc = args.len() as u8;
    compiler.state().emit(Instr::Funcall {
        callee_offset: argc as u32,
        argc,
    });
    compiler.state().emit(Instr::Halt);

    let instrs = compiler.comptime.emitter.take_instrs();
    let result = compiler.run_comptime(&instrs)?;
    compiler.switch_to(prev);

    exprc::compile_expr(compiler, result)
}

#[cfg(test)]
mod macros_test;
