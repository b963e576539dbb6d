// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The expression compiler (§4.7): dispatches on a form's shape, resolves
//! identifiers through the three scope walks, and orders compound-expression
//! handling macro → generator → host-callback → closure-binding →
//! dynamic-scope fallback.

use cinder_core::heap::Heap;
use cinder_core::object::Object;
use cinder_core::value::SymbolRef;
use cinder_core::{Ref, Value};

use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::generators;
use crate::ir::Instr;
use crate::scope::FunctionKind;

pub fn symbol_name<'h>(heap: &'h Heap, sym: &SymbolRef) -> Result<&'h str, CompileError> {
    match heap.get(sym.name) {
        Object::InternalString(s) => std::str::from_utf8(&s.bytes)
            .map_err(|_| CompileError::MalformedForm("symbol name is not valid utf-8")),
        _ => Err(CompileError::MalformedForm("symbol name is not backed by a string")),
    }
}

/// Flatten a proper list's cons chain into a `Vec`, as the reader built it.
pub fn list_items(heap: &Heap, r: Ref) -> Result<Vec<Value>, CompileError> {
    let mut out = Vec::new();
    let mut cur = Value::List(Some(r));
    loop {
        match cur {
            Value::List(None) => break,
            Value::List(Some(cell)) => match heap.get(cell) {
                Object::Cons(c) => {
                    out.push(c.car);
                    cur = c.cdr;
                }
                _ => return Err(CompileError::MalformedForm("improper list")),
            },
            _ => return Err(CompileError::MalformedForm("improper list")),
        }
    }
    Ok(out)
}

pub fn compile_expr(compiler: &mut Compiler, form: Value) -> Result<(), CompileError> {
    match form {
        Value::Bool(true) => {
            compiler.state().emit(Instr::PushBooleanTrue);
        }
        Value::Bool(false) => {
            compiler.state().emit(Instr::PushBooleanFalse);
        }
        Value::Integer(i) => {
            compiler.state().emit(Instr::PushInteger(i));
        }
        Value::Float(f) => {
            compiler.state().emit(Instr::PushDoubleFloat(f));
        }
        Value::Str(view) => {
            let bytes = string_bytes(&compiler.heap, view.backing, view.offset, view.len)?;
            compiler.state().emit(Instr::PushString { bytes });
        }
        Value::List(None) => {
            compiler.state().emit(Instr::Nil);
        }
        Value::Symbol(sym) => compile_identifier(compiler, sym)?,
        Value::List(Some(r)) => compile_compound(compiler, r)?,
        _ => return Err(CompileError::MalformedForm("value has no literal bytecode representation")),
    }
    Ok(())
}

fn string_bytes(heap: &Heap, backing: Ref, offset: u32, len: u32) -> Result<Vec<u8>, CompileError> {
    match heap.get(backing) {
        Object::InternalString(s) => {
            let start = offset as usize;
            let end = start + len as usize;
            s.bytes
                .get(start..end)
                .map(|b| b.to_vec())
                .ok_or(CompileError::MalformedForm("string view out of bounds"))
        }
        _ => Err(CompileError::MalformedForm("string value is not backed by a string")),
    }
}

fn compile_identifier(compiler: &mut Compiler, sym: SymbolRef) -> Result<(), CompileError> {
    let name = symbol_name(&compiler.heap, &sym)?.to_string();

    if let Some(idx) = compiler.state().scopes.resolve_local(&name) {
        let depth = compiler.state().depth();
        let offset = (depth - 1 - idx as i64).max(0) as u32;
        compiler.state().emit(Instr::PushIndex(offset));
        return Ok(());
    }

    if let Some(slot) = compiler.state().scopes.resolve_free(&name) {
        compiler.state().emit(Instr::PushUpvalue(slot));
        return Ok(());
    }

    tracing::warn!(symbol = %name, "resolving as a dynamic-scope global");
    let id = compiler.intern(&name)?.id;
    compiler.state().emit(Instr::PushGlobal(id));
    Ok(())
}

fn compile_compound(compiler: &mut Compiler, r: Ref) -> Result<(), CompileError> {
    let items = list_items(&compiler.heap, r)?;
    let (head, args) = items.split_first().ok_or(CompileError::EmptyForm)?;

    let head_sym = match head {
        Value::Symbol(s) => *s,
        _ => return Err(CompileError::NotAnOperator),
    };
    let name = symbol_name(&compiler.heap, &head_sym)?.to_string();

    if let Some(entry) = compiler.state().scopes.lookup_macro(&name) {
        return crate::macros::expand_and_compile(compiler, entry, args);
    }

    if generators::is_generator(&name) {
        return generators::compile(compiler, &name, args);
    }

    let kind = compiler.state().scopes.resolve_function(&name);
    if kind == Some(FunctionKind::HostCallback) {
        compile_ccall(compiler, &name, args)
    } else {
        compile_funcall(compiler, *head, args)
    }
}

fn compile_ccall(compiler: &mut Compiler, name: &str, args: &[Value]) -> Result<(), CompileError> {
    for a in args {
        compile_expr(compiler, *a)?;
    }
    let symbol = compiler.intern(name)?.id;
    compiler.state().emit(Instr::Ccall {
        symbol,
        argc: args.len() as u8,
    });
    Ok(())
}

/// Compile a quoted form as data rather than code (§4.7 `quote`): literals
/// compile the same as anywhere else, but a symbol becomes a `push-symbol`
/// instead of an identifier lookup and a cons cell is rebuilt at runtime
/// element by element.
pub fn compile_quoted(compiler: &mut Compiler, value: Value) -> Result<(), CompileError> {
    match value {
        Value::List(Some(r)) => {
            let (car, cdr) = match compiler.heap.get(r) {
                Object::Cons(c) => (c.car, c.cdr),
                _ => return Err(CompileError::MalformedForm("quoted cons cell is not a cons")),
            };
            compile_quoted(compiler, car)?;
            compile_quoted(compiler, cdr)?;
            compiler.state().emit(Instr::Cons);
            Ok(())
        }
        Value::Symbol(sym) => {
            let name = symbol_name(&compiler.heap, &sym)?.as_bytes().to_vec();
            compiler.state().emit(Instr::PushSymbol { id: sym.id, name });
            Ok(())
        }
        other => compile_expr(compiler, other),
    }
}

pub fn compile_funcall(compiler: &mut Compiler, callee: Value, args: &[Value]) -> Result<(), CompileError> {
    compile_expr(compiler, callee)?;
    for a in args {
        compile_expr(compiler, *a)?;
    }
    let argc = args.len() as u8;
    compiler.state().emit(Instr::Funcall {
        callee_offset: argc as u32,
        argc,
    });
    Ok(())
}

#[cfg(test)]
mod exprc_test;
