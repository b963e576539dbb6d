// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use crate::compiler::Compiler;
use crate::scope::FunctionKind;

const HEAP_CAP: usize = 256;

#[test]
fn integer_literal_compiles_to_a_single_push() {
    let mut compiler = Compiler::new(HEAP_CAP);
    compile_expr(&mut compiler, Value::Integer(42)).unwrap();
    assert_eq!(compiler.runtime.emitter.instrs(), &[Instr::PushInteger(42)]);
    assert_eq!(compiler.runtime.depth(), 1);
}

#[test]
fn nil_and_booleans_use_their_own_zero_operand_families() {
    let mut compiler = Compiler::new(HEAP_CAP);
    compile_expr(&mut compiler, Value::List(None)).unwrap();
    compile_expr(&mut compiler, Value::Bool(true)).unwrap();
    compile_expr(&mut compiler, Value::Bool(false)).unwrap();
    assert_eq!(
        compiler.runtime.emitter.instrs(),
        &[Instr::Nil, Instr::PushBooleanTrue, Instr::PushBooleanFalse]
    );
}

#[test]
fn a_bound_local_resolves_to_an_offset_from_the_current_depth() {
    let mut compiler = Compiler::new(HEAP_CAP);
    compiler.runtime.emitter.set_depth(3);
    compiler.runtime.scopes.bind_local("x", 1);
    let sym = compiler.intern("x").unwrap();
    compile_identifier(&mut compiler, sym).unwrap();
    // depth(3) - 1 - idx(1) == 1
    assert_eq!(compiler.runtime.emitter.instrs(), &[Instr::PushIndex(1)]);
}

#[test]
fn an_unbound_name_falls_back_to_a_warned_global() {
    let mut compiler = Compiler::new(HEAP_CAP);
    let sym = compiler.intern("mystery").unwrap();
    compile_identifier(&mut compiler, sym).unwrap();
    assert_eq!(compiler.runtime.emitter.instrs(), &[Instr::PushGlobal(sym.id)]);
}

#[test]
fn a_registered_host_builtin_compiles_to_ccall_not_funcall() {
    let mut compiler = Compiler::new(HEAP_CAP);
    compiler.register_host_builtin("print").unwrap();
    let sym = compiler.symtab.lookup("print").unwrap();

    let forms = cinder_reader::read_source("(print 1 2)", &mut compiler.heap, &mut compiler.symtab).unwrap();
    compile_expr(&mut compiler, forms[0]).unwrap();

    assert_eq!(
        compiler.runtime.emitter.instrs(),
        &[
            Instr::PushInteger(1),
            Instr::PushInteger(2),
            Instr::Ccall { symbol: sym.id, argc: 2 },
        ]
    );
}

#[test]
fn an_ordinary_call_compiles_callee_then_args_then_funcall() {
    let mut compiler = Compiler::new(HEAP_CAP);
    compiler.runtime.scopes.bind_function("adder", FunctionKind::Interpreted);
    compiler.runtime.scopes.bind_local("adder", 0);

    let forms = cinder_reader::read_source("(adder 1 2)", &mut compiler.heap, &mut compiler.symtab).unwrap();
    compiler.runtime.emitter.set_depth(1);
    compile_expr(&mut compiler, forms[0]).unwrap();

    assert_eq!(
        compiler.runtime.emitter.instrs(),
        &[
            Instr::PushIndex(0),
            Instr::PushInteger(1),
            Instr::PushInteger(2),
            Instr::Funcall { callee_offset: 2, argc: 2 },
        ]
    );
}
