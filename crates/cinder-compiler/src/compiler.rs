// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The compiler proper (§3.5): owns the heap, the shared symbol table, both
//! sub-compile-states and the VM that runs macro bodies at compile time.

use cinder_core::heap::Heap;
use cinder_core::object::{Bytecode, Object};
use cinder_core::value::SymbolRef;
use cinder_core::{Interner, Value};
use cinder_vm::{run, RunOutcome, Vm};

use crate::assembler;
use crate::error::CompileError;
use crate::ir::Instr;
use crate::scope::FunctionKind;
use crate::substate::{SubCompileState, Target};
use crate::symtab::SymbolTable;

pub struct Compiler {
    pub heap: Heap,
    pub symtab: SymbolTable,
    pub runtime: SubCompileState,
    pub comptime: SubCompileState,
    pub current: Target,
    pub comptime_vm: Vm,
}

impl Compiler {
    pub fn new(heap_capacity: usize) -> Self {
        let mut compiler = Compiler {
            heap: Heap::with_capacity(heap_capacity),
            symtab: SymbolTable::new(),
            runtime: SubCompileState::new(),
            comptime: SubCompileState::new(),
            current: Target::Runtime,
            comptime_vm: Vm::new(),
        };
        compiler.runtime.scopes.push(true);
        compiler.comptime.scopes.push(true);
        compiler
    }

    pub fn state(&mut self) -> &mut SubCompileState {
        match self.current {
            Target::Runtime => &mut self.runtime,
            Target::Comptime => &mut self.comptime,
        }
    }

    /// Switch the active sub-state, returning the one that was active so
    /// the caller can restore it (§4.9 macro bridge).
    pub fn switch_to(&mut self, target: Target) -> Target {
        std::mem::replace(&mut self.current, target)
    }

    pub fn intern(&mut self, name: &str) -> Result<SymbolRef, CompileError> {
        self.symtab.intern(&mut self.heap, name).map_err(Into::into)
    }

    /// Register a host callback name the embedding program will install
    /// into the runtime `Vm`'s globals before execution, so the compiler
    /// knows to emit `ccall` rather than `funcall` for it (§4.7 dispatch
    /// order: host-callback before closure-binding).
    pub fn register_host_builtin(&mut self, name: &str) -> Result<(), CompileError> {
        self.intern(name)?;
        self.runtime.scopes.bind_function(name, FunctionKind::HostCallback);
        self.comptime.scopes.bind_function(name, FunctionKind::HostCallback);
        Ok(())
    }

    /// Compile every top-level form into one bytecode buffer, leaving the
    /// final form's value as the sole operand at `halt`. Goes through the
    /// same `compile_sequence` every function body does, so a top-level
    /// `(var ...)` persists for the rest of the program exactly like one
    /// inside a function persists for the rest of that function.
    pub fn compile_program(&mut self, forms: &[Value]) -> Result<Vec<u8>, CompileError> {
        crate::generators::compile_sequence(self, forms, true)?;
        self.runtime.emit(Instr::Halt);
        assembler::assemble(self.runtime.emitter.instrs())
    }

    /// Assemble `instrs` and run them to completion on the comptime `Vm`,
    /// sharing this compiler's heap (§4.9).
    pub fn run_comptime(&mut self, instrs: &[Instr]) -> Result<Value, CompileError> {
        let code = assembler::assemble(instrs)?;
        let bytecode_ref = self
            .heap
            .alloc(Object::Bytecode(Bytecode {
                code: std::rc::Rc::new(code),
            }))
            .map_err(CompileError::from)?;
        self.comptime_vm.load(&self.heap, bytecode_ref);
        match run(&mut self.comptime_vm, &mut self.heap)? {
            RunOutcome::Halted(v) => Ok(v),
            RunOutcome::Yielded => Err(CompileError::MalformedForm("macro body yielded instead of returning")),
        }
    }
}
