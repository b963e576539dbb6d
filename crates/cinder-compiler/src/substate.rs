// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Sub-compile-state duality (§3.5): `runtime` and `comptime` each get their
//! own scope stack and assembly buffer, sharing the parent [`crate::SymbolTable`]
//! and heap. `comptime` is where macro bodies compile and run.

use crate::emitter::Emitter;
use crate::ir::Instr;
use crate::scope::ScopeStack;

#[derive(Default)]
pub struct SubCompileState {
    pub scopes: ScopeStack,
    pub emitter: Emitter,
}

impl SubCompileState {
    pub fn new() -> Self {
        SubCompileState::default()
    }

    pub fn emit(&mut self, instr: Instr) -> i64 {
        self.emitter.emit(instr)
    }

    pub fn depth(&self) -> i64 {
        self.emitter.depth()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Runtime,
    Comptime,
}
