// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Scope stack and the three name-resolution walks (§3.4, §4.4).
//!
//! Each [`Scope`] tracks locals/functions/labels/macros by name (the
//! source's four tries — a `HashMap` does the exact-match lookups each of
//! them actually needs). A function-boundary scope additionally accumulates
//! `function_uvs`: the upvalue descriptor table a closure's `push-closure`
//! reads from.

use std::collections::HashMap;

use crate::ir::LabelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Interpreted,
    HostCallback,
    Generator,
    Macro,
}

#[derive(Debug, Default)]
pub struct Scope {
    locals: HashMap<String, u32>,
    functions: HashMap<String, FunctionKind>,
    labels: HashMap<String, LabelId>,
    macros: HashMap<String, u32>,
    pub function_scope: bool,
    /// Stack indices, local to this scope, that some inner closure captured
    /// and that must be closed by a `release-upvalues` when the scope exits.
    pub scope_uvs: Vec<u32>,
    /// Upvalue descriptors for this function (only meaningful when
    /// `function_scope` is true): index == operand to `push-upvalue`.
    function_uvs: Vec<i32>,
    function_uv_names: HashMap<String, u32>,
}

impl Scope {
    pub fn new(function_scope: bool) -> Self {
        Scope {
            function_scope,
            ..Default::default()
        }
    }

    pub fn function_uvs(&self) -> &[i32] {
        &self.function_uvs
    }
}

#[derive(Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack { scopes: Vec::new() }
    }

    pub fn push(&mut self, function_scope: bool) {
        self.scopes.push(Scope::new(function_scope));
    }

    pub fn pop(&mut self) -> Scope {
        self.scopes.pop().expect("scope stack underflow")
    }

    pub fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is empty")
    }

    pub fn bind_local(&mut self, name: &str, stack_index: u32) {
        self.current_mut().locals.insert(name.to_string(), stack_index);
    }

    pub fn bind_function(&mut self, name: &str, kind: FunctionKind) {
        self.current_mut().functions.insert(name.to_string(), kind);
    }

    pub fn bind_label(&mut self, name: &str, label: LabelId) {
        self.current_mut().labels.insert(name.to_string(), label);
    }

    pub fn bind_macro(&mut self, name: &str, entry: u32) {
        self.current_mut().macros.insert(name.to_string(), entry);
    }

    pub fn lookup_label(&self, name: &str) -> Option<LabelId> {
        for scope in self.scopes.iter().rev() {
            if let Some(l) = scope.labels.get(name) {
                return Some(*l);
            }
        }
        None
    }

    pub fn lookup_macro(&self, name: &str) -> Option<u32> {
        for scope in self.scopes.iter().rev() {
            if let Some(e) = scope.macros.get(name) {
                return Some(*e);
            }
        }
        None
    }

    /// Walk 1 (§4.4): innermost-first within the *current* function, i.e.
    /// stop at (and include) the first function-boundary scope.
    pub fn resolve_local(&self, name: &str) -> Option<u32> {
        for scope in self.scopes.iter().rev() {
            if let Some(idx) = scope.locals.get(name) {
                return Some(*idx);
            }
            if scope.function_scope {
                break;
            }
        }
        None
    }

    /// Walk 3 (§4.4): same shape as `resolve_local` but over `functions_trie`,
    /// searching every enclosing scope (generators/macros/host callbacks are
    /// visible lexically, not just within one function).
    pub fn resolve_function(&self, name: &str) -> Option<FunctionKind> {
        for scope in self.scopes.iter().rev() {
            if let Some(kind) = scope.functions.get(name) {
                return Some(*kind);
            }
        }
        None
    }

    fn innermost_function_scope_index(&self) -> Option<usize> {
        self.scopes.iter().rposition(|s| s.function_scope)
    }

    /// The index of the function-boundary scope enclosing `fn_scope_idx`
    /// (the nearest `function_scope == true` scope strictly below it), or
    /// `None` if `fn_scope_idx` is the outermost function (top level).
    fn enclosing_function_scope_index(&self, fn_scope_idx: usize) -> Option<usize> {
        self.scopes[..fn_scope_idx].iter().rposition(|s| s.function_scope)
    }

    /// A true local of the function enclosing `fn_scope_idx`: walk scopes
    /// from `fn_scope_idx - 1` down to (and including) that function's own
    /// boundary scope.
    fn find_enclosing_local(&self, fn_scope_idx: usize, name: &str) -> Option<(u32, usize)> {
        let floor = self.enclosing_function_scope_index(fn_scope_idx).unwrap_or(0);
        for i in (floor..fn_scope_idx).rev() {
            if let Some(idx) = self.scopes[i].locals.get(name) {
                return Some((*idx, i));
            }
        }
        None
    }

    /// Walk 2 (§4.4): resolve `name` as an upvalue of the *innermost*
    /// function scope, cascading through as many enclosing functions as
    /// needed and chaining `HeapUpvalue` descriptors along the way. Returns
    /// the slot index in the innermost function's `function_uvs` (the
    /// `push-upvalue`/`set-upvalue` operand), or `None` if `name` is not a
    /// local of any enclosing function (presumed global).
    pub fn resolve_free(&mut self, name: &str) -> Option<u32> {
        let innermost = self.innermost_function_scope_index()?;
        self.ensure_upvalue(innermost, name)
    }

    fn ensure_upvalue(&mut self, fn_scope_idx: usize, name: &str) -> Option<u32> {
        if let Some(&slot) = self.scopes[fn_scope_idx].function_uv_names.get(name) {
            return Some(slot);
        }

        if let Some((local_idx, owner_idx)) = self.find_enclosing_local(fn_scope_idx, name) {
            let slot = self.push_function_uv(fn_scope_idx, name, local_idx as i32);
            self.scopes[owner_idx].scope_uvs.push(local_idx);
            return Some(slot);
        }

        let enclosing_fn = self.enclosing_function_scope_index(fn_scope_idx)?;
        let j = self.ensure_upvalue(enclosing_fn, name)?;
        let descriptor = -(j as i32 + 1);
        Some(self.push_function_uv(fn_scope_idx, name, descriptor))
    }

    fn push_function_uv(&mut self, fn_scope_idx: usize, name: &str, descriptor: i32) -> u32 {
        let scope = &mut self.scopes[fn_scope_idx];
        let slot = scope.function_uvs.len() as u32;
        scope.function_uvs.push(descriptor);
        scope.function_uv_names.insert(name.to_string(), slot);
        slot
    }

    pub fn current_function_uvs(&self) -> &[i32] {
        let idx = self.innermost_function_scope_index().expect("no function scope");
        self.scopes[idx].function_uvs()
    }

    pub fn current_scope_uvs(&self) -> &[u32] {
        &self.scopes.last().expect("scope stack is empty").scope_uvs
    }
}

#[cfg(test)]
mod scope_test;
