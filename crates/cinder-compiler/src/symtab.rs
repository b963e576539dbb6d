// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Compile-time symbol table (§3.4): name → id, and id → name, assigned in
//! first-seen order and never reused. Shared between the runtime and
//! comptime sub-states and append-only once the compiler starts running.
//!
//! The source keeps this as a prefix trie; nothing downstream ever needs a
//! prefix query, only exact-name lookup, so this is a `HashMap` instead
//! (decision recorded in DESIGN.md).

use std::collections::HashMap;

use cinder_core::heap::Heap;
use cinder_core::object::{InternalString, Object};
use cinder_core::refs::SymbolId;
use cinder_core::value::SymbolRef;
use cinder_core::{ErrorKind, Interner, Ref};

pub struct SymbolTable {
    by_name: HashMap<String, SymbolId>,
    names: Vec<Ref>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            by_name: HashMap::new(),
            names: Vec::new(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolRef> {
        self.by_name.get(name).map(|id| SymbolRef {
            id: *id,
            name: self.names[id.0 as usize],
        })
    }

    pub fn name_ref(&self, id: SymbolId) -> Ref {
        self.names[id.0 as usize]
    }
}

impl Interner for SymbolTable {
    fn intern(&mut self, heap: &mut Heap, name: &str) -> Result<SymbolRef, ErrorKind> {
        if let Some(sym) = self.lookup(name) {
            return Ok(sym);
        }
        let name_ref = heap.alloc(Object::InternalString(InternalString {
            bytes: name.as_bytes().to_vec(),
        }))?;
        let id = SymbolId(self.names.len() as u32);
        self.names.push(name_ref);
        self.by_name.insert(name.to_string(), id);
        Ok(SymbolRef { id, name: name_ref })
    }
}

#[cfg(test)]
mod symtab_test;
