// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use cinder_core::heap::Heap;
use cinder_core::object::Object;

use super::*;

#[test]
fn repeated_intern_returns_the_same_id() {
    let mut heap = Heap::with_capacity(16);
    let mut table = SymbolTable::new();
    let a = table.intern(&mut heap, "foo").unwrap();
    let b = table.intern(&mut heap, "foo").unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.name, b.name);
}

#[test]
fn ids_are_assigned_in_first_seen_order() {
    let mut heap = Heap::with_capacity(16);
    let mut table = SymbolTable::new();
    let a = table.intern(&mut heap, "a").unwrap();
    let b = table.intern(&mut heap, "b").unwrap();
    assert_eq!(a.id.0, 0);
    assert_eq!(b.id.0, 1);
}

#[test]
fn name_backing_is_a_real_string_object() {
    let mut heap = Heap::with_capacity(16);
    let mut table = SymbolTable::new();
    let sym = table.intern(&mut heap, "bar").unwrap();
    match heap.get(sym.name) {
        Object::InternalString(s) => assert_eq!(s.bytes, b"bar"),
        _ => panic!("expected an interned string"),
    }
}
