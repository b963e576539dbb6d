// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use std::collections::HashMap;

use cinder_core::object::{Cons, Object};
use cinder_core::refs::SymbolId;
use cinder_core::{ErrorKind, SymbolRef};

use super::*;

/// Minimal interner for tests: just enough of the real compiler symbol
/// table's behaviour (first-seen ids, stable across lookups) to exercise
/// the parser without depending on `cinder-compiler`.
#[derive(Default)]
struct TestInterner {
    ids: HashMap<String, SymbolId>,
    next: u32,
}

impl Interner for TestInterner {
    fn intern(&mut self, heap: &mut Heap, name: &str) -> Result<SymbolRef, ErrorKind> {
        let id = match self.ids.get(name) {
            Some(id) => *id,
            None => {
                let id = SymbolId(self.next);
                self.next += 1;
                self.ids.insert(name.to_string(), id);
                id
            }
        };
        let name_ref = heap.alloc(Object::InternalString(
            cinder_core::object::InternalString {
                bytes: name.as_bytes().to_vec(),
            },
        ))?;
        Ok(SymbolRef {
            id,
            name: name_ref,
        })
    }
}

fn cons(heap: &Heap, v: Value) -> Cons {
    match v {
        Value::List(Some(r)) => match heap.get(r) {
            Object::Cons(c) => *c,
            _ => panic!("expected cons"),
        },
        _ => panic!("expected non-empty list"),
    }
}

#[test]
fn parses_atoms() {
    let mut heap = Heap::with_capacity(64);
    let mut interner = TestInterner::default();
    let values = read_source("1 2.5 true false \"hi\"", &mut heap, &mut interner).unwrap();
    assert_eq!(values.len(), 5);
    assert_eq!(values[0], Value::Integer(1));
    assert_eq!(values[1], Value::Float(2.5));
    assert_eq!(values[2], Value::Bool(true));
    assert_eq!(values[3], Value::Bool(false));
    match values[4] {
        Value::Str(v) => assert_eq!(v.len, 2),
        _ => panic!("expected string"),
    }
}

#[test]
fn parses_nested_lists_as_cons_chains() {
    let mut heap = Heap::with_capacity(64);
    let mut interner = TestInterner::default();
    let values = read_source("(+ 1 (- 2 3))", &mut heap, &mut interner).unwrap();
    assert_eq!(values.len(), 1);

    let head = cons(&heap, values[0]);
    assert!(matches!(head.car, Value::Symbol(_)));
    let second = cons(&heap, head.cdr);
    assert_eq!(second.car, Value::Integer(1));
    let third = cons(&heap, second.cdr);
    assert!(matches!(third.car, Value::List(Some(_))));
    let tail = cons(&heap, third.cdr);
    assert_eq!(tail.car, Value::NIL);
    assert_eq!(tail.cdr, Value::NIL);
}

#[test]
fn quote_shorthand_desugars_to_quote_form() {
    let mut heap = Heap::with_capacity(64);
    let mut interner = TestInterner::default();
    let values = read_source("'x", &mut heap, &mut interner).unwrap();
    let outer = cons(&heap, values[0]);
    match outer.car {
        Value::Symbol(s) => {
            let name = match heap.get(s.name) {
                Object::InternalString(s) => std::str::from_utf8(&s.bytes).unwrap().to_string(),
                _ => panic!(),
            };
            assert_eq!(name, "quote");
        }
        _ => panic!("expected symbol"),
    }
    let inner = cons(&heap, outer.cdr);
    assert!(matches!(inner.car, Value::Symbol(_)));
    assert_eq!(inner.cdr, Value::NIL);
}

#[test]
fn symbol_ids_are_stable_across_occurrences() {
    let mut heap = Heap::with_capacity(64);
    let mut interner = TestInterner::default();
    let values = read_source("(foo foo)", &mut heap, &mut interner).unwrap();
    let head = cons(&heap, values[0]);
    let second = cons(&heap, head.cdr);
    let (Value::Symbol(a), Value::Symbol(b)) = (head.car, second.car) else {
        panic!("expected symbols");
    };
    assert_eq!(a.id, b.id);
}

#[test]
fn unmatched_paren_is_an_error() {
    let mut heap = Heap::with_capacity(64);
    let mut interner = TestInterner::default();
    let err = read_source("(+ 1 2", &mut heap, &mut interner).unwrap_err();
    assert_eq!(err, ReadError::UnexpectedEof);
}

#[test]
fn dangling_quote_is_an_error() {
    let mut heap = Heap::with_capacity(64);
    let mut interner = TestInterner::default();
    let err = read_source("(')", &mut heap, &mut interner).unwrap_err();
    assert_eq!(err, ReadError::DanglingQuote);
}
