// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use crate::object::{Cons, Object};
use crate::value::Value;

#[test]
fn alloc_fills_capacity_then_fails() {
    let mut heap = Heap::with_capacity(2);
    let a = heap
        .alloc(Object::Cons(Cons {
            car: Value::Integer(1),
            cdr: Value::NIL,
        }))
        .unwrap();
    let b = heap
        .alloc(Object::Cons(Cons {
            car: Value::Integer(2),
            cdr: Value::NIL,
        }))
        .unwrap();
    assert_ne!(a, b);
    assert_eq!(heap.live_count(), 2);

    let err = heap.alloc(Object::Cons(Cons {
        car: Value::NIL,
        cdr: Value::NIL,
    }));
    assert_eq!(err.unwrap_err(), ErrorKind::OutOfMemory);
}

#[test]
fn sweep_reclaims_unmarked_slots() {
    let mut heap = Heap::with_capacity(2);
    let a = heap
        .alloc(Object::Cons(Cons {
            car: Value::Integer(1),
            cdr: Value::NIL,
        }))
        .unwrap();
    let _b = heap
        .alloc(Object::Cons(Cons {
            car: Value::Integer(2),
            cdr: Value::NIL,
        }))
        .unwrap();

    heap.clear_marks();
    heap.mark_slot(a);
    let freed = heap.sweep();
    assert_eq!(freed, 1);
    assert_eq!(heap.live_count(), 1);
    assert!(heap.is_live(a));

    // The freed slot is reusable.
    let c = heap
        .alloc(Object::Cons(Cons {
            car: Value::Integer(3),
            cdr: Value::NIL,
        }))
        .unwrap();
    assert_eq!(heap.live_count(), 2);
    let _ = c;
}

#[test]
fn quit_clears_every_slot() {
    let mut heap = Heap::with_capacity(1);
    heap.alloc(Object::Cons(Cons {
        car: Value::NIL,
        cdr: Value::NIL,
    }))
    .unwrap();
    heap.quit();
    assert_eq!(heap.live_count(), 0);
}
