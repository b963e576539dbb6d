// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use cinder_core::Heap;

#[test]
fn make_instance_roundtrips_value_and_function() {
    let mut heap = Heap::with_capacity(8);
    let mut vm = Vm::new();
    let tag = vm.fresh_type();
    let inst = make_instance(&mut heap, tag, Value::Integer(7), Value::Bool(true)).unwrap();
    assert_eq!(composite_value(&heap, inst).unwrap(), Value::Integer(7));
    assert_eq!(composite_function(&heap, inst).unwrap(), Value::Bool(true));
}

#[test]
fn set_composite_value_mutates_in_place() {
    let mut heap = Heap::with_capacity(8);
    let mut vm = Vm::new();
    let tag = vm.fresh_type();
    let inst = make_instance(&mut heap, tag, Value::Integer(1), Value::NIL).unwrap();
    set_composite_value(&mut heap, inst, Value::Integer(2)).unwrap();
    assert_eq!(composite_value(&heap, inst).unwrap(), Value::Integer(2));
}

#[test]
fn type_of_composite_returns_stored_tag() {
    let mut heap = Heap::with_capacity(8);
    let mut vm = Vm::new();
    let tag = vm.fresh_type();
    let inst = make_instance(&mut heap, tag, Value::NIL, Value::NIL).unwrap();
    assert_eq!(type_of(&heap, &mut vm, inst), Value::Type(tag));
}

#[test]
fn type_of_primitive_is_stable_across_calls() {
    let heap = Heap::with_capacity(8);
    let mut vm = Vm::new();
    let a = type_of(&heap, &mut vm, Value::Integer(1));
    let b = type_of(&heap, &mut vm, Value::Integer(2));
    assert_eq!(a, b);
}

#[test]
fn composite_value_on_non_composite_is_invalid() {
    let heap = Heap::with_capacity(8);
    assert_eq!(
        composite_value(&heap, Value::Integer(1)).unwrap_err(),
        ErrorKind::InvalidValue
    );
}
