// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! User-defined composite ops (§4.3.1, GLOSSARY "Composite").

use cinder_core::heap::Heap;
use cinder_core::object::{InternalComposite, Object};
use cinder_core::refs::TypeId;
use cinder_core::{ErrorKind, Value};

use crate::process::Vm;

pub fn make_instance(
    heap: &mut Heap,
    type_tag: TypeId,
    value: Value,
    function: Value,
) -> Result<Value, ErrorKind> {
    let r = heap.alloc(Object::InternalComposite(InternalComposite {
        type_tag,
        value,
        function,
    }))?;
    Ok(Value::Composite(r))
}

fn composite_of(heap: &Heap, v: Value) -> Result<&InternalComposite, ErrorKind> {
    match v {
        Value::Composite(r) => match heap.get(r) {
            Object::InternalComposite(c) => Ok(c),
            _ => Err(ErrorKind::InvalidValue),
        },
        _ => Err(ErrorKind::InvalidValue),
    }
}

pub fn composite_value(heap: &Heap, v: Value) -> Result<Value, ErrorKind> {
    Ok(composite_of(heap, v)?.value)
}

pub fn composite_function(heap: &Heap, v: Value) -> Result<Value, ErrorKind> {
    Ok(composite_of(heap, v)?.function)
}

pub fn set_composite_value(heap: &mut Heap, v: Value, new_value: Value) -> Result<(), ErrorKind> {
    match v {
        Value::Composite(r) => match heap.get_mut(r) {
            Object::InternalComposite(c) => {
                c.value = new_value;
                Ok(())
            }
            _ => Err(ErrorKind::InvalidValue),
        },
        _ => Err(ErrorKind::InvalidValue),
    }
}

pub fn set_composite_function(
    heap: &mut Heap,
    v: Value,
    new_function: Value,
) -> Result<(), ErrorKind> {
    match v {
        Value::Composite(r) => match heap.get_mut(r) {
            Object::InternalComposite(c) => {
                c.function = new_function;
                Ok(())
            }
            _ => Err(ErrorKind::InvalidValue),
        },
        _ => Err(ErrorKind::InvalidValue),
    }
}

/// `type-of` returns a `Type` value for every variant; heap-backed
/// composites return their stored tag, everything else gets a stable tag
/// reserved per primitive type (assigned by the VM's type registry).
pub fn type_of(heap: &Heap, vm: &mut Vm, v: Value) -> Value {
    match v {
        Value::Composite(_) => match composite_of(heap, v) {
            Ok(c) => Value::Type(c.type_tag),
            Err(_) => Value::Type(vm.primitive_type_tag(v.type_name())),
        },
        _ => Value::Type(vm.primitive_type_tag(v.type_name())),
    }
}

#[cfg(test)]
mod composite_test;
