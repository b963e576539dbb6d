// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Cons/list/vector/string family (§4.3.5, §4.3.6) and the symbol/string
//! helper opcodes that share their shape.

use cinder_core::heap::Heap;
use cinder_core::object::{Cons, InternalString, InternalVector, Object};
use cinder_core::{ErrorKind, Ref, StrView, Value, VecView};

pub fn cons(heap: &mut Heap, car: Value, cdr: Value) -> Result<Value, ErrorKind> {
    let r = heap.alloc(Object::Cons(Cons { car, cdr }))?;
    Ok(Value::List(Some(r)))
}

pub fn car(heap: &Heap, v: Value) -> Result<Value, ErrorKind> {
    match v {
        Value::List(None) => Ok(Value::NIL),
        Value::List(Some(r)) => match heap.get(r) {
            Object::Cons(c) => Ok(c.car),
            _ => Err(ErrorKind::InvalidValue),
        },
        Value::Vector(view) => {
            if view.len == 0 {
                Ok(Value::Vector(view))
            } else {
                get_vec_elt(heap, Value::Vector(view), 0)
            }
        }
        Value::Str(view) => {
            if view.len == 0 {
                Ok(Value::Str(view))
            } else {
                get_vec_elt(heap, Value::Str(view), 0)
            }
        }
        _ => Err(ErrorKind::InvalidValue),
    }
}

pub fn cdr(heap: &Heap, v: Value) -> Result<Value, ErrorKind> {
    match v {
        Value::List(None) => Ok(Value::NIL),
        Value::List(Some(r)) => match heap.get(r) {
            Object::Cons(c) => Ok(c.cdr),
            _ => Err(ErrorKind::InvalidValue),
        },
        Value::Vector(view) => Ok(Value::Vector(shift_view(view))),
        Value::Str(view) => Ok(Value::Str(shift_string_view(view))),
        _ => Err(ErrorKind::InvalidValue),
    }
}

fn shift_view(v: VecView) -> VecView {
    if v.len == 0 {
        v
    } else {
        VecView {
            backing: v.backing,
            offset: v.offset + 1,
            len: v.len - 1,
        }
    }
}

fn shift_string_view(v: StrView) -> StrView {
    if v.len == 0 {
        v
    } else {
        StrView {
            backing: v.backing,
            offset: v.offset + 1,
            len: v.len - 1,
        }
    }
}

pub fn set_car(heap: &mut Heap, target: Value, value: Value) -> Result<(), ErrorKind> {
    match target {
        Value::List(Some(r)) => match heap.get_mut(r) {
            Object::Cons(c) => {
                c.car = value;
                Ok(())
            }
            _ => Err(ErrorKind::InvalidValue),
        },
        Value::Vector(view) if view.len > 0 => set_vec_elt(heap, Value::Vector(view), 0, value),
        _ => Err(ErrorKind::InvalidValue),
    }
}

/// A vector has no cdr cell to rewrite, unlike a cons whose cdr field is
/// just another `Value` slot. Adopting the source's idiosyncratic choice
/// (§9 open question, decision recorded in DESIGN.md): `set-cdr nil` on a
/// non-empty vector truncates its logical length to zero, i.e. the view
/// collapses to empty at its current offset. Any other new-cdr value on a
/// vector has no sensible interpretation and is rejected.
pub fn set_cdr(heap: &mut Heap, target: Value, value: Value) -> Result<Value, ErrorKind> {
    match target {
        Value::List(Some(r)) => match heap.get_mut(r) {
            Object::Cons(c) => {
                c.cdr = value;
                Ok(target)
            }
            _ => Err(ErrorKind::InvalidValue),
        },
        Value::Vector(view) if view.len > 0 => match value {
            Value::List(None) => Ok(Value::Vector(VecView {
                backing: view.backing,
                offset: view.offset,
                len: 0,
            })),
            _ => Err(ErrorKind::InvalidValue),
        },
        _ => Err(ErrorKind::InvalidValue),
    }
}

pub fn make_vector(heap: &mut Heap, length: Value, fill: Value) -> Result<Value, ErrorKind> {
    let len = match length {
        Value::Integer(i) if i >= 0 => i as usize,
        _ => return Err(ErrorKind::InvalidValue),
    };
    let backing = heap.alloc(Object::InternalVector(InternalVector {
        elems: vec![fill; len],
        initialized: true,
    }))?;
    Ok(Value::Vector(VecView {
        backing,
        offset: 0,
        len: len as u32,
    }))
}

pub fn get_vec_elt(heap: &Heap, v: Value, i: i64) -> Result<Value, ErrorKind> {
    match v {
        Value::Vector(view) => {
            if i < 0 || i as u32 >= view.len {
                return Err(ErrorKind::BufferOverflow);
            }
            match heap.get(view.backing) {
                Object::InternalVector(iv) => Ok(iv.elems[(view.offset as i64 + i) as usize]),
                _ => Err(ErrorKind::InvalidValue),
            }
        }
        Value::Str(view) => {
            if i < 0 || i as u32 >= view.len {
                return Err(ErrorKind::BufferOverflow);
            }
            match heap.get(view.backing) {
                Object::InternalString(s) => {
                    Ok(Value::Integer(s.bytes[(view.offset as i64 + i) as usize] as i64))
                }
                _ => Err(ErrorKind::InvalidValue),
            }
        }
        _ => Err(ErrorKind::InvalidValue),
    }
}

pub fn set_vec_elt(heap: &mut Heap, v: Value, i: i64, x: Value) -> Result<(), ErrorKind> {
    match v {
        Value::Vector(view) => {
            if i < 0 || i as u32 >= view.len {
                return Err(ErrorKind::BufferOverflow);
            }
            match heap.get_mut(view.backing) {
                Object::InternalVector(iv) => {
                    iv.elems[(view.offset as i64 + i) as usize] = x;
                    Ok(())
                }
                _ => Err(ErrorKind::InvalidValue),
            }
        }
        Value::Str(_) => Err(ErrorKind::InvalidValue),
        _ => Err(ErrorKind::InvalidValue),
    }
}

pub fn nullp(v: Value) -> Result<Value, ErrorKind> {
    match v {
        Value::List(r) => Ok(Value::Bool(r.is_none())),
        Value::Vector(view) => Ok(Value::Bool(view.len == 0)),
        Value::Str(view) => Ok(Value::Bool(view.len == 0)),
        _ => Err(ErrorKind::InvalidValue),
    }
}

/// Brent's cycle-detection algorithm (§4.3.6): a slow pointer, a fast
/// pointer, and a power-of-two cycle-probe stride. The fast pointer
/// catching up to the slow one proves a cycle without an unbounded visited
/// set.
pub fn length(heap: &Heap, v: Value) -> Result<i64, ErrorKind> {
    match v {
        Value::Vector(view) => Ok(view.len as i64),
        Value::Str(view) => Ok(view.len as i64),
        Value::List(head) => length_of_list(heap, head),
        _ => Err(ErrorKind::InvalidValue),
    }
}

fn next_cons(heap: &Heap, r: Ref) -> Result<Option<Ref>, ErrorKind> {
    match heap.get(r) {
        Object::Cons(c) => match c.cdr {
            Value::List(next) => Ok(next),
            _ => Ok(None),
        },
        _ => Err(ErrorKind::InvalidValue),
    }
}

fn length_of_list(heap: &Heap, head: Option<Ref>) -> Result<i64, ErrorKind> {
    let Some(start) = head else {
        return Ok(0);
    };

    let mut power: u64 = 1;
    let mut stride: u64 = 1;
    let mut slow = start;
    let mut fast = start;
    let mut count: i64 = 0;

    loop {
        match next_cons(heap, fast)? {
            None => return Ok(count + 1),
            Some(next_fast) => {
                fast = next_fast;
                count += 1;
            }
        }
        if slow == fast {
            return Err(ErrorKind::InvalidValue);
        }
        if stride == power {
            slow = fast;
            power *= 2;
            stride = 0;
        }
        stride += 1;
    }
}

/// `name` already references an InternalString; wrap it as a zero-copy
/// `StrView` rather than allocating a fresh buffer.
pub fn symbol_string(heap: &Heap, name: Ref) -> Result<Value, ErrorKind> {
    let len = match heap.get(name) {
        Object::InternalString(s) => s.bytes.len() as u32,
        _ => return Err(ErrorKind::InvalidValue),
    };
    Ok(Value::Str(StrView {
        backing: name,
        offset: 0,
        len,
    }))
}

pub fn make_string(heap: &mut Heap, source: Value) -> Result<Value, ErrorKind> {
    let bytes = match source {
        Value::Vector(view) => match heap.get(view.backing) {
            Object::InternalVector(iv) => iv.elems[view.offset as usize..(view.offset + view.len) as usize]
                .iter()
                .map(|v| v.as_integer().map(|i| i as u8).ok_or(ErrorKind::InvalidValue))
                .collect::<Result<Vec<u8>, ErrorKind>>()?,
            _ => return Err(ErrorKind::InvalidValue),
        },
        Value::List(head) => {
            let mut out = Vec::new();
            let mut cursor = head;
            while let Some(r) = cursor {
                match heap.get(r) {
                    Object::Cons(c) => {
                        let byte = c.car.as_integer().ok_or(ErrorKind::InvalidValue)? as u8;
                        out.push(byte);
                        cursor = match c.cdr {
                            Value::List(next) => next,
                            _ => return Err(ErrorKind::InvalidValue),
                        };
                    }
                    _ => return Err(ErrorKind::InvalidValue),
                }
            }
            out
        }
        _ => return Err(ErrorKind::InvalidValue),
    };
    let backing = heap.alloc(Object::InternalString(InternalString { bytes }))?;
    let len = match heap.get(backing) {
        Object::InternalString(s) => s.bytes.len() as u32,
        _ => unreachable!(),
    };
    Ok(Value::Str(StrView {
        backing,
        offset: 0,
        len,
    }))
}

fn text_of(heap: &Heap, v: Value) -> Result<Vec<u8>, ErrorKind> {
    match v {
        Value::Str(view) => match heap.get(view.backing) {
            Object::InternalString(s) => Ok(s.bytes
                [view.offset as usize..(view.offset + view.len) as usize]
                .to_vec()),
            _ => Err(ErrorKind::InvalidValue),
        },
        Value::Symbol(sym) => match heap.get(sym.name) {
            Object::InternalString(s) => Ok(s.bytes.clone()),
            _ => Err(ErrorKind::InvalidValue),
        },
        _ => Err(ErrorKind::InvalidValue),
    }
}

pub fn concatenate(heap: &mut Heap, a: Value, b: Value) -> Result<Value, ErrorKind> {
    let mut bytes = text_of(heap, a)?;
    bytes.extend(text_of(heap, b)?);
    let len = bytes.len() as u32;
    let backing = heap.alloc(Object::InternalString(InternalString { bytes }))?;
    Ok(Value::Str(StrView {
        backing,
        offset: 0,
        len,
    }))
}

pub fn substring(str_v: Value, start: i64, end: i64) -> Result<Value, ErrorKind> {
    let view = match str_v {
        Value::Str(v) => v,
        _ => return Err(ErrorKind::InvalidValue),
    };
    if start < 0 || end < start || end as u32 > view.len {
        return Err(ErrorKind::BufferOverflow);
    }
    Ok(Value::Str(StrView {
        backing: view.backing,
        offset: view.offset + start as u32,
        len: (end - start) as u32,
    }))
}

#[cfg(test)]
mod sequences_test;
