// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Mark-sweep collector over the [`crate::Heap`] pool (§4.1).
//!
//! The mark phase is iterative, driven by an explicit worklist, because
//! cons/upvalue chains can be arbitrarily deep and this must not recurse on
//! the host's call stack. Roots come in two flavours:
//!
//! - [`Root::Stack`] — a `Value` living on an operand stack. Its own bit is
//!   never set (stack slots are not heap slots); only its children are
//!   pushed onto the worklist.
//! - [`Root::Slot`] — a direct heap reference (globals, upvalue-stack
//!   entries, call-frame bytecode, the currently executing bytecode).

use tracing::debug;

use crate::error::ErrorKind;
use crate::heap::Heap;
use crate::object::{Object, UpvalueState};
use crate::refs::Ref;
use crate::value::Value;

#[derive(Debug, Clone, Copy)]
pub enum Root {
    Stack(Value),
    Slot(Ref),
}

fn push_value_children(v: Value, worklist: &mut Vec<Ref>) {
    if let Some(r) = v.as_ref() {
        worklist.push(r);
    }
}

fn push_object_children(heap: &Heap, obj: &Object, worklist: &mut Vec<Ref>) {
    match obj {
        Object::Cons(cons) => {
            push_value_children(cons.car, worklist);
            push_value_children(cons.cdr, worklist);
        }
        Object::Closure(c) => {
            worklist.push(c.upvalues);
            worklist.push(c.bytecode);
        }
        Object::Upvalue(state) => match state {
            UpvalueState::StackIndex(_) => {}
            UpvalueState::HeapObject(v) => push_value_children(*v, worklist),
            UpvalueState::HeapUpvalue(r) => worklist.push(*r),
        },
        Object::UpvalueArray(arr) => worklist.extend(arr.slots.iter().flatten().copied()),
        Object::InternalVector(vec) => {
            if vec.initialized {
                for elem in &vec.elems {
                    push_value_children(*elem, worklist);
                }
            }
        }
        Object::InternalString(_) | Object::Bytecode(_) => {}
        Object::InternalComposite(c) => {
            push_value_children(c.value, worklist);
            push_value_children(c.function, worklist);
        }
        Object::User(u) => {
            u.trace(&mut |v| push_value_children(v, worklist));
        }
    }
    let _ = heap;
}

fn mark(heap: &mut Heap, roots: impl IntoIterator<Item = Root>) {
    heap.clear_marks();
    let mut worklist = Vec::new();
    for root in roots {
        match root {
            Root::Stack(v) => push_value_children(v, &mut worklist),
            Root::Slot(r) => worklist.push(r),
        }
    }
    while let Some(r) = worklist.pop() {
        if heap.mark_slot(r) {
            push_object_children(heap, heap.get(r), &mut worklist);
        }
    }
}

/// Run one full mark-sweep, returning the number of slots reclaimed.
pub fn collect(heap: &mut Heap, roots: impl IntoIterator<Item = Root>) -> usize {
    mark(heap, roots);
    let freed = heap.sweep();
    debug!(freed, live = heap.live_count(), "gc cycle complete");
    freed
}

/// Allocate the object `make()` produces, running a collection and
/// retrying once if the pool is full (§4.1 `alloc` contract). `make` may be
/// invoked twice (an initial attempt, then once more after a collection),
/// so it must freshly construct the object each time rather than capture a
/// moved value.
pub fn alloc_or_gc(
    heap: &mut Heap,
    mut make: impl FnMut() -> Object,
    roots: impl FnOnce() -> Vec<Root>,
) -> Result<Ref, ErrorKind> {
    if let Ok(r) = heap.alloc(make()) {
        return Ok(r);
    }
    collect(heap, roots());
    heap.alloc(make())
}

#[cfg(test)]
mod gc_test;
