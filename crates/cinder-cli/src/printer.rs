// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Render a runtime [`Value`] back to source-like text for the REPL and the
//! file runner. Not part of the language itself (§1 out-of-scope: the
//! printer, like the reader, is a collaborator the compiler core never
//! touches) — this is purely CLI-side convenience.

use std::fmt::Write as _;

use cinder_core::heap::Heap;
use cinder_core::object::Object;
use cinder_core::Value;

pub fn format_value(heap: &Heap, v: Value) -> String {
    let mut out = String::new();
    write_value(heap, v, &mut out);
    out
}

fn write_value(heap: &Heap, v: Value, out: &mut String) {
    match v {
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => {
            let _ = write!(out, "{f}");
        }
        Value::Str(view) => {
            let bytes = string_bytes(heap, view.backing, view.offset, view.len);
            out.push('"');
            out.push_str(&String::from_utf8_lossy(bytes));
            out.push('"');
        }
        Value::Symbol(sym) => {
            if let Object::InternalString(s) = heap.get(sym.name) {
                out.push_str(&String::from_utf8_lossy(&s.bytes));
            } else {
                out.push_str("<symbol>");
            }
        }
        Value::Function(_) => out.push_str("<host-function>"),
        Value::Closure(_) => out.push_str("<closure>"),
        Value::List(None) => out.push_str("()"),
        Value::List(Some(r)) => {
            out.push('(');
            let mut cur = Value::List(Some(r));
            let mut first = true;
            loop {
                match cur {
                    Value::List(None) => break,
                    Value::List(Some(cell)) => match heap.get(cell) {
                        Object::Cons(c) => {
                            if !first {
                                out.push(' ');
                            }
                            first = false;
                            write_value(heap, c.car, out);
                            cur = c.cdr;
                        }
                        _ => {
                            out.push_str(" . <malformed>");
                            break;
                        }
                    },
                    other => {
                        out.push_str(" . ");
                        write_value(heap, other, out);
                        break;
                    }
                }
            }
            out.push(')');
        }
        Value::Vector(view) => {
            out.push_str("#(");
            if let Object::InternalVector(vec) = heap.get(view.backing) {
                let start = view.offset as usize;
                let end = start + view.len as usize;
                for (i, elem) in vec.elems[start..end].iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    write_value(heap, *elem, out);
                }
            }
            out.push(')');
        }
        Value::Composite(_) => out.push_str("<composite>"),
        Value::Type(t) => {
            let _ = write!(out, "<type {}>", t.0);
        }
        Value::User(_) => out.push_str("<user>"),
    }
}

fn string_bytes(heap: &Heap, backing: cinder_core::Ref, offset: u32, len: u32) -> &[u8] {
    match heap.get(backing) {
        Object::InternalString(s) => {
            let start = offset as usize;
            let end = start + len as usize;
            s.bytes.get(start..end).unwrap_or(&[])
        }
        _ => &[],
    }
}
