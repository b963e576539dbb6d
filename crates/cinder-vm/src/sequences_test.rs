// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

fn alloc_str(heap: &mut Heap, s: &str) -> Value {
    let backing = heap
        .alloc(Object::InternalString(InternalString {
            bytes: s.as_bytes().to_vec(),
        }))
        .unwrap();
    Value::Str(StrView {
        backing,
        offset: 0,
        len: s.len() as u32,
    })
}

#[test]
fn cons_car_cdr_roundtrip() {
    let mut heap = Heap::with_capacity(16);
    let pair = cons(&mut heap, Value::Integer(1), Value::Integer(2)).unwrap();
    assert_eq!(car(&heap, pair).unwrap(), Value::Integer(1));
    assert_eq!(cdr(&heap, pair).unwrap(), Value::Integer(2));
}

#[test]
fn car_cdr_on_nil_is_nil() {
    let heap = Heap::with_capacity(4);
    assert_eq!(car(&heap, Value::NIL).unwrap(), Value::NIL);
    assert_eq!(cdr(&heap, Value::NIL).unwrap(), Value::NIL);
}

#[test]
fn set_car_mutates_in_place() {
    let mut heap = Heap::with_capacity(16);
    let pair = cons(&mut heap, Value::Integer(1), Value::NIL).unwrap();
    set_car(&mut heap, pair, Value::Integer(99)).unwrap();
    assert_eq!(car(&heap, pair).unwrap(), Value::Integer(99));
}

#[test]
fn set_cdr_mutates_cons_in_place() {
    let mut heap = Heap::with_capacity(16);
    let pair = cons(&mut heap, Value::Integer(1), Value::NIL).unwrap();
    set_cdr(&mut heap, pair, Value::Integer(7)).unwrap();
    assert_eq!(cdr(&heap, pair).unwrap(), Value::Integer(7));
}

#[test]
fn set_cdr_nil_truncates_a_vector_to_empty() {
    let mut heap = Heap::with_capacity(16);
    let v = make_vector(&mut heap, Value::Integer(3), Value::Integer(0)).unwrap();
    let truncated = set_cdr(&mut heap, v, Value::NIL).unwrap();
    assert_eq!(nullp(truncated).unwrap(), Value::Bool(true));
}

#[test]
fn set_cdr_non_nil_on_a_vector_is_rejected() {
    let mut heap = Heap::with_capacity(16);
    let v = make_vector(&mut heap, Value::Integer(3), Value::Integer(0)).unwrap();
    assert_eq!(
        set_cdr(&mut heap, v, Value::Integer(1)).unwrap_err(),
        ErrorKind::InvalidValue
    );
}

#[test]
fn make_vector_get_set_elt() {
    let mut heap = Heap::with_capacity(16);
    let v = make_vector(&mut heap, Value::Integer(3), Value::Integer(0)).unwrap();
    set_vec_elt(&mut heap, v, 1, Value::Integer(42)).unwrap();
    assert_eq!(get_vec_elt(&heap, v, 1).unwrap(), Value::Integer(42));
    assert_eq!(get_vec_elt(&heap, v, 0).unwrap(), Value::Integer(0));
}

#[test]
fn get_vec_elt_out_of_bounds_errors() {
    let mut heap = Heap::with_capacity(16);
    let v = make_vector(&mut heap, Value::Integer(2), Value::Integer(0)).unwrap();
    assert_eq!(
        get_vec_elt(&heap, v, 5).unwrap_err(),
        ErrorKind::BufferOverflow
    );
}

#[test]
fn vector_cdr_shares_backing_storage() {
    let mut heap = Heap::with_capacity(16);
    let v = make_vector(&mut heap, Value::Integer(3), Value::Integer(0)).unwrap();
    set_vec_elt(&mut heap, v, 0, Value::Integer(10)).unwrap();
    set_vec_elt(&mut heap, v, 1, Value::Integer(20)).unwrap();
    set_vec_elt(&mut heap, v, 2, Value::Integer(30)).unwrap();
    let rest = cdr(&heap, v).unwrap();
    assert_eq!(get_vec_elt(&heap, rest, 0).unwrap(), Value::Integer(20));
    if let Value::Vector(view) = rest {
        if let Value::Vector(orig) = v {
            assert_eq!(view.backing, orig.backing);
        }
    } else {
        panic!("expected vector");
    }
}

#[test]
fn nullp_on_various_shapes() {
    assert_eq!(nullp(Value::NIL).unwrap(), Value::Bool(true));
    let v = VecView {
        backing: cinder_core::Ref(0),
        offset: 0,
        len: 0,
    };
    assert_eq!(nullp(Value::Vector(v)).unwrap(), Value::Bool(true));
}

#[test]
fn length_counts_a_proper_list() {
    let mut heap = Heap::with_capacity(16);
    let tail = cons(&mut heap, Value::Integer(3), Value::NIL).unwrap();
    let mid = cons(&mut heap, Value::Integer(2), tail).unwrap();
    let head = cons(&mut heap, Value::Integer(1), mid).unwrap();
    assert_eq!(length(&heap, head).unwrap(), 3);
}

#[test]
fn length_detects_a_cycle() {
    let mut heap = Heap::with_capacity(16);
    let a = heap
        .alloc(Object::Cons(Cons {
            car: Value::Integer(1),
            cdr: Value::NIL,
        }))
        .unwrap();
    if let Object::Cons(c) = heap.get_mut(a) {
        c.cdr = Value::List(Some(a));
    }
    let err = length(&heap, Value::List(Some(a))).unwrap_err();
    assert_eq!(err, ErrorKind::InvalidValue);
}

#[test]
fn substring_shares_backing_and_respects_bounds() {
    let mut heap = Heap::with_capacity(16);
    let s = alloc_str(&mut heap, "abcdef");
    let sub = substring(s, 2, 5).unwrap();
    assert_eq!(length(&heap, sub).unwrap(), 3);
    assert_eq!(get_vec_elt(&heap, sub, 1).unwrap(), Value::Integer(b'd' as i64));
    assert_eq!(
        get_vec_elt(&heap, sub, 1).unwrap(),
        get_vec_elt(&heap, s, 2 + 1).unwrap()
    );
}

#[test]
fn substring_out_of_range_is_buffer_overflow() {
    let mut heap = Heap::with_capacity(16);
    let s = alloc_str(&mut heap, "abc");
    assert_eq!(
        substring(s, 1, 10).unwrap_err(),
        ErrorKind::BufferOverflow
    );
}

#[test]
fn concatenate_joins_two_strings() {
    let mut heap = Heap::with_capacity(16);
    let a = alloc_str(&mut heap, "foo");
    let b = alloc_str(&mut heap, "bar");
    let joined = concatenate(&mut heap, a, b).unwrap();
    assert_eq!(length(&heap, joined).unwrap(), 6);
    assert_eq!(get_vec_elt(&heap, joined, 3).unwrap(), Value::Integer(b'b' as i64));
}

#[test]
fn make_string_from_integer_vector() {
    let mut heap = Heap::with_capacity(16);
    let v = make_vector(&mut heap, Value::Integer(3), Value::Integer(0)).unwrap();
    set_vec_elt(&mut heap, v, 0, Value::Integer(b'h' as i64)).unwrap();
    set_vec_elt(&mut heap, v, 1, Value::Integer(b'i' as i64)).unwrap();
    set_vec_elt(&mut heap, v, 2, Value::Integer(b'!' as i64)).unwrap();
    let s = make_string(&mut heap, v).unwrap();
    assert_eq!(length(&heap, s).unwrap(), 3);
    assert_eq!(get_vec_elt(&heap, s, 0).unwrap(), Value::Integer(b'h' as i64));
}
