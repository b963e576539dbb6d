// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

#[test]
fn int_plus_float_promotes_to_float() {
    let r = add(Value::Integer(1), Value::Float(2.5)).unwrap();
    assert_eq!(r, Value::Float(3.5));
}

#[test]
fn bool_plus_integer_promotes_to_integer() {
    let r = add(Value::Bool(true), Value::Integer(1)).unwrap();
    assert_eq!(r, Value::Integer(2));
}

#[test]
fn bool_plus_bool_is_truthy_or() {
    let r = add(Value::Bool(true), Value::Bool(false)).unwrap();
    assert_eq!(r, Value::Bool(true));
}

#[test]
fn bool_times_bool_is_and() {
    assert_eq!(
        mul(Value::Bool(true), Value::Bool(false)).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        mul(Value::Bool(true), Value::Bool(true)).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn string_plus_integer_is_invalid() {
    let s = Value::Str(cinder_core::StrView {
        backing: cinder_core::Ref(0),
        offset: 0,
        len: 0,
    });
    assert_eq!(add(s, Value::Integer(1)).unwrap_err(), ErrorKind::InvalidValue);
}

#[test]
fn integer_division_by_zero_is_invalid_value() {
    assert_eq!(
        div(Value::Integer(4), Value::Integer(0)).unwrap_err(),
        ErrorKind::InvalidValue
    );
}

#[test]
fn float_division_by_zero_is_infinity() {
    let r = div(Value::Float(1.0), Value::Float(0.0)).unwrap();
    assert_eq!(r, Value::Float(f64::INFINITY));
}

#[test]
fn equal_coerces_numeric_types() {
    assert_eq!(equal(Value::Integer(1), Value::Float(1.0)).unwrap(), Value::Bool(true));
    assert_eq!(equal(Value::Bool(true), Value::Integer(1)).unwrap(), Value::Bool(true));
}

#[test]
fn equal_on_symbols_compares_ids() {
    let a = cinder_core::SymbolRef {
        id: cinder_core::refs::SymbolId(1),
        name: cinder_core::Ref(0),
    };
    let b = cinder_core::SymbolRef {
        id: cinder_core::refs::SymbolId(1),
        name: cinder_core::Ref(9),
    };
    assert_eq!(equal(Value::Symbol(a), Value::Symbol(b)).unwrap(), Value::Bool(true));
}

#[test]
fn less_requires_numeric_operands() {
    assert_eq!(less(Value::Integer(1), Value::Integer(2)).unwrap(), Value::Bool(true));
    assert_eq!(less(Value::NIL, Value::Integer(2)).unwrap_err(), ErrorKind::InvalidValue);
}

#[test]
fn not_on_nil_and_nonempty_list() {
    assert_eq!(not_value(Value::NIL).unwrap(), Value::Bool(true));
    assert_eq!(
        not_value(Value::List(Some(cinder_core::Ref(1)))).unwrap(),
        Value::Bool(false)
    );
}

#[test]
fn not_on_symbol_is_invalid() {
    let s = Value::Symbol(cinder_core::SymbolRef {
        id: cinder_core::refs::SymbolId(0),
        name: cinder_core::Ref(0),
    });
    assert_eq!(not_value(s).unwrap_err(), ErrorKind::InvalidValue);
}
