// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Arithmetic/comparison coercion matrix (§4.3.4).

use cinder_core::{ErrorKind, Value};

fn is_numeric(v: &Value) -> bool {
    matches!(v, Value::Integer(_) | Value::Float(_) | Value::Bool(_))
}

fn to_f64(v: Value) -> Result<f64, ErrorKind> {
    match v {
        Value::Float(f) => Ok(f),
        Value::Integer(i) => Ok(i as f64),
        Value::Bool(b) => Ok(b as i64 as f64),
        _ => Err(ErrorKind::InvalidValue),
    }
}

fn binary_numeric(
    a: Value,
    b: Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
    bool_op: fn(bool, bool) -> bool,
) -> Result<Value, ErrorKind> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(bool_op(x, y))),
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            Ok(Value::Float(float_op(to_f64(a)?, to_f64(b)?)))
        }
        (Value::Integer(_) | Value::Bool(_), Value::Integer(_) | Value::Bool(_)) => {
            let x = a.as_integer().ok_or(ErrorKind::InvalidValue)?;
            let y = b.as_integer().ok_or(ErrorKind::InvalidValue)?;
            Ok(Value::Integer(int_op(x, y)))
        }
        _ => Err(ErrorKind::InvalidValue),
    }
}

pub fn add(a: Value, b: Value) -> Result<Value, ErrorKind> {
    binary_numeric(a, b, i64::wrapping_add, |x, y| x + y, |x, y| x || y)
}

pub fn sub(a: Value, b: Value) -> Result<Value, ErrorKind> {
    binary_numeric(a, b, i64::wrapping_sub, |x, y| x - y, |x, y| x && !y)
}

pub fn mul(a: Value, b: Value) -> Result<Value, ErrorKind> {
    binary_numeric(a, b, i64::wrapping_mul, |x, y| x * y, |x, y| x && y)
}

/// Integer division by zero is rejected with `InvalidValue` rather than
/// letting the host process trap (the source's "propagates the underlying
/// numeric behavior" is a C div-by-zero trap; there is no safe Rust
/// equivalent, so this deviates deliberately — see DESIGN.md). Float
/// division by zero is left to IEEE 754 (`inf`/`NaN`).
pub fn div(a: Value, b: Value) -> Result<Value, ErrorKind> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => {
            if !y {
                Err(ErrorKind::InvalidValue)
            } else {
                Ok(Value::Bool(x))
            }
        }
        (Value::Float(_), _) | (_, Value::Float(_)) => Ok(Value::Float(to_f64(a)? / to_f64(b)?)),
        (Value::Integer(_) | Value::Bool(_), Value::Integer(_) | Value::Bool(_)) => {
            let x = a.as_integer().ok_or(ErrorKind::InvalidValue)?;
            let y = b.as_integer().ok_or(ErrorKind::InvalidValue)?;
            if y == 0 {
                return Err(ErrorKind::InvalidValue);
            }
            Ok(Value::Integer(x / y))
        }
        _ => Err(ErrorKind::InvalidValue),
    }
}

fn numeric_eq(a: Value, b: Value) -> Result<bool, ErrorKind> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        _ => Ok(to_f64(a)? == to_f64(b)?),
    }
}

/// Structural equality. Numeric types compare by the same coercion matrix
/// as the arithmetic ops; composite heap types (string/vector views,
/// closures, composites, ...) compare by reference identity, not
/// element-wise (§4.2).
pub fn equal(a: Value, b: Value) -> Result<Value, ErrorKind> {
    if is_numeric(&a) && is_numeric(&b) {
        return Ok(Value::Bool(numeric_eq(a, b)?));
    }
    let eq = match (a, b) {
        (Value::Symbol(x), Value::Symbol(y)) => x.id == y.id,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Vector(x), Value::Vector(y)) => x.backing == y.backing && x.offset == y.offset,
        (Value::List(x), Value::List(y)) => x == y,
        (Value::Closure(x), Value::Closure(y)) => x == y,
        (Value::Composite(x), Value::Composite(y)) => x == y,
        (Value::Function(x), Value::Function(y)) => x == y,
        (Value::Type(x), Value::Type(y)) => x == y,
        (Value::User(x), Value::User(y)) => x == y,
        _ => false,
    };
    Ok(Value::Bool(eq))
}

pub fn less(a: Value, b: Value) -> Result<Value, ErrorKind> {
    if !is_numeric(&a) || !is_numeric(&b) {
        return Err(ErrorKind::InvalidValue);
    }
    Ok(Value::Bool(to_f64(a)? < to_f64(b)?))
}

pub fn greater(a: Value, b: Value) -> Result<Value, ErrorKind> {
    if !is_numeric(&a) || !is_numeric(&b) {
        return Err(ErrorKind::InvalidValue);
    }
    Ok(Value::Bool(to_f64(a)? > to_f64(b)?))
}

/// `not` is defined on bool, integer, float, list (nullness) and vector
/// (emptiness); everything else is `InvalidValue`.
pub fn not_value(v: Value) -> Result<Value, ErrorKind> {
    match v {
        Value::Bool(_) | Value::Integer(_) | Value::Float(_) | Value::List(_) | Value::Vector(_) => {
            Ok(Value::Bool(!v.is_truthy()))
        }
        _ => Err(ErrorKind::InvalidValue),
    }
}

#[cfg(test)]
mod arithmetic_test;
