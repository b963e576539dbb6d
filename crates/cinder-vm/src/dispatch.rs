// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The instruction dispatch loop (§4.3.1-§4.3.3, §4.3.7).
//!
//! `step` decodes and executes exactly one instruction against
//! `vm.current_code`; `run` drives `step` until the bytecode halts or
//! yields. Operand widths follow the opcode byte's own width bits for
//! families [`cinder_core::bytecode::is_width_scaled`] names; every other
//! operand (counts, symbol ids, the float payload) is carried at a fixed
//! size agreed between the assembler and this loop.

use cinder_core::bytecode::{read_signed, read_unsigned, unpack_opcode, Family, Width};
use cinder_core::heap::Heap;
use cinder_core::object::{Closure, Cons, InternalString, InternalVector, Object, UpvalueState};
use cinder_core::refs::SymbolId;
use cinder_core::{ErrorKind, Ref, StrView, SymbolRef, Value, VecView};

use crate::arithmetic;
use crate::composite;
use crate::error::RuntimeError;
use crate::process::{HaltMode, RunOutcome, Vm};
use crate::sequences;

fn fetch_byte(vm: &mut Vm) -> Result<u8, RuntimeError> {
    let b = vm
        .current_code
        .get(vm.ip)
        .copied()
        .ok_or_else(|| RuntimeError::new(ErrorKind::BufferOverflow))?;
    vm.ip += 1;
    Ok(b)
}

fn fetch_bytes(vm: &mut Vm, n: usize) -> Result<Vec<u8>, RuntimeError> {
    let slice = vm
        .current_code
        .get(vm.ip..vm.ip + n)
        .ok_or_else(|| RuntimeError::new(ErrorKind::BufferOverflow))?;
    let out = slice.to_vec();
    vm.ip += n;
    Ok(out)
}

fn read_u(vm: &mut Vm, width: Width) -> Result<u64, RuntimeError> {
    let n = width.bytes();
    let bytes = fetch_bytes(vm, n)?;
    read_unsigned(&bytes, width).ok_or_else(|| RuntimeError::new(ErrorKind::BufferOverflow))
}

fn read_s(vm: &mut Vm, width: Width) -> Result<i64, RuntimeError> {
    let n = width.bytes();
    let bytes = fetch_bytes(vm, n)?;
    read_signed(&bytes, width).ok_or_else(|| RuntimeError::new(ErrorKind::BufferOverflow))
}

fn fetch_opcode(vm: &mut Vm) -> Result<(Family, Width), RuntimeError> {
    let byte = fetch_byte(vm)?;
    unpack_opcode(byte).ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))
}

/// Follow a chain of `HeapUpvalue` forwards down to the value it denotes.
fn read_upvalue(vm: &Vm, heap: &Heap, mut r: Ref) -> Result<Value, RuntimeError> {
    loop {
        match heap.get(r) {
            Object::Upvalue(UpvalueState::StackIndex(idx)) => {
                return vm
                    .operand_stack
                    .get(*idx)
                    .copied()
                    .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue));
            }
            Object::Upvalue(UpvalueState::HeapObject(v)) => return Ok(*v),
            Object::Upvalue(UpvalueState::HeapUpvalue(next)) => r = *next,
            _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
        }
    }
}

fn upvalue_slot(heap: &Heap, arr: Ref, i: usize) -> Result<Ref, RuntimeError> {
    match heap.get(arr) {
        Object::UpvalueArray(a) => a
            .slots
            .get(i)
            .copied()
            .flatten()
            .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue)),
        _ => Err(RuntimeError::new(ErrorKind::InvalidValue)),
    }
}

fn resolve_callable(heap: &Heap, mut v: Value) -> Result<Value, RuntimeError> {
    loop {
        match v {
            Value::Composite(_) => v = composite::composite_function(heap, v)?,
            _ => return Ok(v),
        }
    }
}

fn list_to_vec(heap: &Heap, v: Value) -> Result<Vec<Value>, RuntimeError> {
    let mut out = Vec::new();
    let mut cur = match v {
        Value::List(r) => r,
        _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
    };
    while let Some(r) = cur {
        match heap.get(r) {
            Object::Cons(c) => {
                out.push(c.car);
                cur = match c.cdr {
                    Value::List(next) => next,
                    _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
                };
            }
            _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
        }
    }
    Ok(out)
}

fn invoke_host(vm: &mut Vm, heap: &mut Heap, token: cinder_core::refs::HostFnId) -> Result<(), RuntimeError> {
    let mut f = vm
        .host_fns
        .remove(&token)
        .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
    let result = f.call(vm, heap);
    vm.host_fns.insert(token, f);
    result
}

/// Arity-check, pull a closure's activation record together (splicing the
/// apply-list or folding the variadic tail right-to-left, §4.3.2) and jump
/// into its body.
fn perform_call(
    vm: &mut Vm,
    heap: &mut Heap,
    callee_offset: usize,
    argc: usize,
    is_apply: bool,
) -> Result<(), RuntimeError> {
    let callee_idx = vm.index_from_top(callee_offset)?;
    let callee = resolve_callable(heap, vm.operand_stack[callee_idx])?;

    let mut argc = argc;
    if is_apply {
        let spliced = vm.pop()?;
        let extra = list_to_vec(heap, spliced)?;
        argc = argc - 1 + extra.len();
        for e in extra {
            vm.push(e);
        }
    }

    match callee {
        Value::Function(token) => invoke_host(vm, heap, token),
        Value::Closure(closure_ref) => {
            let closure = match heap.get(closure_ref) {
                Object::Closure(c) => *c,
                _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
            };
            if closure.variadic {
                if argc < closure.arity as usize {
                    return Err(RuntimeError::new(ErrorKind::InvalidValue));
                }
                let extra_count = argc - closure.arity as usize;
                vm.push(Value::NIL);
                for _ in 0..extra_count {
                    let tail = vm.pop()?;
                    let elem = vm.pop()?;
                    let pair = vm.alloc(heap, || Object::Cons(Cons { car: elem, cdr: tail }))?;
                    vm.push(Value::List(Some(pair)));
                }
            } else if argc != closure.arity as usize {
                return Err(RuntimeError::new(ErrorKind::InvalidValue));
            }
            vm.push_call_frame(vm.ip, Some(closure.upvalues));
            vm.set_current_bytecode(heap, closure.bytecode);
            vm.ip = closure.entry_offset as usize;
            Ok(())
        }
        _ => Err(RuntimeError::new(ErrorKind::InvalidValue)),
    }
}

fn do_return(vm: &mut Vm, ret: Option<Value>) -> Result<(), RuntimeError> {
    let frame = vm
        .pop_call_frame()
        .ok_or_else(|| RuntimeError::new(ErrorKind::BufferUnderflow))?;
    vm.ip = frame.return_ip;
    vm.current_bytecode = Some(frame.bytecode);
    vm.current_code = frame.code;
    if let Some(v) = ret {
        vm.push(v);
    }
    Ok(())
}

fn execute(vm: &mut Vm, heap: &mut Heap, family: Family, width: Width) -> Result<(), RuntimeError> {
    match family {
        Family::Nop => {}

        Family::PushSymbol => {
            let id = read_u(vm, width)? as u32;
            let name_len = read_u(vm, Width::W16)? as usize;
            let bytes = fetch_bytes(vm, name_len)?;
            let name = vm.alloc(heap, || {
                Object::InternalString(InternalString { bytes: bytes.clone() })
            })?;
            vm.push(Value::Symbol(SymbolRef { id: SymbolId(id), name }));
        }

        Family::PushString => {
            let len = read_u(vm, Width::W32)? as usize;
            let bytes = fetch_bytes(vm, len)?;
            let n = bytes.len() as u32;
            let backing = vm.alloc(heap, || {
                Object::InternalString(InternalString { bytes: bytes.clone() })
            })?;
            vm.push(Value::Str(StrView { backing, offset: 0, len: n }));
        }

        Family::PushBooleanTrue => vm.push(Value::Bool(true)),
        Family::PushBooleanFalse => vm.push(Value::Bool(false)),

        Family::PushInteger => {
            let v = read_s(vm, width)?;
            vm.push(Value::Integer(v));
        }

        Family::PushDoubleFloat => {
            let bytes = fetch_bytes(vm, 8)?;
            let arr: [u8; 8] = bytes
                .try_into()
                .map_err(|_| RuntimeError::new(ErrorKind::BufferOverflow))?;
            vm.push(Value::Float(f64::from_be_bytes(arr)));
        }

        Family::PushIndex => {
            let offset = read_u(vm, width)? as usize;
            let v = vm.get_from_top(offset)?;
            vm.push(v);
        }

        Family::PushUpvalue => {
            let i = read_u(vm, width)? as usize;
            let arr = vm
                .current_upvalue_array()
                .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
            let uv_ref = upvalue_slot(heap, arr, i)?;
            let v = read_upvalue(vm, heap, uv_ref)?;
            vm.push(v);
        }

        Family::PushClosure | Family::PushVaClosure => {
            let rel_offset = read_s(vm, width)?;
            let arity = read_u(vm, Width::W8)? as u8;
            let n_caps = read_u(vm, Width::W8)? as usize;
            let mut descriptors = Vec::with_capacity(n_caps);
            for _ in 0..n_caps {
                descriptors.push(read_s(vm, Width::W32)?);
            }
            let entry_offset = (vm.ip as i64 + rel_offset) as u32;
            let bytecode_ref = vm
                .current_bytecode
                .ok_or_else(|| RuntimeError::new(ErrorKind::ShouldntHappen))?;
            let variadic = matches!(family, Family::PushVaClosure);

            let upvalues = vm.alloc(heap, || {
                Object::UpvalueArray(cinder_core::object::UpvalueArray {
                    slots: vec![None; n_caps],
                })
            })?;
            let closure_ref = vm.alloc(heap, || {
                Object::Closure(Closure {
                    bytecode: bytecode_ref,
                    entry_offset,
                    upvalues,
                    arity,
                    variadic,
                })
            })?;
            vm.push(Value::Closure(closure_ref));

            for (k, &d) in descriptors.iter().enumerate() {
                let uv_ref = if d < 0 {
                    let j = (-d - 1) as usize;
                    let enclosing = vm
                        .current_upvalue_array()
                        .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
                    let forward_target = upvalue_slot(heap, enclosing, j)?;
                    vm.alloc(heap, || Object::Upvalue(UpvalueState::HeapUpvalue(forward_target)))?
                } else {
                    let stack_len = vm.stack_len();
                    let absolute_index = (stack_len - 1).wrapping_sub(d as usize);
                    if absolute_index == stack_len {
                        vm.push(Value::NIL);
                        let new_ref =
                            vm.alloc(heap, || Object::Upvalue(UpvalueState::StackIndex(absolute_index)))?;
                        *vm.upvalue_stack.last_mut().unwrap() = Some(new_ref);
                        new_ref
                    } else {
                        match vm.upvalue_stack.get(absolute_index).copied().flatten() {
                            Some(existing) => existing,
                            None => {
                                let new_ref = vm
                                    .alloc(heap, || Object::Upvalue(UpvalueState::StackIndex(absolute_index)))?;
                                vm.upvalue_stack[absolute_index] = Some(new_ref);
                                new_ref
                            }
                        }
                    }
                };
                if let Object::UpvalueArray(a) = heap.get_mut(upvalues) {
                    a.slots[k] = Some(uv_ref);
                }
            }
        }

        Family::PushGlobal => {
            let id = read_u(vm, width)? as u32;
            let v = vm
                .global_get(SymbolId(id))
                .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
            vm.push(v);
        }

        Family::ReleaseUpvalues => {
            let count = read_u(vm, Width::W8)? as usize;
            let mut offsets = Vec::with_capacity(count);
            for _ in 0..count {
                offsets.push(read_u(vm, width)? as usize);
            }
            for offset in offsets {
                let idx = vm.index_from_top(offset)?;
                if let Some(uv_ref) = vm.upvalue_stack[idx] {
                    let value = vm.operand_stack[idx];
                    if let Object::Upvalue(state) = heap.get_mut(uv_ref) {
                        *state = UpvalueState::HeapObject(value);
                    }
                    vm.upvalue_stack[idx] = None;
                }
            }
        }

        Family::SetUpvalue => {
            let i = read_u(vm, Width::W8)? as usize;
            let src_offset = read_u(vm, width)? as usize;
            let value = vm.get_from_top(src_offset)?;
            let arr = vm
                .current_upvalue_array()
                .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
            let mut uv_ref = upvalue_slot(heap, arr, i)?;
            loop {
                match heap.get(uv_ref) {
                    Object::Upvalue(UpvalueState::StackIndex(idx)) => {
                        let idx = *idx;
                        vm.set_at(idx, value)?;
                        break;
                    }
                    Object::Upvalue(UpvalueState::HeapObject(_)) => {
                        if let Object::Upvalue(state) = heap.get_mut(uv_ref) {
                            *state = UpvalueState::HeapObject(value);
                        }
                        break;
                    }
                    Object::Upvalue(UpvalueState::HeapUpvalue(next)) => uv_ref = *next,
                    _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
                }
            }
        }

        Family::SetStatic => {
            let src_offset = read_u(vm, width)? as usize;
            let symbol_id = read_u(vm, Width::W32)? as u32;
            let value = vm.get_from_top(src_offset)?;
            vm.global_set(SymbolId(symbol_id), value);
        }

        Family::Funcall => {
            let callee_offset = read_u(vm, width)? as usize;
            let argc = read_u(vm, Width::W8)? as usize;
            perform_call(vm, heap, callee_offset, argc, false)?;
        }

        Family::Apply => {
            let callee_offset = read_u(vm, width)? as usize;
            let argc = read_u(vm, Width::W8)? as usize;
            perform_call(vm, heap, callee_offset, argc, true)?;
        }

        Family::Call => {
            let rel_offset = read_s(vm, width)?;
            // Second operand is reserved (legacy, no closure machinery); still
            // consumed to keep the instruction's wire size fixed.
            let _reserved = read_u(vm, Width::W8)?;
            let target = (vm.ip as i64 + rel_offset) as usize;
            let uv = vm.current_upvalue_array();
            vm.push_call_frame(vm.ip, uv);
            vm.ip = target;
        }

        Family::Ccall => {
            let symbol_id = read_u(vm, Width::W32)? as u32;
            let callee = vm
                .global_get(SymbolId(symbol_id))
                .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
            match callee {
                Value::Function(token) => invoke_host(vm, heap, token)?,
                _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
            }
        }

        Family::Jump => {
            let rel = read_s(vm, width)?;
            vm.ip = (vm.ip as i64 + rel) as usize;
        }

        Family::Brnz => {
            let rel = read_s(vm, width)?;
            let pops = read_u(vm, Width::W8)? as usize;
            let test = vm.pop()?;
            for _ in 0..pops {
                vm.pop()?;
            }
            if test.is_truthy() {
                vm.ip = (vm.ip as i64 + rel) as usize;
            }
        }

        Family::Pop => {
            let n = read_u(vm, width)? as usize;
            for _ in 0..n {
                vm.pop()?;
            }
        }

        Family::Move => {
            let dst_offset = read_u(vm, width)? as usize;
            let src_offset = read_u(vm, width)? as usize;
            let v = vm.get_from_top(src_offset)?;
            let idx = vm.index_from_top(dst_offset)?;
            vm.set_at(idx, v)?;
        }

        Family::Not => {
            let a = vm.pop()?;
            vm.push(arithmetic::not_value(a)?);
        }
        Family::Mul => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(arithmetic::mul(a, b)?);
        }
        Family::Div => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(arithmetic::div(a, b)?);
        }
        Family::Add => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(arithmetic::add(a, b)?);
        }
        Family::Sub => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(arithmetic::sub(a, b)?);
        }
        Family::Equal => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(arithmetic::equal(a, b)?);
        }
        Family::Less => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(arithmetic::less(a, b)?);
        }
        Family::Greater => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(arithmetic::greater(a, b)?);
        }

        Family::Cons => {
            let cdr = vm.pop()?;
            let car = vm.pop()?;
            let v = sequences::cons(heap, car, cdr)?;
            vm.push(v);
        }
        Family::Car => {
            let a = vm.pop()?;
            vm.push(sequences::car(heap, a)?);
        }
        Family::Cdr => {
            let a = vm.pop()?;
            vm.push(sequences::cdr(heap, a)?);
        }
        Family::SetCar => {
            let value = vm.pop()?;
            let target = vm.pop()?;
            sequences::set_car(heap, target, value)?;
            vm.push(value);
        }
        Family::SetCdr => {
            let value = vm.pop()?;
            let target = vm.pop()?;
            let result = sequences::set_cdr(heap, target, value)?;
            vm.push(result);
        }

        Family::Vector => {
            let n = read_u(vm, Width::W16)? as usize;
            let elems = vm.pop_n(n)?;
            let len = elems.len() as u32;
            let backing = vm.alloc(heap, || {
                Object::InternalVector(InternalVector {
                    elems: elems.clone(),
                    initialized: true,
                })
            })?;
            vm.push(Value::Vector(VecView { backing, offset: 0, len }));
        }

        Family::MakeVector => {
            let fill = vm.pop()?;
            let length = vm.pop()?;
            let v = sequences::make_vector(heap, length, fill)?;
            vm.push(v);
        }

        Family::GetVecElt => {
            let idx = vm.pop()?;
            let v = vm.pop()?;
            let i = idx
                .as_integer()
                .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
            vm.push(sequences::get_vec_elt(heap, v, i)?);
        }

        Family::SetVecElt => {
            let value = vm.pop()?;
            let idx = vm.pop()?;
            let v = vm.pop()?;
            let i = idx
                .as_integer()
                .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
            sequences::set_vec_elt(heap, v, i, value)?;
            vm.push(value);
        }

        Family::Nullp => {
            let v = vm.pop()?;
            vm.push(sequences::nullp(v)?);
        }

        Family::TypeOf => {
            let v = vm.pop()?;
            let t = composite::type_of(heap, vm, v);
            vm.push(t);
        }

        Family::MakeType => {
            let t = vm.fresh_type();
            vm.push(Value::Type(t));
        }

        Family::MakeInstance => {
            let function = vm.pop()?;
            let value = vm.pop()?;
            let tag_v = vm.pop()?;
            let tag = match tag_v {
                Value::Type(t) => t,
                _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
            };
            let inst = composite::make_instance(heap, tag, value, function)?;
            vm.push(inst);
        }

        Family::CompositeValue => {
            let v = vm.pop()?;
            vm.push(composite::composite_value(heap, v)?);
        }
        Family::CompositeFunction => {
            let v = vm.pop()?;
            vm.push(composite::composite_function(heap, v)?);
        }
        Family::SetCompositeValue => {
            let value = vm.pop()?;
            let target = vm.pop()?;
            composite::set_composite_value(heap, target, value)?;
            vm.push(value);
        }
        Family::SetCompositeFunction => {
            let value = vm.pop()?;
            let target = vm.pop()?;
            composite::set_composite_function(heap, target, value)?;
            vm.push(value);
        }

        Family::Length => {
            let v = vm.pop()?;
            vm.push(Value::Integer(sequences::length(heap, v)?));
        }

        Family::SymbolString => {
            let v = vm.pop()?;
            let name = match v {
                Value::Symbol(s) => s.name,
                _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
            };
            vm.push(sequences::symbol_string(heap, name)?);
        }

        Family::SymbolId => {
            let v = vm.pop()?;
            let id = match v {
                Value::Symbol(s) => s.id.0 as i64,
                _ => return Err(RuntimeError::new(ErrorKind::InvalidValue)),
            };
            vm.push(Value::Integer(id));
        }

        Family::MakeString => {
            let source = vm.pop()?;
            vm.push(sequences::make_string(heap, source)?);
        }

        Family::Concatenate => {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(sequences::concatenate(heap, a, b)?);
        }

        Family::Substring => {
            let end = vm.pop()?;
            let start = vm.pop()?;
            let s = vm.pop()?;
            let start_i = start
                .as_integer()
                .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
            let end_i = end
                .as_integer()
                .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidValue))?;
            vm.push(sequences::substring(s, start_i, end_i)?);
        }

        Family::ReturnN => {
            let n = read_u(vm, width)? as usize;
            let ret = vm.pop()?;
            for _ in 0..n {
                vm.pop()?;
            }
            do_return(vm, Some(ret))?;
        }

        Family::Return0 => {
            do_return(vm, None)?;
        }

        Family::Yield => vm.halt_mode = HaltMode::Yield,
        Family::Halt => vm.halt_mode = HaltMode::Halt,

        Family::Nil => vm.push(Value::NIL),
    }
    Ok(())
}

/// Decode and execute exactly one instruction at `vm.ip`.
pub fn step(vm: &mut Vm, heap: &mut Heap) -> Result<(), RuntimeError> {
    let (family, width) = fetch_opcode(vm)?;
    execute(vm, heap, family, width)
}

/// Run until the bytecode halts or yields (§4.3.7).
pub fn run(vm: &mut Vm, heap: &mut Heap) -> Result<RunOutcome, RuntimeError> {
    vm.halt_mode = HaltMode::Running;
    loop {
        step(vm, heap)?;
        match vm.halt_mode {
            HaltMode::Running => continue,
            HaltMode::Halt => {
                let v = vm.pop()?;
                return Ok(RunOutcome::Halted(v));
            }
            HaltMode::Yield => return Ok(RunOutcome::Yielded),
        }
    }
}

#[cfg(test)]
mod dispatch_test;
