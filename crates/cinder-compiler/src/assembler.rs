// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Two-pass assembler (§4.6): lowers an [`Instr`] stream into the bit-packed
//! bytecode `cinder_vm::dispatch` decodes.
//!
//! Pass 1 assigns every width-scaled instruction the narrowest [`Width`]
//! that fits, iterating to a fixed point since widening one jump can push a
//! later label out of range for another (classic assembler jump-sizing
//! problem). Pass 2 walks the now-stable layout and emits bytes, resolving
//! every label to a signed offset relative to the *next* instruction.

use std::collections::HashMap;

use cinder_core::bytecode::{pack_opcode, write_signed, write_unsigned, Family, Width};

use crate::error::CompileError;
use crate::ir::{Instr, LabelId};

fn label_target(instr: &Instr) -> Option<LabelId> {
    match instr {
        Instr::Jump(l) => Some(*l),
        Instr::Call { target } => Some(*target),
        Instr::Brnz { target, .. } => Some(*target),
        Instr::PushClosure { entry, .. } => Some(*entry),
        _ => None,
    }
}

fn initial_width(instr: &Instr) -> Width {
    use Instr::*;
    match instr {
        PushSymbol { id, .. } => Width::narrowest_unsigned(id.0 as u64),
        PushInteger(v) => Width::narrowest_signed(*v),
        PushIndex(v) | PushUpvalue(v) => Width::narrowest_unsigned(*v as u64),
        PushGlobal(id) => Width::narrowest_unsigned(id.0 as u64),
        ReleaseUpvalues(offsets) => offsets
            .iter()
            .map(|o| Width::narrowest_unsigned(*o as u64))
            .max()
            .unwrap_or(Width::W8),
        SetUpvalue { src_offset, .. } => Width::narrowest_unsigned(*src_offset as u64),
        SetStatic { src_offset, .. } => Width::narrowest_unsigned(*src_offset as u64),
        Funcall { callee_offset, .. } | Apply { callee_offset, .. } => {
            Width::narrowest_unsigned(*callee_offset as u64)
        }
        Pop(n) => Width::narrowest_unsigned(*n as u64),
        Move { dst, src } => Width::narrowest_unsigned((*dst).max(*src) as u64),
        ReturnN(n) => Width::narrowest_unsigned(*n as u64),
        // Label-relative fields start optimistic; the fixed-point loop widens
        // them once real positions are known.
        PushClosure { .. } | Call { .. } | Jump(_) | Brnz { .. } => Width::W8,
        _ => Width::W8,
    }
}

fn encoded_len(instr: &Instr, width: Width) -> usize {
    use Instr::*;
    1 + match instr {
        Nop | PushBooleanTrue | PushBooleanFalse | Not | Mul | Div | Add | Sub | Equal | Less
        | Greater | Cons | Car | Cdr | SetCar | SetCdr | MakeVector | GetVecElt | SetVecElt
        | Nullp | TypeOf | MakeType | MakeInstance | CompositeValue | CompositeFunction
        | SetCompositeValue | SetCompositeFunction | Length | SymbolString | SymbolIdOf
        | MakeString | Concatenate | Substring | Return0 | Yield | Halt | Nil | Label(_) => 0,
        PushSymbol { name, .. } => width.bytes() + 2 + name.len(),
        PushString { bytes } => 4 + bytes.len(),
        PushInteger(_) => width.bytes(),
        PushDoubleFloat(_) => 8,
        PushIndex(_) | PushUpvalue(_) | PushGlobal(_) | Pop(_) | ReturnN(_) => width.bytes(),
        PushClosure { captures, .. } => width.bytes() + 1 + 1 + captures.len() * 4,
        ReleaseUpvalues(offsets) => 1 + offsets.len() * width.bytes(),
        SetUpvalue { .. } => 1 + width.bytes(),
        SetStatic { .. } => width.bytes() + 4,
        Funcall { .. } | Apply { .. } => width.bytes() + 1,
        Call { .. } => width.bytes() + 1,
        Ccall { .. } => 4,
        Jump(_) => width.bytes(),
        Brnz { .. } => width.bytes() + 1,
        Move { .. } => width.bytes() * 2,
        Vector(_) => 2,
    }
}

fn compute_offsets(instrs: &[Instr], widths: &[Width]) -> Vec<u32> {
    let mut offsets = Vec::with_capacity(instrs.len() + 1);
    let mut pos = 0u32;
    for (instr, width) in instrs.iter().zip(widths) {
        offsets.push(pos);
        pos += encoded_len(instr, *width) as u32;
    }
    offsets.push(pos);
    offsets
}

/// Lower an IR stream, resolving `Label` pseudo-instructions against the
/// real instructions that follow them, into the final bytecode.
pub fn assemble(stream: &[Instr]) -> Result<Vec<u8>, CompileError> {
    let mut real: Vec<Instr> = Vec::with_capacity(stream.len());
    let mut label_positions: HashMap<LabelId, usize> = HashMap::new();
    for instr in stream {
        match instr {
            Instr::Label(id) => {
                label_positions.insert(*id, real.len());
            }
            other => real.push(other.clone()),
        }
    }

    let mut widths: Vec<Width> = real.iter().map(initial_width).collect();

    loop {
        let offsets = compute_offsets(&real, &widths);
        let mut changed = false;
        for (i, instr) in real.iter().enumerate() {
            let Some(label) = label_target(instr) else {
                continue;
            };
            let target_idx = *label_positions
                .get(&label)
                .ok_or(CompileError::UnknownLabel)?;
            let target = offsets[target_idx] as i64;
            let from = offsets[i] as i64 + encoded_len(instr, widths[i]) as i64;
            let needed = Width::narrowest_signed(target - from);
            if needed > widths[i] {
                if widths[i] == Width::W32 {
                    return Err(CompileError::OffsetTooLarge);
                }
                widths[i] = needed;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let offsets = compute_offsets(&real, &widths);
    let mut code = Vec::with_capacity(*offsets.last().unwrap() as usize);

    for (i, instr) in real.iter().enumerate() {
        let width = widths[i];
        emit_one(&mut code, instr, width, &offsets, &label_positions, i)?;
    }

    Ok(code)
}

fn rel_to_label(
    offsets: &[u32],
    label_positions: &HashMap<LabelId, usize>,
    label: LabelId,
    from: u32,
) -> Result<i64, CompileError> {
    let target_idx = *label_positions
        .get(&label)
        .ok_or(CompileError::UnknownLabel)?;
    Ok(offsets[target_idx] as i64 - from as i64)
}

fn emit_one(
    code: &mut Vec<u8>,
    instr: &Instr,
    width: Width,
    offsets: &[u32],
    label_positions: &HashMap<LabelId, usize>,
    i: usize,
) -> Result<(), CompileError> {
    use Instr::*;

    let next_ip = offsets[i] + encoded_len(instr, width) as u32;

    match instr {
        Nop => code.push(pack_opcode(Family::Nop, Width::W8)),
        PushSymbol { id, name } => {
            code.push(pack_opcode(Family::PushSymbol, width));
            write_unsigned(code, width, id.0 as u64);
            write_unsigned(code, Width::W16, name.len() as u64);
            code.extend_from_slice(name);
        }
        PushString { bytes } => {
            code.push(pack_opcode(Family::PushString, Width::W8));
            write_unsigned(code, Width::W32, bytes.len() as u64);
            code.extend_from_slice(bytes);
        }
        PushBooleanTrue => code.push(pack_opcode(Family::PushBooleanTrue, Width::W8)),
        PushBooleanFalse => code.push(pack_opcode(Family::PushBooleanFalse, Width::W8)),
        PushInteger(v) => {
            code.push(pack_opcode(Family::PushInteger, width));
            write_signed(code, width, *v);
        }
        PushDoubleFloat(v) => {
            code.push(pack_opcode(Family::PushDoubleFloat, Width::W8));
            code.extend_from_slice(&v.to_be_bytes());
        }
        PushIndex(v) => {
            code.push(pack_opcode(Family::PushIndex, width));
            write_unsigned(code, width, *v as u64);
        }
        PushUpvalue(v) => {
            code.push(pack_opcode(Family::PushUpvalue, width));
            write_unsigned(code, width, *v as u64);
        }
        PushClosure {
            entry,
            arity,
            variadic,
            captures,
        } => {
            let family = if *variadic { Family::PushVaClosure } else { Family::PushClosure };
            code.push(pack_opcode(family, width));
            let rel = rel_to_label(offsets, label_positions, *entry, next_ip)?;
            write_signed(code, width, rel);
            code.push(*arity);
            code.push(captures.len() as u8);
            for d in captures {
                write_signed(code, Width::W32, *d as i64);
            }
        }
        PushGlobal(id) => {
            code.push(pack_opcode(Family::PushGlobal, width));
            write_unsigned(code, width, id.0 as u64);
        }
        ReleaseUpvalues(offs) => {
            code.push(pack_opcode(Family::ReleaseUpvalues, width));
            code.push(offs.len() as u8);
            for o in offs {
                write_unsigned(code, width, *o as u64);
            }
        }
        SetUpvalue { index, src_offset } => {
            code.push(pack_opcode(Family::SetUpvalue, width));
            code.push(*index as u8);
            write_unsigned(code, width, *src_offset as u64);
        }
        SetStatic { src_offset, symbol } => {
            code.push(pack_opcode(Family::SetStatic, width));
            write_unsigned(code, width, *src_offset as u64);
            write_unsigned(code, Width::W32, symbol.0 as u64);
        }
        Funcall { callee_offset, argc } => {
            code.push(pack_opcode(Family::Funcall, width));
            write_unsigned(code, width, *callee_offset as u64);
            code.push(*argc);
        }
        Apply { callee_offset, argc } => {
            code.push(pack_opcode(Family::Apply, width));
            write_unsigned(code, width, *callee_offset as u64);
            code.push(*argc);
        }
        Call { target } => {
            code.push(pack_opcode(Family::Call, width));
            let rel = rel_to_label(offsets, label_positions, *target, next_ip)?;
            write_signed(code, width, rel);
            code.push(0);
        }
        Ccall { symbol, .. } => {
            code.push(pack_opcode(Family::Ccall, Width::W8));
            write_unsigned(code, Width::W32, symbol.0 as u64);
        }
        Jump(target) => {
            code.push(pack_opcode(Family::Jump, width));
            let rel = rel_to_label(offsets, label_positions, *target, next_ip)?;
            write_signed(code, width, rel);
        }
        Brnz { target, pops } => {
            code.push(pack_opcode(Family::Brnz, width));
            let rel = rel_to_label(offsets, label_positions, *target, next_ip)?;
            write_signed(code, width, rel);
            code.push(*pops);
        }
        Pop(n) => {
            code.push(pack_opcode(Family::Pop, width));
            write_unsigned(code, width, *n as u64);
        }
        Move { dst, src } => {
            code.push(pack_opcode(Family::Move, width));
            write_unsigned(code, width, *dst as u64);
            write_unsigned(code, width, *src as u64);
        }
        Not => code.push(pack_opcode(Family::Not, Width::W8)),
        Mul => code.push(pack_opcode(Family::Mul, Width::W8)),
        Div => code.push(pack_opcode(Family::Div, Width::W8)),
        Add => code.push(pack_opcode(Family::Add, Width::W8)),
        Sub => code.push(pack_opcode(Family::Sub, Width::W8)),
        Equal => code.push(pack_opcode(Family::Equal, Width::W8)),
        Less => code.push(pack_opcode(Family::Less, Width::W8)),
        Greater => code.push(pack_opcode(Family::Greater, Width::W8)),
        Cons => code.push(pack_opcode(Family::Cons, Width::W8)),
        Car => code.push(pack_opcode(Family::Car, Width::W8)),
        Cdr => code.push(pack_opcode(Family::Cdr, Width::W8)),
        SetCar => code.push(pack_opcode(Family::SetCar, Width::W8)),
        SetCdr => code.push(pack_opcode(Family::SetCdr, Width::W8)),
        Vector(n) => {
            code.push(pack_opcode(Family::Vector, Width::W8));
            write_unsigned(code, Width::W16, *n as u64);
        }
        MakeVector => code.push(pack_opcode(Family::MakeVector, Width::W8)),
        GetVecElt => code.push(pack_opcode(Family::GetVecElt, Width::W8)),
        SetVecElt => code.push(pack_opcode(Family::SetVecElt, Width::W8)),
        Nullp => code.push(pack_opcode(Family::Nullp, Width::W8)),
        TypeOf => code.push(pack_opcode(Family::TypeOf, Width::W8)),
        MakeType => code.push(pack_opcode(Family::MakeType, Width::W8)),
        MakeInstance => code.push(pack_opcode(Family::MakeInstance, Width::W8)),
        CompositeValue => code.push(pack_opcode(Family::CompositeValue, Width::W8)),
        CompositeFunction => code.push(pack_opcode(Family::CompositeFunction, Width::W8)),
        SetCompositeValue => code.push(pack_opcode(Family::SetCompositeValue, Width::W8)),
        SetCompositeFunction => code.push(pack_opcode(Family::SetCompositeFunction, Width::W8)),
        Length => code.push(pack_opcode(Family::Length, Width::W8)),
        SymbolString => code.push(pack_opcode(Family::SymbolString, Width::W8)),
        SymbolIdOf => code.push(pack_opcode(Family::SymbolId, Width::W8)),
        MakeString => code.push(pack_opcode(Family::MakeString, Width::W8)),
        Concatenate => code.push(pack_opcode(Family::Concatenate, Width::W8)),
        Substring => code.push(pack_opcode(Family::Substring, Width::W8)),
        ReturnN(n) => {
            code.push(pack_opcode(Family::ReturnN, width));
            write_unsigned(code, width, *n as u64);
        }
        Return0 => code.push(pack_opcode(Family::Return0, Width::W8)),
        Yield => code.push(pack_opcode(Family::Yield, Width::W8)),
        Halt => code.push(pack_opcode(Family::Halt, Width::W8)),
        Nil => code.push(pack_opcode(Family::Nil, Width::W8)),
        Label(_) => unreachable!("labels are filtered out before emission"),
    }

    Ok(())
}

#[cfg(test)]
mod assembler_test;
