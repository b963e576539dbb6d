// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! A linear bytecode disassembler (§1 out-of-scope collaborator, carried
//! here as ambient CLI tooling). Walks the same opcode stream `cinder-vm`'s
//! dispatch loop decodes, but never executes anything — every operand
//! width and field order below must track `cinder_vm::dispatch::execute`
//! exactly or the two fall out of sync silently.

use std::fmt::Write as _;

use cinder_core::bytecode::{is_width_scaled, read_signed, read_unsigned, unpack_opcode, Family, Width};

pub fn disassemble(code: &[u8]) -> String {
    let mut out = String::new();
    let mut ip = 0usize;
    while ip < code.len() {
        let start = ip;
        let byte = code[ip];
        ip += 1;
        let Some((family, width)) = unpack_opcode(byte) else {
            let _ = writeln!(out, "{start:6}  <bad opcode {byte:#04x}>");
            continue;
        };
        let operands = decode_operands(code, &mut ip, family, width);
        let _ = writeln!(out, "{start:6}  {family:?}{}", operands.map(|o| format!(" {o}")).unwrap_or_default());
    }
    out
}

fn take(code: &[u8], ip: &mut usize, n: usize) -> &[u8] {
    let end = (*ip + n).min(code.len());
    let slice = &code[*ip..end];
    *ip = end;
    slice
}

fn take_u(code: &[u8], ip: &mut usize, width: Width) -> u64 {
    read_unsigned(take(code, ip, width.bytes()), width).unwrap_or(0)
}

fn take_s(code: &[u8], ip: &mut usize, width: Width) -> i64 {
    read_signed(take(code, ip, width.bytes()), width).unwrap_or(0)
}

/// Decode the fixed/scaled operand fields for one instruction, matching
/// `execute`'s read order family by family. Returns `None` for the
/// zero-operand families.
fn decode_operands(code: &[u8], ip: &mut usize, family: Family, width: Width) -> Option<String> {
    let w = if is_width_scaled(family) { width } else { Width::W8 };
    match family {
        Family::PushSymbol => {
            let id = take_u(code, ip, w);
            let len = take_u(code, ip, Width::W16) as usize;
            let name = String::from_utf8_lossy(take(code, ip, len)).into_owned();
            Some(format!("id={id} \"{name}\""))
        }
        Family::PushString => {
            let len = take_u(code, ip, Width::W32) as usize;
            let s = String::from_utf8_lossy(take(code, ip, len)).into_owned();
            Some(format!("\"{s}\""))
        }
        Family::PushInteger => Some(format!("{}", take_s(code, ip, w))),
        Family::PushDoubleFloat => {
            let bytes = take(code, ip, 8);
            let arr: [u8; 8] = bytes.try_into().unwrap_or([0; 8]);
            Some(format!("{}", f64::from_be_bytes(arr)))
        }
        Family::PushIndex | Family::PushUpvalue | Family::PushGlobal => Some(format!("{}", take_u(code, ip, w))),
        Family::PushClosure | Family::PushVaClosure => {
            let rel = take_s(code, ip, w);
            let arity = take_u(code, ip, Width::W8);
            let n_caps = take_u(code, ip, Width::W8) as usize;
            let mut caps = Vec::with_capacity(n_caps);
            for _ in 0..n_caps {
                caps.push(take_s(code, ip, Width::W32));
            }
            Some(format!("entry={rel:+} arity={arity} captures={caps:?}"))
        }
        Family::ReleaseUpvalues => {
            let count = take_u(code, ip, Width::W8) as usize;
            let mut offsets = Vec::with_capacity(count);
            for _ in 0..count {
                offsets.push(take_u(code, ip, w));
            }
            Some(format!("{offsets:?}"))
        }
        Family::SetUpvalue => {
            let i = take_u(code, ip, Width::W8);
            let src = take_u(code, ip, w);
            Some(format!("slot={i} src={src}"))
        }
        Family::SetStatic => {
            let src = take_u(code, ip, w);
            let sym = take_u(code, ip, Width::W32);
            Some(format!("src={src} symbol={sym}"))
        }
        Family::Funcall | Family::Apply => {
            let callee = take_u(code, ip, w);
            let argc = take_u(code, ip, Width::W8);
            Some(format!("callee_offset={callee} argc={argc}"))
        }
        Family::Call => {
            let rel = take_s(code, ip, w);
            let _reserved = take_u(code, ip, Width::W8);
            Some(format!("{rel:+}"))
        }
        Family::Ccall => Some(format!("symbol={}", take_u(code, ip, Width::W32))),
        Family::Jump => Some(format!("{:+}", take_s(code, ip, w))),
        Family::Brnz => {
            let rel = take_s(code, ip, w);
            let pops = take_u(code, ip, Width::W8);
            Some(format!("{rel:+} pops={pops}"))
        }
        Family::Pop | Family::ReturnN => Some(format!("{}", take_u(code, ip, w))),
        Family::Move => {
            let dst = take_u(code, ip, w);
            let src = take_u(code, ip, w);
            Some(format!("dst={dst} src={src}"))
        }
        Family::Vector => Some(format!("{}", take_u(code, ip, Width::W16))),
        Family::Not
        | Family::Mul
        | Family::Div
        | Family::Add
        | Family::Sub
        | Family::Equal
        | Family::Less
        | Family::Greater
        | Family::Cons
        | Family::Car
        | Family::Cdr
        | Family::SetCar
        | Family::SetCdr
        | Family::MakeVector
        | Family::GetVecElt
        | Family::SetVecElt
        | Family::Nullp
        | Family::TypeOf
        | Family::MakeType
        | Family::MakeInstance
        | Family::CompositeValue
        | Family::CompositeFunction
        | Family::SetCompositeValue
        | Family::SetCompositeFunction
        | Family::Length
        | Family::SymbolString
        | Family::SymbolId
        | Family::MakeString
        | Family::Concatenate
        | Family::Substring
        | Family::Return0
        | Family::Yield
        | Family::Halt
        | Family::Nil
        | Family::Nop => None,
    }
}

#[cfg(test)]
mod disasm_test;
