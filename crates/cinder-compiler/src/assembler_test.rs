// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use cinder_core::bytecode::{read_signed, read_unsigned, unpack_opcode, Family, Width};
use cinder_core::refs::SymbolId;

use super::*;

#[test]
fn simple_arithmetic_sequence_decodes_back_to_the_same_shape() {
    let code = assemble(&[Instr::PushInteger(1), Instr::PushInteger(2), Instr::Add, Instr::Return0]).unwrap();

    let (f0, w0) = unpack_opcode(code[0]).unwrap();
    assert_eq!(f0, Family::PushInteger);
    assert_eq!(read_signed(&code[1..2], w0), Some(1));

    let (f1, w1) = unpack_opcode(code[2]).unwrap();
    assert_eq!(f1, Family::PushInteger);
    assert_eq!(read_signed(&code[3..4], w1), Some(2));

    let (f2, _) = unpack_opcode(code[4]).unwrap();
    assert_eq!(f2, Family::Add);

    let (f3, _) = unpack_opcode(code[5]).unwrap();
    assert_eq!(f3, Family::Return0);
    assert_eq!(code.len(), 6);
}

#[test]
fn ccall_never_carries_argc_on_the_wire() {
    let code = assemble(&[Instr::Ccall {
        symbol: SymbolId(42),
        argc: 3,
    }])
    .unwrap();
    assert_eq!(code.len(), 5);
    let (f, _) = unpack_opcode(code[0]).unwrap();
    assert_eq!(f, Family::Ccall);
    assert_eq!(read_unsigned(&code[1..5], Width::W32), Some(42));
}

#[test]
fn forward_jump_widens_when_the_body_does_not_fit_in_eight_bits() {
    let mut stream = Vec::new();
    let target = LabelId(0);
    stream.push(Instr::Jump(target));
    for _ in 0..200 {
        stream.push(Instr::Nop);
    }
    stream.push(Instr::Label(target));
    stream.push(Instr::Return0);

    let code = assemble(&stream).unwrap();
    let (family, width) = unpack_opcode(code[0]).unwrap();
    assert_eq!(family, Family::Jump);
    assert_eq!(width, Width::W16);

    let rel = read_signed(&code[1..3], width).unwrap();
    let from = 3i64;
    let target_offset = from + rel;
    assert_eq!(target_offset, 1 + 2 + 200);
}

#[test]
fn push_closure_encodes_arity_and_capture_descriptors() {
    let mut stream = Vec::new();
    let entry = LabelId(0);
    stream.push(Instr::PushClosure {
        entry,
        arity: 2,
        variadic: false,
        captures: vec![0, -1],
    });
    stream.push(Instr::Label(entry));
    stream.push(Instr::Return0);

    let code = assemble(&stream).unwrap();
    let (family, width) = unpack_opcode(code[0]).unwrap();
    assert_eq!(family, Family::PushClosure);

    let mut pos = 1 + width.bytes();
    assert_eq!(code[pos], 2); // arity
    pos += 1;
    assert_eq!(code[pos], 2); // n_caps
    pos += 1;
    assert_eq!(read_signed(&code[pos..pos + 4], Width::W32), Some(0));
    pos += 4;
    assert_eq!(read_signed(&code[pos..pos + 4], Width::W32), Some(-1));
}

#[test]
fn unknown_label_is_rejected() {
    let err = assemble(&[Instr::Jump(LabelId(99))]).unwrap_err();
    assert_eq!(err, CompileError::UnknownLabel);
}
