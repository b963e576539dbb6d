// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

#[test]
fn pack_unpack_roundtrip_for_every_width() {
    for &width in &[Width::W8, Width::W16, Width::W32] {
        let byte = pack_opcode(Family::Jump, width);
        let (family, decoded_width) = unpack_opcode(byte).unwrap();
        assert_eq!(family, Family::Jump);
        assert_eq!(decoded_width, width);
    }
}

#[test]
fn narrowest_unsigned_picks_minimum_width() {
    assert_eq!(Width::narrowest_unsigned(0), Width::W8);
    assert_eq!(Width::narrowest_unsigned(255), Width::W8);
    assert_eq!(Width::narrowest_unsigned(256), Width::W16);
    assert_eq!(Width::narrowest_unsigned(65_535), Width::W16);
    assert_eq!(Width::narrowest_unsigned(65_536), Width::W32);
}

#[test]
fn narrowest_signed_picks_minimum_width() {
    assert_eq!(Width::narrowest_signed(-128), Width::W8);
    assert_eq!(Width::narrowest_signed(127), Width::W8);
    assert_eq!(Width::narrowest_signed(128), Width::W16);
    assert_eq!(Width::narrowest_signed(-129), Width::W16);
    assert_eq!(Width::narrowest_signed(40_000), Width::W32);
}

#[test]
fn signed_field_roundtrips_through_bytes() {
    let mut buf = Vec::new();
    write_signed(&mut buf, Width::W16, -300);
    assert_eq!(read_signed(&buf, Width::W16), Some(-300));
}

#[test]
fn unsigned_field_roundtrips_through_bytes() {
    let mut buf = Vec::new();
    write_unsigned(&mut buf, Width::W32, 70_000);
    assert_eq!(read_unsigned(&buf, Width::W32), Some(70_000));
}

#[test]
fn unknown_family_byte_fails_to_decode() {
    let byte = (200u8 << 2) | 0b01;
    assert!(unpack_opcode(byte).is_none());
}

#[test]
fn fixed_families_always_use_w8() {
    assert!(!is_width_scaled(Family::Add));
    assert!(is_width_scaled(Family::Jump));
}
