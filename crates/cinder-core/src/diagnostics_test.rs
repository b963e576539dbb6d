// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

#[test]
fn accumulates_messages_on_separate_lines() {
    let mut d = Diagnostics::new();
    assert!(d.is_empty());
    d.push("first");
    d.push(format_args!("second {}", 2));
    assert_eq!(d.as_str(), "first\nsecond 2");
}

#[test]
fn clear_resets_buffer() {
    let mut d = Diagnostics::new();
    d.push("oops");
    d.clear();
    assert!(d.is_empty());
}
