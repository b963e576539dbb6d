// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

#[test]
fn resolve_local_stops_at_the_function_boundary() {
    let mut s = ScopeStack::new();
    s.push(true);
    s.bind_local("x", 0);
    s.push(false);
    s.bind_local("y", 1);
    assert_eq!(s.resolve_local("y"), Some(1));
    assert_eq!(s.resolve_local("x"), Some(0));

    s.push(true);
    assert_eq!(s.resolve_local("x"), None);
}

#[test]
fn resolve_free_captures_a_direct_enclosing_local() {
    let mut s = ScopeStack::new();
    s.push(true);
    s.bind_local("counter", 0);
    s.push(true);

    let slot = s.resolve_free("counter").expect("should capture");
    assert_eq!(slot, 0);
    assert_eq!(s.current_function_uvs(), &[0]);

    let again = s.resolve_free("counter").expect("dedup");
    assert_eq!(again, slot);
    assert_eq!(s.current_function_uvs().len(), 1);
}

#[test]
fn resolve_free_chains_through_two_function_boundaries() {
    let mut s = ScopeStack::new();
    s.push(true);
    s.bind_local("x", 2);
    s.push(true); // middle function, captures x as its own upvalue 0
    s.push(true); // inner function, should chain through middle

    let inner_slot = s.resolve_free("x").expect("inner capture");
    assert_eq!(inner_slot, 0);
    // Chained descriptor: -(0 + 1) = -1, referencing middle's own upvalue 0.
    assert_eq!(s.current_function_uvs(), &[-1]);
}

#[test]
fn resolve_free_returns_none_for_a_global_name() {
    let mut s = ScopeStack::new();
    s.push(true);
    assert_eq!(s.resolve_free("no-such-local"), None);
}

#[test]
fn labels_and_macros_are_visible_across_scopes() {
    let mut s = ScopeStack::new();
    s.push(true);
    s.bind_label("loop-top", LabelId(3));
    s.bind_macro("swap", 7);
    s.push(false);
    assert_eq!(s.lookup_label("loop-top"), Some(LabelId(3)));
    assert_eq!(s.lookup_macro("swap"), Some(7));
}
