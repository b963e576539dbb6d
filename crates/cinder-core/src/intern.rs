// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The seam between the reader and the compiler's symbol table (§3.4).
//!
//! The reader never owns a symbol table: it asks whatever `Interner` the
//! compiler hands it to turn an identifier's source text into a stable
//! [`SymbolRef`], so that AST nodes and later-compiled references agree on
//! ids without the reader knowing the trie lives in `cinder-compiler`.

use crate::error::ErrorKind;
use crate::heap::Heap;
use crate::value::SymbolRef;

pub trait Interner {
    fn intern(&mut self, heap: &mut Heap, name: &str) -> Result<SymbolRef, ErrorKind>;
}
