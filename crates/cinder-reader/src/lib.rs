// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! S-expression lexer and parser. Out of scope for the compiler core per
//! its own contract, but still part of this workspace: it is the
//! collaborator that turns source text into the `Value` AST trees the
//! compiler consumes.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::ReadError;
pub use lexer::{Lexer, Token};
pub use parser::Parser;

use cinder_core::heap::Heap;
use cinder_core::{Interner, Value};

/// Parse every top-level form in `source`, in order.
pub fn read_source(
    source: &str,
    heap: &mut Heap,
    interner: &mut dyn Interner,
) -> Result<Vec<Value>, ReadError> {
    Parser::new(source).read_all(heap, interner)
}
