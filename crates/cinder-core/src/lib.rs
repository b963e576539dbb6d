// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Cinder core
//!
//! Foundational types shared by the reader, compiler and VM:
//!
//! - [`value`]: the tagged `Value` union and its heap-referencing views.
//! - [`object`]: heap-resident object bodies (conses, strings, upvalues, ...).
//! - [`heap`]: the fixed-capacity object pool.
//! - [`gc`]: the mark-sweep collector that runs over that pool.
//! - [`bytecode`]: opcode family ids and variable-width field encoding.
//! - [`error`]: the status-code error kinds shared across every layer.
//! - [`diagnostics`]: the human-readable errors buffer.

pub mod bytecode;
pub mod diagnostics;
pub mod error;
pub mod gc;
pub mod heap;
pub mod intern;
pub mod object;
pub mod refs;
pub mod value;

pub use diagnostics::Diagnostics;
pub use error::ErrorKind;
pub use heap::Heap;
pub use intern::Interner;
pub use refs::{HostFnId, Ref, SymbolId, TypeId};
pub use value::{StrView, SymbolRef, Value, VecView};
