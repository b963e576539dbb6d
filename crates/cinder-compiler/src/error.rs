// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use std::fmt;

use cinder_core::ErrorKind;
use cinder_reader::ReadError;
use cinder_vm::RuntimeError;

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// `head` of a compound expression was not a symbol.
    NotAnOperator,
    /// An empty list `()` is not a valid form in operator position.
    EmptyForm,
    /// A special form was given the wrong shape (missing/extra args, bad binding list, ...).
    MalformedForm(&'static str),
    /// A label referenced by `goto` was never bound in the current scope.
    UnknownLabel,
    /// A name escaped all scopes, all generators, and all registered functions.
    UnboundSymbol,
    /// A jump/branch/call target needs more than 32 bits of relative offset.
    OffsetTooLarge,
    /// Propagated from the reader while reading a quoted macro argument back into an AST.
    Read(ReadError),
    /// Propagated from the heap (string/cons allocation during compilation).
    Heap(ErrorKind),
    /// Propagated from the comptime VM while executing a macro body.
    Runtime(RuntimeError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::NotAnOperator => write!(f, "operator position is not a symbol"),
            CompileError::EmptyForm => write!(f, "empty list in operator position"),
            CompileError::MalformedForm(what) => write!(f, "malformed form: {what}"),
            CompileError::UnknownLabel => write!(f, "reference to an unbound label"),
            CompileError::UnboundSymbol => write!(f, "unbound symbol"),
            CompileError::OffsetTooLarge => write!(f, "branch/call offset exceeds 32 bits"),
            CompileError::Read(e) => write!(f, "{e}"),
            CompileError::Heap(e) => write!(f, "{e}"),
            CompileError::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ErrorKind> for CompileError {
    fn from(e: ErrorKind) -> Self {
        CompileError::Heap(e)
    }
}

impl From<ReadError> for CompileError {
    fn from(e: ReadError) -> Self {
        CompileError::Read(e)
    }
}

impl From<RuntimeError> for CompileError {
    fn from(e: RuntimeError) -> Self {
        CompileError::Runtime(e)
    }
}
