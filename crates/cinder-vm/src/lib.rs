// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Cinder VM
//!
//! The stack-based bytecode interpreter: operand/upvalue stacks in lock
//! step, a call stack of activation frames, globals, the host-callback
//! table and the opcode dispatch loop itself.
//!
//! - [`process`]: the `Vm` struct — stacks, frames, globals, GC roots.
//! - [`dispatch`]: decode-and-execute one instruction; the run loop.
//! - [`arithmetic`], [`sequences`], [`composite`]: the value-level
//!   operations each opcode family delegates to.
//! - [`host`]: the trait host callbacks implement.

pub mod arithmetic;
pub mod composite;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod process;
pub mod sequences;

pub use dispatch::{run, step};
pub use error::RuntimeError;
pub use host::HostFn;
pub use process::{HaltMode, RunOutcome, Vm};
