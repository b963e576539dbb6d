// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Host callback interface (§6.1, §9 "host callback interface").
//!
//! The source represents a callback as a raw C function pointer; a port
//! replaces it with a host-side dispatch trait. The bytecode only ever
//! knows callbacks by symbol id — `ccall` resolves the id through globals,
//! which map to an opaque [`cinder_core::refs::HostFnId`] dispatch token.

use cinder_core::heap::Heap;

use crate::error::RuntimeError;
use crate::process::Vm;

/// A host function is responsible for popping the arguments it consumes
/// from the operand stack and pushing exactly one return value (§4.3.2).
pub trait HostFn {
    fn call(&mut self, vm: &mut Vm, heap: &mut Heap) -> Result<(), RuntimeError>;
}

impl<F> HostFn for F
where
    F: FnMut(&mut Vm, &mut Heap) -> Result<(), RuntimeError>,
{
    fn call(&mut self, vm: &mut Vm, heap: &mut Heap) -> Result<(), RuntimeError> {
        self(vm, heap)
    }
}
