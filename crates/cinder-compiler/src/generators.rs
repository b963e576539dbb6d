// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Special forms and intrinsic operators (§4.7, §4.8): everything that is
//! not a plain funcall/ccall/macro-expansion. `compile_sequence` is the one
//! piece of shared machinery every body-compiling form (`progn`, `when`,
//! `lambda`, the top-level program) goes through, since it is the only place
//! that knows `(var name init)` must keep its value on the stack rather than
//! get popped like an ordinary statement.

use cinder_core::Value;

use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::exprc;
use crate::ir::Instr;
use crate::scope::FunctionKind;

pub fn is_generator(name: &str) -> bool {
    matches!(
        name,
        "quote"
            | "if"
            | "when"
            | "unless"
            | "while"
            | "progn"
            | "var"
            | "setq"
            | "defun"
            | "lambda"
            | "defmacro"
            | "label"
            | "goto"
            | "declare"
            | "+"
            | "-"
            | "*"
            | "/"
            | "="
            | "<"
            | ">"
            | "not"
            | "cons"
            | "car"
            | "cdr"
            | "set-car!"
            | "set-cdr!"
            | "vector"
            | "make-vector"
            | "vector-ref"
            | "vector-set!"
            | "null?"
            | "type-of"
            | "make-type"
            | "make-instance"
            | "composite-value"
            | "composite-function"
            | "set-composite-value!"
            | "set-composite-function!"
            | "length"
            | "symbol->string"
            | "symbol->id"
            | "make-string"
            | "concatenate"
            | "substring"
            | "funcall"
            | "apply"
    )
}

pub fn compile(compiler: &mut Compiler, name: &str, args: &[Value]) -> Result<(), CompileError> {
    match name {
        "quote" => {
            let [x] = require::<1>(args, "quote takes exactly one argument")?;
            exprc::compile_quoted(compiler, *x)
        }
        "if" => compile_if(compiler, args),
        "when" => compile_when_unless(compiler, args, true),
        "unless" => compile_when_unless(compiler, args, false),
        "while" => compile_while(compiler, args),
        "progn" => compile_sequence(compiler, args, true),
        "var" => compile_var(compiler, args),
        "setq" => compile_setq(compiler, args),
        "defun" => compile_defun(compiler, args),
        "lambda" => compile_lambda(compiler, args),
        "defmacro" => crate::macros::compile_defmacro(compiler, args),
        "label" => compile_label(compiler, args),
        "goto" => compile_goto(compiler, args),
        "declare" => {
            compiler.state().emit(Instr::Nil);
            Ok(())
        }
        "funcall" => compile_funcall_form(compiler, args),
        "apply" => compile_apply_form(compiler, args),
        _ => compile_intrinsic(compiler, name, args),
    }
}

fn require<'a, const N: usize>(args: &'a [Value], msg: &'static str) -> Result<&'a [Value; N], CompileError> {
    <&[Value; N]>::try_from(args).map_err(|_| CompileError::MalformedForm(msg))
}

/// Compile `forms` in order. Every form but the last (when `keep_last`) is
/// popped back off after evaluation; a `(var name init)` form is never
/// popped, since its slot on the stack *is* the local's home for the rest
/// of the enclosing function (§4.4, §4.7 — no block-scoped teardown).
pub fn compile_sequence(compiler: &mut Compiler, forms: &[Value], keep_last: bool) -> Result<(), CompileError> {
    if forms.is_empty() {
        if keep_last {
            compiler.state().emit(Instr::Nil);
        }
        return Ok(());
    }
    let last = forms.len() - 1;
    for (i, form) in forms.iter().enumerate() {
        let is_last = i == last;
        if let Some((name, init)) = as_var_binding(compiler, form)? {
            exprc::compile_expr(compiler, init)?;
            let idx = (compiler.state().depth() - 1) as u32;
            compiler.state().scopes.bind_local(&name, idx);
        } else {
            exprc::compile_expr(compiler, *form)?;
            if !(keep_last && is_last) {
                compiler.state().emit(Instr::Pop(1));
            }
        }
    }
    Ok(())
}

fn as_var_binding(compiler: &Compiler, form: &Value) -> Result<Option<(String, Value)>, CompileError> {
    let r = match form {
        Value::List(Some(r)) => *r,
        _ => return Ok(None),
    };
    let items = exprc::list_items(&compiler.heap, r)?;
    let head = match items.first() {
        Some(Value::Symbol(s)) => s,
        _ => return Ok(None),
    };
    if exprc::symbol_name(&compiler.heap, head)? != "var" {
        return Ok(None);
    }
    if items.len() != 3 {
        return Err(CompileError::MalformedForm("var takes exactly a name and an init expression"));
    }
    let name_sym = match items[1] {
        Value::Symbol(s) => s,
        _ => return Err(CompileError::MalformedForm("var's name must be a symbol")),
    };
    let name = exprc::symbol_name(&compiler.heap, &name_sym)?.to_string();
    Ok(Some((name, items[2])))
}

fn compile_var(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let [name_form, init] = require::<2>(args, "var takes exactly a name and an init expression")?;
    let name_sym = match name_form {
        Value::Symbol(s) => *s,
        _ => return Err(CompileError::MalformedForm("var's name must be a symbol")),
    };
    let name = exprc::symbol_name(&compiler.heap, &name_sym)?.to_string();
    exprc::compile_expr(compiler, *init)?;
    let idx = (compiler.state().depth() - 1) as u32;
    compiler.state().scopes.bind_local(&name, idx);
    Ok(())
}

fn compile_setq(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let [name_form, expr] = require::<2>(args, "setq takes exactly a name and a value expression")?;
    let name_sym = match name_form {
        Value::Symbol(s) => *s,
        _ => return Err(CompileError::MalformedForm("setq's target must be a symbol")),
    };
    let name = exprc::symbol_name(&compiler.heap, &name_sym)?.to_string();
    exprc::compile_expr(compiler, *expr)?;

    if let Some(idx) = compiler.state().scopes.resolve_local(&name) {
        let depth = compiler.state().depth();
        let dst = (depth - 1 - idx as i64).max(0) as u32;
        compiler.state().emit(Instr::Move { dst, src: 0 });
        return Ok(());
    }
    if let Some(slot) = compiler.state().scopes.resolve_free(&name) {
        compiler.state().emit(Instr::SetUpvalue { index: slot, src_offset: 0 });
        return Ok(());
    }
    let id = compiler.intern(&name)?.id;
    compiler.state().emit(Instr::SetStatic { src_offset: 0, symbol: id });
    Ok(())
}

fn compile_if(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    if args.len() != 2 && args.len() != 3 {
        return Err(CompileError::MalformedForm("if takes a test, a then-branch and an optional else-branch"));
    }
    let baseline = compiler.state().depth();
    exprc::compile_expr(compiler, args[0])?;
    let then_label = compiler.state().emitter.fresh_label();
    let end_label = compiler.state().emitter.fresh_label();
    compiler.state().emit(Instr::Brnz { target: then_label, pops: 0 });

    match args.get(2) {
        Some(else_form) => exprc::compile_expr(compiler, *else_form)?,
        None => {
            compiler.state().emit(Instr::Nil);
        }
    }
    compiler.state().emit(Instr::Jump(end_label));

    compiler.state().emitter.mark_label(then_label);
    compiler.state().emitter.set_depth(baseline);
    exprc::compile_expr(compiler, args[1])?;

    compiler.state().emitter.mark_label(end_label);
    Ok(())
}

/// `when`'s body runs on a true test, `unless`'s on a false one; both
/// fall back to `nil` on the other branch. `Brnz` only ever jumps on
/// truthiness, so `unless` is compiled as `when` with the two branches
/// swapped.
fn compile_when_unless(compiler: &mut Compiler, args: &[Value], when: bool) -> Result<(), CompileError> {
    let (test, body) = args.split_first().ok_or(CompileError::MalformedForm("when/unless need a test"))?;
    let baseline = compiler.state().depth();
    exprc::compile_expr(compiler, *test)?;
    let take_label = compiler.state().emitter.fresh_label();
    let end_label = compiler.state().emitter.fresh_label();
    compiler.state().emit(Instr::Brnz { target: take_label, pops: 0 });

    if when {
        compiler.state().emit(Instr::Nil);
    } else {
        compile_sequence(compiler, body, true)?;
    }
    compiler.state().emit(Instr::Jump(end_label));

    compiler.state().emitter.mark_label(take_label);
    compiler.state().emitter.set_depth(baseline);
    if when {
        compile_sequence(compiler, body, true)?;
    } else {
        compiler.state().emit(Instr::Nil);
    }

    compiler.state().emitter.mark_label(end_label);
    Ok(())
}

fn compile_while(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let (test, body) = args.split_first().ok_or(CompileError::MalformedForm("while needs a test"))?;
    let loop_label = compiler.state().emitter.fresh_label();
    let body_label = compiler.state().emitter.fresh_label();
    let end_label = compiler.state().emitter.fresh_label();

    compiler.state().emitter.mark_label(loop_label);
    exprc::compile_expr(compiler, *test)?;
    compiler.state().emit(Instr::Brnz { target: body_label, pops: 0 });
    compiler.state().emit(Instr::Jump(end_label));

    compiler.state().emitter.mark_label(body_label);
    for form in body {
        exprc::compile_expr(compiler, *form)?;
        compiler.state().emit(Instr::Pop(1));
    }
    compiler.state().emit(Instr::Jump(loop_label));

    compiler.state().emitter.mark_label(end_label);
    compiler.state().emit(Instr::Nil);
    Ok(())
}

fn compile_label(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let [name_form] = require::<1>(args, "label takes exactly one name")?;
    let name_sym = match name_form {
        Value::Symbol(s) => *s,
        _ => return Err(CompileError::MalformedForm("label's name must be a symbol")),
    };
    let name = exprc::symbol_name(&compiler.heap, &name_sym)?.to_string();
    let label = compiler.state().emitter.fresh_label();
    compiler.state().scopes.bind_label(&name, label);
    compiler.state().emitter.mark_label(label);
    compiler.state().emit(Instr::Nil);
    Ok(())
}

fn compile_goto(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let [name_form] = require::<1>(args, "goto takes exactly one label name")?;
    let name_sym = match name_form {
        Value::Symbol(s) => *s,
        _ => return Err(CompileError::MalformedForm("goto's target must be a symbol")),
    };
    let name = exprc::symbol_name(&compiler.heap, &name_sym)?.to_string();
    let label = compiler
        .state()
        .scopes
        .lookup_label(&name)
        .ok_or(CompileError::UnknownLabel)?;
    compiler.state().emit(Instr::Jump(label));
    // Unreachable at runtime; kept so whatever follows in the same
    // sequence still sees the uniform one-value contract.
    compiler.state().emit(Instr::Nil);
    Ok(())
}

fn parse_param_list(compiler: &Compiler, form: &Value) -> Result<Vec<String>, CompileError> {
    let items = match form {
        Value::List(None) => Vec::new(),
        Value::List(Some(r)) => exprc::list_items(&compiler.heap, *r)?,
        _ => return Err(CompileError::MalformedForm("parameter list must be a list")),
    };
    items
        .into_iter()
        .map(|v| match v {
            Value::Symbol(s) => exprc::symbol_name(&compiler.heap, &s).map(|n| n.to_string()),
            _ => Err(CompileError::MalformedForm("parameter names must be symbols")),
        })
        .collect()
}

/// Compile `(lambda (params...) body...)`. Emits `push-closure` followed by
/// a `jump` over the inlined body, then the body itself under a fresh
/// function scope whose depth is re-baselined to the arity the caller will
/// have already pushed (§4.3.3, §4.5). `push-closure`'s capture list isn't
/// known until the body is compiled (captures are discovered by
/// `resolve_free` as free names are hit), so the instruction is emitted as
/// a placeholder and patched afterward.
pub(crate) fn compile_lambda(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let (params_form, body) = args.split_first().ok_or(CompileError::MalformedForm("lambda needs a parameter list"))?;
    let params = parse_param_list(compiler, params_form)?;
    let arity = params.len() as u8;

    let saved_depth = compiler.state().depth();
    let entry = compiler.state().emitter.fresh_label();
    let after = compiler.state().emitter.fresh_label();

    let pc_idx = compiler.state().emitter.instrs().len();
    compiler.state().emit(Instr::PushClosure {
        entry,
        arity,
        variadic: false,
        captures: Vec::new(),
    });
    compiler.state().emit(Instr::Jump(after));
    compiler.state().emitter.mark_label(entry);

    compiler.state().scopes.push(true);
    for (i, name) in params.iter().enumerate() {
        compiler.state().scopes.bind_local(name, (i + 1) as u32);
    }
    compiler.state().emitter.set_depth(arity as i64 + 1);

    compile_sequence(compiler, body, true)?;

    // Any of this function's own locals that an inner closure captured by
    // stack reference must be promoted to a heap object before the frame
    // that owns them is popped below, or the capture would dangle (§4.3.3).
    let final_depth = compiler.state().depth();
    let release_offsets: Vec<u32> = compiler
        .state()
        .scopes
        .current_scope_uvs()
        .iter()
        .map(|&idx| (final_depth - 1 - idx as i64) as u32)
        .collect();
    if !release_offsets.is_empty() {
        compiler.state().emit(Instr::ReleaseUpvalues(release_offsets));
    }
    compiler.state().emit(Instr::ReturnN((final_depth - 1) as u32));

    // Non-negative descriptors name a direct local of the *enclosing* scope
    // by its stable absolute stack index (§4.4); `push-closure` instead
    // wants an offset from the top of the stack at the instant it runs
    // (after its own closure value has been pushed), so translate using the
    // enclosing scope's depth at this call site. Negative (chained) entries
    // are an index into an already-built upvalue array and need no
    // translation (§4.3.3).
    let mut captures = compiler.state().scopes.current_function_uvs().to_vec();
    for d in captures.iter_mut() {
        if *d >= 0 {
            *d = (saved_depth - *d as i64) as i32;
        }
    }
    compiler.state().scopes.pop();
    compiler.state().emitter.set_depth(saved_depth + 1);

    if let Instr::PushClosure { captures: slot, .. } = &mut compiler.state().emitter.instrs_mut()[pc_idx] {
        *slot = captures;
    }

    compiler.state().emitter.mark_label(after);
    Ok(())
}

fn compile_defun(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let (name_form, rest) = args.split_first().ok_or(CompileError::MalformedForm("defun needs a name"))?;
    let name_sym = match name_form {
        Value::Symbol(s) => *s,
        _ => return Err(CompileError::MalformedForm("defun's name must be a symbol")),
    };
    let name = exprc::symbol_name(&compiler.heap, &name_sym)?.to_string();

    // Bind the name as a function *before* compiling the body, so a
    // recursive call inside resolves through the dynamic-scope-fallback
    // `push-global` path rather than failing to resolve at all — the
    // global itself isn't populated until `set-static` below runs, which
    // is fine since recursive calls only execute on a later invocation.
    compiler.state().scopes.bind_function(&name, FunctionKind::Interpreted);

    compile_lambda(compiler, rest)?;

    let id = compiler.intern(&name)?.id;
    compiler.state().emit(Instr::SetStatic { src_offset: 0, symbol: id });
    Ok(())
}

/// `(funcall f a b)`: an explicit call, as opposed to the implicit one an
/// ordinary `(f a b)` compound form already triggers via the dynamic-scope
/// fallback (§4.7). Compiles identically; the explicit spelling exists for
/// callers that already hold the callee in a value position.
fn compile_funcall_form(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let (callee, rest) = args.split_first().ok_or(CompileError::MalformedForm("funcall needs a callee"))?;
    exprc::compile_funcall(compiler, *callee, rest)
}

/// `(apply f a b lst)`: call `f` with `a`, `b`, and the elements of `lst`
/// spliced in as trailing arguments. The VM does the splicing at the call
/// site (`perform_call`'s `is_apply` branch), so the compiler's job is just
/// to push the callee, the fixed arguments and the list, then count the
/// fixed-plus-list operands as `argc` (§4.3.1 `apply`).
fn compile_apply_form(compiler: &mut Compiler, args: &[Value]) -> Result<(), CompileError> {
    let (callee, rest) = args.split_first().ok_or(CompileError::MalformedForm("apply needs a callee"))?;
    if rest.is_empty() {
        return Err(CompileError::MalformedForm("apply needs a final list argument"));
    }
    exprc::compile_expr(compiler, *callee)?;
    for a in rest {
        exprc::compile_expr(compiler, *a)?;
    }
    let argc = rest.len() as u8;
    compiler.state().emit(Instr::Apply { callee_offset: argc as u32, argc });
    Ok(())
}

fn compile_intrinsic(compiler: &mut Compiler, name: &str, args: &[Value]) -> Result<(), CompileError> {
    match name {
        "+" => fold(compiler, args, Instr::Add, Some(Instr::PushInteger(0))),
        "*" => fold(compiler, args, Instr::Mul, Some(Instr::PushInteger(1))),
        "-" => fold(compiler, args, Instr::Sub, Some(Instr::PushInteger(0))),
        "/" => fold(compiler, args, Instr::Div, Some(Instr::PushInteger(1))),
        "=" => binary(compiler, args, Instr::Equal, "= takes exactly two arguments"),
        "<" => binary(compiler, args, Instr::Less, "< takes exactly two arguments"),
        ">" => binary(compiler, args, Instr::Greater, "> takes exactly two arguments"),
        "not" => unary(compiler, args, Instr::Not, "not takes exactly one argument"),
        "cons" => binary(compiler, args, Instr::Cons, "cons takes exactly two arguments"),
        "car" => unary(compiler, args, Instr::Car, "car takes exactly one argument"),
        "cdr" => unary(compiler, args, Instr::Cdr, "cdr takes exactly one argument"),
        "set-car!" => binary(compiler, args, Instr::SetCar, "set-car! takes a target and a value"),
        "set-cdr!" => binary(compiler, args, Instr::SetCdr, "set-cdr! takes a target and a value"),
        "vector" => {
            for a in args {
                exprc::compile_expr(compiler, *a)?;
            }
            compiler.state().emit(Instr::Vector(args.len() as u16));
            Ok(())
        }
        "make-vector" => binary(compiler, args, Instr::MakeVector, "make-vector takes a length and a fill value"),
        "vector-ref" => binary(compiler, args, Instr::GetVecElt, "vector-ref takes a vector and an index"),
        "vector-set!" => ternary(compiler, args, Instr::SetVecElt, "vector-set! takes a vector, an index and a value"),
        "null?" => unary(compiler, args, Instr::Nullp, "null? takes exactly one argument"),
        "type-of" => unary(compiler, args, Instr::TypeOf, "type-of takes exactly one argument"),
        "make-type" => {
            let [] = require::<0>(args, "make-type takes no arguments")?;
            compiler.state().emit(Instr::MakeType);
            Ok(())
        }
        "make-instance" => ternary(compiler, args, Instr::MakeInstance, "make-instance takes a type, a value and a function"),
        "composite-value" => unary(compiler, args, Instr::CompositeValue, "composite-value takes exactly one argument"),
        "composite-function" => unary(compiler, args, Instr::CompositeFunction, "composite-function takes exactly one argument"),
        "set-composite-value!" => binary(compiler, args, Instr::SetCompositeValue, "set-composite-value! takes a target and a value"),
        "set-composite-function!" => binary(compiler, args, Instr::SetCompositeFunction, "set-composite-function! takes a target and a value"),
        "length" => unary(compiler, args, Instr::Length, "length takes exactly one argument"),
        "symbol->string" => unary(compiler, args, Instr::SymbolString, "symbol->string takes exactly one argument"),
        "symbol->id" => unary(compiler, args, Instr::SymbolIdOf, "symbol->id takes exactly one argument"),
        "make-string" => unary(compiler, args, Instr::MakeString, "make-string takes exactly one argument"),
        "concatenate" => binary(compiler, args, Instr::Concatenate, "concatenate takes exactly two arguments"),
        "substring" => ternary(compiler, args, Instr::Substring, "substring takes a string, a start and an end"),
        _ => unreachable!("is_generator accepted a name compile_intrinsic does not know"),
    }
}

fn unary(compiler: &mut Compiler, args: &[Value], instr: Instr, msg: &'static str) -> Result<(), CompileError> {
    let [a] = require::<1>(args, msg)?;
    exprc::compile_expr(compiler, *a)?;
    compiler.state().emit(instr);
    Ok(())
}

fn binary(compiler: &mut Compiler, args: &[Value], instr: Instr, msg: &'static str) -> Result<(), CompileError> {
    let [a, b] = require::<2>(args, msg)?;
    exprc::compile_expr(compiler, *a)?;
    exprc::compile_expr(compiler, *b)?;
    compiler.state().emit(instr);
    Ok(())
}

fn ternary(compiler: &mut Compiler, args: &[Value], instr: Instr, msg: &'static str) -> Result<(), CompileError> {
    let [a, b, c] = require::<3>(args, msg)?;
    exprc::compile_expr(compiler, *a)?;
    exprc::compile_expr(compiler, *b)?;
    exprc::compile_expr(compiler, *c)?;
    compiler.state().emit(instr);
    Ok(())
}

/// Variadic left-fold: `(op a b c)` compiles as `a op b op c`. A single
/// argument passes through unfolded unless `identity` is given (used for
/// `-`/`/`'s unary negate/reciprocal forms).
fn fold(compiler: &mut Compiler, args: &[Value], instr: Instr, identity: Option<Instr>) -> Result<(), CompileError> {
    match args {
        [] => Err(CompileError::MalformedForm("operator needs at least one argument")),
        [only] if identity.is_some() => {
            compiler.state().emit(identity.unwrap());
            exprc::compile_expr(compiler, *only)?;
            compiler.state().emit(instr);
            Ok(())
        }
        [only] => {
            exprc::compile_expr(compiler, *only)?;
            Ok(())
        }
        [first, rest @ ..] => {
            exprc::compile_expr(compiler, *first)?;
            for a in rest {
                exprc::compile_expr(compiler, *a)?;
                compiler.state().emit(instr.clone());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod generators_test;
