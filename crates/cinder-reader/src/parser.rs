// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Recursive-descent S-expression parser. Produces [`Value`] trees directly
//! (the language is homoiconic: source and data share one representation),
//! allocating conses and strings straight into the shared [`Heap`].

use tracing::trace;

use cinder_core::heap::Heap;
use cinder_core::object::{Cons, InternalString};
use cinder_core::value::StrView;
use cinder_core::{Interner, Value};

use crate::error::ReadError;
use crate::lexer::{Lexer, Token};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Token>,
}

fn alloc_string(heap: &mut Heap, text: &str) -> Result<StrView, ReadError> {
    let backing = heap.alloc(cinder_core::object::Object::InternalString(
        InternalString {
            bytes: text.as_bytes().to_vec(),
        },
    ))?;
    Ok(StrView {
        backing,
        offset: 0,
        len: text.len() as u32,
    })
}

fn alloc_cons(heap: &mut Heap, car: Value, cdr: Value) -> Result<Value, ReadError> {
    let r = heap.alloc(cinder_core::object::Object::Cons(Cons { car, cdr }))?;
    Ok(Value::List(Some(r)))
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(src),
            lookahead: None,
        }
    }

    fn peek(&mut self) -> Result<&Token, ReadError> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lexer.next_token()?);
        }
        Ok(self.lookahead.as_ref().unwrap())
    }

    fn advance(&mut self) -> Result<Token, ReadError> {
        match self.lookahead.take() {
            Some(t) => Ok(t),
            None => self.lexer.next_token(),
        }
    }

    /// Reads one top-level form, or `None` at end of input.
    pub fn read_value(
        &mut self,
        heap: &mut Heap,
        interner: &mut dyn Interner,
    ) -> Result<Option<Value>, ReadError> {
        if matches!(self.peek()?, Token::Eof) {
            return Ok(None);
        }
        self.read_expr(heap, interner).map(Some)
    }

    pub fn read_all(
        &mut self,
        heap: &mut Heap,
        interner: &mut dyn Interner,
    ) -> Result<Vec<Value>, ReadError> {
        let mut out = Vec::new();
        while let Some(v) = self.read_value(heap, interner)? {
            out.push(v);
        }
        Ok(out)
    }

    fn read_expr(
        &mut self,
        heap: &mut Heap,
        interner: &mut dyn Interner,
    ) -> Result<Value, ReadError> {
        match self.advance()? {
            Token::Eof => Err(ReadError::UnexpectedEof),
            Token::RParen => Err(ReadError::UnmatchedRightParen),
            Token::LParen => self.read_list(heap, interner),
            Token::True => Ok(Value::Bool(true)),
            Token::False => Ok(Value::Bool(false)),
            Token::Integer(i) => Ok(Value::Integer(i)),
            Token::Float(f) => Ok(Value::Float(f)),
            Token::String(s) => Ok(Value::Str(alloc_string(heap, &s)?)),
            Token::Symbol(name) => {
                let sym = interner.intern(heap, &name)?;
                Ok(Value::Symbol(sym))
            }
            Token::Quote => self.read_quoted(heap, interner, "quote"),
            Token::Quasiquote => self.read_quoted(heap, interner, "quasiquote"),
            Token::Unquote => self.read_quoted(heap, interner, "unquote"),
            Token::UnquoteSplicing => self.read_quoted(heap, interner, "unquote-splicing"),
        }
    }

    fn read_quoted(
        &mut self,
        heap: &mut Heap,
        interner: &mut dyn Interner,
        tag: &str,
    ) -> Result<Value, ReadError> {
        if matches!(self.peek()?, Token::Eof | Token::RParen) {
            return Err(ReadError::DanglingQuote);
        }
        let inner = self.read_expr(heap, interner)?;
        let sym = interner.intern(heap, tag)?;
        let tail = alloc_cons(heap, inner, Value::NIL)?;
        alloc_cons(heap, Value::Symbol(sym), tail)
    }

    fn read_list(
        &mut self,
        heap: &mut Heap,
        interner: &mut dyn Interner,
    ) -> Result<Value, ReadError> {
        let mut items = Vec::new();
        loop {
            match self.peek()? {
                Token::Eof => return Err(ReadError::UnexpectedEof),
                Token::RParen => {
                    self.advance()?;
                    break;
                }
                _ => items.push(self.read_expr(heap, interner)?),
            }
        }
        trace!(len = items.len(), "parsed list");
        let mut tail = Value::NIL;
        for item in items.into_iter().rev() {
            tail = alloc_cons(heap, item, tail)?;
        }
        Ok(tail)
    }
}

#[cfg(test)]
mod parser_test;
