// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use std::fmt;

use cinder_core::ErrorKind;

#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    UnexpectedEof,
    UnterminatedString,
    UnmatchedRightParen,
    DanglingQuote,
    Heap(ErrorKind),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::UnexpectedEof => write!(f, "unexpected end of input"),
            ReadError::UnterminatedString => write!(f, "unterminated string literal"),
            ReadError::UnmatchedRightParen => write!(f, "unmatched ')'"),
            ReadError::DanglingQuote => write!(f, "quote prefix with no following expression"),
            ReadError::Heap(k) => write!(f, "{k}"),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<ErrorKind> for ReadError {
    fn from(k: ErrorKind) -> Self {
        ReadError::Heap(k)
    }
}
