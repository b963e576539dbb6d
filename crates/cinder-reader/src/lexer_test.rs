// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

fn tokens(src: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(src);
    let mut out = Vec::new();
    loop {
        let t = lexer.next_token().unwrap();
        let done = t == Token::Eof;
        out.push(t);
        if done {
            break;
        }
    }
    out
}

#[test]
fn tokenizes_a_simple_call() {
    assert_eq!(
        tokens("(+ 1 2.5)"),
        vec![
            Token::LParen,
            Token::Symbol("+".into()),
            Token::Integer(1),
            Token::Float(2.5),
            Token::RParen,
            Token::Eof,
        ]
    );
}

#[test]
fn tokenizes_quote_shorthands() {
    assert_eq!(
        tokens("'x `y ,z ,@w"),
        vec![
            Token::Quote,
            Token::Symbol("x".into()),
            Token::Quasiquote,
            Token::Symbol("y".into()),
            Token::Unquote,
            Token::Symbol("z".into()),
            Token::UnquoteSplicing,
            Token::Symbol("w".into()),
            Token::Eof,
        ]
    );
}

#[test]
fn tokenizes_strings_with_escapes() {
    assert_eq!(
        tokens(r#""hi\n\"there\"""#),
        vec![Token::String("hi\n\"there\"".into()), Token::Eof]
    );
}

#[test]
fn booleans_and_negative_numbers() {
    assert_eq!(
        tokens("true false -5"),
        vec![Token::True, Token::False, Token::Integer(-5), Token::Eof]
    );
}

#[test]
fn symbol_starting_with_minus_is_not_numeric() {
    assert_eq!(tokens("-"), vec![Token::Symbol("-".into()), Token::Eof]);
}

#[test]
fn comments_are_skipped() {
    assert_eq!(
        tokens("1 ; a comment\n2"),
        vec![Token::Integer(1), Token::Integer(2), Token::Eof]
    );
}

#[test]
fn unterminated_string_is_an_error() {
    let mut lexer = Lexer::new("\"abc");
    assert_eq!(lexer.next_token(), Err(ReadError::UnterminatedString));
}
