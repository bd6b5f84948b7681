// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use super::Token::*;
use super::{Lexer, Token};
use crate::common::ErrorCode;

// spans are written as `~` under the input, as in the equation lexer tests
fn test(input: &str, expected: Vec<(&str, Token)>) {
    let tokenizer = Lexer::new(input);
    let len = expected.len();
    for (token, (expected_span, expected_tok)) in tokenizer.zip(expected.into_iter()) {
        let expected_start = expected_span.find('~').unwrap();
        let expected_end = expected_span.rfind('~').unwrap() + 1;
        assert_eq!((expected_start, expected_tok, expected_end), token.unwrap());
    }

    let tokenizer = Lexer::new(input);
    assert!(tokenizer.skip(len).next().is_none());
}

fn test_err(input: &str, details: &str) {
    let err = Lexer::new(input)
        .find_map(|tok| tok.err())
        .expect("expected a lexer error");
    assert_eq!(ErrorCode::MalformedExpression, err.code);
    assert_eq!(Some(details.to_owned()), err.details);
}

#[test]
fn single_atom() {
    test("kg", vec![("~~", Atom("kg", None))]);
}

#[test]
fn atom_with_exponent() {
    test("m^2", vec![("~~~", Atom("m", Some(2)))]);
    test("s^-3", vec![("~~~~", Atom("s", Some(-3)))]);
    test("s^+1", vec![("~~~~", Atom("s", Some(1)))]);
}

#[test]
fn operators() {
    test(
        "kg*m^2/(A^2*s^3)",
        vec![
            ("~~              ", Atom("kg", None)),
            ("  ~             ", Mul),
            ("   ~~~          ", Atom("m", Some(2))),
            ("      ~         ", Div),
            ("       ~        ", LParen),
            ("        ~~~     ", Atom("A", Some(2))),
            ("           ~    ", Mul),
            ("            ~~~ ", Atom("s", Some(3))),
            ("               ~", RParen),
        ],
    );
}

#[test]
fn middle_dot() {
    // the middle dot is two bytes wide
    let tokens = Lexer::new("N·m").map(|t| t.unwrap()).collect::<Vec<_>>();
    assert_eq!(
        vec![(0, Atom("N", None), 1), (1, Mul, 3), (3, Atom("m", None), 4)],
        tokens
    );
}

#[test]
fn micro_prefix() {
    let tokens = Lexer::new("μs").map(|t| t.unwrap()).collect::<Vec<_>>();
    assert_eq!(vec![(0, Atom("μs", None), 3)], tokens);
}

#[test]
fn omega() {
    let tokens = Lexer::new("V/kΩ").map(|t| t.unwrap()).collect::<Vec<_>>();
    assert_eq!(
        vec![(0, Atom("V", None), 1), (1, Div, 2), (2, Atom("kΩ", None), 5)],
        tokens
    );
}

#[test]
fn group_exponent() {
    test(
        "(m/s)^2",
        vec![
            ("~      ", LParen),
            (" ~     ", Atom("m", None)),
            ("  ~    ", Div),
            ("   ~   ", Atom("s", None)),
            ("    ~  ", RParen),
            ("     ~~", Exp(2)),
        ],
    );
}

#[test]
fn dimensionless_literal() {
    test(
        "1/s",
        vec![("~  ", Atom("1", None)), (" ~ ", Div), ("  ~", Atom("s", None))],
    );
}

#[test]
fn whitespace() {
    test(
        " m / s ",
        vec![
            (" ~     ", Atom("m", None)),
            ("   ~   ", Div),
            ("     ~ ", Atom("s", None)),
        ],
    );
}

#[test]
fn unrecognized() {
    test_err("m+s", "unrecognized token '+' at 1:2");
    test_err("2*m", "unrecognized token '2' at 0:1");
    test_err("m^x", "unrecognized token '^' at 1:2");
    test_err("m^99999999999", "exponent '99999999999' out of range at 0:13");
}
