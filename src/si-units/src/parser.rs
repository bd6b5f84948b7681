// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Unit expression parser.
//!
//! Expressions are tokenized, rearranged into postfix order with the
//! shunting-yard algorithm (`*`, `·` and `/` share one precedence level
//! and associate to the left), and then evaluated on a stack of [`Unit`]s.

use tracing::debug;

use crate::common::Result;
use crate::system::UnitSystem;
use crate::token::{Lexer, Spanned, Token};
use crate::unit::Unit;
use crate::unit_err;

const STRUCTURAL_CHARS: &[char] = &['*', '·', '/', '(', ')', '^'];

/// What kind of text we were handed: a lone symbol like `kN` goes straight
/// to the resolver, anything with operators goes through the full parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input<'a> {
    SimpleAtom(&'a str),
    Expression(&'a str),
}

impl<'a> Input<'a> {
    pub fn classify(text: &'a str) -> Self {
        if text.contains(STRUCTURAL_CHARS) {
            Input::Expression(text)
        } else {
            Input::SimpleAtom(text)
        }
    }
}

/// Strips whitespace, and folds the micro sign (U+00B5) and ohm sign
/// (U+2126) into their Greek letters.
fn clean(expr: &str) -> String {
    expr.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '\u{00B5}' => 'μ',
            '\u{2126}' => 'Ω',
            c => c,
        })
        .collect()
}

pub fn parse(expr: &str) -> Result<Unit> {
    parse_with(UnitSystem::si(), expr)
}

pub fn parse_with(system: &UnitSystem, expr: &str) -> Result<Unit> {
    let text = clean(expr);
    if text.is_empty() {
        return unit_err!(Parse, MalformedExpression, "empty unit expression".to_owned());
    }

    match Input::classify(&text) {
        Input::SimpleAtom(symbol) => {
            debug!(symbol, "parsing simple unit");
            let resolved = system.resolve_atom(symbol)?;
            Ok(Unit::from_atom(symbol, resolved))
        }
        Input::Expression(text) => {
            debug!(expr = text, "parsing unit expression");
            let postfix = to_postfix(text)?;
            eval_postfix(system, &postfix)
        }
    }
}

fn to_postfix(text: &str) -> Result<Vec<Spanned<Token<'_>>>> {
    let mut output = Vec::new();
    let mut ops: Vec<Spanned<Token<'_>>> = Vec::new();
    let mut prev: Option<Token<'_>> = None;

    for tok in Lexer::new(text) {
        let (start, token, end) = tok?;
        match token {
            Token::Atom(_, _) => output.push((start, token, end)),
            Token::Exp(_) => {
                if prev != Some(Token::RParen) {
                    return unit_err!(
                        Parse,
                        MalformedExpression,
                        format!("exponent without a unit at {start}:{end}")
                    );
                }
                output.push((start, token, end));
            }
            Token::Mul | Token::Div => {
                while let Some(&(_, Token::Mul | Token::Div, _)) = ops.last() {
                    output.extend(ops.pop());
                }
                ops.push((start, token, end));
            }
            Token::LParen => ops.push((start, token, end)),
            Token::RParen => loop {
                match ops.pop() {
                    Some((_, Token::LParen, _)) => break,
                    Some(op) => output.push(op),
                    None => {
                        return unit_err!(
                            Parse,
                            MalformedExpression,
                            format!("unbalanced parentheses: unexpected ')' at {start}:{end}")
                        );
                    }
                }
            },
        }
        prev = Some(token);
    }

    while let Some(op) = ops.pop() {
        if let (start, Token::LParen, end) = op {
            return unit_err!(
                Parse,
                MalformedExpression,
                format!("unbalanced parentheses: unclosed '(' at {start}:{end}")
            );
        }
        output.push(op);
    }

    Ok(output)
}

/// Reports an exponent overflow as a malformed expression, pointing at the
/// operator or atom that caused it.
fn in_bounds(unit: Result<Unit>, start: usize, end: usize) -> Result<Unit> {
    match unit {
        Ok(unit) => Ok(unit),
        Err(err) => unit_err!(
            Parse,
            MalformedExpression,
            format!(
                "exponent overflow at {start}:{end}: {}",
                err.get_details().unwrap_or_default()
            )
        ),
    }
}

fn eval_postfix(system: &UnitSystem, postfix: &[Spanned<Token<'_>>]) -> Result<Unit> {
    let mut stack: Vec<Unit> = Vec::new();

    for &(start, token, end) in postfix {
        match token {
            Token::Atom(symbol, exp) => {
                let unit = Unit::from_atom(symbol, system.resolve_atom(symbol)?);
                stack.push(match exp {
                    Some(n) => in_bounds(unit.checked_powi(n), start, end)?,
                    None => unit,
                });
            }
            Token::Exp(n) => match stack.pop() {
                Some(unit) => stack.push(in_bounds(unit.checked_powi(n), start, end)?),
                None => {
                    return unit_err!(
                        Parse,
                        MalformedExpression,
                        format!("exponent without a unit at {start}:{end}")
                    );
                }
            },
            Token::Mul | Token::Div => {
                let (rhs, lhs) = match (stack.pop(), stack.pop()) {
                    (Some(rhs), Some(lhs)) => (rhs, lhs),
                    _ => {
                        let op = if token == Token::Mul { '*' } else { '/' };
                        return unit_err!(
                            Parse,
                            MalformedExpression,
                            format!("not enough operands for '{op}' at {start}:{end}")
                        );
                    }
                };
                let unit = if token == Token::Mul {
                    lhs.checked_multiply(&rhs)
                } else {
                    lhs.checked_divide(&rhs)
                };
                stack.push(in_bounds(unit, start, end)?);
            }
            Token::LParen | Token::RParen => {
                return unit_err!(
                    Parse,
                    MalformedExpression,
                    format!("unbalanced parentheses at {start}:{end}")
                );
            }
        }
    }

    if stack.len() != 1 {
        return unit_err!(
            Parse,
            MalformedExpression,
            format!("expected a single unit, found {}", stack.len())
        );
    }

    Ok(stack.pop().unwrap_or_else(Unit::dimensionless))
}

#[cfg(test)]
use crate::common::ErrorCode;
#[cfg(test)]
use crate::unitmap::UnitMap;

#[cfg(test)]
fn dims(entries: &[(&str, i32)]) -> UnitMap {
    entries.iter().cloned().collect()
}

#[test]
fn test_classify() {
    assert_eq!(Input::SimpleAtom("kN"), Input::classify("kN"));
    assert_eq!(Input::Expression("N*m"), Input::classify("N*m"));
    assert_eq!(Input::Expression("N·m"), Input::classify("N·m"));
    assert_eq!(Input::Expression("m^2"), Input::classify("m^2"));
    assert_eq!(Input::Expression("(m)"), Input::classify("(m)"));
}

#[test]
fn test_parse_dimensions() {
    let cases: &[(&str, UnitMap, &str)] = &[
        ("m", dims(&[("m", 1)]), "m"),
        ("m^2/s", dims(&[("m", 2), ("s", -1)]), "m^2/s"),
        (
            "kg*m^2/(A^2*s^3)",
            dims(&[("kg", 1), ("m", 2), ("A", -2), ("s", -3)]),
            "kg*m^2/(A^2*s^3)",
        ),
        ("N·m", dims(&[("kg", 1), ("m", 2), ("s", -2)]), "N*m"),
        ("J/(mol·K)", dims(&[("kg", 1), ("m", 2), ("s", -2), ("mol", -1), ("K", -1)]), "J/(K*mol)"),
        ("1/mol", dims(&[("mol", -1)]), "1/mol"),
        ("1", UnitMap::new(), "1"),
        ("m/m", UnitMap::new(), "1"),
        ("m/s/s", dims(&[("m", 1), ("s", -2)]), "m/s^2"),
        ("(m/s)^2", dims(&[("m", 2), ("s", -2)]), "m^2/s^2"),
        ("m^0", UnitMap::new(), "1"),
        (" kg * m ", dims(&[("kg", 1), ("m", 1)]), "kg*m"),
        ("µs", dims(&[("s", 1)]), "μs"),
    ];

    for (input, expected, name) in cases {
        let unit = parse(input).unwrap();
        assert_eq!(*expected, *unit.dims(), "{}", input);
        assert_eq!(*name, unit.name(), "{}", input);
    }
}

#[test]
fn test_omega_in_expressions() {
    let ohm = parse("Ohm").unwrap();
    for input in &["Ω", "V/A", "V/Ω", "kΩ/s", "Ω*A/V", "\u{2126}"] {
        assert!(parse(input).is_ok(), "{}", input);
    }
    assert_eq!(ohm, parse("Ω").unwrap());
    assert_eq!(ohm, parse("\u{2126}").unwrap());
    assert_eq!(UnitMap::new(), *parse("Ω*A/V").unwrap().dims());
    assert_eq!(dims(&[("A", 1)]), *parse("V/Ω").unwrap().dims());

    let kilo = parse("mA*kΩ").unwrap();
    assert_eq!(parse("V").unwrap(), kilo);
    assert_eq!("kΩ*mA", kilo.name());
}

#[test]
fn test_left_associative() {
    // a/b*c is (a/b)*c, not a/(b*c)
    let unit = parse("m/s*s").unwrap();
    assert_eq!(dims(&[("m", 1)]), *unit.dims());
}

#[test]
fn test_parse_scale() {
    let unit = parse("km/h").unwrap();
    assert!(crate::unit::scale_eq(1000.0 / 3600.0, unit.scale()));
    let unit = parse("kg*m^2/(A^2*s^3)").unwrap();
    assert_eq!(1.0, unit.scale());
}

#[test]
fn test_malformed() {
    let cases: &[(&str, &str)] = &[
        ("", "empty unit expression"),
        ("   ", "empty unit expression"),
        ("(m/s", "unbalanced parentheses: unclosed '(' at 0:1"),
        ("m/s)", "unbalanced parentheses: unexpected ')' at 3:4"),
        ("m*", "not enough operands for '*' at 1:2"),
        ("/s", "not enough operands for '/' at 0:1"),
        ("m(s)", "expected a single unit, found 2"),
        ("()", "expected a single unit, found 0"),
        ("^2", "exponent without a unit at 0:2"),
        ("m*^2", "exponent without a unit at 2:4"),
    ];

    for (input, details) in cases {
        let err = parse(input).unwrap_err();
        assert_eq!(ErrorCode::MalformedExpression, err.code, "{}", input);
        assert_eq!(Some(details.to_string()), err.details, "{}", input);
    }
}

#[test]
fn test_exponent_overflow() {
    let cases: &[(&str, &str)] = &[
        (
            "(m^65536)^65536",
            "exponent overflow at 9:15: (m^65536)^65536",
        ),
        (
            "m^2147483647*m",
            "exponent overflow at 12:13: m^2147483647 * m",
        ),
        (
            "1/m^-2147483648",
            "exponent overflow at 1:2: (1/m^2147483648)^-1",
        ),
    ];

    for (input, details) in cases {
        let err = parse(input).unwrap_err();
        assert_eq!(ErrorCode::MalformedExpression, err.code, "{}", input);
        assert_eq!(Some(details.to_string()), err.details, "{}", input);
    }

    // large but representable exponents are fine
    let unit = parse("(m^65536)^32767").unwrap();
    assert_eq!(dims(&[("m", 65536 * 32767)]), *unit.dims());
}

#[test]
fn test_undefined() {
    for input in &["furlong", "m*furlong", "kg/(m*bogus^2)"] {
        let err = parse(input).unwrap_err();
        assert_eq!(ErrorCode::UndefinedUnit, err.code, "{}", input);
    }
}
