// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use lazy_static::lazy_static;
use regex::Regex;

use crate::common::Result;
use crate::unit_err;

#[cfg(test)]
mod test;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'input> {
    /// a bare unit symbol with an optional integer exponent, like `m^2`
    Atom(&'input str, Option<i32>),
    /// `^n` directly after a closing paren, raising the whole group
    Exp(i32),
    Mul,
    Div,
    LParen,
    RParen,
}

pub type Spanned<T> = (usize, T, usize);

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(
        r"^(?:(?P<atom>[A-Za-zμΩ1]+)(?:\^(?P<exp>[+-]?\d+))?|\^(?P<pow>[+-]?\d+)|(?P<op>[*·/()]))"
    )
    .unwrap();
}

fn exponent(text: &str, start: usize, end: usize) -> Result<i32> {
    match text.parse::<i32>() {
        Ok(n) => Ok(n),
        Err(_) => unit_err!(
            Parse,
            MalformedExpression,
            format!("exponent '{text}' out of range at {start}:{end}")
        ),
    }
}

/// Splits a unit expression into tokens in a single left-to-right scan.
pub struct Lexer<'input> {
    text: &'input str,
    pos: usize,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Lexer {
            text: input,
            pos: 0,
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn scan(&mut self) -> Result<Spanned<Token<'input>>> {
        let text = self.text;
        let start = self.pos;
        let rest = &text[start..];

        let caps = match TOKEN_RE.captures(rest) {
            Some(caps) => caps,
            None => {
                // eat whatever is killing us so iteration can terminate
                let len = rest.chars().next().map_or(1, |c| c.len_utf8());
                self.pos = text.len();
                return unit_err!(
                    Parse,
                    MalformedExpression,
                    format!(
                        "unrecognized token '{}' at {}:{}",
                        &rest[..len],
                        start,
                        start + len
                    )
                );
            }
        };

        let end = start + caps.get(0).map_or(0, |m| m.end());
        self.pos = end;

        let tok = if let Some(atom) = caps.name("atom") {
            let atom = &text[start + atom.start()..start + atom.end()];
            let exp = match caps.name("exp") {
                Some(exp) => Some(exponent(exp.as_str(), start, end)?),
                None => None,
            };
            Token::Atom(atom, exp)
        } else if let Some(pow) = caps.name("pow") {
            Token::Exp(exponent(pow.as_str(), start, end)?)
        } else {
            match caps.name("op").map(|op| op.as_str()) {
                Some("*") | Some("·") => Token::Mul,
                Some("/") => Token::Div,
                Some("(") => Token::LParen,
                _ => Token::RParen,
            }
        };

        Ok((start, tok, end))
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result<Spanned<Token<'input>>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        if self.pos >= self.text.len() {
            return None;
        }
        Some(self.scan())
    }
}
