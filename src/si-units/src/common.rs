// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UndefinedUnit,
    MalformedExpression,
    IncompatibleUnits,
    UnsupportedConversion,
    NonIntegerExponent,
    ExponentOverflow,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            UndefinedUnit => "undefined_unit",
            MalformedExpression => "malformed_expression",
            IncompatibleUnits => "incompatible_units",
            UnsupportedConversion => "unsupported_conversion",
            NonIntegerExponent => "non_integer_exponent",
            ExponentOverflow => "exponent_overflow",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// the unit expression text could not be turned into a unit
    Parse,
    /// a unit-level operation (power, lookup) was rejected
    Unit,
    /// two quantities or units could not be converted into each other
    Conversion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Parse => "ParseError",
            ErrorKind::Unit => "UnitError",
            ErrorKind::Conversion => "ConversionError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! unit_err {
    ($kind:tt, $code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::$kind,
            ErrorCode::$code,
            Some($str),
        ))
    }};
    ($kind:tt, $code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::$kind, ErrorCode::$code, None))
    }};
}

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Parse,
        ErrorCode::UndefinedUnit,
        Some("furlong".to_owned()),
    );
    assert_eq!("ParseError{undefined_unit: furlong}", format!("{err}"));

    let err = Error::new(ErrorKind::Conversion, ErrorCode::IncompatibleUnits, None);
    assert_eq!("ConversionError{incompatible_units}", format!("{err}"));
    assert_eq!(None, err.get_details());
}

#[test]
fn test_unit_err_macro() {
    fn fails() -> Result<()> {
        unit_err!(Unit, NonIntegerExponent, "m^0.5".to_owned())
    }

    let err = fails().unwrap_err();
    assert_eq!(ErrorKind::Unit, err.kind);
    assert_eq!(ErrorCode::NonIntegerExponent, err.code);
    assert_eq!(Some("m^0.5".to_owned()), err.details);
}
