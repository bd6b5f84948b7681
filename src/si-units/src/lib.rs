// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Unit expression parsing, dimensional analysis and quantity arithmetic.
//!
//! ```
//! use si_units::Quantity;
//!
//! let force = Quantity::parse(10.0, "N").unwrap();
//! let area = Quantity::parse(2.0, "m^2").unwrap();
//! assert_eq!("5 Pa", format!("{}", force / area));
//! ```

#![forbid(unsafe_code)]

pub mod common;
pub mod constants;
mod parser;
mod quantity;
mod system;
mod token;
mod unit;
mod unitmap;

#[cfg(test)]
mod properties;

pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::parser::{Input, parse, parse_with};
pub use self::quantity::Quantity;
pub use self::system::{BASE_UNITS, Resolved, UnitSystem};
pub use self::unit::Unit;
pub use self::unitmap::{DIMENSIONLESS, UnitMap};
