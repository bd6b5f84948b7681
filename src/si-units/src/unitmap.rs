// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Symbol used in unit text for "no dimension at all".
pub const DIMENSIONLESS: &str = "1";

/// A map of unit symbols to (non-zero) integer exponents.
///
/// The same type backs both a unit's fully expanded dimension vector
/// (keys are base units like `kg` or `s`) and its raw term map (keys are
/// atomic symbols as written, like `kN` or `mph`).  Zero exponents are
/// never stored, so the empty map is the dimensionless map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UnitMap {
    pub map: BTreeMap<String, i32>,
}

impl UnitMap {
    pub fn new() -> UnitMap {
        Default::default()
    }

    pub fn single(symbol: &str, exp: i32) -> UnitMap {
        let mut result = UnitMap::new();
        result.insert(symbol, exp);
        result
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, symbol: &str) -> i32 {
        self.map.get(symbol).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.map.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Adds `exp` to the exponent for `symbol`, removing the entry if
    /// it cancels out.
    ///
    /// # Panics
    ///
    /// Panics if the exponent overflows an `i32`.
    pub fn insert(&mut self, symbol: &str, exp: i32) {
        if self.checked_insert(symbol, exp).is_none() {
            panic!("exponent overflow on {symbol}");
        }
    }

    /// Like [`UnitMap::insert`], but returns `None` (leaving the map
    /// untouched) if the exponent would overflow.
    pub fn checked_insert(&mut self, symbol: &str, exp: i32) -> Option<()> {
        if exp == 0 {
            return Some(());
        }
        let new_value = self.get(symbol).checked_add(exp)?;
        if new_value == 0 {
            self.map.remove(symbol);
        } else {
            self.map.insert(symbol.to_owned(), new_value);
        }
        Some(())
    }

    /// If this map has exactly one entry, raised to the first power,
    /// returns its symbol.
    pub fn as_single(&self) -> Option<&str> {
        match self.map.iter().next() {
            Some((symbol, 1)) if self.map.len() == 1 => Some(symbol.as_str()),
            _ => None,
        }
    }

    pub fn reciprocal(self) -> Self {
        self.exp(-1)
    }

    /// Raises every exponent to the `exp` power.
    ///
    /// # Panics
    ///
    /// Panics if an exponent overflows an `i32`.
    pub fn exp(self, exp: i32) -> Self {
        match self.checked_exp(exp) {
            Some(result) => result,
            None => panic!("exponent overflow raising to the power {exp}"),
        }
    }

    pub fn checked_exp(mut self, exp: i32) -> Option<Self> {
        if exp == 0 {
            return Some(UnitMap::new());
        }
        for (_id, unit) in self.map.iter_mut() {
            *unit = unit.checked_mul(exp)?;
        }

        Some(self)
    }

    pub fn checked_mul(mut self, rhs: Self) -> Option<Self> {
        for (unit, n) in rhs.map.into_iter() {
            self.checked_insert(&unit, n)?;
        }

        Some(self)
    }

    #[allow(dead_code)]
    pub fn pretty_print(&self) -> String {
        format!("{}", self)
    }
}

impl std::ops::Div for UnitMap {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, rhs: Self) -> Self::Output {
        self * rhs.reciprocal()
    }
}

impl std::ops::Mul for UnitMap {
    type Output = Self;

    fn mul(mut self, rhs: Self) -> Self::Output {
        for (unit, n) in rhs.map.into_iter() {
            self.insert(&unit, n);
        }

        self
    }
}

/// Renders a map as unit text: sorted numerator symbols joined by `*`,
/// then `/` and the denominator, parenthesized if it has more than one
/// symbol.  The dimensionless map renders as `1`.
impl Display for UnitMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let term = |unit: &str, exp: i32| {
            if exp.unsigned_abs() > 1 {
                format!("{}^{}", unit, exp.unsigned_abs())
            } else {
                unit.to_owned()
            }
        };

        // BTreeMap iteration is already sorted by symbol
        let numerator = self
            .iter()
            .filter(|(_, exp)| *exp > 0)
            .map(|(unit, exp)| term(unit, exp))
            .collect::<Vec<_>>();
        let denominator = self
            .iter()
            .filter(|(_, exp)| *exp < 0)
            .map(|(unit, exp)| term(unit, exp))
            .collect::<Vec<_>>();

        if numerator.is_empty() {
            write!(f, "{}", DIMENSIONLESS)?;
        } else {
            write!(f, "{}", numerator.join("*"))?;
        }

        match denominator.len() {
            0 => Ok(()),
            1 => write!(f, "/{}", denominator[0]),
            _ => write!(f, "/({})", denominator.join("*")),
        }
    }
}

impl FromIterator<(String, i32)> for UnitMap {
    fn from_iter<I: IntoIterator<Item = (String, i32)>>(iter: I) -> Self {
        let mut result = UnitMap::new();
        for (unit, exp) in iter {
            result.insert(&unit, exp);
        }
        result
    }
}

impl<'a> FromIterator<(&'a str, i32)> for UnitMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, i32)>>(iter: I) -> Self {
        let mut result = UnitMap::new();
        for (unit, exp) in iter {
            result.insert(unit, exp);
        }
        result
    }
}

#[cfg(test)]
fn map(entries: &[(&str, i32)]) -> UnitMap {
    entries.iter().cloned().collect()
}

#[test]
fn test_pretty_print() {
    let cases: &[(UnitMap, &str)] = &[
        (UnitMap::new(), "1"),
        (map(&[("m", 1)]), "m"),
        (map(&[("m", 2), ("s", -1)]), "m^2/s"),
        (map(&[("s", -1)]), "1/s"),
        (
            map(&[("kg", 1), ("m", 2), ("A", -2), ("s", -3)]),
            "kg*m^2/(A^2*s^3)",
        ),
        (map(&[("kg", 1), ("m", -1), ("s", -2)]), "kg/(m*s^2)"),
        (map(&[("N", 1), ("m", 1)]), "N*m"),
    ];

    for (input, output) in cases {
        assert_eq!(*output, input.pretty_print());
    }
}

#[test]
fn test_zero_exponents_are_dropped() {
    let m = map(&[("m", 1), ("s", 0)]);
    assert_eq!(1, m.len());

    let cancelled = map(&[("m", 1)]) / map(&[("m", 1)]);
    assert!(cancelled.is_empty());

    assert!(map(&[("m", 3), ("s", -1)]).exp(0).is_empty());
}

#[test]
fn test_mul_div() {
    let velocity = map(&[("m", 1), ("s", -1)]);
    let time = map(&[("s", 1)]);

    assert_eq!(map(&[("m", 1)]), velocity.clone() * time.clone());
    assert_eq!(map(&[("m", 1), ("s", -2)]), velocity.clone() / time);
    assert_eq!(map(&[("m", -2), ("s", 2)]), velocity.exp(-2));
}

#[test]
fn test_as_single() {
    assert_eq!(Some("J"), map(&[("J", 1)]).as_single());
    assert_eq!(None, map(&[("J", 2)]).as_single());
    assert_eq!(None, map(&[("J", 1), ("s", 1)]).as_single());
    assert_eq!(None, UnitMap::new().as_single());
}

#[test]
fn test_checked_overflow() {
    let big = map(&[("m", i32::MAX)]);
    assert_eq!(None, big.clone().checked_mul(map(&[("m", 1)])));
    assert_eq!(None, big.clone().checked_exp(2));
    assert_eq!(None, map(&[("m", i32::MIN)]).checked_exp(-1));

    let mut m = big.clone();
    assert_eq!(None, m.checked_insert("m", 1));
    // a failed insert leaves the map alone
    assert_eq!(big, m);

    assert_eq!(
        Some(map(&[("m", i32::MAX - 1)])),
        big.checked_mul(map(&[("m", -1)]))
    );

    assert_eq!("1/m^2147483648", map(&[("m", i32::MIN)]).to_string());
}
