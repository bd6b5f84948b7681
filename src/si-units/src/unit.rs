// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use float_cmp::approx_eq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use crate::common::Result;
use crate::parser;
use crate::system::{Resolved, UnitSystem};
use crate::unit_err;
use crate::unitmap::{DIMENSIONLESS, UnitMap};

pub(crate) fn scale_eq(a: f64, b: f64) -> bool {
    approx_eq!(f64, a, b, ulps = 8)
}

/// Expands a raw term map into (scale, dimension vector) using the
/// resolution recorded for each atomic symbol.  `None` if a base-unit
/// exponent overflows.
fn expand(terms: &UnitMap, atoms: &BTreeMap<String, Resolved>) -> Option<(f64, UnitMap)> {
    let mut scale = 1.0;
    let mut dims = UnitMap::new();
    for (symbol, exp) in terms.iter() {
        if let Some(atom) = atoms.get(symbol) {
            scale *= atom.scale.powi(exp);
            dims = dims.checked_mul(atom.dims.clone().checked_exp(exp)?)?;
        }
    }
    Some((scale, dims))
}

/// A (possibly compound) unit of measure.
///
/// A unit remembers the atomic symbols it was written with (`terms`, e.g.
/// `{N: 1, m: 1}`) alongside their full expansion into SI base units
/// (`dims` and `scale`, e.g. `{kg: 1, m: 2, s: -2}` and 1.0).  Two units are
/// equal when their expansions are, regardless of how they are written.
#[derive(Clone, Debug)]
pub struct Unit {
    name: String,
    scale: f64,
    dims: UnitMap,
    terms: UnitMap,
    atoms: BTreeMap<String, Resolved>,
}

impl Unit {
    pub fn parse(expr: &str) -> Result<Unit> {
        parser::parse(expr)
    }

    pub fn dimensionless() -> Unit {
        Unit::from_parts(UnitMap::new(), BTreeMap::new())
    }

    /// One of the SI base units, like `kg`.
    pub(crate) fn base(symbol: &str) -> Unit {
        Unit::from_atom(
            symbol,
            Resolved {
                scale: 1.0,
                dims: UnitMap::single(symbol, 1),
            },
        )
    }

    pub(crate) fn from_atom(symbol: &str, resolved: Resolved) -> Unit {
        // `1` is not a term of its own: it is the empty map
        if symbol == DIMENSIONLESS {
            return Unit::dimensionless();
        }
        let mut atoms = BTreeMap::new();
        atoms.insert(symbol.to_owned(), resolved);
        Unit::from_parts(UnitMap::single(symbol, 1), atoms)
    }

    fn from_parts(terms: UnitMap, atoms: BTreeMap<String, Resolved>) -> Unit {
        let name = terms.to_string();
        match Unit::try_from_parts(terms, atoms) {
            Some(unit) => unit,
            None => panic!("exponent overflow expanding {name}"),
        }
    }

    fn try_from_parts(terms: UnitMap, mut atoms: BTreeMap<String, Resolved>) -> Option<Unit> {
        atoms.retain(|symbol, _| terms.get(symbol) != 0);
        let (scale, dims) = expand(&terms, &atoms)?;
        Some(Unit {
            name: terms.to_string(),
            scale,
            dims,
            terms,
            atoms,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The dimension vector, in SI base units.
    pub fn dims(&self) -> &UnitMap {
        &self.dims
    }

    /// The raw term map, in the atomic symbols the unit was written with.
    pub fn terms(&self) -> &UnitMap {
        &self.terms
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dims.is_empty()
    }

    /// # Panics
    ///
    /// Panics if a resulting exponent overflows an `i32`; see
    /// [`Unit::checked_multiply`].
    pub fn multiply(&self, rhs: &Unit) -> Unit {
        let terms = self.terms.clone() * rhs.terms.clone();
        Unit::from_parts(terms, self.merged_atoms(rhs))
    }

    pub fn checked_multiply(&self, rhs: &Unit) -> Result<Unit> {
        let unit = self
            .terms
            .clone()
            .checked_mul(rhs.terms.clone())
            .and_then(|terms| Unit::try_from_parts(terms, self.merged_atoms(rhs)));
        match unit {
            Some(unit) => Ok(unit),
            None => unit_err!(
                Unit,
                ExponentOverflow,
                format!("{} * {}", self.name, rhs.name)
            ),
        }
    }

    fn merged_atoms(&self, rhs: &Unit) -> BTreeMap<String, Resolved> {
        let mut atoms = self.atoms.clone();
        for (symbol, atom) in rhs.atoms.iter() {
            atoms
                .entry(symbol.clone())
                .or_insert_with(|| atom.clone());
        }
        atoms
    }

    pub fn divide(&self, rhs: &Unit) -> Unit {
        self.multiply(&rhs.powi(-1))
    }

    pub fn checked_divide(&self, rhs: &Unit) -> Result<Unit> {
        self.checked_multiply(&rhs.checked_powi(-1)?)
    }

    /// # Panics
    ///
    /// Panics if a resulting exponent overflows an `i32`; see
    /// [`Unit::checked_powi`].
    pub fn powi(&self, n: i32) -> Unit {
        Unit::from_parts(self.terms.clone().exp(n), self.atoms.clone())
    }

    pub fn checked_powi(&self, n: i32) -> Result<Unit> {
        let unit = self
            .terms
            .clone()
            .checked_exp(n)
            .and_then(|terms| Unit::try_from_parts(terms, self.atoms.clone()));
        match unit {
            Some(unit) => Ok(unit),
            None => unit_err!(Unit, ExponentOverflow, format!("({})^{}", self.name, n)),
        }
    }

    /// Raises the unit to a real power.  Only allowed when every resulting
    /// exponent is a whole number, so `(m^2)^0.5` is fine but `m^0.5` is
    /// not.
    pub fn powf(&self, x: f64) -> Result<Unit> {
        let mut terms = UnitMap::new();
        for (symbol, exp) in self.terms.iter() {
            let new_exp = exp as f64 * x;
            if !new_exp.is_finite() || (new_exp - new_exp.round()).abs() > 1e-9 {
                return unit_err!(
                    Unit,
                    NonIntegerExponent,
                    format!("({})^{} needs exponent {} on {}", self.name, x, new_exp, symbol)
                );
            }
            let new_exp = new_exp.round();
            if new_exp < i32::MIN as f64 || new_exp > i32::MAX as f64 {
                return unit_err!(
                    Unit,
                    ExponentOverflow,
                    format!("({})^{} needs exponent {} on {}", self.name, x, new_exp, symbol)
                );
            }
            terms.insert(symbol, new_exp as i32);
        }
        match Unit::try_from_parts(terms, self.atoms.clone()) {
            Some(unit) => Ok(unit),
            None => unit_err!(Unit, ExponentOverflow, format!("({})^{}", self.name, x)),
        }
    }

    pub fn sqrt(&self) -> Result<Unit> {
        self.powf(0.5)
    }

    /// True when both units have the same dimension vector, and values in
    /// one can be converted to the other by a scalar factor.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    /// The factor that converts a value in this unit to a value in `target`.
    pub fn convert_factor(&self, target: &Unit) -> Result<f64> {
        if !self.is_compatible(target) {
            return unit_err!(
                Conversion,
                IncompatibleUnits,
                format!("{} and {}", self.name, target.name)
            );
        }
        Ok(self.scale / target.scale)
    }

    /// This unit rewritten entirely in SI base units, together with the
    /// factor to multiply values by.
    pub fn to_base_units(&self) -> (f64, Unit) {
        let atoms = self
            .dims
            .iter()
            .map(|(symbol, _)| {
                (
                    symbol.to_owned(),
                    Resolved {
                        scale: 1.0,
                        dims: UnitMap::single(symbol, 1),
                    },
                )
            })
            .collect();
        (self.scale, Unit::from_parts(self.dims.clone(), atoms))
    }

    pub fn normalize(&self) -> (f64, Unit) {
        self.normalize_with(UnitSystem::si())
    }

    /// Picks the most natural way to write this unit, returning it along
    /// with the factor that converts values in `self` to values in it.
    ///
    /// From most to least specific: a unit already written as a single
    /// symbol is left alone; a single base dimension becomes that base
    /// unit; an exact dimension match against the derived unit table
    /// becomes that derived unit; a dimensionless unit becomes `1`.
    /// Otherwise terms with identical dimensions are merged, so `km*m`
    /// becomes `km^2`.
    pub fn normalize_with(&self, system: &UnitSystem) -> (f64, Unit) {
        if self.terms.as_single().is_some() {
            return (1.0, self.clone());
        }

        if let Some(base) = self.dims.as_single() {
            trace!(unit = %self.name, base, "normalized to base unit");
            return (self.scale, Unit::base(base));
        }

        if let Some((name, def)) = system.find_derived_unit(&self.dims) {
            trace!(unit = %self.name, derived = name, "normalized to derived unit");
            return (self.scale / def.scale, Unit::from_atom(name, def.clone()));
        }

        if self.dims.is_empty() {
            trace!(unit = %self.name, "normalized to dimensionless");
            return (self.scale, Unit::dimensionless());
        }

        match self.reduce() {
            Some(reduced) => {
                trace!(unit = %self.name, reduced = %reduced.name, "reduced unit");
                (self.scale / reduced.scale, reduced)
            }
            // merged exponents would overflow, keep the unit as written
            None => (1.0, self.clone()),
        }
    }

    /// Merges terms whose own dimension vectors are identical.  Terms are
    /// visited in symbol order, and each joins the first earlier term it
    /// matches.
    fn reduce(&self) -> Option<Unit> {
        let mut groups: Vec<(&str, &UnitMap, i32)> = Vec::new();
        for (symbol, exp) in self.terms.iter() {
            let dims = match self.atoms.get(symbol) {
                Some(atom) => &atom.dims,
                None => continue,
            };
            match groups.iter_mut().find(|(_, group_dims, _)| *group_dims == dims) {
                Some(group) => group.2 = group.2.checked_add(exp)?,
                None => groups.push((symbol, dims, exp)),
            }
        }

        let terms = groups
            .into_iter()
            .map(|(symbol, _, exp)| (symbol, exp))
            .collect();
        Unit::try_from_parts(terms, self.atoms.clone())
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && scale_eq(self.scale, other.scale)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for Unit {
    type Err = crate::common::Error;

    fn from_str(s: &str) -> Result<Self> {
        Unit::parse(s)
    }
}

impl std::ops::Mul for &Unit {
    type Output = Unit;

    fn mul(self, rhs: Self) -> Unit {
        self.multiply(rhs)
    }
}

impl std::ops::Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Self) -> Unit {
        self.multiply(&rhs)
    }
}

impl std::ops::Div for &Unit {
    type Output = Unit;

    fn div(self, rhs: Self) -> Unit {
        self.divide(rhs)
    }
}

impl std::ops::Div for Unit {
    type Output = Unit;

    fn div(self, rhs: Self) -> Unit {
        self.divide(&rhs)
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let expr = String::deserialize(deserializer)?;
        Unit::parse(&expr).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
fn u(expr: &str) -> Unit {
    Unit::parse(expr).unwrap()
}

#[cfg(test)]
fn dims_of(entries: &[(&str, i32)]) -> UnitMap {
    entries.iter().cloned().collect()
}

#[test]
fn test_equality_ignores_spelling() {
    assert_eq!(u("N*m"), u("J"));
    assert_eq!(u("kg*m/s^2"), u("N"));
    assert_eq!(1.0, u("m*s/s").scale());
    assert_ne!(u("km"), u("m"));
    assert_ne!(u("J"), u("W"));
    assert!(u("km").is_compatible(&u("m")));
    assert!(!u("J").is_compatible(&u("W")));
}

#[test]
fn test_multiply_divide_power() {
    let a = u("kN");
    let b = u("m");
    let work = &a * &b;
    assert_eq!("kN*m", work.name());
    assert_eq!(1000.0, work.scale());
    assert!(work.is_compatible(&u("J")));

    let speed = u("km") / u("h");
    assert_eq!("km/h", speed.name());
    assert!(scale_eq(1000.0 / 3600.0, speed.scale()));

    let squared = speed.powi(2);
    assert_eq!("km^2/h^2", squared.name());
    assert_eq!(u("m^2/s^2").dims(), squared.dims());

    let inverse = u("Hz").powi(-1);
    assert_eq!("1/Hz", inverse.name());
    assert!(inverse.is_compatible(&u("s")));

    assert!(u("kg*m").divide(&u("kg*m")).is_dimensionless());
}

#[test]
fn test_powf() {
    let root = u("m^2/s^4").sqrt().unwrap();
    assert_eq!("m/s^2", root.name());
    assert_eq!(u("m^4").powf(0.25).unwrap(), u("m"));
    assert_eq!(u("m^3").powf(2.0).unwrap(), u("m^6"));

    use crate::common::ErrorCode;
    let err = u("m^3").sqrt().unwrap_err();
    assert_eq!(ErrorCode::NonIntegerExponent, err.code);
    assert!(u("m").powf(f64::NAN).is_err());
}

#[test]
fn test_checked_exponents() {
    use crate::common::{ErrorCode, ErrorKind};

    let big = u("m^2147483647");
    let err = big.checked_multiply(&u("m")).unwrap_err();
    assert_eq!(ErrorCode::ExponentOverflow, err.code);
    assert_eq!(ErrorKind::Unit, err.kind);
    assert_eq!(Some("m^2147483647 * m".to_owned()), err.details);

    assert!(big.checked_powi(2).is_err());
    assert!(big.checked_divide(&u("1/m")).is_err());
    assert_eq!(u("m^2147483646"), big.checked_divide(&u("m")).unwrap());
    assert_eq!(u("m^-2147483647"), big.checked_powi(-1).unwrap());

    let err = big.powf(2.0).unwrap_err();
    assert_eq!(ErrorCode::ExponentOverflow, err.code);

    // the raw term fits, but its expansion into m^3 doesn't
    let volume = u("gallon");
    let err = volume.checked_powi(1_000_000_000).unwrap_err();
    assert_eq!(ErrorCode::ExponentOverflow, err.code);
    assert!(volume.powf(1e9).is_err());
}

#[test]
fn test_normalize_keeps_unreducible_overflow() {
    // Pa cancels one metre, so the dims fit, but merging km and m into
    // a single term would need an exponent past i32::MAX
    let unit = u("Pa*km^2147483647*m/kg*s^2");
    assert_eq!(dims_of(&[("m", i32::MAX)]), *unit.dims());
    let (factor, normalized) = unit.normalize();
    assert_eq!(1.0, factor);
    assert_eq!(unit.name(), normalized.name());
}

#[test]
fn test_convert_factor() {
    assert_eq!(1000.0, u("km").convert_factor(&u("m")).unwrap());
    assert!(scale_eq(1e-3, u("m").convert_factor(&u("km")).unwrap()));
    assert_eq!(3600.0, u("h").convert_factor(&u("s")).unwrap());

    use crate::common::{ErrorCode, ErrorKind};
    let err = u("m").convert_factor(&u("s")).unwrap_err();
    assert_eq!(ErrorCode::IncompatibleUnits, err.code);
    assert_eq!(ErrorKind::Conversion, err.kind);
    assert_eq!(Some("m and s".to_owned()), err.details);
}

#[test]
fn test_to_base_units() {
    let (factor, base) = u("kWh").to_base_units();
    assert_eq!(3.6e6, factor);
    assert_eq!("kg*m^2/s^2", base.name());
    assert_eq!(1.0, base.scale());

    let (factor, base) = u("1").to_base_units();
    assert_eq!(1.0, factor);
    assert_eq!("1", base.name());
}

#[test]
fn test_normalize_rules() {
    // (input, expected unit name, expected factor)
    let cases: &[(&str, &str, f64)] = &[
        // already a single symbol
        ("kN", "kN", 1.0),
        ("mph", "mph", 1.0),
        // a single base dimension
        ("km/h*s", "m", 1000.0 / 3600.0),
        ("J/N", "m", 1.0),
        // exact derived unit match
        ("N*m", "J", 1.0),
        ("kN*m", "J", 1000.0),
        ("N/m^2", "Pa", 1.0),
        ("1/s", "Hz", 1.0),
        ("kg*m^2/(A^2*s^3)", "Ohm", 1.0),
        ("A*ms", "C", 1e-3),
        // dimensionless
        ("m/m", "1", 1.0),
        ("km/m", "1", 1000.0),
        // reduction of like terms
        ("km*m", "km^2", 1e-3),
        ("m*m", "m^2", 1.0),
        ("m/s", "m/s", 1.0),
        ("h*km/(min*s)", "km/h", 216000.0),
        ("mph^2/knot", "knot", 0.44704 * 0.44704 / 0.514444 / 0.514444),
    ];

    for (input, name, factor) in cases {
        let (actual_factor, normalized) = u(input).normalize();
        assert_eq!(*name, normalized.name(), "{}", input);
        assert!(
            ((factor - actual_factor) / factor).abs() < 1e-12,
            "{}: expected factor {} got {}",
            input,
            factor,
            actual_factor
        );
    }
}

#[test]
fn test_reduction_merges_in_symbol_order() {
    // `g` sorts before `kg`, so the merged term is written in grams
    let (factor, normalized) = u("kg*g*m").normalize();
    assert_eq!("g^2*m", normalized.name());
    assert!((1000.0 - factor).abs() < 1e-9);
}

#[test]
fn test_unit_serde() {
    let unit = u("kg*m^2/(A^2*s^3)");
    let json = serde_json::to_string(&unit).unwrap();
    assert_eq!(r#""kg*m^2/(A^2*s^3)""#, json);
    let back: Unit = serde_json::from_str(&json).unwrap();
    assert_eq!(unit, back);

    assert!(serde_json::from_str::<Unit>(r#""furlong""#).is_err());
}

#[test]
fn test_from_str() {
    let unit: Unit = "m/s".parse().unwrap();
    assert_eq!("m/s", unit.to_string());
    assert!("m/(s".parse::<Unit>().is_err());
}
