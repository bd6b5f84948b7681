// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The SI + imperial unit dataset and the atomic symbol resolver.
//!
//! Every table here is static data.  A single [`UnitSystem`] indexing it
//! is built on first use and shared read-only for the lifetime of the
//! process.

use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::trace;

use crate::common::Result;
use crate::unit_err;
use crate::unitmap::{DIMENSIONLESS, UnitMap};

/// The seven SI base units, one per base dimension.
pub const BASE_UNITS: &[&str] = &["m", "kg", "s", "A", "K", "mol", "cd"];

/// Metric prefixes.  Hecto, deca, deci and centi are included; the exact
/// table matches below (`h`, `day`, `dm`, `cm`, `cd`) always win over
/// prefix stripping, so they don't shadow real units.
const PREFIXES: &[(&str, f64)] = &[
    ("Y", 1e24),
    ("Z", 1e21),
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("da", 1e1),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("μ", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
    ("z", 1e-21),
    ("y", 1e-24),
];

type Definition = (&'static str, f64, &'static [(&'static str, i32)]);

/// Named units, in lookup-preference order: when several entries share a
/// dimension vector the earliest one is what results get displayed in.
const DERIVED_UNITS: &[Definition] = &[
    // length
    ("cm", 0.01, &[("m", 1)]),
    ("dm", 0.1, &[("m", 1)]),
    ("AU", 149597870700.0, &[("m", 1)]),
    ("lyr", 9.4607e15, &[("m", 1)]),
    // mass
    ("g", 0.001, &[("kg", 1)]),
    ("t", 1000.0, &[("kg", 1)]),
    ("u", 1.66053906660e-27, &[("kg", 1)]),
    // time
    ("min", 60.0, &[("s", 1)]),
    ("h", 3600.0, &[("s", 1)]),
    ("day", 86400.0, &[("s", 1)]),
    ("year", 31536000.0, &[("s", 1)]),
    // force
    ("N", 1.0, &[("kg", 1), ("m", 1), ("s", -2)]),
    // energy
    ("J", 1.0, &[("kg", 1), ("m", 2), ("s", -2)]),
    ("eV", 1.602176634e-19, &[("kg", 1), ("m", 2), ("s", -2)]),
    ("cal", 4.184, &[("kg", 1), ("m", 2), ("s", -2)]),
    ("kWh", 3.6e6, &[("kg", 1), ("m", 2), ("s", -2)]),
    // power
    ("W", 1.0, &[("kg", 1), ("m", 2), ("s", -3)]),
    // pressure
    ("Pa", 1.0, &[("kg", 1), ("m", -1), ("s", -2)]),
    ("bar", 1e5, &[("kg", 1), ("m", -1), ("s", -2)]),
    ("atm", 101325.0, &[("kg", 1), ("m", -1), ("s", -2)]),
    // frequency
    ("Hz", 1.0, &[("s", -1)]),
    // electromagnetism
    ("C", 1.0, &[("A", 1), ("s", 1)]),
    ("V", 1.0, &[("kg", 1), ("m", 2), ("s", -3), ("A", -1)]),
    ("T", 1.0, &[("kg", 1), ("s", -2), ("A", -1)]),
    ("G", 1e-4, &[("kg", 1), ("s", -2), ("A", -1)]),
    ("Ohm", 1.0, &[("kg", 1), ("m", 2), ("s", -3), ("A", -2)]),
    ("S", 1.0, &[("kg", -1), ("m", -2), ("s", 3), ("A", 2)]),
    ("Wb", 1.0, &[("kg", 1), ("m", 2), ("s", -2), ("A", -1)]),
    ("F", 1.0, &[("kg", -1), ("m", -2), ("s", 4), ("A", 2)]),
    ("H", 1.0, &[("kg", 1), ("m", 2), ("s", -2), ("A", -2)]),
];

const IMPERIAL_UNITS: &[Definition] = &[
    ("inch", 0.0254, &[("m", 1)]),
    ("foot", 0.3048, &[("m", 1)]),
    ("mile", 1609.344, &[("m", 1)]),
    ("pound", 0.45359237, &[("kg", 1)]),
    ("ounce", 0.028349523125, &[("kg", 1)]),
    ("mph", 0.44704, &[("m", 1), ("s", -1)]),
    ("knot", 0.514444, &[("m", 1), ("s", -1)]),
    // US liquid measures
    ("gallon", 3.785411784e-3, &[("m", 3)]),
    ("quart", 9.46352946e-4, &[("m", 3)]),
    ("pint", 4.73176473e-4, &[("m", 3)]),
];

/// Alternative spellings of atomic symbols.  None of these may read as a
/// prefix followed by a unit (`ft` is femto-tonne, `pt` pico-tonne), since
/// aliases are looked up before prefixes are stripped.
const ALIASES: &[(&str, &str)] = &[
    ("Ω", "Ohm"),
    ("ohm", "Ohm"),
    ("in", "inch"),
    ("mi", "mile"),
    ("lb", "pound"),
    ("oz", "ounce"),
    ("gal", "gallon"),
    ("qt", "quart"),
    ("hr", "h"),
    ("sec", "s"),
];

/// The scale factor and base-unit dimension vector an atomic symbol
/// expands to.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub scale: f64,
    pub dims: UnitMap,
}

impl Resolved {
    pub fn dimensionless() -> Self {
        Resolved {
            scale: 1.0,
            dims: UnitMap::new(),
        }
    }
}

fn build_definitions(defs: &[Definition]) -> Vec<(&'static str, Resolved)> {
    defs.iter()
        .map(|(name, scale, dims)| {
            (
                *name,
                Resolved {
                    scale: *scale,
                    dims: dims.iter().cloned().collect(),
                },
            )
        })
        .collect()
}

#[derive(Debug)]
pub struct UnitSystem {
    prefixes: Vec<(&'static str, f64)>,
    derived: Vec<(&'static str, Resolved)>,
    derived_index: HashMap<&'static str, usize>,
    imperial: HashMap<&'static str, Resolved>,
    aliases: HashMap<&'static str, &'static str>,
}

lazy_static! {
    static ref SI: UnitSystem = UnitSystem::new();
}

impl UnitSystem {
    fn new() -> Self {
        // longest prefix first, so that `da` is tried before `d`.  The
        // sort is stable, keeping declaration order among equal lengths.
        let mut prefixes = PREFIXES.to_vec();
        prefixes.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.chars().count()));

        let derived = build_definitions(DERIVED_UNITS);
        let derived_index = derived
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (*name, i))
            .collect();

        UnitSystem {
            prefixes,
            derived,
            derived_index,
            imperial: build_definitions(IMPERIAL_UNITS).into_iter().collect(),
            aliases: ALIASES.iter().cloned().collect(),
        }
    }

    /// The process-wide SI + imperial unit system.
    pub fn si() -> &'static UnitSystem {
        &SI
    }

    pub fn is_base_unit(&self, symbol: &str) -> bool {
        BASE_UNITS.contains(&symbol)
    }

    pub fn get_derived_unit(&self, symbol: &str) -> Option<&Resolved> {
        self.derived_index
            .get(symbol)
            .map(|&i| &self.derived[i].1)
    }

    pub fn get_imperial_unit(&self, symbol: &str) -> Option<&Resolved> {
        self.imperial.get(symbol)
    }

    /// Prefixes with their scale, longest symbol first.
    pub fn prefixes(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.prefixes.iter().cloned()
    }

    pub fn resolve_alias(&self, symbol: &str) -> Option<&'static str> {
        self.aliases.get(symbol).copied()
    }

    /// The first derived unit (in table order) whose dimension vector is
    /// exactly `dims`.
    pub fn find_derived_unit(&self, dims: &UnitMap) -> Option<(&'static str, &Resolved)> {
        self.derived
            .iter()
            .find(|(_, def)| def.dims == *dims)
            .map(|(name, def)| (*name, def))
    }

    pub fn dimension_vector_to_string(&self, dims: &UnitMap) -> String {
        dims.to_string()
    }

    /// Expands a single symbol (no operators) into its scale and base-unit
    /// dimension vector.  Exact table entries win over prefix stripping;
    /// prefixes are tried longest first and may nest (`kkm`).
    pub fn resolve_atom(&self, symbol: &str) -> Result<Resolved> {
        match self
            .resolve_exact(symbol)
            .or_else(|| self.resolve_prefixed(symbol))
        {
            Some(resolved) => Ok(resolved),
            None => unit_err!(Parse, UndefinedUnit, symbol.to_owned()),
        }
    }

    fn resolve_exact(&self, symbol: &str) -> Option<Resolved> {
        if symbol == DIMENSIONLESS {
            return Some(Resolved::dimensionless());
        }

        if self.is_base_unit(symbol) {
            return Some(Resolved {
                scale: 1.0,
                dims: UnitMap::single(symbol, 1),
            });
        }

        if let Some(def) = self.get_derived_unit(symbol) {
            return Some(def.clone());
        }

        if let Some(def) = self.get_imperial_unit(symbol) {
            return Some(def.clone());
        }

        self.resolve_alias(symbol)
            .and_then(|target| self.resolve_exact(target))
    }

    fn resolve_prefixed(&self, symbol: &str) -> Option<Resolved> {
        for (prefix, prefix_scale) in self.prefixes() {
            let rest = match symbol.strip_prefix(prefix) {
                Some(rest) if !rest.is_empty() && rest != DIMENSIONLESS => rest,
                _ => continue,
            };

            let resolved = self
                .resolve_exact(rest)
                .or_else(|| self.resolve_prefixed(rest));
            if let Some(resolved) = resolved {
                trace!(symbol, prefix, rest, "resolved prefixed unit");
                return Some(Resolved {
                    scale: prefix_scale * resolved.scale,
                    dims: resolved.dims,
                });
            }
        }

        None
    }
}

#[cfg(test)]
use float_cmp::approx_eq;

#[cfg(test)]
fn dims(entries: &[(&str, i32)]) -> UnitMap {
    entries.iter().cloned().collect()
}

#[test]
fn test_base_units_resolve_to_themselves() {
    let si = UnitSystem::si();
    for base in BASE_UNITS {
        let resolved = si.resolve_atom(base).unwrap();
        assert_eq!(1.0, resolved.scale);
        assert_eq!(dims(&[(*base, 1)]), resolved.dims);
    }
}

#[test]
fn test_resolve_atom() {
    let si = UnitSystem::si();
    let cases: &[(&str, f64, UnitMap)] = &[
        ("1", 1.0, UnitMap::new()),
        ("N", 1.0, dims(&[("kg", 1), ("m", 1), ("s", -2)])),
        ("km", 1e3, dims(&[("m", 1)])),
        ("mm", 1e-3, dims(&[("m", 1)])),
        ("ms", 1e-3, dims(&[("s", 1)])),
        ("mg", 1e-6, dims(&[("kg", 1)])),
        ("kN", 1e3, dims(&[("kg", 1), ("m", 1), ("s", -2)])),
        ("MeV", 1.602176634e-13, dims(&[("kg", 1), ("m", 2), ("s", -2)])),
        ("μs", 1e-6, dims(&[("s", 1)])),
        ("nm", 1e-9, dims(&[("m", 1)])),
        ("dam", 10.0, dims(&[("m", 1)])),
        ("hPa", 100.0, dims(&[("kg", 1), ("m", -1), ("s", -2)])),
        ("kkm", 1e6, dims(&[("m", 1)])),
        ("mile", 1609.344, dims(&[("m", 1)])),
        ("in", 0.0254, dims(&[("m", 1)])),
        ("gal", 3.785411784e-3, dims(&[("m", 3)])),
        ("ft", 1e-12, dims(&[("kg", 1)])),
        ("pt", 1e-9, dims(&[("kg", 1)])),
        ("kohm", 1e3, dims(&[("kg", 1), ("m", 2), ("s", -3), ("A", -2)])),
        ("GHz", 1e9, dims(&[("s", -1)])),
    ];

    for (symbol, scale, expected) in cases {
        let resolved = si.resolve_atom(symbol).unwrap();
        assert!(
            approx_eq!(f64, *scale, resolved.scale, ulps = 4),
            "{}: expected scale {} got {}",
            symbol,
            scale,
            resolved.scale
        );
        assert_eq!(*expected, resolved.dims, "{}", symbol);
    }
}

#[test]
fn test_exact_match_beats_prefix() {
    let si = UnitSystem::si();
    // tesla, not tera-something
    assert_eq!(1.0, si.resolve_atom("T").unwrap().scale);
    // hour, not hecto-something
    assert_eq!(3600.0, si.resolve_atom("h").unwrap().scale);
    // minute, not milli-inch
    assert_eq!(60.0, si.resolve_atom("min").unwrap().scale);
    assert_eq!(86400.0, si.resolve_atom("day").unwrap().scale);
    // candela, not centi-d
    assert_eq!(dims(&[("cd", 1)]), si.resolve_atom("cd").unwrap().dims);
}

#[test]
fn test_aliases_do_not_shadow_prefixed_units() {
    let si = UnitSystem::si();
    for (alias, _) in ALIASES {
        for (prefix, _) in si.prefixes() {
            let unit = match alias.strip_prefix(prefix) {
                Some(unit) => unit,
                None => continue,
            };
            assert!(
                !si.is_base_unit(unit) && si.get_derived_unit(unit).is_none(),
                "{} reads as {} + {}",
                alias,
                prefix,
                unit
            );
        }
    }
}

#[test]
fn test_undefined_units() {
    use crate::common::ErrorCode;

    let si = UnitSystem::si();
    for symbol in &["furlong", "k", "Gy", "ha", "xyz", "m1"] {
        let err = si.resolve_atom(symbol).unwrap_err();
        assert_eq!(ErrorCode::UndefinedUnit, err.code, "{}", symbol);
        assert_eq!(Some(symbol.to_string()), err.details);
    }
}

#[test]
fn test_prefixes_longest_first() {
    let si = UnitSystem::si();
    let lengths = si
        .prefixes()
        .map(|(p, _)| p.chars().count())
        .collect::<Vec<_>>();
    assert_eq!(2, lengths[0]);
    assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_find_derived_unit() {
    let si = UnitSystem::si();
    let energy = dims(&[("kg", 1), ("m", 2), ("s", -2)]);
    assert_eq!("J", si.find_derived_unit(&energy).unwrap().0);
    let flux_density = dims(&[("kg", 1), ("s", -2), ("A", -1)]);
    assert_eq!("T", si.find_derived_unit(&flux_density).unwrap().0);
    assert!(si.find_derived_unit(&dims(&[("m", 2)])).is_none());
    assert_eq!(
        "kg*m^2/(A^2*s^3)",
        si.dimension_vector_to_string(&si.get_derived_unit("Ohm").unwrap().dims)
    );
}
