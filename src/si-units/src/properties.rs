// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for the unit algebra using proptest.
//!
//! These tests verify that:
//! 1. atomic resolution composes prefixes with base and derived units
//! 2. rendering a dimension vector and parsing it back is lossless
//! 3. normalization is idempotent
//! 4. compatibility is an equivalence relation

use proptest::prelude::*;

use crate::system::{BASE_UNITS, UnitSystem};
use crate::unit::{Unit, scale_eq};

const SYMBOLS: &[&str] = &[
    "m", "kg", "s", "A", "K", "mol", "cd", "N", "J", "W", "Pa", "Hz", "C", "V", "Ohm", "T", "km",
    "ms", "g", "eV", "MeV", "h", "min", "mph", "inch", "nm", "kN", "μs", "gallon", "atm",
];

const DERIVED: &[&str] = &[
    "cm", "g", "t", "min", "h", "day", "N", "J", "eV", "cal", "W", "Pa", "bar", "atm", "Hz", "C",
    "V", "T", "G", "Ohm", "S", "Wb", "F", "H",
];

const PREFIXES: &[&str] = &[
    "Y", "Z", "E", "P", "T", "G", "M", "k", "h", "da", "d", "c", "m", "μ", "n", "p", "f", "a", "z",
    "y",
];

fn term_strategy() -> impl Strategy<Value = (&'static str, i32)> {
    (prop::sample::select(SYMBOLS), -3i32..=3)
}

fn unit_strategy() -> impl Strategy<Value = Unit> {
    prop::collection::vec(term_strategy(), 1..5).prop_map(|terms| {
        terms
            .into_iter()
            .map(|(symbol, exp)| Unit::parse(symbol).unwrap().powi(exp))
            .fold(Unit::dimensionless(), |acc, unit| acc.multiply(&unit))
    })
}

/// true when `symbol` is spelled out in one of the unit tables, which
/// takes precedence over reading it as prefix + unit (`kg`, `cm`)
fn is_table_entry(system: &UnitSystem, symbol: &str) -> bool {
    system.is_base_unit(symbol)
        || system.get_derived_unit(symbol).is_some()
        || system.get_imperial_unit(symbol).is_some()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prefixed_units_scale_their_base(
        prefix in prop::sample::select(PREFIXES),
        unit in prop::sample::select([BASE_UNITS, DERIVED].concat()),
    ) {
        let system = UnitSystem::si();
        let symbol = format!("{prefix}{unit}");
        prop_assume!(!is_table_entry(system, &symbol));

        let prefix_scale = system
            .prefixes()
            .find(|(p, _)| *p == prefix)
            .map(|(_, scale)| scale)
            .unwrap();
        let base = system.resolve_atom(unit).unwrap();
        let resolved = system.resolve_atom(&symbol).unwrap();

        prop_assert!(scale_eq(prefix_scale * base.scale, resolved.scale));
        prop_assert_eq!(base.dims, resolved.dims);
    }

    #[test]
    fn dimension_string_roundtrips(unit in unit_strategy()) {
        let text = UnitSystem::si().dimension_vector_to_string(unit.dims());
        let reparsed = Unit::parse(&text).unwrap();
        prop_assert!(reparsed.is_compatible(&unit), "{} -> {}", unit, text);
    }

    #[test]
    fn normalize_is_idempotent(unit in unit_strategy()) {
        let (_, once) = unit.normalize();
        let (factor, twice) = once.normalize();
        prop_assert_eq!(once.name(), twice.name());
        prop_assert_eq!(&once, &twice);
        prop_assert!(scale_eq(1.0, factor), "{} -> {} -> {}", unit, once, factor);
    }

    #[test]
    fn normalize_preserves_magnitude(unit in unit_strategy()) {
        let (factor, normalized) = unit.normalize();
        prop_assert!(normalized.is_compatible(&unit));
        prop_assert!(scale_eq(unit.scale(), factor * normalized.scale()));
    }

    #[test]
    fn compatibility_is_an_equivalence(
        a in unit_strategy(),
        b in unit_strategy(),
        c in unit_strategy(),
    ) {
        prop_assert!(a.is_compatible(&a));
        prop_assert_eq!(a.is_compatible(&b), b.is_compatible(&a));
        if a.is_compatible(&b) && b.is_compatible(&c) {
            prop_assert!(a.is_compatible(&c));
        }
        // and the same holds via the base unit rewriting
        let (_, base) = a.to_base_units();
        prop_assert!(base.is_compatible(&a));
    }

    #[test]
    fn unit_times_inverse_is_dimensionless(unit in unit_strategy()) {
        let product = unit.multiply(&unit.powi(-1));
        prop_assert!(product.is_dimensionless());
        prop_assert!(product.terms().is_empty());
        prop_assert_eq!(1.0, product.scale());
    }
}

