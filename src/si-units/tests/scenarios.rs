// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! End-to-end scenarios: parsing unit text, computing with quantities
//! and displaying the results.

use float_cmp::approx_eq;

use si_units::{ErrorCode, ErrorKind, Quantity, Unit, UnitMap, constants, parse};

fn q(value: f64, unit: &str) -> Quantity {
    Quantity::parse(value, unit).unwrap()
}

fn dims(entries: &[(&str, i32)]) -> UnitMap {
    entries.iter().cloned().collect()
}

#[test]
fn force_times_velocity_is_power() {
    let unit = parse("N").unwrap() * parse("m/s").unwrap();
    assert_eq!(dims(&[("kg", 1), ("m", 2), ("s", -3)]), *unit.dims());

    let watt = Unit::parse("W").unwrap();
    assert!(unit.is_compatible(&watt));
    assert_eq!(1.0, unit.convert_factor(&watt).unwrap());
    assert_eq!(watt, unit);
}

#[test]
fn force_over_area_is_pressure() {
    let pressure = q(10.0, "N") / q(2.0, "m^2");
    assert_eq!("Pa", pressure.unit.name());
    assert_eq!(5.0, pressure.value);
    assert_eq!("5 Pa", pressure.to_string());
}

#[test]
fn speed_conversion() {
    let v = q(36.0, "km/h").to("m/s").unwrap();
    assert!(approx_eq!(f64, 10.0, v.value, epsilon = 1e-12));
    assert_eq!("10 m/s", v.to_string());
}

#[test]
fn metre_over_metre_is_a_bare_number() {
    let ratio = q(1.0, "m") / q(1.0, "m");
    assert!(ratio.is_dimensionless());
    assert_eq!(1.0, ratio.value);
    assert_eq!("1", ratio.to_string());
}

#[test]
fn complex_expression() {
    let unit = parse("kg*m^2/(A^2*s^3)").unwrap();
    assert_eq!(
        dims(&[("kg", 1), ("m", 2), ("A", -2), ("s", -3)]),
        *unit.dims()
    );
    assert_eq!(1.0, unit.scale());
    // which happens to be the ohm
    assert_eq!(Unit::parse("Ohm").unwrap(), unit);
    assert_eq!(Unit::parse("V/A").unwrap(), unit);
}

#[test]
fn adding_length_to_time_fails() {
    let err = q(1.0, "m").checked_add(&q(1.0, "s")).unwrap_err();
    assert_eq!(ErrorCode::IncompatibleUnits, err.code);
    assert_eq!(ErrorKind::Conversion, err.kind);
}

#[test]
fn prefixed_derived_units() {
    let q1 = q(2.0, "N*m");
    let q2 = q(4.0, "J");
    assert!(approx_eq!(f64, 2.0, q1.to("J").unwrap().value, ulps = 2));
    assert!(approx_eq!(f64, 4.0, q2.to("N*m").unwrap().value, ulps = 2));
    assert!(approx_eq!(f64, 1000.0, q(1.0, "kJ").to("J").unwrap().value, ulps = 2));

    // N·m collapses to J once it comes out of an arithmetic operation
    let work = q(2.0, "N") * q(3.0, "m");
    assert_eq!("J", work.unit.name());
    assert_eq!(6.0, work.value);
}

#[test]
fn imperial_units() {
    let mile = q(1.0, "mile").to("km").unwrap();
    assert!(approx_eq!(f64, 1.609344, mile.value, epsilon = 1e-12));

    let speed = q(60.0, "mph").to("km/h").unwrap();
    assert!(approx_eq!(f64, 96.56064, speed.value, epsilon = 1e-9));

    let foot = q(12.0, "in").to("foot").unwrap();
    assert!(approx_eq!(f64, 1.0, foot.value, epsilon = 1e-12));

    let volume = q(1.0, "gallon").to("dm^3").unwrap();
    assert!(approx_eq!(f64, 3.785411784, volume.value, epsilon = 1e-9));
}

#[test]
fn time_to_fall() {
    // t = sqrt(2h/g)
    let height = q(19.6133, "m");
    let t = (2.0 * height / constants::G.clone()).sqrt().unwrap();
    assert_eq!("s", t.unit.name());
    assert!(approx_eq!(f64, 2.0, t.value, epsilon = 1e-9));
}

#[test]
fn light_travel_time() {
    let d = q(1.30, "m");
    let t = (&d / &*constants::C) * 1.33;
    assert_eq!("s", t.unit.name());
    let ns = t.to("ns").unwrap();
    assert!((ns.value - 5.7673).abs() < 1e-3);
}

#[test]
fn errors_are_reported() {
    let err = parse("kg*m^2/(A^2*s^3").unwrap_err();
    assert_eq!(ErrorCode::MalformedExpression, err.code);
    assert_eq!(ErrorKind::Parse, err.kind);

    let err = parse("parsec").unwrap_err();
    assert_eq!(ErrorCode::UndefinedUnit, err.code);
    assert_eq!("ParseError{undefined_unit: parsec}", err.to_string());

    let err = q(1.0, "s").to_mev().unwrap_err();
    assert_eq!(ErrorCode::UnsupportedConversion, err.code);
}

#[test]
fn serde_roundtrip() {
    let speed = q(36.0, "km/h");
    let json = serde_json::to_string(&speed).unwrap();
    assert_eq!(r#"{"value":36.0,"unit":"km/h"}"#, json);

    let back: Quantity = serde_json::from_str(&json).unwrap();
    assert_eq!(speed, back);
    assert_eq!("km/h", back.unit.name());

    let bad = serde_json::from_str::<Quantity>(r#"{"value":1.0,"unit":"m+"}"#);
    assert!(bad.is_err());
}
