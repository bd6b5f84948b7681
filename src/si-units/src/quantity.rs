// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::ops::{Div, Mul, Neg};

use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::constants;
use crate::unit::Unit;
use crate::unit_err;
use crate::unitmap::DIMENSIONLESS;

/// Number of decimal places shown when no precision is requested.
const DISPLAY_PRECISION: usize = 6;

/// A numeric value tagged with a unit.
///
/// Multiplying or dividing quantities normalizes the resulting unit, so
/// `10 N / 2 m^2` comes out as `5 Pa`.  Adding and subtracting require
/// compatible units and keep the left hand side's unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Quantity { value, unit }
    }

    pub fn parse(value: f64, unit: &str) -> Result<Self> {
        Ok(Quantity::new(value, Unit::parse(unit)?))
    }

    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_dimensionless()
    }

    /// Re-expresses this quantity in the most natural unit for its
    /// dimensions.
    pub fn normalized(&self) -> Quantity {
        let (factor, unit) = self.unit.normalize();
        Quantity::new(self.value * factor, unit)
    }

    /// Converts to `target`, which is used verbatim as the new unit.
    pub fn convert(&self, target: &Unit) -> Result<Quantity> {
        let factor = self.unit.convert_factor(target)?;
        Ok(Quantity::new(self.value * factor, target.clone()))
    }

    pub fn to(&self, target: &str) -> Result<Quantity> {
        self.convert(&Unit::parse(target)?)
    }

    pub fn checked_add(&self, rhs: &Quantity) -> Result<Quantity> {
        if !self.unit.is_compatible(&rhs.unit) {
            return unit_err!(
                Conversion,
                IncompatibleUnits,
                format!("can't add {} and {}", self.unit, rhs.unit)
            );
        }
        let rhs = rhs.convert(&self.unit)?;
        Ok(Quantity::new(self.value + rhs.value, self.unit.clone()))
    }

    pub fn checked_sub(&self, rhs: &Quantity) -> Result<Quantity> {
        if !self.unit.is_compatible(&rhs.unit) {
            return unit_err!(
                Conversion,
                IncompatibleUnits,
                format!("can't subtract {} from {}", rhs.unit, self.unit)
            );
        }
        let rhs = rhs.convert(&self.unit)?;
        Ok(Quantity::new(self.value - rhs.value, self.unit.clone()))
    }

    pub fn powi(&self, n: i32) -> Quantity {
        Quantity::new(self.value.powi(n), self.unit.powi(n))
    }

    pub fn powf(&self, x: f64) -> Result<Quantity> {
        Ok(Quantity::new(self.value.powf(x), self.unit.powf(x)?))
    }

    pub fn sqrt(&self) -> Result<Quantity> {
        Ok(Quantity::new(self.value.sqrt(), self.unit.sqrt()?))
    }

    /// Energy equivalent in MeV: masses via E = mc², momenta via E = pc,
    /// and energies directly.
    pub fn to_mev(&self) -> Result<Quantity> {
        let mev = Unit::parse("MeV")?;
        let c = &*constants::C;
        if self.unit.is_compatible(&Unit::parse("kg")?) {
            (self * &c.powi(2)).convert(&mev)
        } else if self.unit.is_compatible(&Unit::parse("kg*m/s")?) {
            (self * c).convert(&mev)
        } else if self.unit.is_compatible(&mev) {
            self.convert(&mev)
        } else {
            unit_err!(
                Conversion,
                UnsupportedConversion,
                format!("{} can't be converted to MeV", self.unit)
            )
        }
    }

    /// Wavelength in nm: lengths directly, photon energies via λ = hc/E.
    pub fn to_nm(&self) -> Result<Quantity> {
        let nm = Unit::parse("nm")?;
        let ev = Unit::parse("eV")?;
        if self.unit.is_compatible(&nm) {
            self.convert(&nm)
        } else if self.unit.is_compatible(&ev) {
            (&(&*constants::H * &*constants::C) / self).convert(&nm)
        } else {
            unit_err!(
                Conversion,
                UnsupportedConversion,
                format!("{} can't be converted to nm", self.unit)
            )
        }
    }

    /// Photon energy in eV: wavelengths via E = hc/λ, energies directly.
    pub fn to_ev(&self) -> Result<Quantity> {
        let nm = Unit::parse("nm")?;
        let ev = Unit::parse("eV")?;
        if self.unit.is_compatible(&nm) {
            (&(&*constants::H * &*constants::C) / self).convert(&ev)
        } else if self.unit.is_compatible(&ev) {
            self.convert(&ev)
        } else {
            unit_err!(
                Conversion,
                UnsupportedConversion,
                format!("{} can't be converted to eV", self.unit)
            )
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let precision = f.precision().unwrap_or(DISPLAY_PRECISION);
        let scale = 10f64.powi(precision.min(i32::MAX as usize) as i32);
        let scaled = self.value * scale;
        // rounding huge values (or to huge precisions) would overflow, and
        // they have no fractional digits worth dropping anyway.  Adding
        // zero turns a rounded -0 into 0.
        let value = if scaled.is_finite() {
            scaled.round() / scale + 0.0
        } else {
            self.value
        };
        if self.unit.name() == DIMENSIONLESS {
            write!(f, "{}", value)
        } else {
            write!(f, "{} {}", value, self.unit)
        }
    }
}

impl Mul<&Quantity> for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: &Quantity) -> Quantity {
        Quantity::new(self.value * rhs.value, self.unit.multiply(&rhs.unit)).normalized()
    }
}

impl Div<&Quantity> for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: &Quantity) -> Quantity {
        Quantity::new(self.value / rhs.value, self.unit.divide(&rhs.unit)).normalized()
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        &self * &rhs
    }
}

impl Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        &self / &rhs
    }
}

impl Mul<&Unit> for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: &Unit) -> Quantity {
        Quantity::new(self.value, self.unit.multiply(rhs)).normalized()
    }
}

impl Div<&Unit> for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: &Unit) -> Quantity {
        Quantity::new(self.value, self.unit.divide(rhs)).normalized()
    }
}

impl Mul<Unit> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Unit) -> Quantity {
        &self * &rhs
    }
}

impl Div<Unit> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Unit) -> Quantity {
        &self / &rhs
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity::new(self.value * rhs, self.unit)
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        Quantity::new(self.value / rhs, self.unit)
    }
}

impl Mul<Quantity> for f64 {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        rhs * self
    }
}

/// `n / q` inverts the unit as written, without normalizing it.
impl Div<Quantity> for f64 {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        Quantity::new(self / rhs.value, rhs.unit.powi(-1))
    }
}

/// `n * unit` builds a quantity, as in `5.0 * km`.
impl Mul<Unit> for f64 {
    type Output = Quantity;

    fn mul(self, rhs: Unit) -> Quantity {
        Quantity::new(self, rhs)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity::new(-self.value, self.unit)
    }
}

#[cfg(test)]
use float_cmp::approx_eq;

#[cfg(test)]
fn q(value: f64, unit: &str) -> Quantity {
    Quantity::parse(value, unit).unwrap()
}

#[test]
fn test_mul_normalizes_to_derived() {
    let power = q(10.0, "N") * q(3.0, "m/s");
    assert_eq!("W", power.unit.name());
    assert!(approx_eq!(f64, 30.0, power.value, ulps = 4));

    let pressure = q(10.0, "N") / q(2.0, "m^2");
    assert_eq!("Pa", pressure.unit.name());
    assert!(approx_eq!(f64, 5.0, pressure.value, ulps = 4));

    let energy = power * q(2.0, "h");
    assert_eq!("J", energy.unit.name());
    assert!(approx_eq!(f64, 216000.0, energy.value, ulps = 4));
    let kwh = energy.to("kWh").unwrap();
    assert!(approx_eq!(f64, 0.06, kwh.value, epsilon = 1e-12));
}

#[test]
fn test_mul_reduces_like_terms() {
    let area = q(1.0, "km") * q(1.0, "m");
    assert_eq!("km^2", area.unit.name());
    assert!(approx_eq!(f64, 0.001, area.value, ulps = 4));

    let area = q(2.0, "m") * q(3.0, "m");
    assert_eq!("m^2", area.unit.name());
    assert!(approx_eq!(f64, 6.0, area.value, ulps = 4));
}

#[test]
fn test_single_base_dimension() {
    // cancelling terms leaves the unit as written
    let distance = q(36.0, "km/h") * q(2.0, "h");
    assert_eq!("km", distance.unit.name());
    assert!(approx_eq!(f64, 72.0, distance.value, ulps = 4));

    // km/h * s is a length, expressed in metres
    let distance = q(36.0, "km/h") * q(2.0, "s");
    assert_eq!("m", distance.unit.name());
    assert!(approx_eq!(f64, 20.0, distance.value, epsilon = 1e-12));
}

#[test]
fn test_dimensionless() {
    let ratio = q(1.0, "m") / q(1.0, "m");
    assert!(ratio.is_dimensionless());
    assert_eq!(1.0, ratio.value);
    assert_eq!("1", format!("{ratio}"));

    let ratio = q(1.0, "km") / q(1.0, "m");
    assert!(ratio.is_dimensionless());
    assert!(approx_eq!(f64, 1000.0, ratio.value, epsilon = 1e-9));
}

#[test]
fn test_scalar_ops() {
    let d = q(3.0, "m") * 2.0;
    assert_eq!(6.0, d.value);
    assert_eq!("m", d.unit.name());

    let d = 2.0 * q(3.0, "km/h");
    assert_eq!(6.0, d.value);
    assert_eq!("km/h", d.unit.name());

    let d = q(3.0, "m") / 2.0;
    assert_eq!(1.5, d.value);

    let rate = 2.0 / q(4.0, "s");
    assert_eq!(0.5, rate.value);
    assert_eq!("1/s", rate.unit.name());

    let neg = -q(3.0, "m");
    assert_eq!(-3.0, neg.value);
}

#[test]
fn test_unit_operands() {
    let s = Unit::parse("s").unwrap();
    let speed = q(10.0, "m") / Unit::parse("s").unwrap();
    assert_eq!(10.0, speed.value);
    assert_eq!("m/s", speed.unit.name());

    let distance = speed * s;
    assert_eq!("m", distance.unit.name());
    assert_eq!(10.0, distance.value);

    let made = 5.0 * Unit::parse("km").unwrap();
    assert_eq!(5.0, made.value);
    assert_eq!("km", made.unit.name());
}

#[test]
fn test_add_sub() {
    let sum = q(1.0, "km").checked_add(&q(500.0, "m")).unwrap();
    assert_eq!("km", sum.unit.name());
    assert!(approx_eq!(f64, 1.5, sum.value, ulps = 4));

    let diff = q(1.0, "m").checked_sub(&q(50.0, "cm")).unwrap();
    assert_eq!("m", diff.unit.name());
    assert!(approx_eq!(f64, 0.5, diff.value, ulps = 4));

    use crate::common::ErrorCode;
    let err = q(1.0, "m").checked_add(&q(1.0, "s")).unwrap_err();
    assert_eq!(ErrorCode::IncompatibleUnits, err.code);
    let err = q(1.0, "m").checked_sub(&q(1.0, "kg")).unwrap_err();
    assert_eq!(ErrorCode::IncompatibleUnits, err.code);
}

#[test]
fn test_convert() {
    let v = q(36.0, "km/h").to("m/s").unwrap();
    assert!(approx_eq!(f64, 10.0, v.value, epsilon = 1e-12));
    assert_eq!("m/s", v.unit.name());

    let e = q(1.0, "kJ").to("J").unwrap();
    assert!(approx_eq!(f64, 1000.0, e.value, ulps = 4));

    // an explicit target is kept as written
    let work = q(2.0, "J").to("N*m").unwrap();
    assert_eq!("N*m", work.unit.name());
    assert_eq!(2.0, work.value);

    use crate::common::ErrorCode;
    let err = q(1.0, "m").to("s").unwrap_err();
    assert_eq!(ErrorCode::IncompatibleUnits, err.code);
}

#[test]
fn test_powers() {
    let area = q(3.0, "m").powi(2);
    assert_eq!(9.0, area.value);
    assert_eq!("m^2", area.unit.name());

    let side = q(100.0, "cm^2").sqrt().unwrap();
    assert_eq!(10.0, side.value);
    assert_eq!("cm", side.unit.name());

    use crate::common::ErrorCode;
    let err = q(1.0, "m").sqrt().unwrap_err();
    assert_eq!(ErrorCode::NonIntegerExponent, err.code);
    let err = q(8.0, "m^3").powf(0.5).unwrap_err();
    assert_eq!(ErrorCode::NonIntegerExponent, err.code);
}

#[test]
fn test_display() {
    assert_eq!("30 W", format!("{}", q(30.0, "W")));
    assert_eq!("0.333333 m", format!("{}", q(1.0 / 3.0, "m")));
    assert_eq!("0.33 m", format!("{:.2}", q(1.0 / 3.0, "m")));
    assert_eq!("2.5 kg*m^2/(A^2*s^3)", format!("{}", q(2.5, "kg*m^2/(A^2*s^3)")));
    assert_eq!("0.007297", format!("{}", q(7.2973525693e-3, "1")));
    assert_eq!("0 m", format!("{}", q(-1e-9, "m")));

    assert_eq!(format!("{} m", 1e305), format!("{}", q(1e305, "m")));
    assert_eq!(format!("{} m", -1e305), format!("{}", q(-1e305, "m")));
    assert_eq!("1.5 m", format!("{:.400}", q(1.5, "m")));
    assert_eq!("inf m", format!("{}", q(f64::INFINITY, "m")));
}

#[test]
fn test_to_mev() {
    let rest_energy = q(1.0, "kg").to_mev().unwrap();
    assert_eq!("MeV", rest_energy.unit.name());
    assert!(approx_eq!(f64, 5.609588603804452e29, rest_energy.value, epsilon = 1e17));

    let electron = constants::M_E.to_mev().unwrap();
    assert!((electron.value - 0.511).abs() < 1e-3);

    let momentum = q(1.0, "kg*m/s").to_mev().unwrap();
    assert!(approx_eq!(f64, 1.8711e21, momentum.value, epsilon = 1e18));

    let energy = q(2.0, "GeV").to_mev().unwrap();
    assert!(approx_eq!(f64, 2000.0, energy.value, epsilon = 1e-9));

    use crate::common::ErrorCode;
    let err = q(1.0, "s").to_mev().unwrap_err();
    assert_eq!(ErrorCode::UnsupportedConversion, err.code);
}

#[test]
fn test_photon_conversions() {
    let green = q(500.0, "nm").to_ev().unwrap();
    assert_eq!("eV", green.unit.name());
    assert!((green.value - 2.4797).abs() < 1e-3);

    let back = green.to_nm().unwrap();
    assert_eq!("nm", back.unit.name());
    assert!((back.value - 500.0).abs() < 1e-6);

    let len = q(1.0, "μm").to_nm().unwrap();
    assert!(approx_eq!(f64, 1000.0, len.value, epsilon = 1e-9));

    let energy = q(3.0, "eV").to_ev().unwrap();
    assert!(approx_eq!(f64, 3.0, energy.value, ulps = 4));

    use crate::common::ErrorCode;
    assert_eq!(
        ErrorCode::UnsupportedConversion,
        q(1.0, "kg").to_nm().unwrap_err().code
    );
    assert_eq!(
        ErrorCode::UnsupportedConversion,
        q(1.0, "A").to_ev().unwrap_err().code
    );
}
