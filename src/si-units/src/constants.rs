// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Physical constants (CODATA values) as quantities.

use lazy_static::lazy_static;

use crate::quantity::Quantity;

fn constant(value: f64, unit: &str) -> Quantity {
    Quantity::parse(value, unit).unwrap()
}

lazy_static! {
    /// standard gravity
    pub static ref G: Quantity = constant(9.80665, "m/s^2");
    /// Planck constant
    pub static ref H: Quantity = constant(6.62607015e-34, "J·s");
    /// speed of light in vacuum
    pub static ref C: Quantity = constant(299792458.0, "m/s");
    pub static ref M_E: Quantity = constant(9.1093837015e-31, "kg");
    pub static ref M_P: Quantity = constant(1.67262192369e-27, "kg");
    pub static ref M_N: Quantity = constant(1.67492749804e-27, "kg");
    /// fine-structure constant
    pub static ref ALPHA: Quantity = constant(7.2973525693e-3, "1");
    /// Avogadro constant
    pub static ref N_A: Quantity = constant(6.02214076e23, "1/mol");
    /// molar gas constant
    pub static ref R: Quantity = constant(8.314462618, "J/(mol·K)");
    /// Boltzmann constant
    pub static ref K_B: Quantity = constant(1.380649e-23, "J/K");
    /// vacuum permittivity
    pub static ref EPSILON_0: Quantity = constant(8.8541878128e-12, "F/m");
    /// vacuum permeability
    pub static ref MU_0: Quantity = constant(1.25663706212e-6, "H/m");
    /// elementary charge
    pub static ref E: Quantity = constant(1.602176634e-19, "C");
}

#[cfg(test)]
use float_cmp::approx_eq;

#[test]
fn test_constant_units() {
    assert_eq!("m/s^2", G.unit.name());
    assert_eq!("J*s", H.unit.name());
    assert_eq!("J/(K*mol)", R.unit.name());
    assert!(ALPHA.is_dimensionless());
    assert_eq!("1/mol", N_A.unit.name());
}

#[test]
fn test_gas_constant() {
    // R = N_A * k_B, and the units agree
    let r = &*N_A * &*K_B;
    assert!(r.unit.is_compatible(&R.unit));
    assert!(approx_eq!(f64, R.value, r.value, epsilon = 1e-8));
}

#[test]
fn test_speed_of_light_from_vacuum() {
    // c^2 = 1 / (ε0 μ0)
    let product = &*EPSILON_0 * &*MU_0;
    let c_squared = 1.0 / product.value * product.unit.scale();
    let (_, base) = product.unit.to_base_units();
    assert_eq!("s^2/m^2", base.name());
    assert!((c_squared.sqrt() - C.value).abs() / C.value < 1e-9);
}
