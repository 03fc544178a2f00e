//! Classical fourth-order Runge–Kutta on the Lorentz-force equation.
//!
//! State `y = [x, y, z, px, py, pz]`, independent variable the path length `s`:
//! `dr/ds = p/|p|`, `dp/ds = c·q·(p/|p|) × B(r)`.
//! The error estimate comes from step doubling: one full step against two
//! half steps; the (more accurate) two-half-step result is returned.

use nalgebra::{Vector3, Vector6};

use crate::C_LIGHT_GEV;

use super::field::FieldSource;

/// Result of one doubled RK4 step.
#[derive(Clone, Copy, Debug)]
pub struct Rk4Output {
    /// State after two half steps.
    pub y: Vector6<f64>,
    /// Two-half-step result minus single-step result.
    pub error: Vector6<f64>,
    /// State at the half-way point.
    pub mid: Vector6<f64>,
}

#[inline]
fn split(y: &Vector6<f64>) -> (Vector3<f64>, Vector3<f64>) {
    (
        y.fixed_rows::<3>(0).into_owned(),
        y.fixed_rows::<3>(3).into_owned(),
    )
}

fn derivative<F: FieldSource + ?Sized>(y: &Vector6<f64>, charge: f64, field: &F) -> Vector6<f64> {
    let (r, p) = split(y);
    let p_mag = p.norm();
    if p_mag == 0.0 {
        return Vector6::zeros();
    }
    let u = p / p_mag;
    let force = u.cross(&field.field_at(&r)) * (C_LIGHT_GEV * charge);
    Vector6::new(u.x, u.y, u.z, force.x, force.y, force.z)
}

/// Single classical RK4 step of length `h`.
pub fn rk4_single<F: FieldSource + ?Sized>(
    y: &Vector6<f64>,
    h: f64,
    charge: f64,
    field: &F,
) -> Vector6<f64> {
    let k1 = derivative(y, charge, field);
    let k2 = derivative(&(y + k1 * (0.5 * h)), charge, field);
    let k3 = derivative(&(y + k2 * (0.5 * h)), charge, field);
    let k4 = derivative(&(y + k3 * h), charge, field);
    y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

/// RK4 step of length `h` with a step-doubling error estimate.
pub fn rk4_step<F: FieldSource + ?Sized>(
    y: &Vector6<f64>,
    h: f64,
    charge: f64,
    field: &F,
) -> Rk4Output {
    let full = rk4_single(y, h, charge, field);
    let mid = rk4_single(y, 0.5 * h, charge, field);
    let two_half = rk4_single(&mid, 0.5 * h, charge, field);
    Rk4Output {
        y: two_half,
        error: two_half - full,
        mid,
    }
}
