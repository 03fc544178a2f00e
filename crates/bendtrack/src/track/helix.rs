//! Exact helix in a uniform field of arbitrary direction.
//!
//! The momentum component along the field drifts straight; the transverse
//! part rotates about the field axis by `ω·h` with `ω = −c·q·|B|/|p|`.

use nalgebra::Vector3;

use crate::C_LIGHT_GEV;

use super::types::{unit_or_zero, ParticleState};

/// Advance `state` by path length `h` along the helix defined by `field`.
///
/// Returns the new state and the helix radius (`|p⊥|/(c|q||B|)`, infinite for
/// straight-line motion).
pub fn advance_helix(
    state: &ParticleState,
    field: &Vector3<f64>,
    charge: f64,
    h: f64,
) -> (ParticleState, f64) {
    let b = field.norm();
    if b == 0.0 || charge == 0.0 || state.momentum <= 0.0 {
        let moved = ParticleState {
            position: state.position + state.direction * h,
            ..*state
        };
        return (moved, f64::INFINITY);
    }
    let b_hat = field / b;
    let v = state.direction;
    let v_par = b_hat * v.dot(&b_hat);
    let v_perp = v - v_par;
    let side = b_hat.cross(&v_perp);

    let omega = -C_LIGHT_GEV * charge * b / state.momentum;
    let theta = omega * h;
    let (sin_t, cos_t) = theta.sin_cos();

    let position =
        state.position + v_par * h + v_perp * (sin_t / omega) + side * ((1.0 - cos_t) / omega);
    let direction = unit_or_zero(v_par + v_perp * cos_t + side * sin_t);
    let radius = v_perp.norm() / omega.abs();
    (
        ParticleState {
            position,
            direction,
            momentum: state.momentum,
        },
        radius,
    )
}
