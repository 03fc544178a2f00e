//! Analytic dipole stepper with degenerate-physics fallbacks.
//!
//! Frame: local magnet coordinates, z along the segment chord, the dipole
//! field along ±y. Each step picks one `StepMode` via `select_mode`:
//! - `Linear` when the field or the charge vanishes.
//! - `Spiralling` when the bending radius drops below the configured floor;
//!   the particle is pushed a full step along the field axis so it leaves the
//!   region instead of looping with ever smaller steps.
//! - `Helix` for forward, paraxial motion in a field along y: the closed-form
//!   arc. Its error estimate compares one full step with two half steps, the
//!   second half using the field sampled at the midpoint.
//! - `RungeKutta` otherwise.
//!
//! The stepper never fails; bad inputs (NaN field, zero step) are the host
//! driver's responsibility and fall through to one of the modes above.

use nalgebra::{Vector3, Vector6};

use crate::cfg::TrackingCfg;
use crate::{bending_radius, is_nonzero};

use super::field::FieldSource;
use super::helix::advance_helix;
use super::rk4::rk4_step;
use super::types::{unit_or_zero, ParticleState, StepMode, StepResult};

/// Synthetic position error reported for spiralling steps.
const SPIRAL_POSITION_ERROR: f64 = 1e-20;
/// Synthetic momentum error reported for spiralling steps.
const SPIRAL_MOMENTUM_ERROR: f64 = 1e-40;
/// Relative tolerance for treating a field as pointing along local y.
const DIPOLE_AXIS_TOL: f64 = 1e-9;

/// Choose how to advance `state` through `field`.
pub fn select_mode(
    cfg: &TrackingCfg,
    field: &Vector3<f64>,
    charge: f64,
    state: &ParticleState,
) -> StepMode {
    let b = field.norm();
    if b == 0.0 || charge == 0.0 {
        return StepMode::Linear;
    }
    let radius = bending_radius(state.momentum, charge, b).abs();
    if radius < cfg.min_radius_of_curvature {
        return StepMode::Spiralling;
    }
    let along_y = field.y.abs() >= b * (1.0 - DIPOLE_AXIS_TOL);
    if along_y
        && state.direction.z > cfg.paraxial_cosine
        && state.momentum > cfg.min_paraxial_momentum
    {
        StepMode::Helix
    } else {
        StepMode::RungeKutta
    }
}

/// Closed-form arc in a field `b_y` along local y.
///
/// Returns the new state and the sagitta of the step, `|R|(1 − cos(Θ/2))`.
pub(crate) fn dipole_arc(
    state: &ParticleState,
    b_y: f64,
    charge: f64,
    h: f64,
) -> (ParticleState, f64) {
    if !is_nonzero(b_y) || charge == 0.0 {
        let moved = ParticleState {
            position: state.position + state.direction * h,
            ..*state
        };
        return (moved, 0.0);
    }
    let r = bending_radius(state.momentum, charge, b_y);
    let theta = h / r;
    let (sin_t, cos_t) = theta.sin_cos();
    let v = state.direction;
    let n = v.cross(&Vector3::y());

    let position = state.position + (v * sin_t + n * (1.0 - cos_t)) * r;
    let direction = unit_or_zero(v * cos_t + n * sin_t);
    let sagitta = r.abs() * (1.0 - (0.5 * theta).cos());
    (
        ParticleState {
            position,
            direction,
            momentum: state.momentum,
        },
        sagitta,
    )
}

/// Per-track dipole stepper: configuration, field and particle charge.
#[derive(Clone, Debug)]
pub struct DipoleAdvancer<F> {
    cfg: TrackingCfg,
    field: F,
    charge: f64,
}

impl<F: FieldSource> DipoleAdvancer<F> {
    pub fn new(cfg: TrackingCfg, field: F, charge: f64) -> Self {
        Self { cfg, field, charge }
    }

    pub fn cfg(&self) -> &TrackingCfg {
        &self.cfg
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    /// Re-arm for another track of a different species.
    pub fn set_charge(&mut self, charge: f64) {
        self.charge = charge;
    }

    /// Mode the next step from `state` would take.
    pub fn mode_for(&self, state: &ParticleState) -> StepMode {
        let b = self.field.field_at(&state.position);
        select_mode(&self.cfg, &b, self.charge, state)
    }

    /// Advance `state` by path length `h`.
    pub fn advance(&self, state: &ParticleState, h: f64) -> StepResult {
        let b = self.field.field_at(&state.position);
        let mode = select_mode(&self.cfg, &b, self.charge, state);
        tracing::trace!(?mode, h, "dipole step");
        match mode {
            StepMode::Linear => StepResult {
                state: ParticleState {
                    position: state.position + state.direction * h,
                    ..*state
                },
                error: Vector6::zeros(),
                dist_chord: 0.0,
                mode,
            },
            StepMode::Spiralling => self.spiral(state, &b, h),
            StepMode::Helix => self.arc_with_error(state, b.y, h),
            StepMode::RungeKutta => self.runge_kutta(state, h),
        }
    }

    fn spiral(&self, state: &ParticleState, b: &Vector3<f64>, h: f64) -> StepResult {
        let (turned, _) = advance_helix(state, b, self.charge, h);
        let axis = b / b.norm();
        let mut error = Vector6::zeros();
        error.fixed_rows_mut::<3>(0).fill(SPIRAL_POSITION_ERROR);
        error.fixed_rows_mut::<3>(3).fill(SPIRAL_MOMENTUM_ERROR);
        StepResult {
            state: ParticleState {
                position: state.position + axis * h,
                direction: turned.direction,
                momentum: state.momentum,
            },
            error,
            dist_chord: 0.0,
            mode: StepMode::Spiralling,
        }
    }

    fn arc_with_error(&self, state: &ParticleState, b_y: f64, h: f64) -> StepResult {
        let (full, dist_chord) = dipole_arc(state, b_y, self.charge, h);
        let (half, _) = dipole_arc(state, b_y, self.charge, 0.5 * h);
        let b_mid = self.field.field_at(&half.position);
        let (two_half, _) = dipole_arc(&half, b_mid.y, self.charge, 0.5 * h);
        StepResult {
            state: full,
            error: full.to_vector6() - two_half.to_vector6(),
            dist_chord,
            mode: StepMode::Helix,
        }
    }

    fn runge_kutta(&self, state: &ParticleState, h: f64) -> StepResult {
        let y0 = state.to_vector6();
        let out = rk4_step(&y0, h, self.charge, &self.field);
        let end = ParticleState::from_vector6(&out.y);
        let mid = ParticleState::from_vector6(&out.mid);
        StepResult {
            state: end,
            error: out.error,
            dist_chord: distance_to_chord(&mid.position, &state.position, &end.position),
            mode: StepMode::RungeKutta,
        }
    }
}

/// Distance of `p` from the segment `a`–`b` (from `a` when they coincide).
fn distance_to_chord(p: &Vector3<f64>, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let chord = b - a;
    let len2 = chord.norm_squared();
    if len2 == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&chord) / len2).clamp(0.0, 1.0);
    (p - (a + chord * t)).norm()
}
