//! Particle state and per-step output exchanged with the host integrator.

use nalgebra::{Vector3, Vector6};

/// Position, unit direction, and momentum magnitude of one particle.
///
/// The 6-vector form `[x, y, z, px, py, pz]` is what error estimates refer to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleState {
    pub position: Vector3<f64>,
    pub direction: Vector3<f64>,
    /// |p| [GeV/c].
    pub momentum: f64,
}

impl ParticleState {
    /// Build a state; `direction` is normalised (a zero vector stays zero).
    pub fn new(position: Vector3<f64>, direction: Vector3<f64>, momentum: f64) -> Self {
        Self {
            position,
            direction: unit_or_zero(direction),
            momentum,
        }
    }

    #[inline]
    pub fn momentum_vector(&self) -> Vector3<f64> {
        self.direction * self.momentum
    }

    pub fn to_vector6(&self) -> Vector6<f64> {
        let p = self.momentum_vector();
        Vector6::new(
            self.position.x,
            self.position.y,
            self.position.z,
            p.x,
            p.y,
            p.z,
        )
    }

    pub fn from_vector6(y: &Vector6<f64>) -> Self {
        let position = Vector3::new(y[0], y[1], y[2]);
        let p = Vector3::new(y[3], y[4], y[5]);
        let momentum = p.norm();
        Self {
            position,
            direction: unit_or_zero(p),
            momentum,
        }
    }
}

#[inline]
pub(crate) fn unit_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > 0.0 {
        v / n
    } else {
        v
    }
}

/// Which path the advancer took for a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepMode {
    /// No field or neutral particle: straight line.
    Linear,
    /// Bending radius under the floor: pushed along the field axis.
    Spiralling,
    /// Closed-form circular arc.
    Helix,
    /// Numerical fallback for non-paraxial motion.
    RungeKutta,
}

/// Output of one advancer step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepResult {
    pub state: ParticleState,
    /// Error estimate on `[x, y, z, px, py, pz]` for the step-size controller.
    pub error: Vector6<f64>,
    /// Largest distance between the true path and the chord of the step [m].
    pub dist_chord: f64,
    pub mode: StepMode,
}
