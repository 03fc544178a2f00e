//! Fixed-step driver that records a trajectory.

use super::dipole::DipoleAdvancer;
use super::field::FieldSource;
use super::types::{ParticleState, StepMode};

/// One recorded point; the first point of a trajectory has no step behind it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryPoint {
    /// Path length travelled so far [m].
    pub s: f64,
    pub state: ParticleState,
    pub mode: Option<StepMode>,
    pub error_norm: f64,
    pub dist_chord: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    pub points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    /// Number of steps taken in `mode`.
    pub fn count_mode(&self, mode: StepMode) -> usize {
        self.points.iter().filter(|p| p.mode == Some(mode)).count()
    }

    /// Largest per-step sagitta seen.
    pub fn max_dist_chord(&self) -> f64 {
        self.points.iter().map(|p| p.dist_chord).fold(0.0, f64::max)
    }
}

/// Most steps a single `drive` call will take.
pub const MAX_DRIVE_STEPS: usize = 1 << 24;

/// Step `start` through `path_length` in steps of at most `step`.
///
/// The last step is shortened to land exactly on `path_length`. A
/// non-positive or non-finite step or length, or a step so small that more
/// than `MAX_DRIVE_STEPS` would be needed, records only the start point.
pub fn drive<F: FieldSource>(
    advancer: &DipoleAdvancer<F>,
    start: ParticleState,
    path_length: f64,
    step: f64,
) -> Trajectory {
    let mut trajectory = Trajectory {
        points: vec![TrajectoryPoint {
            s: 0.0,
            state: start,
            mode: None,
            error_norm: 0.0,
            dist_chord: 0.0,
        }],
    };
    if !(step.is_finite() && step > 0.0 && path_length.is_finite() && path_length > 0.0) {
        return trajectory;
    }
    let n_float = (path_length / step).ceil().max(1.0);
    if !(n_float <= MAX_DRIVE_STEPS as f64) {
        tracing::warn!(path_length, step, "too many steps requested, not driving");
        return trajectory;
    }
    let n_steps = n_float as usize;
    trajectory.points.reserve(n_steps);
    let mut state = start;
    for i in 0..n_steps {
        let s0 = step * i as f64;
        let h = if i + 1 == n_steps {
            path_length - s0
        } else {
            step
        };
        let result = advancer.advance(&state, h);
        state = result.state;
        trajectory.points.push(TrajectoryPoint {
            s: s0 + h,
            state,
            mode: Some(result.mode),
            error_norm: result.error.norm(),
            dist_chord: result.dist_chord,
        });
    }
    tracing::debug!(
        steps = n_steps,
        helix = trajectory.count_mode(StepMode::Helix),
        rk4 = trajectory.count_mode(StepMode::RungeKutta),
        "trajectory done"
    );
    trajectory
}
