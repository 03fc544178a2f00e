//! Analytic dipole stepping and sector-bend segmentation.
//!
//! Two halves that meet at the beamline element:
//! - `bend`: split a bend into wedge segments whose chords stay within a
//!   sagitta bound, with thin fringe pieces carrying poleface rotations.
//! - `track`: advance a charged particle through a dipole field, analytically
//!   where the arc solution holds and via fallbacks where it does not.
//!
//! Units: metres, radians, GeV/c for momentum, tesla for field, elementary
//! charge for charge.
//!
//! API Policy
//! - Configuration is always passed in explicitly (`cfg::Config`).
//! - Builders return `Result`; steppers never fail and degrade instead.

pub mod api;
pub mod beam;
pub mod bend;
pub mod cfg;
pub mod track;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Speed of light expressed as GeV/c per (T·m·e).
pub const C_LIGHT_GEV: f64 = 0.299_792_458;

pub use cfg::Config;
pub use nalgebra::{Vector3 as Vec3, Vector6 as Vec6};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::bend::{
        build_rbend, build_sbend, segment_count, BendError, BendLine, BendSpec, MagnetGeometryType,
        MagnetOuter, RBendNeighbours, Segment, SegmentKind,
    };
    pub use crate::cfg::{BeamCfg, BendCfg, Config, TrackingCfg};
    pub use crate::track::{
        drive, select_mode, DipoleAdvancer, FieldSource, ParticleState, StepMode, StepResult,
        Trajectory, UniformField,
    };
    pub use nalgebra::{Vector3 as Vec3, Vector6 as Vec6};
}

/// Magnetic rigidity Bρ [T·m] for momentum `p` [GeV/c] and charge `q` [e].
#[inline]
pub fn brho(p: f64, q: f64) -> f64 {
    p / (C_LIGHT_GEV * q)
}

/// Signed bending radius [m] in a field `b` [T]; infinite when `q·b` vanishes.
#[inline]
pub fn bending_radius(p: f64, q: f64, b: f64) -> f64 {
    p / (C_LIGHT_GEV * q * b)
}

/// True when `x` is distinguishable from zero at machine precision.
#[inline]
pub(crate) fn is_nonzero(x: f64) -> bool {
    x.abs() > f64::EPSILON
}
