//! Curated surface for the CLI and benches.
//!
//! Prefer these re-exports over reaching into submodules so callers stay
//! insulated from internal file moves.

// Segmentation
pub use crate::bend::{
    build_rbend, build_sbend, faces_overlap_radius, segment_count, BendError, BendLine, BendSpec,
    MagnetGeometryType, MagnetOuter, RBendNeighbours, Segment, SegmentKind,
};
// Stepping
pub use crate::track::{
    advance_helix, drive, rk4_step, select_mode, DipoleAdvancer, FieldSource, ParticleState,
    StepMode, StepResult, Trajectory, TrajectoryPoint, UniformField,
};
// Bunches
pub use crate::beam::{sample_bunch, BeamError, BunchCfg};
// Configuration
pub use crate::cfg::{BeamCfg, BendCfg, Config, ConfigError, TrackingCfg};
