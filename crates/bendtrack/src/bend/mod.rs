//! Bend segmentation: sector bends split into sagitta-bounded wedges.
//!
//! Purpose
//! - Turn a bend element (length, angle, polefaces) into an ordered list of
//!   straight wedge segments a geometry collaborator can place one by one.
//! - Keep the chord of each wedge within `BendCfg::precision` of the arc.
//!
//! Why this design
//! - Output is plain data (`BendLine`), built once per element and shared
//!   read-only afterwards; trackers never mutate it.
//! - Impossible geometry is a hard error (`BendError`), never silently patched.
//!
//! Code cross-refs: `count::segment_count`, `sector::build_sbend`,
//! `rect::build_rbend`, `checks::faces_overlap_radius`.

mod checks;
mod count;
mod rect;
mod sector;
mod types;

pub use checks::faces_overlap_radius;
pub use count::segment_count;
pub use rect::{build_rbend, RBendNeighbours};
pub use sector::build_sbend;
pub use types::{
    BendError, BendLine, BendSpec, Face, MagnetGeometryType, MagnetOuter, Segment, SegmentKind,
};
