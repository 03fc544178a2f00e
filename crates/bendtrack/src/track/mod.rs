//! Particle stepping through dipole fields.
//!
//! Purpose
//! - Advance a charged particle over one step of a host integrator and hand
//!   back the new state plus an error estimate for step-size control.
//! - Prefer the exact arc; degrade to simpler or numerical paths where the arc
//!   assumptions break, never to an error.
//!
//! Why this design
//! - Mode choice is a pure function (`select_mode`) returning a tagged
//!   `StepMode`, so the dispatch is inspectable and testable on its own.
//! - Fields come in through the `FieldSource` trait; the advancer owns one and
//!   is cloned per track, so no state is shared between tracks.
//!
//! Code cross-refs: `dipole::DipoleAdvancer`, `helix::advance_helix`,
//! `rk4::rk4_step`, `drive::drive`.

mod dipole;
mod drive;
mod field;
mod helix;
mod rk4;
mod types;

pub use dipole::{select_mode, DipoleAdvancer};
pub use drive::{drive, Trajectory, TrajectoryPoint, MAX_DRIVE_STEPS};
pub use field::{FieldSource, UniformField};
pub use helix::advance_helix;
pub use rk4::{rk4_single, rk4_step, Rk4Output};
pub use types::{ParticleState, StepMode, StepResult};

#[cfg(test)]
mod tests;
