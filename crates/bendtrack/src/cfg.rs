//! Run configuration injected into builders and steppers.
//!
//! Policy
//! - Every tunable lives in one plain struct that callers construct (or load)
//!   once and pass down explicitly. Nothing reads process-wide state.
//! - Defaults mirror the reference beamline defaults; SI-style units throughout
//!   (metres, radians, GeV, tesla).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bend::{MagnetGeometryType, MagnetOuter};

/// Rest mass of the electron in GeV.
pub const ELECTRON_MASS_GEV: f64 = 0.000_510_998_95;

/// Errors raised when a configuration fails validation.
#[derive(Debug)]
pub enum ConfigError {
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Options consumed by the bend builders.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BendCfg {
    /// Maximum chord-to-arc sagitta per segment [m].
    pub precision: f64,
    /// Debug override: never split sector bends.
    pub dont_split: bool,
    /// Emit thin fringe segments where a poleface angle is set.
    pub include_fringe: bool,
    /// Length given to fringe segments [m].
    pub thin_element_length: f64,
    /// Magnet outer used when an element does not carry its own.
    pub default_outer: MagnetOuter,
}

impl Default for BendCfg {
    fn default() -> Self {
        Self {
            precision: 1e-3,
            dont_split: false,
            include_fringe: true,
            thin_element_length: 1e-7,
            default_outer: MagnetOuter {
                diameter: 0.6,
                geometry: MagnetGeometryType::PolesCircular,
            },
        }
    }
}

/// Options consumed by the dipole advancer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingCfg {
    /// Below this bending radius [m] a particle is pushed along the field axis.
    pub min_radius_of_curvature: f64,
    /// Minimum local longitudinal direction cosine for the analytic arc.
    pub paraxial_cosine: f64,
    /// Minimum momentum [GeV/c] for the analytic arc.
    pub min_paraxial_momentum: f64,
}

impl Default for TrackingCfg {
    fn default() -> Self {
        Self {
            min_radius_of_curvature: 0.05,
            paraxial_cosine: 0.9,
            min_paraxial_momentum: 0.04,
        }
    }
}

/// Nominal beam used to derive magnet strengths.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamCfg {
    /// Total energy of the design particle [GeV].
    pub nominal_energy: f64,
    /// Rest mass of the design particle [GeV].
    pub particle_mass: f64,
    /// Charge of the design particle [e].
    pub charge: f64,
}

impl Default for BeamCfg {
    fn default() -> Self {
        Self {
            nominal_energy: 1.0,
            particle_mass: ELECTRON_MASS_GEV,
            charge: -1.0,
        }
    }
}

impl BeamCfg {
    /// Design momentum `sqrt(E² − m²)` [GeV/c].
    pub fn nominal_momentum(&self) -> f64 {
        (self.nominal_energy * self.nominal_energy - self.particle_mass * self.particle_mass)
            .max(0.0)
            .sqrt()
    }

    /// Magnetic rigidity Bρ [T·m] of the design particle.
    pub fn brho(&self) -> f64 {
        crate::brho(self.nominal_momentum(), self.charge)
    }
}

/// Top-level configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bend: BendCfg,
    pub tracking: TrackingCfg,
    pub beam: BeamCfg,
}

impl BendCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(ConfigError::invalid("bend.precision", "must be finite and > 0"));
        }
        if !(self.thin_element_length.is_finite() && self.thin_element_length > 0.0) {
            return Err(ConfigError::invalid(
                "bend.thin_element_length",
                "must be finite and > 0",
            ));
        }
        if !(self.default_outer.diameter.is_finite() && self.default_outer.diameter >= 0.0) {
            return Err(ConfigError::invalid(
                "bend.default_outer.diameter",
                "must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bend.validate()?;
        let t = &self.tracking;
        if !(t.min_radius_of_curvature.is_finite() && t.min_radius_of_curvature >= 0.0) {
            return Err(ConfigError::invalid(
                "tracking.min_radius_of_curvature",
                "must be finite and >= 0",
            ));
        }
        if !(-1.0..=1.0).contains(&t.paraxial_cosine) {
            return Err(ConfigError::invalid(
                "tracking.paraxial_cosine",
                "must lie in [-1, 1]",
            ));
        }
        let beam = &self.beam;
        if !(beam.nominal_energy.is_finite() && beam.nominal_energy > beam.particle_mass) {
            return Err(ConfigError::invalid(
                "beam.nominal_energy",
                "must exceed the particle mass",
            ));
        }
        if beam.charge == 0.0 || !beam.charge.is_finite() {
            return Err(ConfigError::invalid("beam.charge", "must be finite and non-zero"));
        }
        Ok(())
    }
}
