//! Reproducible Gaussian bunches in local magnet coordinates.
//!
//! Purpose
//! - Feed the CLI and benches with realistic start states around the design
//!   orbit (`z` forward).
//!
//! Why this design
//! - A bunch is fully determined by `(BunchCfg, n, seed)`, so any run can be
//!   replayed from its provenance record.
//! - Gaussians are `rand_distr::StandardNormal` draws from a seeded `StdRng`.

use std::fmt;

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::track::ParticleState;

#[derive(Debug)]
pub enum BeamError {
    InvalidParams { reason: String },
}

impl BeamError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BeamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParams { reason } => write!(f, "invalid bunch params: {reason}"),
        }
    }
}

impl std::error::Error for BeamError {}

/// Gaussian bunch widths around the design orbit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BunchCfg {
    /// Central momentum [GeV/c].
    pub momentum: f64,
    pub sigma_x: f64,
    pub sigma_xp: f64,
    pub sigma_y: f64,
    pub sigma_yp: f64,
    /// Relative momentum spread.
    pub sigma_dp: f64,
}

impl Default for BunchCfg {
    fn default() -> Self {
        Self {
            momentum: 1.0,
            sigma_x: 1e-3,
            sigma_xp: 1e-4,
            sigma_y: 1e-3,
            sigma_yp: 1e-4,
            sigma_dp: 1e-3,
        }
    }
}

impl BunchCfg {
    pub fn validate(&self) -> Result<(), BeamError> {
        if !(self.momentum.is_finite() && self.momentum > 0.0) {
            return Err(BeamError::invalid("momentum must be finite and > 0"));
        }
        let sigmas = [
            self.sigma_x,
            self.sigma_xp,
            self.sigma_y,
            self.sigma_yp,
            self.sigma_dp,
        ];
        if sigmas.iter().any(|s| !(s.is_finite() && *s >= 0.0)) {
            return Err(BeamError::invalid("sigmas must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Draw `n` particles at `z = 0` moving along `+z` with the configured spreads.
pub fn sample_bunch(cfg: &BunchCfg, n: usize, seed: u64) -> Result<Vec<ParticleState>, BeamError> {
    cfg.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let [gx, gxp, gy, gyp, gdp]: [f64; 5] =
            std::array::from_fn(|_| rng.sample(StandardNormal));
        let position = Vector3::new(cfg.sigma_x * gx, cfg.sigma_y * gy, 0.0);
        let direction = Vector3::new(cfg.sigma_xp * gxp, cfg.sigma_yp * gyp, 1.0);
        let momentum = (cfg.momentum * (1.0 + cfg.sigma_dp * gdp)).max(f64::MIN_POSITIVE);
        out.push(ParticleState::new(position, direction, momentum));
    }
    tracing::debug!(n, seed, "sampled bunch");
    Ok(out)
}
