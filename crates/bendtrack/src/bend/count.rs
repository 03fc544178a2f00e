//! Number of wedge segments needed for a sector bend.

use crate::cfg::BendCfg;
use crate::is_nonzero;

use super::types::BendSpec;

/// Odd number of segments keeping the chord sagitta of each below `cfg.precision`.
///
/// From `L/(2N) · tan(θ/N) < ε` with the small-angle form of the tangent:
/// `N = ceil(sqrt(L·θtot / (2ε)))`, where `θtot` adds the poleface angles as
/// absolute values. A straight element or the `dont_split` override yields one
/// segment. Even counts are bumped so a central wedge always exists.
///
/// A precision that is not finite and positive also yields one segment, with a
/// warning; the builders reject such a config before counting.
pub fn segment_count(spec: &BendSpec, cfg: &BendCfg) -> usize {
    if !(cfg.precision.is_finite() && cfg.precision > 0.0) {
        tracing::warn!(
            element = %spec.name,
            precision = cfg.precision,
            "unusable precision, not splitting"
        );
        return 1;
    }
    let raw = (spec.length * spec.total_angle() / 2.0 / cfg.precision).sqrt().ceil();
    let mut n = if raw.is_finite() && raw >= 1.0 {
        raw as usize
    } else {
        1
    };
    if !is_nonzero(spec.angle) || cfg.dont_split {
        n = 1;
    }
    if n % 2 == 0 {
        n += 1;
    }
    tracing::debug!(element = %spec.name, n, "sector bend segment count");
    n
}
