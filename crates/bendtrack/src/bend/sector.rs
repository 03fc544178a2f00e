//! Sector bend → ordered wedge segments (with optional thin fringe pieces).
//!
//! Layout for N > 1
//! - Body segments of equal nominal length `L/N`; the first/last lose one thin
//!   length when a fringe piece sits in front of/behind them.
//! - Poleface rotations are not put on the outer faces alone. They are ramped
//!   linearly from the ends towards the central wedge (which keeps the plain
//!   sector faces), so no single face carries a large tilt.
//! - Adjacent faces always close: `out[i] + in[i+1] = (a[i] + a[i+1]) / 2`.

use crate::cfg::BendCfg;
use crate::is_nonzero;

use super::checks::{check_cfg, check_faces, check_width};
use super::count::segment_count;
use super::types::{BendError, BendLine, BendSpec, Segment, SegmentKind};

/// Split a sector bend into wedge segments bounded by `cfg.precision`.
pub fn build_sbend(spec: &BendSpec, cfg: &BendCfg) -> Result<BendLine, BendError> {
    spec.validate()?;
    check_cfg(&spec.name, cfg)?;
    let n = segment_count(spec, cfg);
    let outer = spec.outer.unwrap_or(cfg.default_outer);
    let mut line = BendLine::new(&spec.name);

    if n == 1 || !is_nonzero(spec.angle) {
        line.push(Segment {
            name: format!("{}_1_of_1", spec.name),
            kind: SegmentKind::Body,
            length: spec.length,
            angle: spec.angle,
            angle_in: 0.5 * spec.angle - spec.e1,
            angle_out: 0.5 * spec.angle - spec.e2,
            field: spec.field,
        });
        return Ok(line);
    }

    let nf = n as f64;
    let rho = spec.rho();
    let semilength = spec.length / nf;
    check_width(&spec.name, semilength, spec.angle / nf, &outer)?;

    let thin = cfg.thin_element_length;
    let fringe_in = cfg.include_fringe && is_nonzero(spec.e1);
    let fringe_out = cfg.include_fringe && is_nonzero(spec.e2);
    let has_polefaces = is_nonzero(spec.e1) || is_nonzero(spec.e2);
    let half = 0.5 * (nf - 1.0);
    let delta_start = -spec.e1 / half;
    let delta_end = -spec.e2 / half;
    let thin_angle = thin / rho;

    if fringe_in {
        line.push(Segment {
            name: format!("{}_e1_fringe", spec.name),
            kind: SegmentKind::Fringe { poleface: spec.e1 },
            length: thin,
            angle: thin_angle,
            angle_in: 0.5 * thin_angle - spec.e1,
            angle_out: spec.e1 - 0.5 * thin_angle,
            field: spec.field,
        });
    }

    for i in 0..n {
        let name = format!("{}_{}_of_{}", spec.name, i + 1, n);
        let fi = i as f64;
        let first = i == 0;
        let last = i == n - 1;

        let mut length = semilength;
        if first && fringe_in {
            length -= thin;
        }
        if last && fringe_out {
            length -= thin;
        }
        let angle = length / rho;

        let mut angle_in = 0.5 * angle;
        let mut angle_out = 0.5 * angle;
        if has_polefaces {
            if fi < half {
                angle_in -= spec.e1 + fi * delta_start;
                angle_out -= (0.5 * (nf - 3.0) - fi) * delta_start;
            } else if fi > half {
                angle_in += (0.5 * (nf + 1.0) - fi) * delta_end;
                angle_out -= (half - fi) * delta_end;
            }
        }
        if first && fringe_in {
            angle_in += thin_angle;
        }
        if last && fringe_out {
            angle_out += thin_angle;
        }

        check_faces(&name, angle_in, angle_out, semilength, &outer)?;
        tracing::debug!(segment = %name, length, angle, angle_in, angle_out, "sbend segment");
        line.push(Segment {
            name,
            kind: SegmentKind::Body,
            length,
            angle,
            angle_in,
            angle_out,
            field: spec.field,
        });
    }

    if fringe_out {
        line.push(Segment {
            name: format!("{}_e2_fringe", spec.name),
            kind: SegmentKind::Fringe { poleface: spec.e2 },
            length: thin,
            angle: thin_angle,
            angle_in: spec.e2 - 0.5 * thin_angle,
            angle_out: 0.5 * thin_angle - spec.e2,
            field: spec.field,
        });
    }
    Ok(line)
}
