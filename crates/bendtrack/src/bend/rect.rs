//! Rectangular bend → one body segment plus optional fringe pieces.
//!
//! A rectangular bend is a sector bend whose polefaces are rotated by half the
//! bend angle, so the body faces are just `-e1`/`-e2`. It is never split.
//! Consecutive rectangular bends share their edges: the fringe between them is
//! dropped and the shared face angles are corrected instead.

use crate::cfg::BendCfg;
use crate::is_nonzero;

use super::checks::check_cfg;
use super::types::{BendError, BendLine, BendSpec, Segment, SegmentKind};

/// Whether the elements around a rectangular bend are rectangular bends too.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RBendNeighbours {
    pub prev_is_rbend: bool,
    pub next_is_rbend: bool,
}

pub fn build_rbend(
    spec: &BendSpec,
    neighbours: RBendNeighbours,
    cfg: &BendCfg,
) -> Result<BendLine, BendError> {
    spec.validate()?;
    check_cfg(&spec.name, cfg)?;
    if !is_nonzero(spec.angle) {
        return Err(BendError::invalid(&spec.name, "rectangular bend needs a non-zero angle"));
    }

    let rho = spec.rho();
    let thin = cfg.thin_element_length;
    let half_thin_angle = 0.5 * thin / rho;
    let fringe_in = is_nonzero(spec.e1) && cfg.include_fringe && !neighbours.prev_is_rbend;
    let fringe_out = is_nonzero(spec.e2) && cfg.include_fringe && !neighbours.next_is_rbend;

    let mut poleface_in = spec.e1 + 0.5 * (spec.length - thin) / rho;
    let mut poleface_out = spec.e2 + 0.5 * (spec.length - thin) / rho;
    let mut angle_in = -spec.e1;
    let mut angle_out = -spec.e2;
    if neighbours.prev_is_rbend {
        poleface_in -= 0.5 * spec.angle;
        angle_in += half_thin_angle;
    }
    if neighbours.next_is_rbend {
        poleface_out -= 0.5 * spec.angle;
        angle_out += half_thin_angle;
    }

    let mut line = BendLine::new(&spec.name);
    if fringe_in {
        line.push(fringe(
            format!("{}_e1_fringe", spec.name),
            spec,
            spec.e1,
            -poleface_in,
            poleface_in,
            thin,
            rho,
        ));
    }

    let mut length = spec.length;
    if fringe_in {
        length -= thin;
        angle_in += half_thin_angle;
        angle_out -= half_thin_angle;
    }
    if fringe_out {
        length -= thin;
        angle_out += half_thin_angle;
        angle_in -= half_thin_angle;
    }
    if neighbours.next_is_rbend {
        angle_out -= half_thin_angle;
    }
    if neighbours.prev_is_rbend {
        angle_in -= half_thin_angle;
    }

    tracing::debug!(element = %spec.name, length, angle_in, angle_out, "rbend body");
    line.push(Segment {
        name: spec.name.clone(),
        kind: SegmentKind::Body,
        length,
        angle: length / rho,
        angle_in,
        angle_out,
        field: spec.field,
    });

    if fringe_out {
        line.push(fringe(
            format!("{}_e2_fringe", spec.name),
            spec,
            spec.e2,
            poleface_out,
            -poleface_out,
            thin,
            rho,
        ));
    }
    Ok(line)
}

fn fringe(
    name: String,
    spec: &BendSpec,
    poleface: f64,
    angle_in: f64,
    angle_out: f64,
    thin: f64,
    rho: f64,
) -> Segment {
    Segment {
        name,
        kind: SegmentKind::Fringe { poleface },
        length: thin,
        angle: thin / rho,
        angle_in,
        angle_out,
        field: spec.field,
    }
}
