//! Geometric sanity checks applied while building bend lines.
//!
//! All of these are fatal: a failing element describes a magnet that cannot
//! exist, so the builder stops and reports instead of patching values.

use std::f64::consts::FRAC_PI_2;

use crate::cfg::BendCfg;
use crate::is_nonzero;

use super::types::{BendError, BendSpec, Face, MagnetOuter};

/// Largest poleface rotation accepted for a rectangular bend.
pub(crate) const MAX_POLEFACE: f64 = FRAC_PI_2;

/// Transverse offset at which the entry and exit faces of a wedge meet.
///
/// Faces sit at `z = ∓length/2`, tilted by `angle_in`/`angle_out`, so they
/// cross at `x = length / (tan(angle_in) + tan(angle_out))`. Parallel faces
/// never cross and give `0`.
pub fn faces_overlap_radius(angle_in: f64, angle_out: f64, length: f64) -> f64 {
    let denom = angle_in.tan() + angle_out.tan();
    if !is_nonzero(denom) {
        return 0.0;
    }
    length / denom
}

/// Fail when the faces of segment `name` meet within the magnet outer radius.
pub(crate) fn check_faces(
    name: &str,
    angle_in: f64,
    angle_out: f64,
    length: f64,
    outer: &MagnetOuter,
) -> Result<(), BendError> {
    let intersection = faces_overlap_radius(angle_in, angle_out, length);
    let magnet_radius = outer.aperture_radius();
    if is_nonzero(intersection) && intersection.abs() < magnet_radius {
        tracing::warn!(segment = name, intersection, magnet_radius, "angled faces intersect");
        return Err(BendError::FacesIntersect {
            segment: name.to_string(),
            intersection,
            magnet_radius,
        });
    }
    Ok(())
}

/// Fail when half the magnet width exceeds the radius implied by `length`/`angle`.
pub(crate) fn check_width(
    element: &str,
    length: f64,
    angle: f64,
    outer: &MagnetOuter,
) -> Result<(), BendError> {
    let radius = (length / angle).abs();
    let half_width = 0.5 * outer.diameter;
    if half_width > radius {
        tracing::warn!(element, half_width, radius, "magnet too wide for bend");
        return Err(BendError::WidthTooLarge {
            element: element.to_string(),
            half_width,
            radius,
        });
    }
    Ok(())
}

/// Builders refuse a bend config that `Config::validate` would refuse.
pub(crate) fn check_cfg(element: &str, cfg: &BendCfg) -> Result<(), BendError> {
    cfg.validate().map_err(|e| BendError::invalid(element, e.to_string()))
}

/// Fail when either poleface rotation exceeds `max`.
pub(crate) fn check_polefaces(spec: &BendSpec, max: f64) -> Result<(), BendError> {
    for (face, angle) in [(Face::Entry, spec.e1), (Face::Exit, spec.e2)] {
        if angle.abs() > max {
            return Err(BendError::PolefaceTooLarge {
                element: spec.name.clone(),
                face,
                angle,
                max,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bend::MagnetGeometryType;

    fn outer(diameter: f64, geometry: MagnetGeometryType) -> MagnetOuter {
        MagnetOuter { diameter, geometry }
    }

    #[test]
    fn parallel_faces_never_meet() {
        assert_eq!(faces_overlap_radius(0.0, 0.0, 1.0), 0.0);
        assert_eq!(faces_overlap_radius(0.3, -0.3, 1.0), 0.0);
    }

    #[test]
    fn sector_wedge_faces_meet_at_bending_centre() {
        // Wedge of bend a and chord c: faces meet at c / (2 tan(a/2)), the radius.
        let a: f64 = 0.01;
        let rho = 10.0;
        let chord = 2.0 * rho * (a / 2.0).sin();
        let x = faces_overlap_radius(a / 2.0, a / 2.0, chord);
        assert!((x - rho * (a / 2.0).cos()).abs() < 1e-9);
    }

    #[test]
    fn cylindrical_uses_half_diameter() {
        let cyl = outer(1.0, MagnetGeometryType::Cylindrical);
        let poles = outer(1.0, MagnetGeometryType::PolesSquare);
        assert_eq!(cyl.aperture_radius(), 0.5);
        assert_eq!(poles.aperture_radius(), 0.625);
        // faces meeting at 0.55 pass for cylindrical, fail for poles
        let t: f64 = 0.5 / 0.55;
        let a = t.atan();
        assert!(check_faces("s", a, a, 1.0, &cyl).is_ok());
        assert!(matches!(
            check_faces("s", a, a, 1.0, &poles),
            Err(BendError::FacesIntersect { .. })
        ));
    }

    #[test]
    fn width_check_compares_half_width_with_radius() {
        let o = outer(0.6, MagnetGeometryType::PolesCircular);
        assert!(check_width("b", 1.0, 0.1, &o).is_ok()); // radius 10 m
        assert!(matches!(
            check_width("b", 0.1, 0.5, &o), // radius 0.2 m < 0.3 m
            Err(BendError::WidthTooLarge { .. })
        ));
    }

    #[test]
    fn poleface_limit() {
        let ok = BendSpec::new("b", 1.0, 0.1).with_polefaces(1.5, -1.5);
        assert!(check_polefaces(&ok, MAX_POLEFACE).is_ok());
        let bad = BendSpec::new("b", 1.0, 0.1).with_polefaces(0.0, -1.6);
        match check_polefaces(&bad, MAX_POLEFACE) {
            Err(BendError::PolefaceTooLarge { face, .. }) => assert_eq!(face, Face::Exit),
            other => panic!("expected poleface error, got {other:?}"),
        }
    }
}
