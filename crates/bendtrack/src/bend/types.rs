//! Bend element description, produced segments, and builder errors.
//!
//! - `BendSpec`: immutable input for one beamline bend.
//! - `Segment`/`BendLine`: immutable builder output, shared read-only by trackers.
//! - `BendError`: fatal configuration problems; construction stops on the first one.
//!
//! Face angle convention
//! - `angle_in`/`angle_out` are measured from the segment's own chord normal.
//!   A plain sector wedge of bend `a` has `angle_in = angle_out = a/2`; a
//!   poleface rotation `e` subtracts from the face it sits on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cfg::BeamCfg;

use super::checks::{check_polefaces, MAX_POLEFACE};

/// Cross-section family of the magnet yoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnetGeometryType {
    Cylindrical,
    PolesCircular,
    PolesSquare,
    PolesFacet,
    PolesFacetCrop,
    LhcLeft,
    LhcRight,
    None,
}

/// Outer extent of a magnet, used for geometric sanity checks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MagnetOuter {
    /// Full outer width [m].
    pub diameter: f64,
    pub geometry: MagnetGeometryType,
}

impl MagnetOuter {
    /// Radius within which angled faces must not meet.
    ///
    /// Cylindrical yokes use half the diameter; every other shape is allowed
    /// to extend to 1.25× that.
    #[inline]
    pub fn aperture_radius(&self) -> f64 {
        match self.geometry {
            MagnetGeometryType::Cylindrical => 0.5 * self.diameter,
            _ => 0.625 * self.diameter,
        }
    }
}

/// One bend element as seen by the builders.
///
/// Invariant: `rho = length / angle` whenever `angle` is non-zero.
#[derive(Clone, Debug, PartialEq)]
pub struct BendSpec {
    pub name: String,
    /// Arc length along the design orbit [m].
    pub length: f64,
    /// Total bend angle [rad].
    pub angle: f64,
    /// Entry poleface rotation [rad].
    pub e1: f64,
    /// Exit poleface rotation [rad].
    pub e2: f64,
    /// Dipole field along local y [T].
    pub field: f64,
    /// Per-element override of the configured magnet outer.
    pub outer: Option<MagnetOuter>,
}

impl BendSpec {
    pub fn new(name: impl Into<String>, length: f64, angle: f64) -> Self {
        Self {
            name: name.into(),
            length,
            angle,
            e1: 0.0,
            e2: 0.0,
            field: 0.0,
            outer: None,
        }
    }

    /// Bend whose field steers the nominal beam through `angle` over `length`.
    pub fn from_nominal(name: impl Into<String>, length: f64, angle: f64, beam: &BeamCfg) -> Self {
        let field = if length > 0.0 {
            beam.brho() * angle / length
        } else {
            0.0
        };
        Self::new(name, length, angle).with_field(field)
    }

    pub fn with_polefaces(mut self, e1: f64, e2: f64) -> Self {
        self.e1 = e1;
        self.e2 = e2;
        self
    }

    pub fn with_field(mut self, field: f64) -> Self {
        self.field = field;
        self
    }

    pub fn with_outer(mut self, outer: MagnetOuter) -> Self {
        self.outer = Some(outer);
        self
    }

    /// Bending radius of the design orbit; infinite for a straight element.
    #[inline]
    pub fn rho(&self) -> f64 {
        self.length / self.angle
    }

    /// Sum of the absolute bend and poleface angles.
    #[inline]
    pub fn total_angle(&self) -> f64 {
        self.angle.abs() + self.e1.abs() + self.e2.abs()
    }

    /// Reject values no builder can work with, including polefaces beyond ±π/2.
    pub fn validate(&self) -> Result<(), BendError> {
        let finite = [self.length, self.angle, self.e1, self.e2, self.field]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(BendError::invalid(&self.name, "non-finite length, angle or field"));
        }
        if self.length <= 0.0 {
            return Err(BendError::invalid(&self.name, "length must be > 0"));
        }
        check_polefaces(self, MAX_POLEFACE)
    }
}

/// What a segment stands for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegmentKind {
    /// Physical slice of the magnet body.
    Body,
    /// Thin edge piece carrying only the poleface kick.
    Fringe { poleface: f64 },
}

/// One straight wedge of a split bend.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub name: String,
    pub kind: SegmentKind,
    /// Chord length [m]; fringe pieces carry the configured thin length.
    pub length: f64,
    /// Bend angle of this piece [rad], same sign as the parent bend.
    pub angle: f64,
    pub angle_in: f64,
    pub angle_out: f64,
    /// Dipole field copied from the parent [T].
    pub field: f64,
}

impl Segment {
    #[inline]
    pub fn is_fringe(&self) -> bool {
        matches!(self.kind, SegmentKind::Fringe { .. })
    }
}

/// Ordered segments for one element; immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct BendLine {
    pub name: String,
    pub segments: Vec<Segment>,
}

impl BendLine {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of body (non-fringe) segments.
    pub fn n_body(&self) -> usize {
        self.iter().filter(|s| !s.is_fringe()).count()
    }

    pub fn body_angle(&self) -> f64 {
        self.iter().filter(|s| !s.is_fringe()).map(|s| s.angle).sum()
    }

    pub fn fringe_angle(&self) -> f64 {
        self.iter().filter(|s| s.is_fringe()).map(|s| s.angle).sum()
    }

    /// Body plus fringe angle; reconstructs the parent bend angle.
    pub fn total_angle(&self) -> f64 {
        self.iter().map(|s| s.angle).sum()
    }

    pub fn total_length(&self) -> f64 {
        self.iter().map(|s| s.length).sum()
    }
}

impl<'a> IntoIterator for &'a BendLine {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Which end of a magnet a poleface belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Entry,
    Exit,
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Entry => write!(f, "e1"),
            Face::Exit => write!(f, "e2"),
        }
    }
}

/// Fatal problems found while building a bend line.
#[derive(Debug)]
pub enum BendError {
    /// Input values that no builder accepts.
    InvalidSpec { element: String, reason: String },
    /// A poleface rotation beyond the allowed maximum.
    PolefaceTooLarge {
        element: String,
        face: Face,
        angle: f64,
        max: f64,
    },
    /// Magnet width exceeds the bending radius of a segment.
    WidthTooLarge {
        element: String,
        half_width: f64,
        radius: f64,
    },
    /// Entry and exit faces of a segment meet inside the magnet.
    FacesIntersect {
        segment: String,
        intersection: f64,
        magnet_radius: f64,
    },
}

impl BendError {
    pub(crate) fn invalid(element: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpec { element, reason } => {
                write!(f, "element \"{element}\" is invalid: {reason}")
            }
            Self::PolefaceTooLarge {
                element,
                face,
                angle,
                max,
            } => write!(
                f,
                "poleface angle {face} = {angle} rad of element \"{element}\" exceeds {max} rad"
            ),
            Self::WidthTooLarge {
                element,
                half_width,
                radius,
            } => write!(
                f,
                "length, angle and width of element \"{element}\" give overlapping faces \
                 (half width {half_width} m > segment radius {radius} m); reduce the width"
            ),
            Self::FacesIntersect {
                segment,
                intersection,
                magnet_radius,
            } => write!(
                f,
                "angled faces of \"{segment}\" intersect at {intersection} m, inside the \
                 magnet radius {magnet_radius} m"
            ),
        }
    }
}

impl std::error::Error for BendError {}
