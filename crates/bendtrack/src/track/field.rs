//! Magnetic field sources sampled by the steppers.

use nalgebra::Vector3;

use crate::bend::Segment;

/// Anything that yields a magnetic field [T] at a local position [m].
pub trait FieldSource {
    fn field_at(&self, position: &Vector3<f64>) -> Vector3<f64>;
}

impl<F> FieldSource for F
where
    F: Fn(&Vector3<f64>) -> Vector3<f64>,
{
    #[inline]
    fn field_at(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self(position)
    }
}

/// Same field everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformField {
    pub b: Vector3<f64>,
}

impl UniformField {
    pub fn new(b: Vector3<f64>) -> Self {
        Self { b }
    }

    /// Pure dipole along local y.
    pub fn dipole(b_y: f64) -> Self {
        Self::new(Vector3::new(0.0, b_y, 0.0))
    }

    /// Dipole field of one bend segment.
    pub fn from_segment(segment: &Segment) -> Self {
        Self::dipole(segment.field)
    }
}

impl FieldSource for UniformField {
    #[inline]
    fn field_at(&self, _position: &Vector3<f64>) -> Vector3<f64> {
        self.b
    }
}
