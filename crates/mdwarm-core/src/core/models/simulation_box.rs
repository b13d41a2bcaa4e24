use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoxError {
    #[error("Box lengths must be finite and positive, got {0:?}")]
    InvalidLengths([f64; 3]),
}

/// An orthorhombic, fully periodic simulation domain with its corner at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationBox {
    lengths: Vector3<f64>,
}

impl SimulationBox {
    /// Creates a box with the given edge lengths.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::InvalidLengths`] if any length is not finite and positive.
    pub fn new(lengths: Vector3<f64>) -> Result<Self, BoxError> {
        if lengths.iter().all(|l| l.is_finite() && *l > 0.0) {
            Ok(Self { lengths })
        } else {
            Err(BoxError::InvalidLengths([lengths.x, lengths.y, lengths.z]))
        }
    }

    /// Creates a cubic box of edge length `length`.
    pub fn cubic(length: f64) -> Result<Self, BoxError> {
        Self::new(Vector3::repeat(length))
    }

    #[inline]
    pub fn lengths(&self) -> &Vector3<f64> {
        &self.lengths
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.lengths.x * self.lengths.y * self.lengths.z
    }

    /// Shortest periodic image of the separation vector `delta`.
    #[inline]
    pub fn minimum_image(&self, mut delta: Vector3<f64>) -> Vector3<f64> {
        for axis in 0..3 {
            let length = self.lengths[axis];
            delta[axis] -= length * (delta[axis] / length).round();
        }
        delta
    }

    /// Minimum-image vector pointing from `from` to `to`.
    #[inline]
    pub fn separation(&self, from: &Point3<f64>, to: &Point3<f64>) -> Vector3<f64> {
        self.minimum_image(to - from)
    }
}
