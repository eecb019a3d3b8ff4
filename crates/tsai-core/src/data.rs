//! Calibration correspondences.

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::math::{Pt2, Pt3, Real};

/// Maximum number of correspondences a single calibration run accepts.
pub const MAX_POINTS: usize = 500;

/// Paired 3D world points \[mm\] and measured 2D image points \[px\].
///
/// The two vectors are index-aligned and validated to have equal length at
/// construction. Calibration never mutates the set; coplanar modes require
/// every world point to have `z == 0` exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceSet {
    /// World points.
    pub world: Vec<Pt3>,
    /// Measured image points.
    pub image: Vec<Pt2>,
}

impl CorrespondenceSet {
    /// Build a validated set from parallel vectors.
    pub fn new(world: Vec<Pt3>, image: Vec<Pt2>) -> Result<Self, CalibrationError> {
        if world.len() != image.len() {
            return Err(CalibrationError::PointCountMismatch {
                world: world.len(),
                image: image.len(),
            });
        }
        if world.len() > MAX_POINTS {
            return Err(CalibrationError::TooManyPoints {
                got: world.len(),
                max: MAX_POINTS,
            });
        }
        Ok(Self { world, image })
    }

    /// Append one correspondence.
    pub fn push(&mut self, world: Pt3, image: Pt2) -> Result<(), CalibrationError> {
        if self.world.len() == MAX_POINTS {
            return Err(CalibrationError::TooManyPoints {
                got: MAX_POINTS + 1,
                max: MAX_POINTS,
            });
        }
        self.world.push(world);
        self.image.push(image);
        Ok(())
    }

    /// Number of correspondences.
    pub fn len(&self) -> usize {
        self.world.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    /// Index of the first world point off the z = 0 plane, if any.
    pub fn first_off_plane(&self) -> Option<(usize, Real)> {
        self.world
            .iter()
            .enumerate()
            .find(|(_, p)| p.z != 0.0)
            .map(|(i, p)| (i, p.z))
    }
}
