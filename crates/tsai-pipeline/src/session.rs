//! The mutable state a calibration run operates on.

use serde::{Deserialize, Serialize};
use tsai_core::{CameraGeometry, CameraModel, CorrespondenceSet};

/// Geometry, model and data bundle passed into the pipeline entry points.
///
/// Calibration reads `data`, refines `model`, and in the full variants
/// also refines the `cx`, `cy` and `sx` fields of `geometry`. The
/// extrinsic entry points treat `model.f` and `model.kappa1` as trusted
/// inputs and only touch the pose. A failed run never leaves a partially
/// seeded session behind: nothing is written until the closed-form
/// estimate has succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSession {
    /// Sensor and frame-grabber geometry, including the current image
    /// center and scale factor estimates.
    pub geometry: CameraGeometry,
    /// The camera model being calibrated.
    pub model: CameraModel,
    /// World/image correspondences.
    pub data: CorrespondenceSet,
}

impl CalibrationSession {
    /// Start a session with a default model.
    pub fn new(geometry: CameraGeometry, data: CorrespondenceSet) -> Self {
        Self {
            geometry,
            model: CameraModel::default(),
            data,
        }
    }
}
