//! Error type shared by every calibration stage.

use thiserror::Error;

/// Failures surfaced by data validation, the closed-form estimators and the
/// nonlinear refinement stages.
///
/// The linear stages report rank-deficient systems as [`SingularSystem`];
/// for non-coplanar calibration that is also the practical symptom of data
/// that actually lies in a single plane. [`HandednessAmbiguity`] means both
/// candidate orthonormal rotation solutions produced a negative focal
/// length, which points at a left-handed or otherwise inconsistent data
/// set rather than at a numerical problem.
///
/// [`SingularSystem`]: CalibrationError::SingularSystem
/// [`HandednessAmbiguity`]: CalibrationError::HandednessAmbiguity
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// World and image point vectors have different lengths.
    #[error("world and image point counts differ ({world} vs {image})")]
    PointCountMismatch { world: usize, image: usize },

    /// More correspondences than the fixed capacity.
    #[error("{got} correspondences exceed the supported maximum of {max}")]
    TooManyPoints { got: usize, max: usize },

    /// Too few correspondences for the requested estimation mode.
    #[error("need at least {needed} correspondences, got {got}")]
    NotEnoughPoints { needed: usize, got: usize },

    /// Coplanar calibration was handed a world point off the z = 0 plane.
    #[error("coplanar calibration requires world points with z = 0, but point {index} has z = {z}")]
    NonCoplanarData { index: usize, z: f64 },

    /// A dense linear system could not be solved.
    #[error("unable to solve linear system: {context}")]
    SingularSystem { context: &'static str },

    /// Both orthonormal rotation candidates leave the focal length negative.
    #[error("possible handedness problem with data: focal length negative for both rotation solutions")]
    HandednessAmbiguity,
}
