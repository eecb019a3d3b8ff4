//! Core types, coordinate transforms and accuracy metrics for Tsai camera
//! calibration.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Pt2`, `Pt3`, ...),
//! - the fixed sensor/frame-grabber description ([`CameraGeometry`]) and the
//!   calibrated parameters ([`CameraModel`]),
//! - matched world/image point sets ([`CorrespondenceSet`]),
//! - the chain of coordinate transforms between the world, camera,
//!   undistorted sensor, distorted sensor and image frames,
//! - accuracy metrics for a fitted model,
//! - synthetic target helpers for tests and examples.
//!
//! Camera pipeline:
//! `image = sensor ∘ distortion ∘ projection ∘ rigid(world)`

/// Fixed sensor and frame-grabber geometry, with vendor presets.
pub mod camera;
/// Matched world/image correspondence sets.
pub mod data;
/// Error taxonomy shared by every stage of the pipeline.
pub mod error;
/// Accuracy metrics for a fitted model.
pub mod eval;
/// Linear algebra type aliases.
pub mod math;
/// Calibrated camera parameters.
pub mod model;
/// Euler-angle conventions for the camera rotation.
pub mod rotation;
/// Synthetic target helpers.
pub mod synthetic;
/// Coordinate transforms between world, sensor and image frames.
pub mod transform;

pub use camera::CameraGeometry;
pub use data::{CorrespondenceSet, MAX_POINTS};
pub use error::CalibrationError;
pub use eval::{
    distorted_image_plane_error_stats, normalized_calibration_error,
    object_space_error_stats, undistorted_image_plane_error_stats, ErrorStats,
    NormalizedErrorStats,
};
pub use math::*;
pub use model::CameraModel;
pub use rotation::{alternate_rotation_solution, euler_from_rotation, rotation_from_euler};
pub use transform::*;
