//! Scalar and small linear-algebra aliases shared across the workspace.

use nalgebra::{Matrix3, Point2, Point3, Vector2, Vector3};

/// Floating point scalar used throughout the calibration code.
pub type Real = f64;

/// 2D point (image or sensor plane).
pub type Pt2 = Point2<Real>;

/// 3D point (world or camera frame).
pub type Pt3 = Point3<Real>;

/// 2D vector.
pub type Vec2 = Vector2<Real>;

/// 3D vector.
pub type Vec3 = Vector3<Real>;

/// 3x3 matrix (rotation).
pub type Mat3 = Matrix3<Real>;
