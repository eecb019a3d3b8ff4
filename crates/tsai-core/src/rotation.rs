//! Euler angle conversions for Tsai's rotation convention.
//!
//! The rotation matrix is built as `Rz(rz) * Ry(ry) * Rx(rx)` (roll, pitch
//! and yaw applied in that order), which is exactly what
//! [`nalgebra::Rotation3::from_euler_angles`] produces. The inverse keeps
//! the atan2 formulation of the original method so the recovered angles
//! regenerate the matrix bit-for-bit through the same branch structure.
//!
//! The decomposition has a two-solution ambiguity: negating the matrix
//! elements `r3, r6, r7, r8` yields a second orthonormal matrix with the
//! same radial-alignment behavior. The closed-form estimator probes that
//! alternate solution when the first one implies a negative focal length.

use nalgebra::Rotation3;

use crate::math::{Mat3, Real};

/// Build the rotation matrix from Euler angles (radians).
pub fn rotation_from_euler(rx: Real, ry: Real, rz: Real) -> Mat3 {
    *Rotation3::from_euler_angles(rx, ry, rz).matrix()
}

/// Recover `(rx, ry, rz)` from a rotation matrix.
///
/// Returns the principal solution with `ry` in `(-pi/2, pi/2)` whenever
/// `r1` or `r4` is nonzero.
pub fn euler_from_rotation(rot: &Mat3) -> (Real, Real, Real) {
    let rz = rot[(1, 0)].atan2(rot[(0, 0)]);
    let (sg, cg) = rz.sin_cos();
    let ry = (-rot[(2, 0)]).atan2(rot[(0, 0)] * cg + rot[(1, 0)] * sg);
    let rx = (rot[(0, 2)] * sg - rot[(1, 2)] * cg).atan2(rot[(1, 1)] * cg - rot[(0, 1)] * sg);
    (rx, ry, rz)
}

/// The second orthonormal matrix compatible with the same first two rows
/// of radial-alignment coefficients: `r3, r6, r7, r8` negated.
pub fn alternate_rotation_solution(rot: &Mat3) -> Mat3 {
    let mut alt = *rot;
    alt[(0, 2)] = -alt[(0, 2)];
    alt[(1, 2)] = -alt[(1, 2)];
    alt[(2, 0)] = -alt[(2, 0)];
    alt[(2, 1)] = -alt[(2, 1)];
    alt
}
