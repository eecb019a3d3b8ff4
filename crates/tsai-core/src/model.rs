//! The calibrated camera model.

use serde::{Deserialize, Serialize};

use crate::camera::CameraGeometry;
use crate::math::{Mat3, Real, Vec3};
use crate::rotation::{euler_from_rotation, rotation_from_euler};

/// Focal length, radial distortion and the world-to-camera rigid transform.
///
/// The rotation is stored twice, as Euler angles `rx, ry, rz` and as the
/// matrix `rot`; the pipeline stages keep the two in sync via
/// [`update_rotation_matrix`](Self::update_rotation_matrix) and
/// [`update_euler_angles`](Self::update_euler_angles) after refining one
/// representation. `p1` and `p2` are tangential distortion coefficients
/// carried for layout compatibility; no estimator touches them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraModel {
    /// Effective focal length \[mm\].
    pub f: Real,
    /// First-order radial distortion coefficient \[1/mm^2\].
    pub kappa1: Real,
    /// Tangential distortion, unused.
    pub p1: Real,
    /// Tangential distortion, unused.
    pub p2: Real,
    /// Translation x \[mm\].
    pub tx: Real,
    /// Translation y \[mm\].
    pub ty: Real,
    /// Translation z \[mm\].
    pub tz: Real,
    /// Rotation about the world x axis \[rad\].
    pub rx: Real,
    /// Rotation about the world y axis \[rad\].
    pub ry: Real,
    /// Rotation about the world z axis \[rad\].
    pub rz: Real,
    /// Rotation matrix, consistent with the Euler angles.
    pub rot: Mat3,
}

impl Default for CameraModel {
    fn default() -> Self {
        Self {
            f: 0.0,
            kappa1: 0.0,
            p1: 0.0,
            p2: 0.0,
            tx: 0.0,
            ty: 0.0,
            tz: 0.0,
            rx: 0.0,
            ry: 0.0,
            rz: 0.0,
            rot: Mat3::identity(),
        }
    }
}

impl CameraModel {
    /// Rebuild `rot` from the Euler angles.
    pub fn update_rotation_matrix(&mut self) {
        self.rot = rotation_from_euler(self.rx, self.ry, self.rz);
    }

    /// Re-derive the Euler angles from `rot`.
    pub fn update_euler_angles(&mut self) {
        let (rx, ry, rz) = euler_from_rotation(&self.rot);
        self.rx = rx;
        self.ry = ry;
        self.rz = rz;
    }

    /// Install a rotation matrix and re-derive the angles from it.
    pub fn set_rotation(&mut self, rot: Mat3) {
        self.rot = rot;
        self.update_euler_angles();
    }

    /// World-to-camera translation.
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.tx, self.ty, self.tz)
    }

    /// Euler angles `(rx, ry, rz)`.
    pub fn euler_angles(&self) -> (Real, Real, Real) {
        (self.rx, self.ry, self.rz)
    }

    /// Horizontal field of view, `2 * atan2(ncx * dx, 2 * f)` \[rad\].
    pub fn horizontal_fov(&self, geom: &CameraGeometry) -> Real {
        2.0 * (geom.ncx * geom.dx).atan2(2.0 * self.f)
    }
}
