//! Coordinate transforms between the world, camera, sensor and image frames.
//!
//! The frames chain as
//! `world [mm] -> camera [mm] -> undistorted sensor plane [mm]
//! -> distorted sensor plane [mm] -> image [px]`,
//! and every step here is invertible. The only nontrivial inverse is
//! distorted-from-undistorted, which solves the cubic
//! `Ru = Rd * (1 + kappa1 * Rd^2)` in closed form (Cardan). The camera X
//! axis runs along increasing image columns, Y along increasing rows; all
//! 3D frames are right-handed.
//!
//! Projection divides by the camera-frame depth `zc`; calling these with a
//! model/point combination that puts a point on the camera plane
//! (`zc == 0`) is a caller error and yields non-finite output rather than
//! a panic.

use log::warn;

use crate::camera::CameraGeometry;
use crate::math::{Pt2, Pt3, Real, Vec2};
use crate::model::CameraModel;

/// World \[mm\] to camera \[mm\]: `R * p + T`.
pub fn world_to_camera(model: &CameraModel, pw: Pt3) -> Pt3 {
    Pt3::from(model.rot * pw.coords + model.translation())
}

/// Camera \[mm\] to world \[mm\], via the cofactor expansion of the
/// inverse affine transform.
///
/// Valid for any invertible rotation matrix, including the not yet
/// orthonormalized intermediates the linear estimator produces.
pub fn camera_to_world(model: &CameraModel, pc: Pt3) -> Pt3 {
    let r = &model.rot;
    let (r1, r2, r3) = (r[(0, 0)], r[(0, 1)], r[(0, 2)]);
    let (r4, r5, r6) = (r[(1, 0)], r[(1, 1)], r[(1, 2)]);
    let (r7, r8, r9) = (r[(2, 0)], r[(2, 1)], r[(2, 2)]);
    let (tx, ty, tz) = (model.tx, model.ty, model.tz);
    let (xc, yc, zc) = (pc.x, pc.y, pc.z);

    let denom =
        (r1 * r5 - r2 * r4) * r9 + (r3 * r4 - r1 * r6) * r8 + (r2 * r6 - r3 * r5) * r7;

    let xw = ((r2 * r6 - r3 * r5) * zc
        + (r3 * r8 - r2 * r9) * yc
        + (r5 * r9 - r6 * r8) * xc
        + (r3 * r5 - r2 * r6) * tz
        + (r2 * r9 - r3 * r8) * ty
        + (r6 * r8 - r5 * r9) * tx)
        / denom;

    let yw = -((r1 * r6 - r3 * r4) * zc
        + (r3 * r7 - r1 * r9) * yc
        + (r4 * r9 - r6 * r7) * xc
        + (r3 * r4 - r1 * r6) * tz
        + (r1 * r9 - r3 * r7) * ty
        + (r6 * r7 - r4 * r9) * tx)
        / denom;

    let zw = ((r1 * r5 - r2 * r4) * zc
        + (r2 * r7 - r1 * r8) * yc
        + (r4 * r8 - r5 * r7) * xc
        + (r2 * r4 - r1 * r5) * tz
        + (r1 * r8 - r2 * r7) * ty
        + (r5 * r7 - r4 * r8) * tx)
        / denom;

    Pt3::new(xw, yw, zw)
}

/// Distorted to undistorted sensor coordinates \[mm\]:
/// `su = sd * (1 + kappa1 * |sd|^2)`.
pub fn distorted_to_undistorted_sensor(model: &CameraModel, sd: Vec2) -> Vec2 {
    let factor = 1.0 + model.kappa1 * (sd.x * sd.x + sd.y * sd.y);
    sd * factor
}

/// Undistorted to distorted sensor coordinates \[mm\].
///
/// Solves `Ru = Rd * (1 + kappa1 * Rd^2)` for `Rd` with the Cardan method
/// and rescales the input radially. Identity when `kappa1 == 0` or the
/// input is the origin. For `kappa1 < 0` the distorted plane only extends
/// to the barrel radius `sqrt(-1/(3 * kappa1))`; inputs mapping beyond it
/// are clamped to that radius with a logged warning.
pub fn undistorted_to_distorted_sensor(model: &CameraModel, su: Vec2) -> Vec2 {
    if model.kappa1 == 0.0 || (su.x == 0.0 && su.y == 0.0) {
        return su;
    }

    let ru = su.x.hypot(su.y);
    let c = 1.0 / model.kappa1;
    let d = -c * ru;

    // depressed cubic Rd^3 + 0*Rd^2 + c*Rd + d = 0
    let q = c / 3.0;
    let r = -d / 2.0;
    let disc = q * q * q + r * r;

    let rd = if disc >= 0.0 {
        // one real root
        let sq = disc.sqrt();
        let root = (r + sq).cbrt() + (r - sq).cbrt();
        if root < 0.0 {
            let rd_max = (-1.0 / (3.0 * model.kappa1)).sqrt();
            warn!(
                "({}, {}) lies beyond the maximum barrel distortion radius {}; clamping",
                su.x, su.y, rd_max
            );
            rd_max
        } else {
            root
        }
    } else {
        // three real roots; the smaller positive one is the physical branch
        let sq = (-disc).sqrt();
        let s = r.hypot(sq).cbrt();
        let theta = sq.atan2(r) / 3.0;
        let (sin_t, cos_t) = theta.sin_cos();
        -s * cos_t + 3.0_f64.sqrt() * s * sin_t
    };

    su * (rd / ru)
}

/// Image \[px\] to distorted sensor coordinates \[mm\].
pub fn image_to_distorted_sensor(geom: &CameraGeometry, pi: Pt2) -> Vec2 {
    Vec2::new(
        geom.dpx * (pi.x - geom.cx) / geom.sx,
        geom.dpy * (pi.y - geom.cy),
    )
}

/// Distorted sensor coordinates \[mm\] to image \[px\].
pub fn distorted_sensor_to_image(geom: &CameraGeometry, sd: Vec2) -> Pt2 {
    Pt2::new(sd.x * geom.sx / geom.dpx + geom.cx, sd.y / geom.dpy + geom.cy)
}

/// Remove radial distortion from an image-frame point \[px\].
pub fn distorted_to_undistorted_image(geom: &CameraGeometry, model: &CameraModel, pi: Pt2) -> Pt2 {
    let sd = image_to_distorted_sensor(geom, pi);
    let su = distorted_to_undistorted_sensor(model, sd);
    distorted_sensor_to_image(geom, su)
}

/// Apply radial distortion to an image-frame point \[px\].
pub fn undistorted_to_distorted_image(geom: &CameraGeometry, model: &CameraModel, pi: Pt2) -> Pt2 {
    let su = image_to_distorted_sensor(geom, pi);
    let sd = undistorted_to_distorted_sensor(model, su);
    distorted_sensor_to_image(geom, sd)
}

/// Project a world point \[mm\] to image coordinates \[px\].
pub fn world_to_image(geom: &CameraGeometry, model: &CameraModel, pw: Pt3) -> Pt2 {
    let pc = world_to_camera(model, pw);
    let su = Vec2::new(model.f * pc.x / pc.z, model.f * pc.y / pc.z);
    let sd = undistorted_to_distorted_sensor(model, su);
    distorted_sensor_to_image(geom, sd)
}

/// Back-project an image point \[px\] to the world plane at depth `zw`.
///
/// A single image point underdetermines the 3D position, so the caller
/// supplies the world z coordinate of the plane the point lies on. The
/// world x/y follow from algebraically inverting the forward projection.
pub fn image_to_world(geom: &CameraGeometry, model: &CameraModel, pi: Pt2, zw: Real) -> Pt3 {
    let sd = image_to_distorted_sensor(geom, pi);
    let su = distorted_to_undistorted_sensor(model, sd);
    let (xu, yu) = (su.x, su.y);

    let r = &model.rot;
    let (r1, r2, r3) = (r[(0, 0)], r[(0, 1)], r[(0, 2)]);
    let (r4, r5, r6) = (r[(1, 0)], r[(1, 1)], r[(1, 2)]);
    let (r7, r8, r9) = (r[(2, 0)], r[(2, 1)], r[(2, 2)]);
    let (tx, ty, tz) = (model.tx, model.ty, model.tz);
    let f = model.f;

    let denom = (r1 * r8 - r2 * r7) * yu + (r5 * r7 - r4 * r8) * xu - f * r1 * r5 + f * r2 * r4;

    let xw = (((r2 * r9 - r3 * r8) * yu + (r6 * r8 - r5 * r9) * xu - f * r2 * r6 + f * r3 * r5)
        * zw
        + (r2 * tz - r8 * tx) * yu
        + (r8 * ty - r5 * tz) * xu
        - f * r2 * ty
        + f * r5 * tx)
        / denom;

    let yw = -(((r1 * r9 - r3 * r7) * yu + (r6 * r7 - r4 * r9) * xu - f * r1 * r6 + f * r3 * r4)
        * zw
        + (r1 * tz - r7 * tx) * yu
        + (r7 * ty - r4 * tz) * xu
        - f * r1 * ty
        + f * r4 * tx)
        / denom;

    Pt3::new(xw, yw, zw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraGeometry;
    use crate::model::CameraModel;
    use approx::assert_relative_eq;

    fn fixture() -> (CameraGeometry, CameraModel) {
        let geom = CameraGeometry::sony_xc75();
        let mut model = CameraModel {
            f: 8.0,
            kappa1: 0.002,
            tx: 5.0,
            ty: -10.0,
            tz: 200.0,
            rx: 0.1,
            ry: -0.2,
            rz: 0.15,
            ..CameraModel::default()
        };
        model.update_rotation_matrix();
        (geom, model)
    }

    #[test]
    fn world_camera_round_trip() {
        let (_, model) = fixture();
        let pw = Pt3::new(25.0, -15.0, 40.0);
        let pc = world_to_camera(&model, pw);
        let back = camera_to_world(&model, pc);
        assert_relative_eq!(back, pw, epsilon = 1e-9);
    }

    #[test]
    fn distortion_is_identity_without_kappa() {
        let model = CameraModel::default();
        let s = Vec2::new(1.25, -0.5);
        assert_eq!(undistorted_to_distorted_sensor(&model, s), s);
        assert_eq!(distorted_to_undistorted_sensor(&model, s), s);
    }

    #[test]
    fn distortion_round_trips_both_signs() {
        for kappa1 in [0.002, -0.002] {
            let model = CameraModel {
                kappa1,
                ..CameraModel::default()
            };
            let su = Vec2::new(2.0, -1.5);
            let sd = undistorted_to_distorted_sensor(&model, su);
            let back = distorted_to_undistorted_sensor(&model, sd);
            assert_relative_eq!(back.x, su.x, epsilon = 1e-9);
            assert_relative_eq!(back.y, su.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn barrel_distortion_clamps_at_maximum_radius() {
        let model = CameraModel {
            kappa1: -1.0e-3,
            ..CameraModel::default()
        };
        // well beyond the Ru the barrel model can produce
        let su = Vec2::new(15.0, 0.0);
        let sd = undistorted_to_distorted_sensor(&model, su);
        let rd_max = (-1.0 / (3.0 * model.kappa1)).sqrt();
        assert_relative_eq!(sd.norm(), rd_max, epsilon = 1e-9);
    }

    #[test]
    fn image_round_trips_through_distortion() {
        let (geom, model) = fixture();
        let pi = Pt2::new(300.0, 200.0);
        let undist = distorted_to_undistorted_image(&geom, &model, pi);
        let back = undistorted_to_distorted_image(&geom, &model, undist);
        assert_relative_eq!(back.x, pi.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, pi.y, epsilon = 1e-9);
    }

    #[test]
    fn projection_inverts_at_known_depth() {
        let (geom, model) = fixture();
        let pw = Pt3::new(25.0, -15.0, 40.0);
        let pi = world_to_image(&geom, &model, pw);
        let back = image_to_world(&geom, &model, pi, pw.z);
        assert_relative_eq!(back.x, pw.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, pw.y, epsilon = 1e-6);
    }

    #[test]
    fn sensor_scaling_honors_sx() {
        let geom = CameraGeometry::sony_xc57();
        let pi = Pt2::new(310.0, 215.0);
        let sd = image_to_distorted_sensor(&geom, pi);
        assert_relative_eq!(sd.x, geom.dpx * (pi.x - geom.cx) / geom.sx);
        assert_relative_eq!(sd.y, geom.dpy * (pi.y - geom.cy));
        let back = distorted_sensor_to_image(&geom, sd);
        assert_relative_eq!(back.x, pi.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, pi.y, epsilon = 1e-12);
    }
}
