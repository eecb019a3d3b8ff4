//! Closed-form pose seed when the intrinsic parameters are known.
//!
//! Runs the radial alignment stage on observations undistorted with the
//! trusted `kappa1`, then recovers the full translation from the stacked
//! projection equations with the trusted focal length. The reference
//! point for the translation sign test is picked by raw pixel distance
//! here, since the image center is input rather than an unknown.

use nalgebra::{DMatrix, DVector};
use tsai_core::{
    alternate_rotation_solution, CalibrationError, CameraGeometry, CameraModel,
    CorrespondenceSet, Mat3, Pt3, Real,
};

use crate::lstsq::solve_least_squares;
use crate::sensor::{farthest_pixel, SensorObservations};
use crate::{coplanar, noncoplanar};

/// Camera pose recovered by the extrinsic-only closed form.
#[derive(Debug, Clone, Copy)]
pub struct ExtrinsicSeed {
    /// World-to-camera rotation.
    pub rot: Mat3,
    /// Translation x component \[mm\].
    pub tx: Real,
    /// Translation y component \[mm\].
    pub ty: Real,
    /// Translation z component \[mm\].
    pub tz: Real,
}

/// Closed-form pose estimate from a coplanar target and a fully
/// calibrated camera.
///
/// A throwaway focal length solve, run on the still-distorted
/// observations, only probes which of the two rotation solutions is
/// consistent with the measured data; its value is discarded.
pub fn coplanar_extrinsic_seed(
    geom: &CameraGeometry,
    model: &CameraModel,
    data: &CorrespondenceSet,
) -> Result<ExtrinsicSeed, CalibrationError> {
    let undistorted = SensorObservations::undistorted(geom, model.kappa1, data);
    let u = coplanar::radial_alignment_coefficients(&data.world, &undistorted)?;
    let far = farthest_pixel(geom, data);
    let far_x = data.image[far].x - geom.cx;
    let far_y = data.image[far].y - geom.cy;
    let (_, ty) = coplanar::translation_xy(&u, &data.world, far, far_x, far_y);
    let mut rot = coplanar::rotation_from_coefficients(&u, ty);

    let distorted = SensorObservations::from_image(geom, data);
    let (trial_f, _) = coplanar::approximate_f_tz(&data.world, &distorted, &rot, ty)?;
    if trial_f < 0.0 {
        rot = alternate_rotation_solution(&rot);
        let (trial_f, _) = coplanar::approximate_f_tz(&data.world, &distorted, &rot, ty)?;
        if trial_f < 0.0 {
            return Err(CalibrationError::HandednessAmbiguity);
        }
    }

    let (tx, ty, tz) = solve_translation(&data.world, &undistorted, &rot, model.f)?;
    Ok(ExtrinsicSeed { rot, tx, ty, tz })
}

/// Closed-form pose estimate from a non-coplanar target and a fully
/// calibrated camera.
pub fn noncoplanar_extrinsic_seed(
    geom: &CameraGeometry,
    model: &CameraModel,
    data: &CorrespondenceSet,
) -> Result<ExtrinsicSeed, CalibrationError> {
    let undistorted = SensorObservations::undistorted(geom, model.kappa1, data);
    let u = noncoplanar::radial_alignment_coefficients(&data.world, &undistorted)?;
    let far = farthest_pixel(geom, data);
    let far_x = data.image[far].x - geom.cx;
    let far_y = data.image[far].y - geom.cy;
    let (_, ty) = noncoplanar::translation_xy(&u, &data.world, far, far_x, far_y);
    let rot = rotation_from_scaled_coefficients(&u, ty);
    let (tx, ty, tz) = solve_translation(&data.world, &undistorted, &rot, model.f)?;
    Ok(ExtrinsicSeed { rot, tx, ty, tz })
}

/// Rotation from the seven alignment coefficients once `sx` is already
/// folded into the observations: both recovered rows scale by `Ty`
/// alone, and the last row is their cross product.
fn rotation_from_scaled_coefficients(u: &[Real; 7], ty: Real) -> Mat3 {
    let r1 = u[0] * ty;
    let r2 = u[1] * ty;
    let r3 = u[2] * ty;
    let r4 = u[4] * ty;
    let r5 = u[5] * ty;
    let r6 = u[6] * ty;
    let r7 = r2 * r6 - r3 * r5;
    let r8 = r3 * r4 - r1 * r6;
    let r9 = r1 * r5 - r2 * r4;
    Mat3::new(r1, r2, r3, r4, r5, r6, r7, r8, r9)
}

/// Solve the stacked projection equations for the full translation with
/// the rotation and the intrinsic parameters held fixed.
fn solve_translation(
    world: &[Pt3],
    obs: &SensorObservations,
    rot: &Mat3,
    f: Real,
) -> Result<(Real, Real, Real), CalibrationError> {
    let n = world.len();
    let mut m = DMatrix::zeros(2 * n, 3);
    let mut b = DVector::zeros(2 * n);
    for (i, pw) in world.iter().enumerate() {
        // untranslated camera coordinates
        let pk = rot * pw.coords;
        m[(i, 0)] = f;
        m[(i, 2)] = -obs.xd[i];
        b[i] = obs.xd[i] * pk.z - f * pk.x;
        m[(n + i, 1)] = f;
        m[(n + i, 2)] = -obs.yd[i];
        b[n + i] = obs.yd[i] * pk.z - f * pk.y;
    }
    let a = solve_least_squares(m, b, "extrinsic translation system")?;
    Ok((a[0], a[1], a[2]))
}
