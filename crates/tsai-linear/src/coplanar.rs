//! Closed-form pose and focal length seed for coplanar targets.
//!
//! First stage of the two-stage method. The radial alignment constraint
//! couples only the rotation and the x/y translation, independently of
//! radial distortion and focal length, so those unknowns drop out of a
//! small linear system. Focal length and the z translation then follow
//! from a second linear solve under a zero-distortion assumption.

use log::debug;
use nalgebra::{DMatrix, DVector};
use tsai_core::{alternate_rotation_solution, CalibrationError, Mat3, Pt3, Real};

use crate::lstsq::solve_least_squares;
use crate::sensor::{sign_match, SensorObservations};

/// Numerical zero for the special-case branches of the `Ty^2` solve.
const EPSILON: Real = 1.0e-8;

/// Pose and approximate focal length recovered by the coplanar closed
/// form. Distortion is taken as zero at this stage.
#[derive(Debug, Clone, Copy)]
pub struct CoplanarSeed {
    /// World-to-camera rotation.
    pub rot: Mat3,
    /// Translation x component \[mm\].
    pub tx: Real,
    /// Translation y component \[mm\].
    pub ty: Real,
    /// Translation z component \[mm\].
    pub tz: Real,
    /// Approximate effective focal length \[mm\].
    pub f: Real,
}

/// Run the coplanar closed form on `world` (all `z == 0`) and matching
/// sensor observations.
///
/// When the recovered focal length comes out negative the alternate
/// rotation solution is probed once; if both signs fail the data is
/// reported as [`CalibrationError::HandednessAmbiguity`].
pub fn coplanar_seed(
    world: &[Pt3],
    obs: &SensorObservations,
) -> Result<CoplanarSeed, CalibrationError> {
    let u = radial_alignment_coefficients(world, obs)?;
    let far = obs.farthest_point();
    let (tx, ty) = translation_xy(&u, world, far, obs.xd[far], obs.yd[far]);
    let mut rot = rotation_from_coefficients(&u, ty);
    let (mut f, mut tz) = approximate_f_tz(world, obs, &rot, ty)?;
    if f < 0.0 {
        debug!("focal length came out negative, probing the alternate rotation solution");
        rot = alternate_rotation_solution(&rot);
        let (f2, tz2) = approximate_f_tz(world, obs, &rot, ty)?;
        if f2 < 0.0 {
            return Err(CalibrationError::HandednessAmbiguity);
        }
        f = f2;
        tz = tz2;
    }
    Ok(CoplanarSeed { rot, tx, ty, tz, f })
}

/// Solve the N x 5 radial alignment system for
/// `[r1/Ty, r2/Ty, Tx/Ty, r4/Ty, r5/Ty]`.
pub(crate) fn radial_alignment_coefficients(
    world: &[Pt3],
    obs: &SensorObservations,
) -> Result<[Real; 5], CalibrationError> {
    let n = world.len();
    let mut m = DMatrix::zeros(n, 5);
    let mut b = DVector::zeros(n);
    for (i, pw) in world.iter().enumerate() {
        m[(i, 0)] = obs.yd[i] * pw.x;
        m[(i, 1)] = obs.yd[i] * pw.y;
        m[(i, 2)] = obs.yd[i];
        m[(i, 3)] = -obs.xd[i] * pw.x;
        m[(i, 4)] = -obs.xd[i] * pw.y;
        b[i] = obs.xd[i];
    }
    let a = solve_least_squares(m, b, "coplanar radial alignment system")?;
    Ok([a[0], a[1], a[2], a[3], a[4]])
}

/// Recover `(Tx, Ty)` from the alignment coefficients.
///
/// The magnitude of `Ty` follows from the unit norm of the first two
/// rotation rows; its sign is fixed by requiring the projection of the
/// reference point `far` to land in the measured quadrant `(far_x, far_y)`.
pub(crate) fn translation_xy(
    u: &[Real; 5],
    world: &[Pt3],
    far: usize,
    far_x: Real,
    far_y: Real,
) -> (Real, Real) {
    let (r1p, r2p, r4p, r5p) = (u[0], u[1], u[3], u[4]);

    // degenerate orientations zero out a row or column of the scaled
    // upper 2x2 rotation block; fall back to the surviving pair
    let ty_squared = if r1p.abs() < EPSILON && r2p.abs() < EPSILON {
        1.0 / (r4p * r4p + r5p * r5p)
    } else if r4p.abs() < EPSILON && r5p.abs() < EPSILON {
        1.0 / (r1p * r1p + r2p * r2p)
    } else if r1p.abs() < EPSILON && r4p.abs() < EPSILON {
        1.0 / (r2p * r2p + r5p * r5p)
    } else if r2p.abs() < EPSILON && r5p.abs() < EPSILON {
        1.0 / (r1p * r1p + r4p * r4p)
    } else {
        let det = r1p * r5p - r4p * r2p;
        let norm = r1p * r1p + r2p * r2p + r4p * r4p + r5p * r5p;
        (norm - (norm * norm - 4.0 * det * det).sqrt()) / (2.0 * det * det)
    };

    // assume Ty positive, then check which quadrant the reference point
    // projects into
    let mut ty = ty_squared.sqrt();
    let r1 = u[0] * ty;
    let r2 = u[1] * ty;
    let r4 = u[3] * ty;
    let r5 = u[4] * ty;
    let tx = u[2] * ty;
    let x = r1 * world[far].x + r2 * world[far].y + tx;
    let y = r4 * world[far].x + r5 * world[far].y + ty;
    if !sign_match(x, far_x) || !sign_match(y, far_y) {
        ty = -ty;
    }
    (u[2] * ty, ty)
}

/// Build the full orthonormal rotation from the alignment coefficients
/// and a signed `Ty`.
pub(crate) fn rotation_from_coefficients(u: &[Real; 5], ty: Real) -> Mat3 {
    let r1 = u[0] * ty;
    let r2 = u[1] * ty;
    let r4 = u[3] * ty;
    let r5 = u[4] * ty;
    // guard tiny negative arguments from measurement noise
    let r3 = (1.0 - r1 * r1 - r2 * r2).max(0.0).sqrt();
    let mut r6 = (1.0 - r4 * r4 - r5 * r5).max(0.0).sqrt();
    if r1 * r4 + r2 * r5 > 0.0 {
        r6 = -r6;
    }
    let r7 = r2 * r6 - r3 * r5;
    let r8 = r3 * r4 - r1 * r6;
    let r9 = r1 * r5 - r2 * r4;
    Mat3::new(r1, r2, r3, r4, r5, r6, r7, r8, r9)
}

/// Linear estimate of `(f, Tz)` under zero distortion, using the y
/// projection equation of every point.
pub(crate) fn approximate_f_tz(
    world: &[Pt3],
    obs: &SensorObservations,
    rot: &Mat3,
    ty: Real,
) -> Result<(Real, Real), CalibrationError> {
    let n = world.len();
    let mut m = DMatrix::zeros(n, 2);
    let mut b = DVector::zeros(n);
    for (i, pw) in world.iter().enumerate() {
        m[(i, 0)] = rot[(1, 0)] * pw.x + rot[(1, 1)] * pw.y + ty;
        m[(i, 1)] = -obs.yd[i];
        b[i] = (rot[(2, 0)] * pw.x + rot[(2, 1)] * pw.y) * obs.yd[i];
    }
    let a = solve_least_squares(m, b, "coplanar approximate f and Tz")?;
    Ok((a[0], a[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tsai_core::synthetic::{grid_points, project_points};
    use tsai_core::{CameraGeometry, CameraModel, CorrespondenceSet};

    fn planar_scene(
        rx: Real,
        ry: Real,
        rz: Real,
    ) -> (CameraGeometry, CameraModel, CorrespondenceSet) {
        let geom = CameraGeometry::sony_xc75();
        let mut model = CameraModel {
            f: 8.0,
            tx: -60.0,
            ty: -70.0,
            tz: 500.0,
            rx,
            ry,
            rz,
            ..CameraModel::default()
        };
        model.update_rotation_matrix();
        let world = grid_points(6, 6, 30.0, 0.0);
        let image = project_points(&geom, &model, &world);
        let data = CorrespondenceSet::new(world, image).unwrap();
        (geom, model, data)
    }

    #[test]
    fn seed_recovers_pose_and_focal_length() {
        let (geom, model, data) = planar_scene(0.4, 0.2, 0.1);
        let obs = SensorObservations::from_image(&geom, &data);
        let seed = coplanar_seed(&data.world, &obs).unwrap();
        assert_relative_eq!(seed.f, model.f, max_relative = 1e-6);
        assert_relative_eq!(seed.tx, model.tx, max_relative = 1e-6);
        assert_relative_eq!(seed.ty, model.ty, max_relative = 1e-6);
        assert_relative_eq!(seed.tz, model.tz, max_relative = 1e-6);
        assert_relative_eq!(seed.rot, model.rot, epsilon = 1e-8);
    }

    #[test]
    fn seed_probes_alternate_rotation_for_tilt_away_poses() {
        // this orientation has a negative r3 entry, which the principal
        // square-root branch cannot produce directly
        let (geom, model, data) = planar_scene(0.3, -0.4, 0.2);
        assert!(model.rot[(0, 2)] < 0.0);
        let obs = SensorObservations::from_image(&geom, &data);
        let seed = coplanar_seed(&data.world, &obs).unwrap();
        assert!(seed.f > 0.0);
        assert_relative_eq!(seed.rot, model.rot, epsilon = 1e-8);
        assert_relative_eq!(seed.tz, model.tz, max_relative = 1e-6);
    }

    #[test]
    fn collinear_targets_are_singular() {
        let geom = CameraGeometry::sony_xc75();
        let mut model = CameraModel {
            f: 8.0,
            tx: -20.0,
            ty: -30.0,
            tz: 400.0,
            rx: 0.4,
            ry: 0.1,
            rz: 0.05,
            ..CameraModel::default()
        };
        model.update_rotation_matrix();
        let world: Vec<_> = (0..8)
            .map(|i| Pt3::new(i as Real * 15.0, 0.0, 0.0))
            .collect();
        let image = project_points(&geom, &model, &world);
        let data = CorrespondenceSet::new(world, image).unwrap();
        let obs = SensorObservations::from_image(&geom, &data);
        let err = coplanar_seed(&data.world, &obs).unwrap_err();
        assert!(matches!(err, CalibrationError::SingularSystem { .. }));
    }
}
