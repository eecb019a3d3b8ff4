//! Closed-form pose, focal length and scale factor seed for
//! non-coplanar targets.
//!
//! With volumetric data the radial alignment system carries seven
//! unknowns and additionally pins down the horizontal scale factor `sx`,
//! which coplanar data cannot separate from the pose. The recovered raw
//! rotation rows are not exactly orthonormal under noise, so the seed
//! extracts their Euler angles and regenerates a clean matrix from those.

use log::debug;
use nalgebra::{DMatrix, DVector};
use tsai_core::{
    alternate_rotation_solution, euler_from_rotation, rotation_from_euler, CalibrationError,
    CameraGeometry, CorrespondenceSet, Mat3, Pt3, Real,
};

use crate::lstsq::solve_least_squares;
use crate::sensor::{sign_match, SensorObservations};

/// Pose, approximate focal length and scale factor recovered by the
/// non-coplanar closed form. Distortion is taken as zero at this stage.
#[derive(Debug, Clone, Copy)]
pub struct NonCoplanarSeed {
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
    /// Horizontal scale factor estimated from the data.
    pub sx: Real,
}

/// Run the non-coplanar closed form.
///
/// `geom.sx` only serves as the prior scale under which the observations
/// are formed; the returned [`NonCoplanarSeed::sx`] replaces it. A target
/// whose points actually lie in one plane makes the alignment system
/// rank deficient and is reported as [`CalibrationError::SingularSystem`].
pub fn noncoplanar_seed(
    geom: &CameraGeometry,
    data: &CorrespondenceSet,
) -> Result<NonCoplanarSeed, CalibrationError> {
    let obs = SensorObservations::from_image(geom, data);
    let u = radial_alignment_coefficients(&data.world, &obs)?;
    let far = obs.farthest_point();
    let (tx, ty) = translation_xy(&u, &data.world, far, obs.xd[far], obs.yd[far]);
    let sx = (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt() * ty.abs();
    debug!("estimated horizontal scale factor sx = {sx:.6}");
    let mut rot = orthonormal_rotation(&u, ty, sx);
    let (mut f, mut tz) = approximate_f_tz(&data.world, &obs, &rot, ty)?;
    if f < 0.0 {
        debug!("focal length came out negative, probing the alternate rotation solution");
        rot = alternate_rotation_solution(&rot);
        let (f2, tz2) = approximate_f_tz(&data.world, &obs, &rot, ty)?;
        if f2 < 0.0 {
            return Err(CalibrationError::HandednessAmbiguity);
        }
        f = f2;
        tz = tz2;
    }
    Ok(NonCoplanarSeed { rot, tx, ty, tz, f, sx })
}

/// Solve the N x 7 radial alignment system for
/// `[sx r1/Ty, sx r2/Ty, sx r3/Ty, sx Tx/Ty, r4/Ty, r5/Ty, r6/Ty]`.
pub(crate) fn radial_alignment_coefficients(
    world: &[Pt3],
    obs: &SensorObservations,
) -> Result<[Real; 7], CalibrationError> {
    let n = world.len();
    let mut m = DMatrix::zeros(n, 7);
    let mut b = DVector::zeros(n);
    for (i, pw) in world.iter().enumerate() {
        m[(i, 0)] = obs.yd[i] * pw.x;
        m[(i, 1)] = obs.yd[i] * pw.y;
        m[(i, 2)] = obs.yd[i] * pw.z;
        m[(i, 3)] = obs.yd[i];
        m[(i, 4)] = -obs.xd[i] * pw.x;
        m[(i, 5)] = -obs.xd[i] * pw.y;
        m[(i, 6)] = -obs.xd[i] * pw.z;
        b[i] = obs.xd[i];
    }
    let a = solve_least_squares(
        m,
        b,
        "non-coplanar radial alignment system (the data may be coplanar)",
    )?;
    Ok([a[0], a[1], a[2], a[3], a[4], a[5], a[6]])
}

/// Recover `(Tx, Ty)` from the alignment coefficients, fixing the sign of
/// `Ty` through the quadrant of the reference point `far`.
pub(crate) fn translation_xy(
    u: &[Real; 7],
    world: &[Pt3],
    far: usize,
    far_x: Real,
    far_y: Real,
) -> (Real, Real) {
    let ty_squared = 1.0 / (u[4] * u[4] + u[5] * u[5] + u[6] * u[6]);

    // assume Ty positive, then check which quadrant the reference point
    // projects into
    let mut ty = ty_squared.sqrt();
    let p = world[far];
    let x = (u[0] * p.x + u[1] * p.y + u[2] * p.z + u[3]) * ty;
    let y = (u[4] * p.x + u[5] * p.y + u[6] * p.z) * ty + ty;
    if !sign_match(x, far_x) || !sign_match(y, far_y) {
        ty = -ty;
    }
    (u[3] * ty, ty)
}

/// Orthonormal rotation from the alignment coefficients, the signed `Ty`
/// and the recovered scale factor.
pub(crate) fn orthonormal_rotation(u: &[Real; 7], ty: Real, sx: Real) -> Mat3 {
    let r1 = u[0] * ty / sx;
    let r2 = u[1] * ty / sx;
    let r3 = u[2] * ty / sx;
    let r4 = u[4] * ty;
    let r5 = u[5] * ty;
    let r6 = u[6] * ty;
    let r7 = r2 * r6 - r3 * r5;
    let r8 = r3 * r4 - r1 * r6;
    let r9 = r1 * r5 - r2 * r4;
    let raw = Mat3::new(r1, r2, r3, r4, r5, r6, r7, r8, r9);
    let (rx, ry, rz) = euler_from_rotation(&raw);
    rotation_from_euler(rx, ry, rz)
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
        m[(i, 0)] = rot[(1, 0)] * pw.x + rot[(1, 1)] * pw.y + rot[(1, 2)] * pw.z + ty;
        m[(i, 1)] = -obs.yd[i];
        b[i] = (rot[(2, 0)] * pw.x + rot[(2, 1)] * pw.y + rot[(2, 2)] * pw.z) * obs.yd[i];
    }
    let a = solve_least_squares(m, b, "non-coplanar approximate f and Tz")?;
    Ok((a[0], a[1]))
}
