//! Refinement stages for coplanar calibration.
//!
//! Every stage polishes a subset of the camera parameters by nonlinear
//! least squares, starting from whatever the closed-form estimate or the
//! previous stage left behind. The basic variant stops after
//! [`refine_f_tz_kappa`]; the full variant walks the whole ladder up to
//! [`refine_full`]. Residuals are always pointwise distances in the
//! undistorted sensor plane, and the world points are assumed to lie on
//! the `z = 0` plane throughout.

use log::debug;
use nalgebra::DVector;
use tsai_core::{
    rotation_from_euler, CalibrationError, CameraGeometry, CameraModel, CorrespondenceSet, Mat3,
    Pt3, Real, Vec3,
};
use tsai_linear::{coplanar_seed, SensorObservations};

use crate::lm::{optimize, ResidualProblem, SolveOptions, SolveReport};

/// Distance, per point, between the projection of the world point and the
/// observation mapped into the undistorted sensor plane.
///
/// The observations are scaled by `1 + kappa1 * r^2` on their way out of
/// the distorted plane; pass zero when they are already undistorted.
fn planar_sensor_errors(
    world: &[Pt3],
    obs: &SensorObservations,
    rot: &Mat3,
    t: Vec3,
    f: Real,
    kappa1: Real,
) -> DVector<Real> {
    DVector::from_iterator(
        obs.len(),
        (0..obs.len()).map(|i| {
            let pw = world[i];
            let xc = rot[(0, 0)] * pw.x + rot[(0, 1)] * pw.y + t.x;
            let yc = rot[(1, 0)] * pw.x + rot[(1, 1)] * pw.y + t.y;
            let zc = rot[(2, 0)] * pw.x + rot[(2, 1)] * pw.y + t.z;
            let factor = 1.0 + kappa1 * obs.r_squared[i];
            (f * xc / zc - obs.xd[i] * factor).hypot(f * yc / zc - obs.yd[i] * factor)
        }),
    )
}

struct FTzKappaProblem<'a> {
    world: &'a [Pt3],
    obs: SensorObservations,
    rot: Mat3,
    tx: Real,
    ty: Real,
}

impl ResidualProblem for FTzKappaProblem<'_> {
    fn residuals(&self, x: &DVector<Real>) -> Result<DVector<Real>, CalibrationError> {
        Ok(planar_sensor_errors(
            self.world,
            &self.obs,
            &self.rot,
            Vec3::new(self.tx, self.ty, x[1]),
            x[0],
            x[2],
        ))
    }
}

/// Three-parameter stage: `f`, `Tz` and `kappa1`, with the rotation and
/// the in-plane translation held at their closed-form values.
pub fn refine_f_tz_kappa(
    geom: &CameraGeometry,
    model: &mut CameraModel,
    data: &CorrespondenceSet,
    opts: &SolveOptions,
) -> Result<SolveReport, CalibrationError> {
    let problem = FTzKappaProblem {
        world: &data.world,
        obs: SensorObservations::from_image(geom, data),
        rot: model.rot,
        tx: model.tx,
        ty: model.ty,
    };
    let x0 = DVector::from_vec(vec![model.f, model.tz, model.kappa1]);
    let (x, report) = optimize(&problem, x0, opts)?;
    model.f = x[0];
    model.tz = x[1];
    model.kappa1 = x[2];
    debug!(
        "coplanar f/Tz/kappa stage: cost {:.3e} after {} evaluations",
        report.final_cost, report.iterations
    );
    Ok(report)
}

/// Five-parameter problem over `f`, `Tz`, `kappa1` and the image center.
///
/// Moving the center changes the sensor observations, so the rotation and
/// the in-plane translation are re-derived from the closed-form chain at
/// every trial point instead of being frozen.
struct CenterProblem<'a> {
    geom: CameraGeometry,
    data: &'a CorrespondenceSet,
    early_undistortion: bool,
}

impl CenterProblem<'_> {
    fn observations(&self, x: &DVector<Real>) -> SensorObservations {
        let mut geom = self.geom;
        geom.cx = x[3];
        geom.cy = x[4];
        let mut obs = SensorObservations::from_image(&geom, self.data);
        if self.early_undistortion {
            obs.remove_distortion(x[2]);
        }
        obs
    }
}

impl ResidualProblem for CenterProblem<'_> {
    fn residuals(&self, x: &DVector<Real>) -> Result<DVector<Real>, CalibrationError> {
        let obs = self.observations(x);
        let seed = coplanar_seed(&self.data.world, &obs)?;
        let kappa1 = if self.early_undistortion { 0.0 } else { x[2] };
        Ok(planar_sensor_errors(
            &self.data.world,
            &obs,
            &seed.rot,
            Vec3::new(seed.tx, seed.ty, x[1]),
            x[0],
            kappa1,
        ))
    }
}

fn refine_center(
    geom: &mut CameraGeometry,
    model: &mut CameraModel,
    data: &CorrespondenceSet,
    opts: &SolveOptions,
    early_undistortion: bool,
) -> Result<SolveReport, CalibrationError> {
    let problem = CenterProblem {
        geom: *geom,
        data,
        early_undistortion,
    };
    let x0 = DVector::from_vec(vec![model.f, model.tz, model.kappa1, geom.cx, geom.cy]);
    let (x, report) = optimize(&problem, x0, opts)?;

    // leave the pose consistent with the accepted center
    let obs = problem.observations(&x);
    let seed = coplanar_seed(&data.world, &obs)?;
    model.set_rotation(seed.rot);
    model.tx = seed.tx;
    model.ty = seed.ty;
    model.f = x[0];
    model.tz = x[1];
    model.kappa1 = x[2];
    geom.cx = x[3];
    geom.cy = x[4];
    debug!(
        "coplanar center stage (early undistortion: {}): cost {:.3e} after {} evaluations",
        early_undistortion, report.final_cost, report.iterations
    );
    Ok(report)
}

/// Five-parameter stage: `f`, `Tz`, `kappa1` and the image center, with
/// distortion accounted for only when comparing against the observations.
pub fn refine_center_late_undistortion(
    geom: &mut CameraGeometry,
    model: &mut CameraModel,
    data: &CorrespondenceSet,
    opts: &SolveOptions,
) -> Result<SolveReport, CalibrationError> {
    refine_center(geom, model, data, opts, false)
}

/// Five-parameter stage variant that removes the trial distortion from
/// the observations before re-deriving the pose, for when `kappa1` is
/// already modelled reasonably well.
pub fn refine_center_early_undistortion(
    geom: &mut CameraGeometry,
    model: &mut CameraModel,
    data: &CorrespondenceSet,
    opts: &SolveOptions,
) -> Result<SolveReport, CalibrationError> {
    refine_center(geom, model, data, opts, true)
}

struct PoseIntrinsicsProblem<'a> {
    world: &'a [Pt3],
    obs: SensorObservations,
}

impl ResidualProblem for PoseIntrinsicsProblem<'_> {
    fn residuals(&self, x: &DVector<Real>) -> Result<DVector<Real>, CalibrationError> {
        let rot = rotation_from_euler(x[0], x[1], x[2]);
        Ok(planar_sensor_errors(
            self.world,
            &self.obs,
            &rot,
            Vec3::new(x[3], x[4], x[5]),
            x[7],
            x[6],
        ))
    }
}

/// Eight-parameter stage: the full pose plus `kappa1` and `f`, with the
/// image center held fixed.
pub fn refine_all_but_center(
    geom: &CameraGeometry,
    model: &mut CameraModel,
    data: &CorrespondenceSet,
    opts: &SolveOptions,
) -> Result<SolveReport, CalibrationError> {
    let problem = PoseIntrinsicsProblem {
        world: &data.world,
        obs: SensorObservations::from_image(geom, data),
    };
    let x0 = DVector::from_vec(vec![
        model.rx,
        model.ry,
        model.rz,
        model.tx,
        model.ty,
        model.tz,
        model.kappa1,
        model.f,
    ]);
    let (x, report) = optimize(&problem, x0, opts)?;
    model.rx = x[0];
    model.ry = x[1];
    model.rz = x[2];
    model.update_rotation_matrix();
    model.tx = x[3];
    model.ty = x[4];
    model.tz = x[5];
    model.kappa1 = x[6];
    model.f = x[7];
    debug!(
        "coplanar pose/intrinsics stage: cost {:.3e} after {} evaluations",
        report.final_cost, report.iterations
    );
    Ok(report)
}

struct FullProblem<'a> {
    geom: CameraGeometry,
    data: &'a CorrespondenceSet,
}

impl ResidualProblem for FullProblem<'_> {
    fn residuals(&self, x: &DVector<Real>) -> Result<DVector<Real>, CalibrationError> {
        let mut geom = self.geom;
        geom.cx = x[8];
        geom.cy = x[9];
        let obs = SensorObservations::from_image(&geom, self.data);
        let rot = rotation_from_euler(x[0], x[1], x[2]);
        Ok(planar_sensor_errors(
            &self.data.world,
            &obs,
            &rot,
            Vec3::new(x[3], x[4], x[5]),
            x[7],
            x[6],
        ))
    }
}

/// Ten-parameter stage: the full pose, `kappa1`, `f` and the image
/// center, all refined together.
pub fn refine_full(
    geom: &mut CameraGeometry,
    model: &mut CameraModel,
    data: &CorrespondenceSet,
    opts: &SolveOptions,
) -> Result<SolveReport, CalibrationError> {
    let problem = FullProblem { geom: *geom, data };
    let x0 = DVector::from_vec(vec![
        model.rx,
        model.ry,
        model.rz,
        model.tx,
        model.ty,
        model.tz,
        model.kappa1,
        model.f,
        geom.cx,
        geom.cy,
    ]);
    let (x, report) = optimize(&problem, x0, opts)?;
    model.rx = x[0];
    model.ry = x[1];
    model.rz = x[2];
    model.update_rotation_matrix();
    model.tx = x[3];
    model.ty = x[4];
    model.tz = x[5];
    model.kappa1 = x[6];
    model.f = x[7];
    geom.cx = x[8];
    geom.cy = x[9];
    debug!(
        "coplanar full stage: cost {:.3e} after {} evaluations",
        report.final_cost, report.iterations
    );
    Ok(report)
}
