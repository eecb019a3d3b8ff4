//! Refinement stages for non-coplanar calibration.
//!
//! The ladder is shorter than the coplanar one: the closed-form estimate
//! already pins down the horizontal scale factor, so after the basic
//! `f`/`Tz`/`kappa1` polish the remaining stages free the whole pose at
//! once, first with the image center held fixed and then with everything
//! open. Changing `sx` (or the center) moves the observations themselves,
//! so those stages rebuild the sensor-plane observations at every trial
//! point.

use log::debug;
use nalgebra::DVector;
use tsai_core::{
    rotation_from_euler, CalibrationError, CameraGeometry, CameraModel, CorrespondenceSet, Mat3,
    Pt3, Real, Vec3,
};
use tsai_linear::SensorObservations;

use crate::lm::{optimize, ResidualProblem, SolveOptions, SolveReport};

/// Distance, per point, between the projection of the world point and the
/// observation mapped into the undistorted sensor plane, with the full
/// rigid transform applied.
pub(crate) fn volumetric_sensor_errors(
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
            let pc = rot * world[i].coords + t;
            let factor = 1.0 + kappa1 * obs.r_squared[i];
            (f * pc.x / pc.z - obs.xd[i] * factor).hypot(f * pc.y / pc.z - obs.yd[i] * factor)
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
        Ok(volumetric_sensor_errors(
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
///
/// Expects `geom.sx` to already carry the closed-form scale estimate so
/// the observations line up with the rotation.
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
        "non-coplanar f/Tz/kappa stage: cost {:.3e} after {} evaluations",
        report.final_cost, report.iterations
    );
    Ok(report)
}

/// Pose, intrinsics and scale problem; optionally frees the image center
/// as well. The observations depend on the trial `sx` (and center), so
/// they are rebuilt on every evaluation.
struct PoseIntrinsicsScaleProblem<'a> {
    geom: CameraGeometry,
    data: &'a CorrespondenceSet,
    free_center: bool,
}

impl ResidualProblem for PoseIntrinsicsScaleProblem<'_> {
    fn residuals(&self, x: &DVector<Real>) -> Result<DVector<Real>, CalibrationError> {
        let mut geom = self.geom;
        geom.sx = x[8];
        if self.free_center {
            geom.cx = x[9];
            geom.cy = x[10];
        }
        let obs = SensorObservations::from_image(&geom, self.data);
        let rot = rotation_from_euler(x[0], x[1], x[2]);
        Ok(volumetric_sensor_errors(
            &self.data.world,
            &obs,
            &rot,
            Vec3::new(x[3], x[4], x[5]),
            x[7],
            x[6],
        ))
    }
}

fn write_back_pose(model: &mut CameraModel, x: &DVector<Real>) {
    model.rx = x[0];
    model.ry = x[1];
    model.rz = x[2];
    model.update_rotation_matrix();
    model.tx = x[3];
    model.ty = x[4];
    model.tz = x[5];
    model.kappa1 = x[6];
    model.f = x[7];
}

/// Nine-parameter stage: the full pose, `kappa1`, `f` and `sx`, with the
/// image center held fixed.
pub fn refine_all_but_center(
    geom: &mut CameraGeometry,
    model: &mut CameraModel,
    data: &CorrespondenceSet,
    opts: &SolveOptions,
) -> Result<SolveReport, CalibrationError> {
    let problem = PoseIntrinsicsScaleProblem {
        geom: *geom,
        data,
        free_center: false,
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
        geom.sx,
    ]);
    let (x, report) = optimize(&problem, x0, opts)?;
    write_back_pose(model, &x);
    geom.sx = x[8];
    debug!(
        "non-coplanar pose/intrinsics stage: cost {:.3e} after {} evaluations",
        report.final_cost, report.iterations
    );
    Ok(report)
}

/// Eleven-parameter stage: the full pose, `kappa1`, `f`, `sx` and the
/// image center, all refined together.
pub fn refine_full(
    geom: &mut CameraGeometry,
    model: &mut CameraModel,
    data: &CorrespondenceSet,
    opts: &SolveOptions,
) -> Result<SolveReport, CalibrationError> {
    let problem = PoseIntrinsicsScaleProblem {
        geom: *geom,
        data,
        free_center: true,
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
        geom.sx,
        geom.cx,
        geom.cy,
    ]);
    let (x, report) = optimize(&problem, x0, opts)?;
    write_back_pose(model, &x);
    geom.sx = x[8];
    geom.cx = x[9];
    geom.cy = x[10];
    debug!(
        "non-coplanar full stage: cost {:.3e} after {} evaluations",
        report.final_cost, report.iterations
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tsai_core::synthetic::{block_points, project_points};
    use tsai_linear::noncoplanar_seed;

    fn volumetric_scene(
        geom: &CameraGeometry,
        kappa1: Real,
    ) -> (CameraModel, CorrespondenceSet) {
        let mut truth = CameraModel {
            f: 10.0,
            kappa1,
            tx: -40.0,
            ty: -55.0,
            tz: 600.0,
            rx: 0.2,
            ry: -0.15,
            rz: 0.3,
            ..CameraModel::default()
        };
        truth.update_rotation_matrix();
        let world = block_points(4, 4, 3, 25.0);
        let image = project_points(geom, &truth, &world);
        let mut data = CorrespondenceSet::default();
        for (pw, pi) in world.iter().zip(&image) {
            data.push(*pw, *pi).unwrap();
        }
        (truth, data)
    }

    fn seeded_model(geom: &mut CameraGeometry, data: &CorrespondenceSet) -> CameraModel {
        let seed = noncoplanar_seed(geom, data).unwrap();
        geom.sx = seed.sx;
        let mut model = CameraModel {
            f: seed.f,
            tx: seed.tx,
            ty: seed.ty,
            tz: seed.tz,
            ..CameraModel::default()
        };
        model.set_rotation(seed.rot);
        model
    }

    #[test]
    fn three_parameter_stage_recovers_distortion() {
        let truth_geom = CameraGeometry::sony_xc75();
        let (truth, data) = volumetric_scene(&truth_geom, 2.0e-3);

        let mut geom = CameraGeometry::sony_xc75();
        let mut model = seeded_model(&mut geom, &data);
        let report =
            refine_f_tz_kappa(&geom, &mut model, &data, &SolveOptions::default()).unwrap();

        assert!(report.final_cost < 1e-10);
        assert_relative_eq!(model.f, truth.f, max_relative = 1e-5);
        assert_relative_eq!(model.tz, truth.tz, max_relative = 1e-5);
        assert_relative_eq!(model.kappa1, truth.kappa1, max_relative = 1e-3);
    }

    #[test]
    fn scale_stage_recovers_a_stretched_sensor() {
        let mut truth_geom = CameraGeometry::sony_xc75();
        truth_geom.sx = 1.04;
        let (truth, data) = volumetric_scene(&truth_geom, 1.0e-3);

        // prior geometry claims sx = 1
        let mut geom = CameraGeometry::sony_xc75();
        let mut model = seeded_model(&mut geom, &data);
        let opts = SolveOptions::default();
        refine_f_tz_kappa(&geom, &mut model, &data, &opts).unwrap();

        let report = refine_all_but_center(&mut geom, &mut model, &data, &opts).unwrap();

        assert!(report.final_cost < 1e-10);
        assert_relative_eq!(geom.sx, truth_geom.sx, max_relative = 1e-4);
        assert_relative_eq!(model.f, truth.f, max_relative = 1e-4);
        assert_relative_eq!(model.tx, truth.tx, max_relative = 1e-4);
        assert_relative_eq!(model.rx, truth.rx, epsilon = 1e-5);
        assert_relative_eq!(model.kappa1, truth.kappa1, max_relative = 1e-2);
    }

    #[test]
    fn full_stage_recovers_scale_and_center_together() {
        let mut truth_geom = CameraGeometry::sony_xc75();
        truth_geom.sx = 1.03;
        truth_geom.cx = 259.0;
        truth_geom.cy = 242.0;
        let (truth, data) = volumetric_scene(&truth_geom, 1.0e-3);

        let mut geom = CameraGeometry::sony_xc75();
        let mut model = truth;
        model.f *= 1.01;
        model.kappa1 = 0.0;
        model.tx += 1.0;

        let report =
            refine_full(&mut geom, &mut model, &data, &SolveOptions::default()).unwrap();

        assert!(report.final_cost < 1e-10);
        assert_relative_eq!(geom.sx, truth_geom.sx, max_relative = 1e-4);
        assert!((geom.cx - truth_geom.cx).abs() < 0.05);
        assert!((geom.cy - truth_geom.cy).abs() < 0.05);
        assert_relative_eq!(model.f, truth.f, max_relative = 1e-4);
        assert_relative_eq!(model.kappa1, truth.kappa1, max_relative = 1e-2);
    }
}
