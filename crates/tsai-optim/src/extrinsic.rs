//! Pose-only refinement for a camera with known intrinsics.

use log::debug;
use nalgebra::DVector;
use tsai_core::{
    rotation_from_euler, CalibrationError, CameraGeometry, CameraModel, CorrespondenceSet, Pt3,
    Real, Vec3,
};
use tsai_linear::SensorObservations;

use crate::lm::{optimize, ResidualProblem, SolveOptions, SolveReport};
use crate::noncoplanar::volumetric_sensor_errors;

struct PoseProblem<'a> {
    world: &'a [Pt3],
    obs: SensorObservations,
    f: Real,
    kappa1: Real,
}

impl ResidualProblem for PoseProblem<'_> {
    fn residuals(&self, x: &DVector<Real>) -> Result<DVector<Real>, CalibrationError> {
        let rot = rotation_from_euler(x[0], x[1], x[2]);
        Ok(volumetric_sensor_errors(
            self.world,
            &self.obs,
            &rot,
            Vec3::new(x[3], x[4], x[5]),
            self.f,
            self.kappa1,
        ))
    }
}

/// Six-parameter stage: the rigid world-to-camera transform, with `f`,
/// `kappa1` and the sensor geometry held fixed.
pub fn refine_pose(
    geom: &CameraGeometry,
    model: &mut CameraModel,
    data: &CorrespondenceSet,
    opts: &SolveOptions,
) -> Result<SolveReport, CalibrationError> {
    let problem = PoseProblem {
        world: &data.world,
        obs: SensorObservations::from_image(geom, data),
        f: model.f,
        kappa1: model.kappa1,
    };
    let x0 = DVector::from_vec(vec![
        model.rx, model.ry, model.rz, model.tx, model.ty, model.tz,
    ]);
    let (x, report) = optimize(&problem, x0, opts)?;
    model.rx = x[0];
    model.ry = x[1];
    model.rz = x[2];
    model.update_rotation_matrix();
    model.tx = x[3];
    model.ty = x[4];
    model.tz = x[5];
    debug!(
        "extrinsic pose stage: cost {:.3e} after {} evaluations",
        report.final_cost, report.iterations
    );
    Ok(report)
}
