//! Calibration entry points for coplanar targets.

use log::debug;
use tsai_core::CalibrationError;
use tsai_linear::{coplanar_seed, SensorObservations};
use tsai_optim::{coplanar, SolveOptions};

use crate::report::{CalibrationReport, Stage};
use crate::session::CalibrationSession;

/// Fewest correspondences the coplanar closed form accepts.
pub const MIN_COPLANAR_POINTS: usize = 5;

fn validate(session: &CalibrationSession) -> Result<(), CalibrationError> {
    if session.data.len() < MIN_COPLANAR_POINTS {
        return Err(CalibrationError::NotEnoughPoints {
            needed: MIN_COPLANAR_POINTS,
            got: session.data.len(),
        });
    }
    if let Some((index, z)) = session.data.first_off_plane() {
        return Err(CalibrationError::NonCoplanarData { index, z });
    }
    Ok(())
}

/// Run the closed form and commit it to the session model.
fn seed_session(session: &mut CalibrationSession) -> Result<(), CalibrationError> {
    let obs = SensorObservations::from_image(&session.geometry, &session.data);
    let seed = coplanar_seed(&session.data.world, &obs)?;
    let model = &mut session.model;
    model.set_rotation(seed.rot);
    model.tx = seed.tx;
    model.ty = seed.ty;
    model.tz = seed.tz;
    model.f = seed.f;
    // the closed form assumes an undistorted lens
    model.kappa1 = 0.0;
    debug!(
        "coplanar closed form: f = {:.4}, T = ({:.3}, {:.3}, {:.3})",
        model.f, model.tx, model.ty, model.tz
    );
    Ok(())
}

/// Coplanar calibration: closed-form estimate followed by the basic
/// three-parameter (`f`, `Tz`, `kappa1`) refinement.
///
/// Requires at least [`MIN_COPLANAR_POINTS`] correspondences, all with
/// `z == 0`. On error the session is left untouched.
pub fn coplanar_calibration(
    session: &mut CalibrationSession,
    opts: &SolveOptions,
) -> Result<CalibrationReport, CalibrationError> {
    validate(session)?;
    seed_session(session)?;

    let mut report = CalibrationReport::default();
    let solve =
        coplanar::refine_f_tz_kappa(&session.geometry, &mut session.model, &session.data, opts)?;
    report.record(Stage::FTzKappa, solve);
    Ok(report)
}

/// Coplanar calibration through the whole refinement ladder: the basic
/// fit, both five-parameter image center stages, the eight-parameter pose
/// stage and the final ten-parameter stage.
///
/// Refines `session.geometry.cx`/`cy` in addition to the model. A failure
/// mid-ladder keeps the stages committed so far and returns the error.
pub fn coplanar_calibration_with_full_optimization(
    session: &mut CalibrationSession,
    opts: &SolveOptions,
) -> Result<CalibrationReport, CalibrationError> {
    validate(session)?;
    seed_session(session)?;

    let mut report = CalibrationReport::default();
    let solve =
        coplanar::refine_f_tz_kappa(&session.geometry, &mut session.model, &session.data, opts)?;
    report.record(Stage::FTzKappa, solve);

    let solve = coplanar::refine_center_late_undistortion(
        &mut session.geometry,
        &mut session.model,
        &session.data,
        opts,
    )?;
    report.record(Stage::CenterLateUndistortion, solve);

    let solve = coplanar::refine_center_early_undistortion(
        &mut session.geometry,
        &mut session.model,
        &session.data,
        opts,
    )?;
    report.record(Stage::CenterEarlyUndistortion, solve);

    let solve = coplanar::refine_all_but_center(
        &session.geometry,
        &mut session.model,
        &session.data,
        opts,
    )?;
    report.record(Stage::AllButCenter, solve);

    let solve =
        coplanar::refine_full(&mut session.geometry, &mut session.model, &session.data, opts)?;
    report.record(Stage::Full, solve);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsai_core::{CameraGeometry, CameraModel, CorrespondenceSet, Pt2, Pt3};

    #[test]
    fn rejects_too_few_points_without_touching_the_session() {
        let mut data = CorrespondenceSet::default();
        for i in 0..4 {
            data.push(
                Pt3::new(i as f64 * 10.0, 0.0, 0.0),
                Pt2::new(100.0 + i as f64, 200.0),
            )
            .unwrap();
        }
        let mut session = CalibrationSession::new(CameraGeometry::sony_xc75(), data);
        let before = session.clone();

        let err = coplanar_calibration(&mut session, &SolveOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::NotEnoughPoints { needed: 5, got: 4 }
        );
        assert_eq!(session, before);
    }

    #[test]
    fn rejects_off_plane_points_without_touching_the_session() {
        let mut data = CorrespondenceSet::default();
        for i in 0..6 {
            data.push(
                Pt3::new(i as f64 * 10.0, (i % 3) as f64 * 10.0, 0.0),
                Pt2::new(100.0 + i as f64, 200.0 + i as f64),
            )
            .unwrap();
        }
        data.world[3].z = 2.5;
        let mut session = CalibrationSession::new(CameraGeometry::sony_xc75(), data);
        session.model = CameraModel {
            f: 99.0,
            ..CameraModel::default()
        };
        let before = session.clone();

        let err = coplanar_calibration(&mut session, &SolveOptions::default()).unwrap_err();
        assert_eq!(err, CalibrationError::NonCoplanarData { index: 3, z: 2.5 });
        assert_eq!(session, before);
    }
}
