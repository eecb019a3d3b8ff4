//! Pose-only estimation entry points for a camera with known intrinsics.

use log::debug;
use tsai_core::CalibrationError;
use tsai_linear::{coplanar_extrinsic_seed, noncoplanar_extrinsic_seed, ExtrinsicSeed};
use tsai_optim::{extrinsic, SolveOptions};

use crate::coplanar::MIN_COPLANAR_POINTS;
use crate::noncoplanar::MIN_NONCOPLANAR_POINTS;
use crate::report::{CalibrationReport, Stage};
use crate::session::CalibrationSession;

fn commit_and_refine(
    session: &mut CalibrationSession,
    seed: ExtrinsicSeed,
    opts: &SolveOptions,
) -> Result<CalibrationReport, CalibrationError> {
    let model = &mut session.model;
    model.set_rotation(seed.rot);
    model.tx = seed.tx;
    model.ty = seed.ty;
    model.tz = seed.tz;
    debug!(
        "extrinsic closed form: T = ({:.3}, {:.3}, {:.3})",
        model.tx, model.ty, model.tz
    );

    let mut report = CalibrationReport::default();
    let solve =
        extrinsic::refine_pose(&session.geometry, &mut session.model, &session.data, opts)?;
    report.record(Stage::Pose, solve);
    Ok(report)
}

/// Estimate the pose of a calibrated camera from a coplanar target.
///
/// `session.model.f` and `session.model.kappa1` are trusted inputs; only
/// the six pose parameters are estimated and refined. Requires at least
/// [`MIN_COPLANAR_POINTS`] correspondences, all with `z == 0`. On error
/// the session is left untouched.
pub fn coplanar_extrinsic_estimation(
    session: &mut CalibrationSession,
    opts: &SolveOptions,
) -> Result<CalibrationReport, CalibrationError> {
    if session.data.len() < MIN_COPLANAR_POINTS {
        return Err(CalibrationError::NotEnoughPoints {
            needed: MIN_COPLANAR_POINTS,
            got: session.data.len(),
        });
    }
    if let Some((index, z)) = session.data.first_off_plane() {
        return Err(CalibrationError::NonCoplanarData { index, z });
    }

    let seed = coplanar_extrinsic_seed(&session.geometry, &session.model, &session.data)?;
    commit_and_refine(session, seed, opts)
}

/// Estimate the pose of a calibrated camera from a non-coplanar target.
///
/// `session.model.f` and `session.model.kappa1` are trusted inputs; only
/// the six pose parameters are estimated and refined. Requires at least
/// [`MIN_NONCOPLANAR_POINTS`] correspondences spanning more than one
/// plane. On error the session is left untouched.
pub fn noncoplanar_extrinsic_estimation(
    session: &mut CalibrationSession,
    opts: &SolveOptions,
) -> Result<CalibrationReport, CalibrationError> {
    if session.data.len() < MIN_NONCOPLANAR_POINTS {
        return Err(CalibrationError::NotEnoughPoints {
            needed: MIN_NONCOPLANAR_POINTS,
            got: session.data.len(),
        });
    }

    let seed = noncoplanar_extrinsic_seed(&session.geometry, &session.model, &session.data)?;
    commit_and_refine(session, seed, opts)
}
