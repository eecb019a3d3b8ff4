//! Calibration entry points for non-coplanar targets.

use log::debug;
use tsai_core::CalibrationError;
use tsai_linear::noncoplanar_seed;
use tsai_optim::{noncoplanar, SolveOptions};

use crate::report::{CalibrationReport, Stage};
use crate::session::CalibrationSession;

/// Fewest correspondences the non-coplanar closed form accepts.
pub const MIN_NONCOPLANAR_POINTS: usize = 7;

fn validate(session: &CalibrationSession) -> Result<(), CalibrationError> {
    if session.data.len() < MIN_NONCOPLANAR_POINTS {
        return Err(CalibrationError::NotEnoughPoints {
            needed: MIN_NONCOPLANAR_POINTS,
            got: session.data.len(),
        });
    }
    // planarity is not checked up front; coplanar data surfaces as a
    // singular radial alignment system inside the closed form
    Ok(())
}

/// Run the closed form and commit it, including the solved scale factor.
fn seed_session(session: &mut CalibrationSession) -> Result<(), CalibrationError> {
    let seed = noncoplanar_seed(&session.geometry, &session.data)?;
    session.geometry.sx = seed.sx;
    let model = &mut session.model;
    model.set_rotation(seed.rot);
    model.tx = seed.tx;
    model.ty = seed.ty;
    model.tz = seed.tz;
    model.f = seed.f;
    // the closed form assumes an undistorted lens
    model.kappa1 = 0.0;
    debug!(
        "non-coplanar closed form: f = {:.4}, sx = {:.6}, T = ({:.3}, {:.3}, {:.3})",
        model.f, seed.sx, model.tx, model.ty, model.tz
    );
    Ok(())
}

/// Non-coplanar calibration: closed-form estimate (which also solves the
/// horizontal scale factor `sx`) followed by the basic three-parameter
/// (`f`, `Tz`, `kappa1`) refinement.
///
/// Requires at least [`MIN_NONCOPLANAR_POINTS`] correspondences spanning
/// more than one plane. On error the session is left untouched.
pub fn noncoplanar_calibration(
    session: &mut CalibrationSession,
    opts: &SolveOptions,
) -> Result<CalibrationReport, CalibrationError> {
    validate(session)?;
    seed_session(session)?;

    let mut report = CalibrationReport::default();
    let solve = noncoplanar::refine_f_tz_kappa(
        &session.geometry,
        &mut session.model,
        &session.data,
        opts,
    )?;
    report.record(Stage::FTzKappa, solve);
    Ok(report)
}

/// Non-coplanar calibration through the whole refinement ladder: the
/// basic fit, the nine-parameter stage (pose, `kappa1`, `f`, `sx`) and the
/// final eleven-parameter stage that frees the image center too.
///
/// Refines `session.geometry.sx`/`cx`/`cy` in addition to the model. A
/// failure mid-ladder keeps the stages committed so far and returns the
/// error.
pub fn noncoplanar_calibration_with_full_optimization(
    session: &mut CalibrationSession,
    opts: &SolveOptions,
) -> Result<CalibrationReport, CalibrationError> {
    validate(session)?;
    seed_session(session)?;

    let mut report = CalibrationReport::default();
    let solve = noncoplanar::refine_f_tz_kappa(
        &session.geometry,
        &mut session.model,
        &session.data,
        opts,
    )?;
    report.record(Stage::FTzKappa, solve);

    let solve = noncoplanar::refine_all_but_center(
        &mut session.geometry,
        &mut session.model,
        &session.data,
        opts,
    )?;
    report.record(Stage::AllButCenter, solve);

    let solve = noncoplanar::refine_full(
        &mut session.geometry,
        &mut session.model,
        &session.data,
        opts,
    )?;
    report.record(Stage::Full, solve);

    Ok(report)
}
