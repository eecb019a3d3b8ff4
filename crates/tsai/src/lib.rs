//! High-level entry crate for the `tsai` calibration toolbox.
//!
//! This crate provides **two complementary APIs** for calibrating a camera
//! with the two-stage Tsai method:
//!
//! ## 1. Pipeline API (standard workflows)
//!
//! Use when you want:
//! - The published workflows in a single call each
//! - A [`pipeline::CalibrationSession`] that owns geometry, model and data
//! - A per-stage [`pipeline::CalibrationReport`] of the refinement ladder
//!
//! Pick the entry point by your target and by what you trust:
//! `coplanar_*` for targets on the `z = 0` plane, `noncoplanar_*` for
//! targets spanning more than one plane, `*_extrinsic_estimation` when the
//! intrinsic parameters are already calibrated and only the pose is wanted.
//!
//! ```no_run
//! use tsai::core::{undistorted_image_plane_error_stats, CameraGeometry, CorrespondenceSet, Pt2, Pt3};
//! use tsai::pipeline::{
//!     noncoplanar_calibration_with_full_optimization, CalibrationSession, SolveOptions,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let world: Vec<Pt3> = /* surveyed target coordinates [mm] */
//! # vec![];
//! let image: Vec<Pt2> = /* measured feature locations [px] */
//! # vec![];
//!
//! let data = CorrespondenceSet::new(world, image)?;
//! let mut session = CalibrationSession::new(CameraGeometry::sony_xc75(), data);
//!
//! let report =
//!     noncoplanar_calibration_with_full_optimization(&mut session, &SolveOptions::default())?;
//!
//! println!(
//!     "f = {:.4} mm, kappa1 = {:.3e} 1/mm^2, sx = {:.6}",
//!     session.model.f, session.model.kappa1, session.geometry.sx
//! );
//! println!("converged: {}", report.converged());
//!
//! let stats =
//!     undistorted_image_plane_error_stats(&session.geometry, &session.model, &session.data);
//! println!("reprojection error: {:.3} +/- {:.3} px", stats.mean, stats.stddev);
//! # Ok(())
//! # }
//! ```
//!
//! ## 2. Layered API (custom workflows)
//!
//! Use when you need:
//! - Intermediate results (the closed-form seed before any refinement)
//! - A custom subset or ordering of the refinement stages
//! - Integration into a larger estimation problem
//!
//! Every closed-form seed and every refinement stage is an ordinary
//! function; the pipeline entry points are nothing but fixed sequences of
//! them.
//!
//! ```no_run
//! use tsai::core::{CameraGeometry, CameraModel, CorrespondenceSet};
//! use tsai::linear::{coplanar_seed, SensorObservations};
//! use tsai::optim::{coplanar, SolveOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let data = CorrespondenceSet::default();
//! let geom = CameraGeometry::photometrics_star_i();
//!
//! // Stage one, closed form: exact pose, approximate f and Tz, kappa1 = 0.
//! let obs = SensorObservations::from_image(&geom, &data);
//! let seed = coplanar_seed(&data.world, &obs)?;
//!
//! let mut model = CameraModel::default();
//! model.set_rotation(seed.rot);
//! model.tx = seed.tx;
//! model.ty = seed.ty;
//! model.tz = seed.tz;
//! model.f = seed.f;
//!
//! // Stage two: polish f and Tz, pick up the distortion coefficient.
//! let solve = coplanar::refine_f_tz_kappa(&geom, &mut model, &data, &SolveOptions::default())?;
//! println!("{} iterations, final cost {:.3e}", solve.iterations, solve.final_cost);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - **[`pipeline`]**: end-to-end workflows, [`pipeline::CalibrationSession`]
//!   and [`pipeline::CalibrationReport`]
//! - **[`core`]**: math types, camera geometry and model, coordinate
//!   transforms, accuracy metrics, synthetic targets
//! - **[`linear`]**: closed-form seeds (radial alignment constraint)
//! - **[`optim`]**: nonlinear Levenberg-Marquardt refinement stages
//! - **[`prelude`]**: convenient re-exports for common use cases
//!
//! ## Stability
//!
//! The `tsai` crate is the public compatibility boundary. Lower-level
//! crates are intended for advanced usage and may evolve more quickly.

/// End-to-end calibration workflows and the session/report types.
///
/// Use these when you want a single-call solution per workflow.
pub mod pipeline {
    pub use tsai_pipeline::*;
}

/// Core math types, camera descriptions, coordinate transforms, accuracy
/// metrics and synthetic targets.
///
/// This module contains the fundamental building blocks used throughout
/// the library.
pub mod core {
    pub use tsai_core::*;
}

/// Closed-form estimators built on the radial alignment constraint.
///
/// Use these for linear initialization before nonlinear refinement.
pub mod linear {
    pub use tsai_linear::*;
}

/// Nonlinear least-squares refinement stages.
///
/// Includes the coplanar, non-coplanar and extrinsic-only stage families
/// plus the shared Levenberg-Marquardt driver.
pub mod optim {
    pub use tsai_optim::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use tsai::prelude::*;` to get started quickly.
pub mod prelude {
    // Common types
    pub use crate::core::{
        CalibrationError, CameraGeometry, CameraModel, CorrespondenceSet, Pt2, Pt3, Real,
    };

    // Accuracy metrics
    pub use crate::core::{
        distorted_image_plane_error_stats, normalized_calibration_error,
        object_space_error_stats, undistorted_image_plane_error_stats, ErrorStats,
        NormalizedErrorStats,
    };

    // Pipeline API
    pub use crate::pipeline::{
        coplanar_calibration, coplanar_calibration_with_full_optimization,
        coplanar_extrinsic_estimation, noncoplanar_calibration,
        noncoplanar_calibration_with_full_optimization, noncoplanar_extrinsic_estimation,
        CalibrationReport, CalibrationSession, Stage, StageReport,
    };

    // Solver controls
    pub use crate::optim::{SolveOptions, SolveReport};
}
