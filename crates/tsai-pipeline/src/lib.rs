//! End-to-end Tsai calibration pipelines.
//!
//! Each entry point bundles a closed-form estimate with the matching
//! nonlinear refinement ladder and mutates a [`CalibrationSession`] in
//! place:
//!
//! - [`coplanar_calibration`] / [`coplanar_calibration_with_full_optimization`]
//!   for targets on the `z = 0` plane;
//! - [`noncoplanar_calibration`] / [`noncoplanar_calibration_with_full_optimization`]
//!   for targets spanning more than one plane (these also solve the
//!   horizontal scale factor `sx`);
//! - [`coplanar_extrinsic_estimation`] / [`noncoplanar_extrinsic_estimation`]
//!   for pose-only estimation with known intrinsics.
//!
//! All six return a [`CalibrationReport`] with one [`StageReport`] per
//! nonlinear stage. A stage that exhausts its budget without meeting a
//! tolerance still commits its parameters; that shows up as
//! `converged == false` plus a logged warning, never as an error.

mod coplanar;
mod extrinsic;
mod noncoplanar;
mod report;
mod session;

pub use coplanar::{
    coplanar_calibration, coplanar_calibration_with_full_optimization, MIN_COPLANAR_POINTS,
};
pub use extrinsic::{coplanar_extrinsic_estimation, noncoplanar_extrinsic_estimation};
pub use noncoplanar::{
    noncoplanar_calibration, noncoplanar_calibration_with_full_optimization,
    MIN_NONCOPLANAR_POINTS,
};
pub use report::{CalibrationReport, Stage, StageReport};
pub use session::CalibrationSession;

pub use tsai_optim::{SolveOptions, SolveReport};
