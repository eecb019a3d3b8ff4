//! Nonlinear refinement stages for Tsai camera calibration.
//!
//! The closed-form estimators leave a model that is exact in the
//! rotation and in-plane translation but only approximate in `f`, `Tz`
//! and anything the linear stage had to assume (zero distortion, the
//! nominal image center, the nominal scale factor). The stages in this
//! crate polish those parameters by Levenberg-Marquardt, minimizing
//! pointwise reprojection distances in the undistorted sensor plane.
//!
//! Stage functions come in three families, one module each:
//! [`coplanar`], [`noncoplanar`] and [`extrinsic`]. Each stage reads its
//! starting point from the model (and geometry), minimizes, and writes
//! the accepted parameters back, so chaining stages is just calling them
//! in order.

pub mod coplanar;
pub mod extrinsic;
pub mod noncoplanar;

mod lm;

pub use lm::{optimize, ResidualProblem, SolveOptions, SolveReport};
