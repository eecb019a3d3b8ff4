//! Closed-form estimators for Tsai camera calibration.
//!
//! These are the first-stage solvers: small dense least-squares systems
//! built from the radial alignment constraint that seed the nonlinear
//! refinement with a pose, an approximate focal length and (for
//! non-coplanar targets) the horizontal scale factor. A separate pair of
//! entry points recovers the pose alone for a camera whose intrinsic
//! parameters are already known.

mod coplanar;
mod extrinsic;
mod lstsq;
mod noncoplanar;
mod sensor;

pub use coplanar::{coplanar_seed, CoplanarSeed};
pub use extrinsic::{coplanar_extrinsic_seed, noncoplanar_extrinsic_seed, ExtrinsicSeed};
pub use noncoplanar::{noncoplanar_seed, NonCoplanarSeed};
pub use sensor::SensorObservations;
