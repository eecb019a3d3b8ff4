//! Dense least-squares solve shared by the closed-form estimators.

use nalgebra::{DMatrix, DVector};
use tsai_core::{CalibrationError, Real};

/// Relative singular value cutoff for rank detection.
const RANK_REL_EPS: Real = 1.0e-12;

/// Solve the (usually overdetermined) system `M a = b` in the
/// least-squares sense via SVD.
///
/// A rank-deficient design matrix is reported as
/// [`CalibrationError::SingularSystem`] with `context` naming the system
/// being solved.
pub(crate) fn solve_least_squares(
    m: DMatrix<Real>,
    b: DVector<Real>,
    context: &'static str,
) -> Result<DVector<Real>, CalibrationError> {
    let cols = m.ncols();
    let svd = m.svd(true, true);
    let eps = svd.singular_values.max() * RANK_REL_EPS;
    if svd.rank(eps) < cols {
        return Err(CalibrationError::SingularSystem { context });
    }
    svd.solve(&b, eps)
        .map_err(|_| CalibrationError::SingularSystem { context })
}
