//! Levenberg-Marquardt driver shared by all refinement stages.
//!
//! Stages describe themselves through [`ResidualProblem`]; the driver
//! wraps them for the `levenberg_marquardt` crate and differentiates
//! numerically by forward differences, so stages never spell out a
//! Jacobian. Residual evaluation is fallible: the stages that re-derive
//! the pose from the closed form at every trial point can hit singular
//! systems, and such a failure aborts the minimization and surfaces as
//! the returned error.

use std::cell::RefCell;

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use log::warn;
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn};
use tsai_core::{CalibrationError, Real};

/// Forward-difference step floor, relative to machine epsilon.
const EPSFCN: Real = 1.0e-16;

/// Nonlinear least-squares problem over a dense parameter vector.
pub trait ResidualProblem {
    /// Residual vector at `x`, one entry per correspondence.
    fn residuals(&self, x: &DVector<Real>) -> Result<DVector<Real>, CalibrationError>;
}

/// Termination tolerances for the minimization.
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    /// Maximum number of solver iterations before giving up.
    pub max_iters: usize,
    /// Relative tolerance on the residual sum of squares.
    pub ftol: Real,
    /// Relative tolerance on parameter updates.
    pub xtol: Real,
    /// Orthogonality tolerance between the residuals and the Jacobian
    /// columns; zero disables the test.
    pub gtol: Real,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            ftol: 1.0e-5,
            xtol: 1.0e-7,
            gtol: 0.0,
        }
    }
}

/// What the minimization did, reported by every refinement stage.
#[derive(Debug, Clone, Copy)]
pub struct SolveReport {
    /// Number of residual evaluations.
    pub iterations: usize,
    /// Half the residual sum of squares at the final parameters.
    pub final_cost: Real,
    /// Whether a convergence criterion was met (as opposed to running
    /// out of iterations or stalling numerically).
    pub converged: bool,
}

struct LmWrapper<'a, P: ResidualProblem> {
    problem: &'a P,
    params: DVector<Real>,
    failure: RefCell<Option<CalibrationError>>,
}

impl<P: ResidualProblem> LmWrapper<'_, P> {
    fn eval(&self, x: &DVector<Real>) -> Option<DVector<Real>> {
        match self.problem.residuals(x) {
            Ok(r) => Some(r),
            Err(err) => {
                self.failure.replace(Some(err));
                None
            }
        }
    }
}

impl<P: ResidualProblem> LeastSquaresProblem<Real, Dyn, Dyn> for LmWrapper<'_, P> {
    type ResidualStorage = Owned<Real, Dyn>;
    type JacobianStorage = Owned<Real, Dyn, Dyn>;
    type ParameterStorage = Owned<Real, Dyn>;

    fn set_params(&mut self, x: &DVector<Real>) {
        self.params.clone_from(x);
    }

    fn params(&self) -> DVector<Real> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<Real>> {
        self.eval(&self.params)
    }

    fn jacobian(&self) -> Option<DMatrix<Real>> {
        let base = self.eval(&self.params)?;
        let n = self.params.len();
        let scale = EPSFCN.max(Real::EPSILON).sqrt();
        let mut jac = DMatrix::zeros(base.len(), n);
        let mut x = self.params.clone();
        for j in 0..n {
            let xj = x[j];
            let mut h = scale * xj.abs();
            if h == 0.0 {
                h = scale;
            }
            x[j] = xj + h;
            let shifted = self.eval(&x)?;
            x[j] = xj;
            jac.set_column(j, &((shifted - &base) / h));
        }
        Some(jac)
    }
}

/// Minimize `problem` starting from `x0`.
///
/// An underdetermined system (fewer residuals than parameters) is left
/// at its starting point with `converged == false`, matching how the
/// staged drivers treat a stage they cannot run.
pub fn optimize<P: ResidualProblem>(
    problem: &P,
    x0: DVector<Real>,
    opts: &SolveOptions,
) -> Result<(DVector<Real>, SolveReport), CalibrationError> {
    let r0 = problem.residuals(&x0)?;
    if r0.len() < x0.len() {
        warn!(
            "{} residuals cannot constrain {} parameters, leaving the estimate unchanged",
            r0.len(),
            x0.len()
        );
        let final_cost = 0.5 * r0.norm_squared();
        return Ok((
            x0,
            SolveReport {
                iterations: 0,
                final_cost,
                converged: false,
            },
        ));
    }

    let lm = LevenbergMarquardt::new()
        .with_ftol(opts.ftol)
        .with_xtol(opts.xtol)
        .with_gtol(opts.gtol)
        .with_patience(opts.max_iters.max(1));

    let wrapper = LmWrapper {
        problem,
        params: x0,
        failure: RefCell::new(None),
    };

    let (wrapper, report) = lm.minimize(wrapper);
    if let Some(err) = wrapper.failure.into_inner() {
        return Err(err);
    }
    Ok((
        wrapper.params,
        SolveReport {
            iterations: report.number_of_evaluations,
            final_cost: report.objective_function,
            converged: report.termination.was_successful(),
        },
    ))
}
