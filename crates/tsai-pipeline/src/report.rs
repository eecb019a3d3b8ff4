//! Per-stage reports returned by the pipeline entry points.

use log::warn;
use serde::{Deserialize, Serialize};
use tsai_core::Real;
use tsai_optim::SolveReport;

/// Identifies one nonlinear stage of a calibration ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// `f`, `Tz`, `kappa1` with the pose frozen.
    FTzKappa,
    /// Image center stage, distortion applied on the observation side.
    CenterLateUndistortion,
    /// Image center stage, observations undistorted up front.
    CenterEarlyUndistortion,
    /// Pose, `kappa1`, `f` (and `sx` for non-coplanar data), center fixed.
    AllButCenter,
    /// Everything at once, image center included.
    Full,
    /// Extrinsic-only pose refinement.
    Pose,
}

impl Stage {
    /// Stable lowercase name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Stage::FTzKappa => "f/Tz/kappa",
            Stage::CenterLateUndistortion => "center (late undistortion)",
            Stage::CenterEarlyUndistortion => "center (early undistortion)",
            Stage::AllButCenter => "all but center",
            Stage::Full => "full",
            Stage::Pose => "pose",
        }
    }
}

/// Outcome of one nonlinear stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    /// Which stage ran.
    pub stage: Stage,
    /// Number of residual evaluations the stage used.
    pub iterations: usize,
    /// Half the residual sum of squares at the accepted parameters.
    pub final_cost: Real,
    /// Whether the optimizer met a convergence tolerance. Stages that run
    /// out of budget still commit their final parameters; this flag (and
    /// a logged warning) is how that shows up.
    pub converged: bool,
}

/// Everything the nonlinear ladder of one entry point did, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// One entry per stage, in execution order.
    pub stages: Vec<StageReport>,
}

impl CalibrationReport {
    /// Whether every stage met its convergence tolerances.
    pub fn converged(&self) -> bool {
        self.stages.iter().all(|s| s.converged)
    }

    /// Final cost of the last stage that ran, if any.
    pub fn final_cost(&self) -> Option<Real> {
        self.stages.last().map(|s| s.final_cost)
    }

    pub(crate) fn record(&mut self, stage: Stage, solve: SolveReport) {
        if !solve.converged {
            warn!(
                "{} stage stopped without meeting its tolerances; keeping its final parameters",
                stage.name()
            );
        }
        self.stages.push(StageReport {
            stage,
            iterations: solve.iterations,
            final_cost: solve.final_cost,
            converged: solve.converged,
        });
    }
}
