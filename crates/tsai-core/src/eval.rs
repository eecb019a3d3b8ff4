//! Accuracy metrics for a fitted model against its calibration data.
//!
//! All four metrics reduce per-point error magnitudes to summary
//! statistics; none of them mutates the data set. The normalized metric is
//! the one proposed by Weng, Cohen and Herniou (IEEE PAMI 14(10), 1992).

use serde::{Deserialize, Serialize};

use crate::camera::CameraGeometry;
use crate::data::CorrespondenceSet;
use crate::math::Real;
use crate::model::CameraModel;
use crate::transform::{image_to_distorted_sensor, world_to_camera, world_to_image};

/// Mean, sample standard deviation, maximum and sum of squared errors.
///
/// The standard deviation uses the N-1 denominator and is 0 for a single
/// point; every field is 0 for an empty data set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub mean: Real,
    pub stddev: Real,
    pub max: Real,
    pub sse: Real,
}

/// Mean and sample standard deviation of the normalized (Weng) error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedErrorStats {
    pub mean: Real,
    pub stddev: Real,
}

fn reduce(squared_errors: impl Iterator<Item = Real>) -> ErrorStats {
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut sse = 0.0;
    let mut max = 0.0;
    for sq in squared_errors {
        let error = sq.sqrt();
        n += 1;
        sum += error;
        sse += sq;
        if error > max {
            max = error;
        }
    }
    if n < 1 {
        return ErrorStats::default();
    }
    let count = n as Real;
    let stddev = if n == 1 {
        0.0
    } else {
        // the numerator can cancel to a tiny negative value on noise-free data
        (((sse - sum * sum / count) / (count - 1.0)).max(0.0)).sqrt()
    };
    ErrorStats {
        mean: sum / count,
        stddev,
        max,
        sse,
    }
}

/// Reprojection error in distorted image coordinates \[px\].
pub fn distorted_image_plane_error_stats(
    geom: &CameraGeometry,
    model: &CameraModel,
    data: &CorrespondenceSet,
) -> ErrorStats {
    reduce(data.world.iter().zip(&data.image).map(|(&pw, &pi)| {
        let predicted = world_to_image(geom, model, pw);
        let dx = predicted.x - pi.x;
        let dy = predicted.y - pi.y;
        dx * dx + dy * dy
    }))
}

/// Reprojection error in undistorted image coordinates \[px equivalents\].
///
/// Both the prediction and the measurement are compared on the undistorted
/// sensor plane; the difference is scaled back to pixel units per axis.
pub fn undistorted_image_plane_error_stats(
    geom: &CameraGeometry,
    model: &CameraModel,
    data: &CorrespondenceSet,
) -> ErrorStats {
    reduce(data.world.iter().zip(&data.image).map(|(&pw, &pi)| {
        let pc = world_to_camera(model, pw);
        let xu_pre = model.f * pc.x / pc.z;
        let yu_pre = model.f * pc.y / pc.z;

        let sd = image_to_distorted_sensor(geom, pi);
        let factor = 1.0 + model.kappa1 * (sd.x * sd.x + sd.y * sd.y);
        let xu_meas = sd.x * factor;
        let yu_meas = sd.y * factor;

        let x_pixel_error = geom.sx * (xu_pre - xu_meas) / geom.dpx;
        let y_pixel_error = (yu_pre - yu_meas) / geom.dpy;
        x_pixel_error * x_pixel_error + y_pixel_error * y_pixel_error
    }))
}

/// Distance of closest approach \[mm\] between each world point and the
/// line of sight back-projected through its measured image location.
pub fn object_space_error_stats(
    geom: &CameraGeometry,
    model: &CameraModel,
    data: &CorrespondenceSet,
) -> ErrorStats {
    reduce(data.world.iter().zip(&data.image).map(|(&pw, &pi)| {
        let pc = world_to_camera(model, pw);

        let sd = image_to_distorted_sensor(geom, pi);
        let factor = 1.0 + model.kappa1 * (sd.x * sd.x + sd.y * sd.y);
        let xu = sd.x * factor;
        let yu = sd.y * factor;

        // closest point on the ray through (xu, yu, f)
        let t = (pc.x * xu + pc.y * yu + pc.z * model.f)
            / (xu * xu + yu * yu + model.f * model.f);
        let ex = pc.x - xu * t;
        let ey = pc.y - yu * t;
        let ez = pc.z - model.f * t;
        ex * ex + ey * ey + ez * ez
    }))
}

/// Normalized calibration error after Weng et al.
///
/// Each measured point is back-projected onto the plane at its true
/// camera-frame depth and the squared discrepancy is normalized by the
/// depth-scaled pixel variance term `zc^2 * (1/fu^2 + 1/fv^2) / 12`.
pub fn normalized_calibration_error(
    geom: &CameraGeometry,
    model: &CameraModel,
    data: &CorrespondenceSet,
) -> NormalizedErrorStats {
    let fu = geom.sx * model.f / geom.dpx;
    let fv = model.f / geom.dpy;
    let focal_term = 1.0 / (fu * fu) + 1.0 / (fv * fv);

    let stats = reduce(data.world.iter().zip(&data.image).map(|(&pw, &pi)| {
        let pc = world_to_camera(model, pw);

        let sd = image_to_distorted_sensor(geom, pi);
        let factor = 1.0 + model.kappa1 * (sd.x * sd.x + sd.y * sd.y);
        let xu = sd.x * factor;
        let yu = sd.y * factor;

        let xc_est = pc.z * xu / model.f;
        let yc_est = pc.z * yu / model.f;

        let ex = xc_est - pc.x;
        let ey = yc_est - pc.y;
        (ex * ex + ey * ey) / (pc.z * pc.z * focal_term / 12.0)
    }));

    NormalizedErrorStats {
        mean: stats.mean,
        stddev: stats.stddev,
    }
}
