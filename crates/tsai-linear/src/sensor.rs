//! Per-point sensor-plane scratch shared by the closed-form stages.

use tsai_core::{image_to_distorted_sensor, CameraGeometry, CorrespondenceSet, Pt2, Real};

/// Measured image points mapped onto the sensor plane, together with
/// their squared radial distances from the sensor origin.
///
/// Freshly built observations hold distorted coordinates; calling
/// [`SensorObservations::remove_distortion`] rewrites them in place with
/// their undistorted counterparts, which is how the stages that assume a
/// known `kappa1` operate.
#[derive(Debug, Clone)]
pub struct SensorObservations {
    /// Sensor x coordinate of each point \[mm\].
    pub xd: Vec<Real>,
    /// Sensor y coordinate of each point \[mm\].
    pub yd: Vec<Real>,
    /// Squared distance of each point from the sensor origin \[mm^2\].
    pub r_squared: Vec<Real>,
}

impl SensorObservations {
    /// Map the measured image points of `data` onto the distorted sensor
    /// plane using the current geometry (`cx`, `cy`, `sx`).
    pub fn from_image(geom: &CameraGeometry, data: &CorrespondenceSet) -> Self {
        let mut xd = Vec::with_capacity(data.len());
        let mut yd = Vec::with_capacity(data.len());
        let mut r_squared = Vec::with_capacity(data.len());
        for pi in &data.image {
            let sd = image_to_distorted_sensor(geom, *pi);
            xd.push(sd.x);
            yd.push(sd.y);
            r_squared.push(sd.x * sd.x + sd.y * sd.y);
        }
        Self { xd, yd, r_squared }
    }

    /// Build observations and immediately remove a known radial
    /// distortion, as the extrinsic-only estimators do.
    pub fn undistorted(geom: &CameraGeometry, kappa1: Real, data: &CorrespondenceSet) -> Self {
        let mut obs = Self::from_image(geom, data);
        obs.remove_distortion(kappa1);
        obs
    }

    /// Rewrite the stored coordinates with `s_u = s_d * (1 + kappa1 * r^2)`
    /// and recompute the squared radii to match.
    pub fn remove_distortion(&mut self, kappa1: Real) {
        for i in 0..self.xd.len() {
            let factor = 1.0 + kappa1 * self.r_squared[i];
            self.xd[i] *= factor;
            self.yd[i] *= factor;
            self.r_squared[i] = self.xd[i] * self.xd[i] + self.yd[i] * self.yd[i];
        }
    }

    /// Index of the observation farthest from the sensor origin.
    ///
    /// The translation sign test is evaluated at this point because it is
    /// the least likely to sit near the optical axis, where both
    /// projections change sign.
    pub fn farthest_point(&self) -> usize {
        let mut far = 0;
        let mut far_r2 = 0.0;
        for (i, &r2) in self.r_squared.iter().enumerate() {
            if r2 > far_r2 {
                far = i;
                far_r2 = r2;
            }
        }
        far
    }

    pub fn len(&self) -> usize {
        self.xd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xd.is_empty()
    }
}

/// Index of the measured image point farthest from the image center.
///
/// The extrinsic-only estimators run their sign test against raw pixel
/// offsets since the image center is trusted input there.
pub(crate) fn farthest_pixel(geom: &CameraGeometry, data: &CorrespondenceSet) -> usize {
    let mut far = 0;
    let mut far_d2 = 0.0;
    for (i, pi) in data.image.iter().enumerate() {
        let d2 = pixel_offset_squared(geom, *pi);
        if d2 > far_d2 {
            far = i;
            far_d2 = d2;
        }
    }
    far
}

pub(crate) fn pixel_offset_squared(geom: &CameraGeometry, pi: Pt2) -> Real {
    let dx = pi.x - geom.cx;
    let dy = pi.y - geom.cy;
    dx * dx + dy * dy
}

/// True when `a` and `b` fall on the same side of zero, with zero itself
/// counted as negative.
pub(crate) fn sign_match(a: Real, b: Real) -> bool {
    (a > 0.0) == (b > 0.0)
}
