//! Sensor and frame-grabber geometry.

use serde::{Deserialize, Serialize};

use crate::math::Real;

/// Fixed camera/digitizer geometry: how the CCD maps onto frame buffer
/// pixels, plus the distortion center and the horizontal scale factor.
///
/// Distances are in millimetres, image coordinates in pixels. `dpx`/`dpy`
/// are the effective pixel sizes after digitization; for most hardware
/// `dpx = dx * ncx / nfx` and `dpy = dy`. `cx`, `cy` and `sx` start as
/// estimates and are refined by the full calibration variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraGeometry {
    /// Number of sensor elements in a row.
    pub ncx: Real,
    /// Number of pixels sampled per row by the frame grabber.
    pub nfx: Real,
    /// Size of a sensor element in x \[mm\].
    pub dx: Real,
    /// Size of a sensor element in y \[mm\].
    pub dy: Real,
    /// Effective pixel size in x \[mm/px\].
    pub dpx: Real,
    /// Effective pixel size in y \[mm/px\].
    pub dpy: Real,
    /// Distortion center x \[px\].
    pub cx: Real,
    /// Distortion center y \[px\].
    pub cy: Real,
    /// Horizontal scale uncertainty factor, > 0.
    pub sx: Real,
}

impl CameraGeometry {
    /// Geometry for an idealized camera derived from an image size alone:
    /// unit pixel sizes and the distortion center at the image midpoint.
    pub fn from_image_size(width: usize, height: usize) -> Self {
        Self {
            ncx: width as Real,
            nfx: width as Real,
            dx: 1.0,
            dy: 1.0,
            dpx: 1.0,
            dpy: 1.0,
            cx: width as Real / 2.0,
            cy: height as Real / 2.0,
            sx: 1.0,
        }
    }

    /// Photometrics STAR I camera.
    pub fn photometrics_star_i() -> Self {
        Self::from_sensor(576.0, 576.0, 0.023, 0.023, 258.0, 204.0, 1.0)
    }

    /// General Imaging MOS5300 camera with a Matrox frame grabber.
    pub fn general_imaging_mos5300() -> Self {
        Self::from_sensor(649.0, 512.0, 0.015, 0.015, 256.0, 240.0, 1.0)
    }

    /// Panasonic GP-MF702 camera with a Matrox frame grabber.
    pub fn panasonic_gp_mf702() -> Self {
        Self::from_sensor(649.0, 512.0, 0.015, 0.015, 268.0, 248.0, 1.078647)
    }

    /// Sony XC75 camera with a Matrox frame grabber.
    pub fn sony_xc75() -> Self {
        Self::from_sensor(768.0, 512.0, 0.0084, 0.0098, 256.0, 240.0, 1.0)
    }

    /// Sony XC77 camera with a Matrox frame grabber.
    pub fn sony_xc77() -> Self {
        Self::from_sensor(768.0, 512.0, 0.011, 0.013, 256.0, 240.0, 1.0)
    }

    /// Sony XC57 camera with an Androx frame grabber.
    pub fn sony_xc57() -> Self {
        Self::from_sensor(510.0, 512.0, 0.017, 0.013, 256.0, 240.0, 1.107914)
    }

    /// Canon Xap Shot camera with a Matrox frame grabber.
    pub fn canon_xapshot() -> Self {
        Self::from_sensor(739.0, 512.0, 6.4 / 782.0, 4.8 / 250.0, 256.0, 120.0, 1.027753)
    }

    fn from_sensor(ncx: Real, nfx: Real, dx: Real, dy: Real, cx: Real, cy: Real, sx: Real) -> Self {
        Self {
            ncx,
            nfx,
            dx,
            dy,
            dpx: dx * ncx / nfx,
            dpy: dy,
            cx,
            cy,
            sx,
        }
    }
}
