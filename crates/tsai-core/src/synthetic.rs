//! Synthetic target helpers for tests and examples.
//!
//! The functions here build simple calibration targets (planar grids and
//! 3D lattices), project them through a camera, and perturb the projected
//! pixels with Gaussian noise.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::camera::CameraGeometry;
use crate::math::{Pt2, Pt3, Real};
use crate::model::CameraModel;
use crate::transform::world_to_image;

/// Generate a planar grid of `nx * ny` points at height `z`.
///
/// Points are ordered deterministically in row-major order (Y major):
/// `(x = 0..nx-1, y = 0..ny-1)`.
pub fn grid_points(nx: usize, ny: usize, spacing: Real, z: Real) -> Vec<Pt3> {
    let mut points = Vec::with_capacity(nx.saturating_mul(ny));
    for j in 0..ny {
        for i in 0..nx {
            points.push(Pt3::new(i as Real * spacing, j as Real * spacing, z));
        }
    }
    points
}

/// Generate a 3D lattice of `nx * ny * nz` points.
///
/// The output is deterministic: Z major, then Y, then X.
pub fn block_points(nx: usize, ny: usize, nz: usize, spacing: Real) -> Vec<Pt3> {
    let mut points = Vec::with_capacity(nx.saturating_mul(ny).saturating_mul(nz));
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                points.push(Pt3::new(
                    i as Real * spacing,
                    j as Real * spacing,
                    k as Real * spacing,
                ));
            }
        }
    }
    points
}

/// Project world points through the camera into image coordinates.
pub fn project_points(
    geom: &CameraGeometry,
    model: &CameraModel,
    points: &[Pt3],
) -> Vec<Pt2> {
    points
        .iter()
        .map(|&pw| world_to_image(geom, model, pw))
        .collect()
}

/// Add zero-mean Gaussian noise with standard deviation `sigma` \[px\] to
/// each pixel coordinate. A non-positive `sigma` leaves the pixels alone.
pub fn add_pixel_noise<R: Rng>(pixels: &mut [Pt2], sigma: Real, rng: &mut R) {
    if sigma <= 0.0 {
        return;
    }
    let Ok(dist) = Normal::new(0.0, sigma) else {
        return;
    };
    for p in pixels.iter_mut() {
        p.x += dist.sample(rng);
        p.y += dist.sample(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn grid_points_order_is_stable() {
        let pts = grid_points(2, 3, 0.5, 10.0);
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[0], Pt3::new(0.0, 0.0, 10.0));
        assert_eq!(pts[1], Pt3::new(0.5, 0.0, 10.0));
        assert_eq!(pts[2], Pt3::new(0.0, 0.5, 10.0));
    }

    #[test]
    fn block_points_cover_every_lattice_site() {
        let pts = block_points(3, 2, 2, 1.0);
        assert_eq!(pts.len(), 12);
        assert_eq!(pts[0], Pt3::new(0.0, 0.0, 0.0));
        assert_eq!(pts[11], Pt3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn noise_is_reproducible_for_a_fixed_seed() {
        let mut a = vec![Pt2::new(1.0, 2.0), Pt2::new(3.0, 4.0)];
        let mut b = a.clone();
        add_pixel_noise(&mut a, 0.5, &mut StdRng::seed_from_u64(7));
        add_pixel_noise(&mut b, 0.5, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_ne!(a[0], Pt2::new(1.0, 2.0));
    }

    #[test]
    fn zero_sigma_leaves_pixels_untouched() {
        let mut pixels = vec![Pt2::new(5.0, 6.0)];
        add_pixel_noise(&mut pixels, 0.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(pixels[0], Pt2::new(5.0, 6.0));
    }
}
