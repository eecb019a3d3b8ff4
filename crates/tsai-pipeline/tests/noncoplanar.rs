//! End-to-end non-coplanar calibration on synthetic targets.
//!
//! Covers scale factor recovery, the planar-data degeneracy, and noise
//! tolerance of the basic pipeline.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tsai_core::synthetic::{add_pixel_noise, block_points, grid_points, project_points};
use tsai_core::{
    distorted_image_plane_error_stats, undistorted_image_plane_error_stats, CalibrationError,
    CameraGeometry, CameraModel, CorrespondenceSet, Real,
};
use tsai_pipeline::{
    noncoplanar_calibration, noncoplanar_calibration_with_full_optimization, CalibrationSession,
    SolveOptions, Stage,
};

fn ground_truth(kappa1: Real) -> CameraModel {
    let mut truth = CameraModel {
        f: 10.0,
        kappa1,
        tx: -40.0,
        ty: -55.0,
        tz: 600.0,
        rx: 0.2,
        ry: -0.15,
        rz: 0.3,
        ..CameraModel::default()
    };
    truth.update_rotation_matrix();
    truth
}

fn volumetric_session(
    true_geom: &CameraGeometry,
    truth: &CameraModel,
    noise_sigma: Real,
    rng_seed: u64,
) -> CalibrationSession {
    let world = block_points(4, 4, 4, 25.0);
    let mut image = project_points(true_geom, truth, &world);
    add_pixel_noise(&mut image, noise_sigma, &mut StdRng::seed_from_u64(rng_seed));
    let data = CorrespondenceSet::new(world, image).unwrap();
    CalibrationSession::new(CameraGeometry::sony_xc75(), data)
}

#[test]
fn basic_pipeline_solves_the_scale_factor() {
    let mut true_geom = CameraGeometry::sony_xc75();
    true_geom.sx = 1.05;
    let truth = ground_truth(1.0e-3);
    let mut session = volumetric_session(&true_geom, &truth, 0.0, 0);

    let report = noncoplanar_calibration(&mut session, &SolveOptions::default()).unwrap();

    assert_eq!(report.stages.len(), 1);
    assert_eq!(report.stages[0].stage, Stage::FTzKappa);

    assert_relative_eq!(session.geometry.sx, true_geom.sx, max_relative = 1e-6);
    assert_relative_eq!(session.model.f, truth.f, max_relative = 1e-5);
    assert_relative_eq!(session.model.tz, truth.tz, max_relative = 1e-5);
    assert_relative_eq!(session.model.kappa1, truth.kappa1, max_relative = 1e-3);
    assert_relative_eq!(session.model.ty, truth.ty, max_relative = 1e-6);
    assert_relative_eq!(session.model.rx, truth.rx, epsilon = 1e-8);
}

#[test]
fn full_pipeline_recovers_scale_and_center() {
    let mut true_geom = CameraGeometry::sony_xc75();
    true_geom.sx = 1.04;
    true_geom.cx = 258.0;
    true_geom.cy = 243.0;
    let truth = ground_truth(1.0e-3);
    let mut session = volumetric_session(&true_geom, &truth, 0.0, 0);

    let report =
        noncoplanar_calibration_with_full_optimization(&mut session, &SolveOptions::default())
            .unwrap();

    let order: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
    assert_eq!(
        order,
        vec![Stage::FTzKappa, Stage::AllButCenter, Stage::Full]
    );
    assert!(report.final_cost().unwrap() < 1e-10);

    assert_relative_eq!(session.geometry.sx, true_geom.sx, max_relative = 1e-4);
    assert!((session.geometry.cx - true_geom.cx).abs() < 0.05);
    assert!((session.geometry.cy - true_geom.cy).abs() < 0.05);
    assert_relative_eq!(session.model.f, truth.f, max_relative = 1e-4);
    assert_relative_eq!(session.model.kappa1, truth.kappa1, max_relative = 1e-2);

    let stats = distorted_image_plane_error_stats(&session.geometry, &session.model, &session.data);
    assert!(stats.max < 1e-4, "max reprojection error {} px", stats.max);
}

#[test]
fn planar_data_is_reported_as_singular() {
    let geom = CameraGeometry::sony_xc75();
    let truth = ground_truth(0.0);
    // a single plane away from z = 0 passes validation but cannot
    // constrain the seven-unknown system
    let world = grid_points(4, 4, 25.0, 40.0);
    let image = project_points(&geom, &truth, &world);
    let data = CorrespondenceSet::new(world, image).unwrap();
    let mut session = CalibrationSession::new(geom, data);
    let before = session.clone();

    let err = noncoplanar_calibration(&mut session, &SolveOptions::default()).unwrap_err();
    assert!(matches!(err, CalibrationError::SingularSystem { .. }));
    assert_eq!(session, before);
}

#[test]
fn full_pipeline_matches_the_generator_under_pixel_noise() {
    // generator: f = 12 mm, kappa1 = 1e-4 1/mm^2, center (256, 240), sx = 1
    let geom = CameraGeometry::sony_xc75();
    let mut truth = CameraModel {
        f: 12.0,
        kappa1: 1.0e-4,
        tx: -45.0,
        ty: -50.0,
        tz: 550.0,
        rx: 0.2,
        ry: -0.15,
        rz: 0.3,
        ..CameraModel::default()
    };
    truth.update_rotation_matrix();

    let world = block_points(4, 4, 3, 30.0);
    let mut image = project_points(&geom, &truth, &world);
    add_pixel_noise(&mut image, 0.1, &mut StdRng::seed_from_u64(29));
    let data = CorrespondenceSet::new(world, image).unwrap();
    let mut session = CalibrationSession::new(CameraGeometry::sony_xc75(), data);

    let report =
        noncoplanar_calibration_with_full_optimization(&mut session, &SolveOptions::default())
            .unwrap();
    assert!(report.converged());

    assert_relative_eq!(session.model.f, truth.f, max_relative = 0.01);
    assert!((session.model.rx - truth.rx).abs() < 1e-3);
    assert!((session.model.ry - truth.ry).abs() < 1e-3);
    assert!((session.model.rz - truth.rz).abs() < 1e-3);

    // the fit should explain everything except the injected noise
    let stats =
        undistorted_image_plane_error_stats(&session.geometry, &session.model, &session.data);
    assert!(
        stats.mean > 0.02 && stats.mean < 0.4,
        "mean undistorted-plane error {} px",
        stats.mean
    );
}

#[test]
fn basic_pipeline_tolerates_pixel_noise() {
    let true_geom = CameraGeometry::sony_xc75();
    let truth = ground_truth(5.0e-4);
    let mut session = volumetric_session(&true_geom, &truth, 0.1, 11);

    noncoplanar_calibration(&mut session, &SolveOptions::default()).unwrap();

    assert_relative_eq!(session.model.f, truth.f, max_relative = 0.02);
    assert_relative_eq!(session.model.tz, truth.tz, max_relative = 0.02);
    assert_relative_eq!(session.geometry.sx, true_geom.sx, max_relative = 0.01);
    assert!((session.model.rx - truth.rx).abs() < 5e-3);
    assert!((session.model.ry - truth.ry).abs() < 5e-3);
    assert!((session.model.rz - truth.rz).abs() < 5e-3);

    let stats = distorted_image_plane_error_stats(&session.geometry, &session.model, &session.data);
    assert!(stats.mean < 0.5, "mean reprojection error {} px", stats.mean);
}
