//! Lattice recovery on synthetic point sets.

use gridfit::{fit_grid, FitConfig, FitResult, LatticeFitter, Point2D};
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, PI};

/// Length tolerance as a fraction of the true spacing.
const LENGTH_TOLERANCE: f64 = 0.02;

/// Angle tolerance in degrees.
const ANGLE_TOLERANCE_DEG: f64 = 1.0;

/// Distance from any input point to its fitted node, in pixels.
const NODE_TOLERANCE_PX: f64 = 2.0;

/// Synthetic lattice description.
#[derive(Debug, Deserialize)]
struct LatticeCase {
    case_id: String,
    spacing: f64,
    angle_deg: f64,
    basis_angle_deg: f64,
    origin: [f64; 2],
    count: usize,
    canvas: usize,
}

const CASES_JSON: &str = r#"[
  { "case_id": "square_axis_aligned", "spacing": 50.0, "angle_deg": 0.0,
    "basis_angle_deg": 90.0, "origin": [60.0, 70.0], "count": 7, "canvas": 400 },
  { "case_id": "square_fine_pitch", "spacing": 30.0, "angle_deg": 0.0,
    "basis_angle_deg": 90.0, "origin": [37.0, 41.0], "count": 10, "canvas": 400 },
  { "case_id": "square_rotated", "spacing": 40.0, "angle_deg": 12.0,
    "basis_angle_deg": 90.0, "origin": [100.0, 60.0], "count": 8, "canvas": 500 },
  { "case_id": "hexagonal_rotated", "spacing": 45.0, "angle_deg": 12.0,
    "basis_angle_deg": 60.0, "origin": [80.0, 60.0], "count": 8, "canvas": 500 }
]"#;

fn lattice_points(case: &LatticeCase) -> Vec<Point2D> {
    let a = case.angle_deg.to_radians();
    let b = a + case.basis_angle_deg.to_radians();
    let u = [case.spacing * a.cos(), case.spacing * a.sin()];
    let v = [case.spacing * b.cos(), case.spacing * b.sin()];
    let limit = case.canvas as f64;
    let mut points = Vec::new();
    for j in 0..case.count {
        for i in 0..case.count {
            let x = case.origin[0] + i as f64 * u[0] + j as f64 * v[0];
            let y = case.origin[1] + i as f64 * u[1] + j as f64 * v[1];
            if (0.0..limit).contains(&x) && (0.0..limit).contains(&y) {
                points.push(Point2D::new(x.round() as usize, y.round() as usize));
            }
        }
    }
    points
}

/// Undirected angle difference in degrees.
fn angle_diff_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(PI);
    d.min(PI - d).to_degrees()
}

/// Difference of two offsets modulo the lattice period.
fn offset_diff(a: f64, b: f64, period: f64) -> f64 {
    let d = (a - b).rem_euclid(period);
    d.min(period - d)
}

fn max_node_distance(fit: &FitResult, points: &[Point2D], canvas: usize) -> f64 {
    let nodes = fit.nodes_within(canvas, canvas);
    points
        .iter()
        .map(|p| {
            nodes
                .iter()
                .map(|&(x, y)| ((x - p.x as f64).powi(2) + (y - p.y as f64).powi(2)).sqrt())
                .fold(f64::INFINITY, f64::min)
        })
        .fold(0.0, f64::max)
}

#[test]
fn recovers_axis_aligned_square_grid() {
    let points: Vec<Point2D> = (0..7)
        .flat_map(|j| (0..7).map(move |i| Point2D::new(60 + 50 * i, 70 + 50 * j)))
        .collect();
    let fit = fit_grid(&points, 400, 400, FRAC_PI_2).expect("fit");

    assert!((fit.lattice.a - 50.0).abs() <= 50.0 * LENGTH_TOLERANCE);
    assert_eq!(fit.lattice.a, fit.lattice.b);
    assert!(angle_diff_deg(fit.lattice.alpha, 0.0) <= ANGLE_TOLERANCE_DEG);
    assert!(angle_diff_deg(fit.lattice.beta, FRAC_PI_2) <= ANGLE_TOLERANCE_DEG);
    // Canvas centre is (200, 200); the grid origin (60, 70) sits 10 / 20 px
    // past a lattice node counted from the centre.
    assert!(offset_diff(fit.tx, 10.0, 50.0) <= 2.0, "tx {}", fit.tx);
    assert!(offset_diff(fit.ty, 20.0, 50.0) <= 2.0, "ty {}", fit.ty);
    assert_eq!(fit.inliers, 47);
    assert!(fit.final_loss <= fit.initial_loss);
}

#[test]
fn recovers_synthetic_lattice_table() {
    let cases: Vec<LatticeCase> = serde_json::from_str(CASES_JSON).unwrap();
    for case in &cases {
        let points = lattice_points(case);
        let basis_angle = case.basis_angle_deg.to_radians();
        let fit = fit_grid(&points, case.canvas, case.canvas, basis_angle)
            .unwrap_or_else(|| panic!("{}: no fit", case.case_id));

        let rel = (fit.lattice.a - case.spacing).abs() / case.spacing;
        assert!(rel <= LENGTH_TOLERANCE, "{}: a = {}", case.case_id, fit.lattice.a);

        // The fitted first axis may be any lattice direction.
        let truth = case.angle_deg.to_radians();
        let best = (0..3)
            .map(|k| angle_diff_deg(fit.lattice.alpha, truth + k as f64 * basis_angle))
            .fold(f64::INFINITY, f64::min);
        assert!(best <= ANGLE_TOLERANCE_DEG, "{}: alpha off by {best}", case.case_id);
        assert!(
            angle_diff_deg(fit.lattice.beta - fit.lattice.alpha, basis_angle) < 1e-9,
            "{}",
            case.case_id
        );

        let worst = max_node_distance(&fit, &points, case.canvas);
        assert!(worst <= NODE_TOLERANCE_PX, "{}: worst node distance {worst}", case.case_id);
        assert!(fit.final_loss <= fit.initial_loss, "{}", case.case_id);
    }
}

#[test]
fn refinement_reduces_rounding_loss() {
    let cases: Vec<LatticeCase> = serde_json::from_str(CASES_JSON).unwrap();
    let case = cases
        .iter()
        .find(|c| c.case_id == "square_rotated")
        .unwrap();
    let points = lattice_points(case);
    let fit = fit_grid(&points, case.canvas, case.canvas, FRAC_PI_2).unwrap();
    assert!(fit.iterations > 0);
    assert!(fit.final_loss < fit.initial_loss);
    // Rounding to whole pixels leaves about 1/6 px^2 of irreducible error.
    assert!(fit.final_loss < 0.5, "final loss {}", fit.final_loss);
}

#[test]
fn stray_points_are_trimmed() {
    let mut points: Vec<Point2D> = (0..8)
        .flat_map(|j| (0..8).map(move |i| Point2D::new(40 + 40 * i, 40 + 40 * j)))
        .collect();
    points.push(Point2D::new(61, 58));
    points.push(Point2D::new(222, 141));
    let fit = fit_grid(&points, 400, 400, FRAC_PI_2).expect("fit");
    assert_eq!(fit.inliers, 66 - 3);
    assert!((fit.lattice.a - 40.0).abs() <= 40.0 * LENGTH_TOLERANCE);
}

#[test]
fn two_points_yield_no_fit() {
    let points = [Point2D::new(10, 10), Point2D::new(60, 10)];
    assert!(fit_grid(&points, 100, 100, FRAC_PI_2).is_none());
}

#[test]
fn collinear_points_yield_no_fit() {
    let points: Vec<Point2D> = (0..10).map(|i| Point2D::new(20 + 30 * i, 50)).collect();
    assert!(fit_grid(&points, 400, 100, FRAC_PI_2).is_none());
}

#[test]
fn weak_secondary_direction_is_rejected() {
    // A long row with a single point off-axis: the vertical bin holds far
    // fewer votes than the configured ratio requires.
    let mut points: Vec<Point2D> = (0..12).map(|i| Point2D::new(20 + 20 * i, 100)).collect();
    points.push(Point2D::new(20, 80));
    let cfg = FitConfig {
        min_secondary_ratio: 0.5,
        ..FitConfig::default()
    };
    let fitter = LatticeFitter::new(cfg).unwrap();
    assert!(fitter.fit(&points, 300, 200).is_none());
}

#[test]
fn fitting_is_deterministic() {
    let cases: Vec<LatticeCase> = serde_json::from_str(CASES_JSON).unwrap();
    let points = lattice_points(&cases[3]);
    let a = fit_grid(&points, 500, 500, cases[3].basis_angle_deg.to_radians());
    let b = fit_grid(&points, 500, 500, cases[3].basis_angle_deg.to_radians());
    assert_eq!(a, b);
}
