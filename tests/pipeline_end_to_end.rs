//! Detection and fitting on a synthetic micropattern image.
//!
//! The image is a 10 x 10 array of 30 px textured islands on a 50 px pitch
//! over a flat background. Variance lights up the islands, the background
//! lanes between them stay open, and the distance-transform peaks land in
//! the lane crossings.
//!
//! A plain checkerboard behaves differently: every cell edge is textured, so
//! each inner cell is background fully enclosed by foreground and hole
//! filling turns it into foreground. Only the cells on the right and bottom
//! edges stay open to the border and produce peaks.

use gridfit::{detect_grid_points, fit_grid, DetectConfig, GridDetector, ScalarField};
use std::f64::consts::FRAC_PI_2;

const CANVAS: usize = 500;
const PITCH: usize = 50;
const ISLAND: usize = 30;
const MARGIN: usize = 10;

fn checkerboard() -> ScalarField {
    ScalarField::from_fn(CANVAS, CANVAS, |x, y| {
        if (x / PITCH + y / PITCH) % 2 == 0 {
            40.0
        } else {
            220.0
        }
    })
    .unwrap()
}

fn micropattern() -> ScalarField {
    ScalarField::from_fn(CANVAS, CANVAS, |x, y| {
        let inside = |v: usize| v >= MARGIN && (v - MARGIN) % PITCH < ISLAND;
        if inside(x) && inside(y) {
            if (x + y) % 2 == 0 {
                40.0
            } else {
                220.0
            }
        } else {
            128.0
        }
    })
    .unwrap()
}

#[test]
fn detects_lane_crossings() {
    let image = micropattern();
    let points = detect_grid_points(&image, 5);
    assert!(points.len() >= 30, "only {} points", points.len());
    for p in &points {
        // Crossings of the background lanes sit around 49..50 (mod 50).
        let (mx, my) = (p.x % PITCH, p.y % PITCH);
        assert!((45..PITCH).contains(&mx) || mx < 5, "x {}", p.x);
        assert!((45..PITCH).contains(&my) || my < 5, "y {}", p.y);
    }
}

#[test]
fn fitted_pitch_matches_pattern() {
    let image = micropattern();
    let points = detect_grid_points(&image, 5);
    let fit = fit_grid(&points, CANVAS, CANVAS, FRAC_PI_2).expect("fit");
    let pitch = PITCH as f64;
    assert!(
        (fit.lattice.a - pitch).abs() <= 0.05 * pitch,
        "a = {}",
        fit.lattice.a
    );
    assert!(fit.final_loss < 1.0);
}

#[test]
fn detection_report_is_consistent() {
    let image = micropattern();
    let detector = GridDetector::new(DetectConfig::default()).unwrap();
    let detection = detector.detect(&image);

    assert_eq!(detection.points.len(), detection.peaks.len());
    assert!(detection.raw_count >= detection.merged_count);
    assert!(detection.merged_count >= detection.points.len());
    assert!(detection.threshold > 0.0);
    assert!(detection.foreground > 0 && detection.foreground < CANVAS * CANVAS);
    for (point, peak) in detection.points.iter().zip(detection.peaks.iter()) {
        assert_eq!(*point, peak.point());
    }

    // Same input, same output.
    assert_eq!(detector.detect(&image), detection);
}

#[test]
fn checkerboard_keeps_only_border_open_cells() {
    let image = checkerboard();
    let detector = GridDetector::new(DetectConfig::default()).unwrap();
    let detection = detector.detect(&image);

    assert_eq!(detection.raw_count, 16);
    assert_eq!(detection.points.len(), 16);
    assert_eq!(detection.foreground, 183_580);

    // Cell centres sit at 24 (mod 50). Survivors are the last column and the
    // last row of cells, without the corner cell and the cells that also
    // touch the top or left border.
    let last = CANVAS - PITCH / 2 - 1;
    for peak in &detection.peaks {
        assert_eq!(peak.value, 20.0);
        let (along, across) = if peak.x == last {
            (peak.y, peak.x)
        } else {
            (peak.x, peak.y)
        };
        assert_eq!(across, last, "({}, {})", peak.x, peak.y);
        assert_eq!(along % PITCH, PITCH / 2 - 1);
        assert!((74..=424).contains(&along), "({}, {})", peak.x, peak.y);
    }

    let fit = fit_grid(&detection.points, CANVAS, CANVAS, FRAC_PI_2).expect("fit");
    let pitch = PITCH as f64;
    assert!(
        (fit.lattice.a - pitch).abs() <= 0.05 * pitch,
        "a = {}",
        fit.lattice.a
    );
    assert!(fit.final_loss < 1.0);
}

#[test]
fn flat_image_detects_nothing() {
    let image = ScalarField::filled(120, 80, 128.0).unwrap();
    assert!(detect_grid_points(&image, 5).is_empty());
}
