//! End-to-end grid point detection.
//!
//! The detector chains the stages in a fixed order: local variance, `ln(1+v)`
//! compression, Otsu binarization, morphological cleanup, Euclidean distance
//! transform and peak extraction. Peaks of the distance field sit in the
//! middle of the background gaps between foreground cells, which is where
//! grid intersections lie.

use crate::candidate::{extract_peaks, Peak, PeakParams, Point2D};
use crate::distance::distance_transform;
use crate::image::ScalarField;
use crate::segment::{binarize, clean_mask, otsu_threshold};
use crate::trace::{trace_event, trace_span};
use crate::util::{GridFitError, GridFitResult};
use crate::variance::{log1p_field, variance_field_with};

/// Configuration for [`GridDetector`].
#[derive(Clone, Debug, PartialEq)]
pub struct DetectConfig {
    /// Radius of the variance window (window side `2r + 1`).
    pub variance_radius: usize,
    /// Radius of the square structuring element used for cleanup.
    pub morph_radius: usize,
    /// Peaks closer than this (pixels) to a stronger peak are merged.
    pub merge_radius: f32,
    /// Fixed minimum distance value for peaks; `None` derives it.
    pub min_value: Option<f32>,
    /// Lower bound of the derived minimum value.
    pub min_value_floor: f32,
    /// Fraction of the largest distance used for the derived minimum value.
    pub min_value_fraction: f32,
    /// Largest fraction of merged peaks the dispersion filter may drop.
    pub max_drop_fraction: f32,
    /// Coefficient of variation the surviving peaks should not exceed.
    pub cv_threshold: f32,
    /// Run the window stages row-parallel (feature `rayon`).
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        let peaks = PeakParams::default();
        Self {
            variance_radius: 5,
            morph_radius: 2,
            merge_radius: peaks.merge_radius,
            min_value: peaks.min_value,
            min_value_floor: peaks.min_value_floor,
            min_value_fraction: peaks.min_value_fraction,
            max_drop_fraction: peaks.max_drop_fraction,
            cv_threshold: peaks.cv_threshold,
            parallel: false,
        }
    }
}

impl DetectConfig {
    /// Checks ranges of every field.
    pub fn validate(&self) -> GridFitResult<()> {
        let fail = |reason| Err(GridFitError::InvalidConfig { reason });
        if self.variance_radius == 0 {
            return fail("variance_radius must be positive");
        }
        if !self.merge_radius.is_finite() || self.merge_radius < 0.0 {
            return fail("merge_radius must be finite and non-negative");
        }
        if let Some(v) = self.min_value {
            if !v.is_finite() {
                return fail("min_value must be finite");
            }
        }
        if !self.min_value_floor.is_finite() {
            return fail("min_value_floor must be finite");
        }
        if !(0.0..=1.0).contains(&self.min_value_fraction) {
            return fail("min_value_fraction must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.max_drop_fraction) {
            return fail("max_drop_fraction must lie in [0, 1]");
        }
        if !self.cv_threshold.is_finite() || self.cv_threshold < 0.0 {
            return fail("cv_threshold must be finite and non-negative");
        }
        Ok(())
    }

    fn peak_params(&self) -> PeakParams {
        PeakParams {
            min_value: self.min_value,
            min_value_floor: self.min_value_floor,
            min_value_fraction: self.min_value_fraction,
            merge_radius: self.merge_radius,
            max_drop_fraction: self.max_drop_fraction,
            cv_threshold: self.cv_threshold,
        }
    }
}

/// Per-stage report of one detection run.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Final grid points, strongest first.
    pub points: Vec<Point2D>,
    /// Final peaks with their distance values, aligned with `points`.
    pub peaks: Vec<Peak>,
    /// Otsu threshold on the log-variance field.
    pub threshold: f32,
    /// Foreground pixels after cleanup.
    pub foreground: usize,
    /// Local maxima above the minimum value.
    pub raw_count: usize,
    /// Peaks left after merging.
    pub merged_count: usize,
}

/// Runs the detection pipeline with a fixed configuration.
#[derive(Clone, Debug)]
pub struct GridDetector {
    cfg: DetectConfig,
}

impl GridDetector {
    /// Creates a detector after validating `cfg`.
    pub fn new(cfg: DetectConfig) -> GridFitResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &DetectConfig {
        &self.cfg
    }

    /// Detects grid points in a grayscale intensity field.
    pub fn detect(&self, image: &ScalarField) -> Detection {
        let cfg = &self.cfg;
        let _span = trace_span!(
            "detect_grid_points",
            width = image.width(),
            height = image.height(),
            radius = cfg.variance_radius
        )
        .entered();

        let variance = variance_field_with(image, cfg.variance_radius, cfg.parallel);
        let compressed = log1p_field(&variance);
        let threshold = otsu_threshold(&compressed);
        let mut mask = binarize(&compressed, threshold.value);
        clean_mask(&mut mask, cfg.morph_radius, cfg.parallel);
        let foreground = mask.count_ones();

        let distance = distance_transform(&mask);
        let extraction = extract_peaks(&distance, &cfg.peak_params());
        let points = extraction.peaks.iter().map(Peak::point).collect::<Vec<_>>();

        trace_event!("detected", points = points.len(), foreground = foreground);
        Detection {
            points,
            peaks: extraction.peaks,
            threshold: threshold.value,
            foreground,
            raw_count: extraction.raw_count,
            merged_count: extraction.merged_count,
        }
    }
}

/// Detects grid points with the default configuration and the given
/// variance radius.
///
/// Returns an empty list when detection finds nothing, including for a zero
/// radius.
pub fn detect_grid_points(image: &ScalarField, radius: usize) -> Vec<Point2D> {
    let cfg = DetectConfig {
        variance_radius: radius,
        ..DetectConfig::default()
    };
    match GridDetector::new(cfg) {
        Ok(detector) => detector.detect(image).points,
        Err(_) => Vec::new(),
    }
}
