//! Peak candidates extracted from the distance field.
//!
//! Extraction runs in three passes: strict local maxima above a floor,
//! greedy Euclidean merging that keeps the strongest peak of each blob, and a
//! coefficient-of-variation filter that trims low-confidence detections.

pub(crate) mod maxima;
pub(crate) mod nms;
pub(crate) mod outliers;
mod peak;

pub use maxima::local_maxima;
pub use nms::merge_peaks;
pub use outliers::{coefficient_of_variation, prune_by_cv};
pub use peak::{Peak, Point2D};

use crate::image::ScalarField;
use crate::trace::{trace_event, trace_span};

/// Parameters for peak extraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakParams {
    /// Fixed minimum peak value; `None` derives it from the field maximum.
    pub min_value: Option<f32>,
    /// Lower bound of the derived minimum value.
    pub min_value_floor: f32,
    /// Fraction of the field maximum used for the derived minimum value.
    pub min_value_fraction: f32,
    /// Peaks within this Euclidean radius of a stronger peak are merged.
    pub merge_radius: f32,
    /// Largest fraction of merged peaks the dispersion filter may drop.
    pub max_drop_fraction: f32,
    /// Target coefficient of variation for the surviving peak values.
    pub cv_threshold: f32,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            min_value: None,
            min_value_floor: 3.0,
            min_value_fraction: 0.1,
            merge_radius: 10.0,
            max_drop_fraction: 0.3,
            cv_threshold: 0.2,
        }
    }
}

impl PeakParams {
    /// Effective minimum value for a field whose maximum is `field_max`.
    pub fn resolve_min_value(&self, field_max: f32) -> f32 {
        self.min_value
            .unwrap_or_else(|| self.min_value_floor.max(self.min_value_fraction * field_max))
    }
}

/// Outcome of [`extract_peaks`] with the intermediate counts.
#[derive(Clone, Debug, PartialEq)]
pub struct PeakExtraction {
    /// Minimum value that was applied.
    pub min_value: f32,
    /// Number of local maxima above the minimum value.
    pub raw_count: usize,
    /// Number of peaks left after merging.
    pub merged_count: usize,
    /// Surviving peaks in descending value order.
    pub peaks: Vec<Peak>,
}

/// Runs maxima detection, merging and dispersion pruning on `field`.
pub fn extract_peaks(field: &ScalarField, params: &PeakParams) -> PeakExtraction {
    let _span = trace_span!("peak_extraction").entered();

    let field_max = field.min_max().map_or(0.0, |(_, max)| max);
    let min_value = params.resolve_min_value(field_max);
    let mut raw = maxima::local_maxima(field, min_value);
    let raw_count = raw.len();
    let merged = nms::merge_peaks(&mut raw, params.merge_radius);
    let merged_count = merged.len();
    let peaks = outliers::prune_by_cv(&merged, params.max_drop_fraction, params.cv_threshold);

    trace_event!(
        "peaks",
        min_value = min_value,
        raw = raw_count,
        merged = merged_count,
        kept = peaks.len()
    );
    PeakExtraction {
        min_value,
        raw_count,
        merged_count,
        peaks,
    }
}
