//! Individual pipeline stages for custom detection pipelines.
//!
//! [`GridDetector`](crate::GridDetector) chains these in a fixed order; use
//! them directly to inspect intermediate fields or to swap a stage out.

pub use crate::candidate::{
    coefficient_of_variation, extract_peaks, local_maxima, merge_peaks, prune_by_cv,
    PeakExtraction, PeakParams,
};
pub use crate::distance::distance_transform;
pub use crate::image::gray::{from_f32, from_interleaved, from_luma8, from_rgba8};
pub use crate::segment::{
    binarize, clean_mask, close, dilate, erode, fill_holes, open, otsu_threshold, OtsuThreshold,
    OTSU_BINS,
};
pub use crate::variance::{
    log1p_field, variance_field, variance_field_with, IntegralImage, WindowStats,
};
