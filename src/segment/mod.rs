//! Foreground segmentation of the variance field.
//!
//! Otsu picks a global threshold on the log-compressed variance field; the
//! resulting mask is cleaned by opening, closing and hole filling so that the
//! remaining background corresponds to genuine gaps between pattern cells.

pub mod morphology;
pub mod otsu;

pub use morphology::{clean_mask, close, dilate, erode, fill_holes, open};
pub use otsu::{binarize, otsu_threshold, OtsuThreshold, OTSU_BINS};
