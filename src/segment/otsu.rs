//! Global Otsu threshold over a 256-bin histogram of a scalar field.

use crate::image::{BinaryMask, ScalarField};
use crate::trace::{trace_event, trace_mask, trace_span};

/// Number of histogram bins spanning `[min, max]` of the field.
pub const OTSU_BINS: usize = 256;

/// Threshold selected by [`otsu_threshold`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OtsuThreshold {
    /// Samples `>= value` belong to the upper (foreground) class.
    pub value: f32,
    /// Last histogram bin of the lower class; `None` for a flat field.
    pub split_bin: Option<usize>,
}

/// Histogram of finite samples over `[min, max]`, plus that range.
fn histogram(field: &ScalarField) -> Option<([u64; OTSU_BINS], f64, f64)> {
    let (min, max) = field.min_max()?;
    let (min, max) = (f64::from(min), f64::from(max));
    let range = max - min;
    let mut hist = [0u64; OTSU_BINS];
    if range <= 0.0 {
        return Some((hist, min, max));
    }
    let last = (OTSU_BINS - 1) as f64;
    for &v in field.data() {
        if !v.is_finite() {
            continue;
        }
        let idx = ((f64::from(v) - min) / range * last) as usize;
        hist[idx.min(OTSU_BINS - 1)] += 1;
    }
    Some((hist, min, max))
}

/// Picks the bin split that maximises between-class variance.
///
/// Bins are scanned low to high and the best split only changes on a strict
/// improvement, so ties resolve to the lowest bin. Returns `None` when the
/// histogram has fewer than two populated bins.
pub(crate) fn otsu_split(hist: &[u64]) -> Option<usize> {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return None;
    }
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut weight_bg = 0u64;
    let mut sum_bg = 0.0f64;
    let mut best: Option<(usize, f64)> = None;
    for (t, &count) in hist.iter().enumerate() {
        weight_bg += count;
        sum_bg += t as f64 * count as f64;
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }
        let wb = weight_bg as f64;
        let wf = weight_fg as f64;
        let mean_bg = sum_bg / wb;
        let mean_fg = (sum_total - sum_bg) / wf;
        let between = wb * wf * (mean_bg - mean_fg) * (mean_bg - mean_fg);
        if best.map_or(true, |(_, b)| between > b) {
            best = Some((t, between));
        }
    }
    best.map(|(t, _)| t)
}

/// Computes the Otsu threshold of `field`.
///
/// A field without dynamic range yields its constant value (so binarization
/// marks every pixel as foreground). A field without finite samples yields 0.
pub fn otsu_threshold(field: &ScalarField) -> OtsuThreshold {
    let _span = trace_span!("otsu").entered();

    let Some((hist, min, max)) = histogram(field) else {
        return OtsuThreshold {
            value: 0.0,
            split_bin: None,
        };
    };
    let range = max - min;
    let split = if range > 0.0 { otsu_split(&hist) } else { None };
    let value = match split {
        Some(t) => min + (t + 1) as f64 * range / (OTSU_BINS - 1) as f64,
        None => min,
    };

    trace_event!("otsu_threshold", value = value, split = split.unwrap_or(0));
    OtsuThreshold {
        value: value as f32,
        split_bin: split,
    }
}

/// Marks samples `>= threshold` as foreground. Non-finite samples stay 0.
pub fn binarize(field: &ScalarField, threshold: f32) -> BinaryMask {
    let data = field
        .data()
        .iter()
        .map(|&v| u8::from(v.is_finite() && v >= threshold))
        .collect();
    let mask = BinaryMask::from_parts(data, field.width(), field.height());
    trace_mask!("binarized", &mask, threshold = threshold);
    mask
}

#[cfg(test)]
mod tests {
    use super::{binarize, otsu_split, otsu_threshold};
    use crate::image::ScalarField;

    #[test]
    fn bimodal_split_lands_between_modes() {
        let mut hist = [0u64; 256];
        hist[10] = 100;
        hist[200] = 50;
        let t = otsu_split(&hist).unwrap();
        assert_eq!(t, 10);
    }

    #[test]
    fn single_bin_has_no_split() {
        let mut hist = [0u64; 256];
        hist[42] = 9;
        assert_eq!(otsu_split(&hist), None);
    }

    #[test]
    fn flat_field_returns_constant() {
        let field = ScalarField::filled(4, 4, 2.5).unwrap();
        let t = otsu_threshold(&field);
        assert_eq!(t.value, 2.5);
        assert_eq!(t.split_bin, None);
        assert_eq!(binarize(&field, t.value).count_ones(), 16);
    }

    #[test]
    fn two_level_field_separates_levels() {
        let field = ScalarField::from_fn(10, 10, |x, _| if x < 4 { 1.0 } else { 9.0 }).unwrap();
        let t = otsu_threshold(&field);
        assert!(t.value > 1.0 && t.value <= 9.0);
        let mask = binarize(&field, t.value);
        assert_eq!(mask.count_ones(), 60);
    }
}
