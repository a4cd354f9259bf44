//! Dispersion-based pruning of weak peaks.

use crate::candidate::peak::{sort_peaks_desc, Peak};
use crate::util::math::mean_std;

/// Coefficient of variation (`std / mean`) of peak values; 0 for a
/// non-positive mean.
pub fn coefficient_of_variation(peaks: &[Peak]) -> f64 {
    let (mean, std) = mean_std(peaks.iter().map(|p| f64::from(p.value)));
    if mean <= 1e-9 {
        return 0.0;
    }
    std / mean
}

/// Drops the weakest peaks while the remaining values are too dispersed.
///
/// Peaks are visited weakest first; one is removed at a time while the
/// coefficient of variation of the remainder exceeds `cv_threshold`, and at
/// most `floor(max_drop_fraction * n)` peaks are removed. The survivors are
/// returned in descending value order.
pub fn prune_by_cv(peaks: &[Peak], max_drop_fraction: f32, cv_threshold: f32) -> Vec<Peak> {
    let mut sorted = peaks.to_vec();
    sort_peaks_desc(&mut sorted);
    sorted.reverse();

    let max_drop = (sorted.len() as f64 * f64::from(max_drop_fraction)).floor() as usize;
    let threshold = f64::from(cv_threshold);
    let mut start = 0usize;
    while start < max_drop && coefficient_of_variation(&sorted[start..]) > threshold {
        start += 1;
    }

    let mut kept = sorted.split_off(start);
    sort_peaks_desc(&mut kept);
    kept
}

#[cfg(test)]
mod tests {
    use super::{coefficient_of_variation, prune_by_cv};
    use crate::candidate::Peak;

    fn peaks(values: &[f32]) -> Vec<Peak> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Peak {
                x: i * 20,
                y: 0,
                value,
            })
            .collect()
    }

    #[test]
    fn uniform_values_are_untouched() {
        let input = peaks(&[7.0; 10]);
        assert_eq!(coefficient_of_variation(&input), 0.0);
        assert_eq!(prune_by_cv(&input, 0.3, 0.2).len(), 10);
    }

    #[test]
    fn weak_tail_is_removed() {
        let input = peaks(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 1.0, 1.5]);
        let kept = prune_by_cv(&input, 0.3, 0.2);
        assert_eq!(kept.len(), 8);
        assert!(kept.iter().all(|p| p.value == 10.0));
    }

    #[test]
    fn drop_cap_limits_removal() {
        let input = peaks(&[1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0]);
        let kept = prune_by_cv(&input, 0.3, 0.2);
        assert_eq!(kept.len(), 7);
        assert_eq!(kept.last().map(|p| p.value), Some(8.0));
    }
}
