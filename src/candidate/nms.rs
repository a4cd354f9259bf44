//! Greedy merging of nearby peaks.

use crate::candidate::peak::{sort_peaks_desc, Peak};

/// Keeps the strongest peak of every cluster closer than `radius`.
///
/// Peaks are sorted by descending value and kept if they are farther than
/// `radius` (Euclidean) from every previously kept peak.
pub fn merge_peaks(peaks: &mut [Peak], radius: f32) -> Vec<Peak> {
    sort_peaks_desc(peaks);
    if radius <= 0.0 {
        return peaks.to_owned();
    }

    let r2 = f64::from(radius) * f64::from(radius);
    let mut kept: Vec<Peak> = Vec::new();

    'outer: for peak in peaks.iter().copied() {
        for kept_peak in kept.iter() {
            if peak.point().dist2(&kept_peak.point()) <= r2 {
                continue 'outer;
            }
        }
        kept.push(peak);
    }

    kept
}
