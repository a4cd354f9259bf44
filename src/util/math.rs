//! Small numeric helpers shared by the detection and fitting stages.

use std::f64::consts::PI;

/// Folds an angle in radians into `[0, π)`.
///
/// A lattice direction and its opposite describe the same family of rows, so
/// the sign of the direction vector is discarded.
pub(crate) fn fold_pi(angle: f64) -> f64 {
    let mut folded = angle % PI;
    if folded < 0.0 {
        folded += PI;
    }
    if folded >= PI {
        folded -= PI;
    }
    folded
}

/// Wraps a value into `[-0.5, 0.5)` around zero.
pub(crate) fn wrap_unit(value: f64) -> f64 {
    let wrapped = value - value.round();
    if wrapped >= 0.5 {
        wrapped - 1.0
    } else {
        wrapped
    }
}

/// Median of a slice; averages the two middle values for even lengths.
///
/// Returns `None` for an empty slice. The input is left untouched.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    }
}

/// Median of values on the unit circle (period 1).
///
/// Values are re-centred around their circular mean before the ordinary median
/// is taken, so a cluster straddling the 0/1 seam is handled like any other.
/// The result lies in `[-0.5, 0.5)`.
pub(crate) fn circular_median_unit(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let (mut s, mut c) = (0.0f64, 0.0f64);
    for &v in values {
        let (sin, cos) = (2.0 * PI * v).sin_cos();
        s += sin;
        c += cos;
    }
    let reference = if s.abs() < 1e-12 && c.abs() < 1e-12 {
        0.0
    } else {
        s.atan2(c) / (2.0 * PI)
    };
    let centred: Vec<f64> = values
        .iter()
        .map(|&v| reference + wrap_unit(v - reference))
        .collect();
    median(&centred).map(wrap_unit)
}

/// Mean and population standard deviation.
pub(crate) fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let mut n = 0usize;
    let mut sum = 0.0f64;
    for v in values.clone() {
        sum += v;
        n += 1;
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    (mean, var.sqrt())
}
