//! Summed-area tables for O(1) window statistics.

use crate::image::ScalarField;

/// Prefix sums of values and squared values with a zero guard row/column.
///
/// Entry `(x, y)` of each table holds the sum over the half-open rectangle
/// `[0, x) x [0, y)` of the source, so tables are `(width + 1) x (height + 1)`.
/// Sums are accumulated in `f64`; integer-valued inputs stay exact.
pub struct IntegralImage {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    width: usize,
    height: usize,
}

/// Sum, sum of squares and sample count of one window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowStats {
    pub sum: f64,
    pub sum_sq: f64,
    pub count: usize,
}

impl WindowStats {
    /// Population variance `E[x^2] - E[x]^2`, clamped at zero.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        let mean = self.sum / n;
        (self.sum_sq / n - mean * mean).max(0.0)
    }
}

impl IntegralImage {
    /// Builds both tables in a single pass over `field`.
    pub fn from_field(field: &ScalarField) -> Self {
        let width = field.width();
        let height = field.height();
        let stride = width + 1;
        let mut sum = vec![0.0f64; stride * (height + 1)];
        let mut sum_sq = vec![0.0f64; stride * (height + 1)];

        for (y, row) in field.data().chunks_exact(width).enumerate() {
            let mut row_sum = 0.0f64;
            let mut row_sq = 0.0f64;
            let above = y * stride;
            let here = (y + 1) * stride;
            for (x, &v) in row.iter().enumerate() {
                let v = f64::from(v);
                row_sum += v;
                row_sq += v * v;
                sum[here + x + 1] = sum[above + x + 1] + row_sum;
                sum_sq[here + x + 1] = sum_sq[above + x + 1] + row_sq;
            }
        }

        Self {
            sum,
            sum_sq,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Statistics over the inclusive rectangle `[x0, x1] x [y0, y1]`.
    ///
    /// The caller keeps the rectangle inside the source image.
    #[inline]
    pub fn window(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> WindowStats {
        debug_assert!(x0 <= x1 && x1 < self.width);
        debug_assert!(y0 <= y1 && y1 < self.height);
        let stride = self.width + 1;
        let a = y0 * stride + x0;
        let b = y0 * stride + x1 + 1;
        let c = (y1 + 1) * stride + x0;
        let d = (y1 + 1) * stride + x1 + 1;
        WindowStats {
            sum: self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            sum_sq: self.sum_sq[d] - self.sum_sq[b] - self.sum_sq[c] + self.sum_sq[a],
            count: (x1 - x0 + 1) * (y1 - y0 + 1),
        }
    }

    /// Statistics over the `(2r+1)^2` window centred at `(x, y)`, clipped to
    /// the image bounds.
    #[inline]
    pub fn clipped_window(&self, x: usize, y: usize, radius: usize) -> WindowStats {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius).min(self.width - 1);
        let y1 = (y + radius).min(self.height - 1);
        self.window(x0, y0, x1, y1)
    }
}
