//! Point and peak types with deterministic ordering.

use std::cmp::Ordering;

/// Integer pixel coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point2D {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

impl Point2D {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    pub fn dist2(&self, other: &Point2D) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx * dx + dy * dy
    }
}

/// Distance-field peak: a candidate point with its distance value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the peak.
    pub x: usize,
    /// Y coordinate (row) of the peak.
    pub y: usize,
    /// Distance-transform value at the peak (confidence proxy).
    pub value: f32,
}

impl Peak {
    pub fn point(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

fn peak_cmp_desc(a: &Peak, b: &Peak) -> Ordering {
    b.value
        .total_cmp(&a.value)
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sorts peaks by descending value; ties break by row, then column.
pub(crate) fn sort_peaks_desc(peaks: &mut [Peak]) {
    peaks.sort_by(peak_cmp_desc);
}

#[cfg(test)]
mod tests {
    use super::{sort_peaks_desc, Peak, Point2D};

    #[test]
    fn sort_is_value_then_raster_order() {
        let mut peaks = vec![
            Peak { x: 5, y: 1, value: 2.0 },
            Peak { x: 1, y: 1, value: 2.0 },
            Peak { x: 0, y: 0, value: 1.0 },
            Peak { x: 9, y: 0, value: 2.0 },
        ];
        sort_peaks_desc(&mut peaks);
        let order: Vec<(usize, usize)> = peaks.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(order, vec![(9, 0), (1, 1), (5, 1), (0, 0)]);
    }

    #[test]
    fn dist2_is_symmetric() {
        let a = Point2D::new(3, 10);
        let b = Point2D::new(6, 6);
        assert_eq!(a.dist2(&b), 25.0);
        assert_eq!(b.dist2(&a), 25.0);
    }
}
