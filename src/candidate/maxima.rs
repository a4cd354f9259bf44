//! Local maxima of a scalar field.

use crate::candidate::peak::Peak;
use crate::image::ScalarField;

/// 8-neighbour offsets that precede the centre in raster order.
const BEFORE: [(isize, isize); 4] = [(-1, -1), (0, -1), (1, -1), (-1, 0)];
/// 8-neighbour offsets that follow the centre in raster order.
const AFTER: [(isize, isize); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

/// Collects strict 8-neighbourhood maxima with `value >= min_value`.
///
/// The one-pixel border ring is never reported. Strictness is taken in
/// raster order: a pixel must exceed the neighbours that come before it and
/// be at least as large as the neighbours after it. A flat-topped plateau
/// therefore yields exactly one maximum, its first pixel in raster order,
/// and a plateau touching a larger value yields none.
pub fn local_maxima(field: &ScalarField, min_value: f32) -> Vec<Peak> {
    let w = field.width();
    let h = field.height();
    if w < 3 || h < 3 {
        return Vec::new();
    }
    let data = field.data();
    let at = |x: usize, y: usize, dx: isize, dy: isize| -> f32 {
        let xx = (x as isize + dx) as usize;
        let yy = (y as isize + dy) as usize;
        data[yy * w + xx]
    };

    let mut peaks = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let value = data[y * w + x];
            if value.is_nan() || value < min_value {
                continue;
            }
            let beats_before = BEFORE.iter().all(|&(dx, dy)| value > at(x, y, dx, dy));
            if !beats_before {
                continue;
            }
            let holds_after = AFTER.iter().all(|&(dx, dy)| value >= at(x, y, dx, dy));
            if holds_after {
                peaks.push(Peak { x, y, value });
            }
        }
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::local_maxima;
    use crate::distance::distance_transform;
    use crate::image::{BinaryMask, ScalarField};

    #[test]
    fn isolated_peak_is_found() {
        let field =
            ScalarField::from_fn(7, 7, |x, y| if (x, y) == (3, 2) { 5.0 } else { 1.0 }).unwrap();
        let peaks = local_maxima(&field, 0.0);
        assert_eq!(peaks.len(), 1);
        assert_eq!((peaks[0].x, peaks[0].y), (3, 2));
    }

    #[test]
    fn plateau_yields_single_peak() {
        let field = ScalarField::from_fn(8, 8, |x, y| {
            if (3..=4).contains(&x) && (3..=4).contains(&y) {
                4.0
            } else {
                0.0
            }
        })
        .unwrap();
        let peaks = local_maxima(&field, 1.0);
        assert_eq!(peaks.len(), 1);
        assert_eq!((peaks[0].x, peaks[0].y), (3, 3));
    }

    #[test]
    fn border_ring_and_threshold_are_respected() {
        let field = ScalarField::from_fn(6, 6, |x, y| match (x, y) {
            (0, 3) => 9.0,
            (3, 3) => 2.0,
            _ => 0.0,
        })
        .unwrap();
        assert!(local_maxima(&field, 0.5).iter().all(|p| p.x != 0));
        assert!(local_maxima(&field, 2.5).is_empty());
    }

    #[test]
    fn ridge_next_to_summit_is_not_a_peak() {
        let field = ScalarField::from_fn(9, 5, |x, y| {
            if y != 2 {
                0.0
            } else if x == 6 {
                3.0
            } else {
                2.0
            }
        })
        .unwrap();
        let peaks = local_maxima(&field, 0.0);
        assert_eq!(peaks.len(), 1);
        assert_eq!((peaks[0].x, peaks[0].y), (6, 2));
    }

    #[test]
    fn even_width_cell_centre_survives() {
        // A 6x6 background cell inside a one-pixel frame: its distance
        // transform tops out in a 2x2 plateau of value 3.
        let mask = BinaryMask::from_fn(8, 8, |x, y| x == 0 || y == 0 || x == 7 || y == 7).unwrap();
        let dt = distance_transform(&mask);
        for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
            assert_eq!(dt.get(x, y), Some(3.0));
        }

        let strict = (1..7)
            .flat_map(|y| (1..7).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                let v = dt.get(x, y).unwrap();
                (-1isize..=1)
                    .flat_map(|dy| (-1isize..=1).map(move |dx| (dx, dy)))
                    .filter(|&d| d != (0, 0))
                    .all(|(dx, dy)| {
                        let n = dt
                            .get((x as isize + dx) as usize, (y as isize + dy) as usize)
                            .unwrap();
                        v > n
                    })
            })
            .count();
        assert_eq!(strict, 0);

        let peaks = local_maxima(&dt, 1.0);
        assert_eq!(peaks.len(), 1);
        assert_eq!((peaks[0].x, peaks[0].y, peaks[0].value), (3, 3, 3.0));
    }
}
