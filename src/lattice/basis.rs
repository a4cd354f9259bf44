//! Nearest-neighbour direction voting.

use crate::candidate::Point2D;
use crate::util::math::{fold_pi, median};
use std::f64::consts::PI;

/// Squared lengths below this are treated as coincident points.
const MIN_DIST2: f64 = 1e-18;
/// Relative tolerance for nearest-neighbour ties.
const TIE_EPS: f64 = 1e-9;

/// One nearest-neighbour vote: undirected angle in `[0, π)` and length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct NeighborVote {
    pub angle: f64,
    pub magnitude: f64,
}

/// Collects the nearest-neighbour vectors of every point (brute force).
///
/// All neighbours tied at the minimal distance vote, so a point on an exact
/// square grid contributes to both axes. Coincident points are skipped.
pub(crate) fn nearest_neighbor_votes(points: &[Point2D]) -> Vec<NeighborVote> {
    let mut votes = Vec::with_capacity(points.len() * 2);
    for (i, p) in points.iter().enumerate() {
        let mut best = f64::INFINITY;
        for (j, q) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            let d2 = p.dist2(q);
            if d2 > MIN_DIST2 && d2 < best {
                best = d2;
            }
        }
        if !best.is_finite() {
            continue;
        }

        let limit = best * (1.0 + TIE_EPS);
        for (j, q) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            let d2 = p.dist2(q);
            if d2 > MIN_DIST2 && d2 <= limit {
                let dx = q.x as f64 - p.x as f64;
                let dy = q.y as f64 - p.y as f64;
                votes.push(NeighborVote {
                    angle: fold_pi(dy.atan2(dx)),
                    magnitude: d2.sqrt(),
                });
            }
        }
    }
    votes
}

/// Votes binned by undirected angle over `[0, π)`.
pub(crate) struct AngleHistogram {
    bins: Vec<Vec<NeighborVote>>,
    bin_width: f64,
}

impl AngleHistogram {
    pub(crate) fn new(votes: &[NeighborVote], bin_count: usize) -> Self {
        let bin_count = bin_count.max(1);
        let bin_width = PI / bin_count as f64;
        let mut bins = vec![Vec::new(); bin_count];
        for vote in votes {
            bins[Self::index_of(vote.angle, bin_width, bin_count)].push(*vote);
        }
        Self { bins, bin_width }
    }

    fn index_of(angle: f64, bin_width: f64, bin_count: usize) -> usize {
        ((fold_pi(angle) / bin_width).floor() as usize).min(bin_count - 1)
    }

    pub(crate) fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub(crate) fn count(&self, bin: usize) -> usize {
        self.bins[bin].len()
    }

    /// First bin with the most votes, `None` when every bin is empty.
    pub(crate) fn primary(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, bin) in self.bins.iter().enumerate() {
            if bin.is_empty() {
                continue;
            }
            match best {
                Some(b) if self.bins[b].len() >= bin.len() => {}
                _ => best = Some(idx),
            }
        }
        best
    }

    /// Most populated bin within `half_width` radians of `target`, with wrap.
    ///
    /// Bins are visited from the target outwards, so equal counts resolve to
    /// the bin closest to the target. `exclude` is never returned.
    pub(crate) fn best_near(&self, target: f64, half_width: f64, exclude: usize) -> Option<usize> {
        let n = self.bins.len();
        let center = Self::index_of(target, self.bin_width, n);
        let span = ((half_width / self.bin_width).round() as usize).min(n / 2);

        let mut best: Option<usize> = None;
        for offset in 0..=span {
            for idx in [(center + offset) % n, (center + n - offset) % n] {
                if idx == exclude || self.bins[idx].is_empty() {
                    continue;
                }
                match best {
                    Some(b) if self.bins[b].len() >= self.bins[idx].len() => {}
                    _ => best = Some(idx),
                }
            }
        }
        best
    }

    /// Median angle and median magnitude of the votes in `bin`.
    pub(crate) fn medians(&self, bin: usize) -> Option<(f64, f64)> {
        let votes = &self.bins[bin];
        let angles: Vec<f64> = votes.iter().map(|v| v.angle).collect();
        let magnitudes: Vec<f64> = votes.iter().map(|v| v.magnitude).collect();
        Some((median(&angles)?, median(&magnitudes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::{nearest_neighbor_votes, AngleHistogram, NeighborVote};
    use crate::candidate::Point2D;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn grid_points_vote_for_both_axes() {
        let points: Vec<Point2D> = (0..3)
            .flat_map(|j| (0..3).map(move |i| Point2D::new(10 + 20 * i, 10 + 20 * j)))
            .collect();
        let votes = nearest_neighbor_votes(&points);
        // 12 edges, each seen from both ends.
        assert_eq!(votes.len(), 24);
        let horizontal = votes.iter().filter(|v| v.angle.abs() < 1e-12).count();
        let vertical = votes
            .iter()
            .filter(|v| (v.angle - FRAC_PI_2).abs() < 1e-12)
            .count();
        assert_eq!(horizontal, 12);
        assert_eq!(vertical, 12);
        assert!(votes.iter().all(|v| (v.magnitude - 20.0).abs() < 1e-12));
    }

    #[test]
    fn coincident_points_do_not_vote_zero_length() {
        let points = [Point2D::new(5, 5), Point2D::new(5, 5), Point2D::new(9, 5)];
        let votes = nearest_neighbor_votes(&points);
        assert!(votes.iter().all(|v| v.magnitude > 0.0));
    }

    #[test]
    fn search_window_wraps_around_zero() {
        let vote = |deg: f64| NeighborVote {
            angle: deg.to_radians(),
            magnitude: 1.0,
        };
        let votes = [vote(91.0), vote(92.0), vote(178.0), vote(177.0), vote(176.0)];
        let hist = AngleHistogram::new(&votes, 36);
        assert_eq!(hist.primary(), Some(35));
        let primary = hist.primary().unwrap();
        assert_eq!(hist.best_near(2.0f64.to_radians(), 15.0f64.to_radians(), 18), Some(35));
        assert_eq!(hist.best_near(FRAC_PI_2, 15.0f64.to_radians(), primary), Some(18));
        assert_eq!(hist.best_near(PI / 4.0, 5.0f64.to_radians(), primary), None);
    }
}
