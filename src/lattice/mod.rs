//! Lattice fitting over detected grid points.
//!
//! The fitter estimates two equal-length basis vectors separated by a fixed
//! basis angle (π/2 for square grids, π/3 for hexagonal ones) from a
//! histogram of nearest-neighbour directions, places the origin with a
//! circular median of the fractional cell offsets, trims the worst residuals
//! and polishes `(a, alpha, tx, ty)` with a clamped gradient descent.
//!
//! Translations are measured from the canvas centre `(width / 2, height / 2)`.
//! Every "no fit" outcome is `None`; the fitter never panics on degenerate
//! point sets.

mod basis;
mod refine;
mod residual;

use crate::candidate::Point2D;
use crate::trace::{trace_event, trace_span};
use crate::util::math::{circular_median_unit, fold_pi};
use crate::util::{GridFitError, GridFitResult};
use basis::{nearest_neighbor_votes, AngleHistogram};
use refine::{refine_params, DescentSettings, LossInput};
use residual::{mean_loss, polar, LatticeGeometry, LatticeParams};
use std::f64::consts::FRAC_PI_2;

/// Two basis vectors given by length and angle.
///
/// `alpha` and `beta` are folded into `[0, π)`. Fits produced by
/// [`LatticeFitter`] always have `a == b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lattice {
    /// Length of the first basis vector in pixels.
    pub a: f64,
    /// Direction of the first basis vector in radians.
    pub alpha: f64,
    /// Length of the second basis vector in pixels.
    pub b: f64,
    /// Direction of the second basis vector in radians.
    pub beta: f64,
}

impl Lattice {
    /// Basis vectors `(u, v)` as `[dx, dy]` pairs.
    pub fn basis(&self) -> ([f64; 2], [f64; 2]) {
        (polar(self.a, self.alpha), polar(self.b, self.beta))
    }

    /// Area of one lattice cell (absolute basis determinant).
    pub fn cell_area(&self) -> f64 {
        let (u, v) = self.basis();
        (u[0] * v[1] - u[1] * v[0]).abs()
    }
}

/// Successful lattice fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitResult {
    pub lattice: Lattice,
    /// Origin x offset from the canvas centre in pixels.
    pub tx: f64,
    /// Origin y offset from the canvas centre in pixels.
    pub ty: f64,
    /// Points kept after outlier trimming.
    pub inliers: usize,
    /// Mean squared residual over the inliers before refinement.
    pub initial_loss: f64,
    /// Mean squared residual over the inliers after refinement.
    pub final_loss: f64,
    /// Accepted descent steps.
    pub iterations: usize,
}

impl FitResult {
    /// Lattice nodes inside a `width x height` canvas, row by row.
    ///
    /// Cells smaller than one pixel yield no nodes.
    pub fn nodes_within(&self, width: usize, height: usize) -> Vec<(f64, f64)> {
        let (w, h) = (width as f64, height as f64);
        if self.lattice.cell_area() < 1.0 {
            return Vec::new();
        }
        let (u, v) = self.lattice.basis();
        let origin = [0.5 * w + self.tx, 0.5 * h + self.ty];
        let Some(geom) = LatticeGeometry::from_basis(origin, u, v) else {
            return Vec::new();
        };

        let corners = [[0.0, 0.0], [w, 0.0], [0.0, h], [w, h]].map(|c| geom.lattice_coords(c));
        let (mut i0, mut i1, mut j0, mut j1) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for [ci, cj] in corners {
            i0 = i0.min(ci);
            i1 = i1.max(ci);
            j0 = j0.min(cj);
            j1 = j1.max(cj);
        }

        let mut nodes = Vec::new();
        let (i0, i1) = (i0.floor() as i64, i1.ceil() as i64);
        let (j0, j1) = (j0.floor() as i64, j1.ceil() as i64);
        for j in j0..=j1 {
            for i in i0..=i1 {
                let [x, y] = geom.node(i as f64, j as f64);
                if x >= 0.0 && x < w && y >= 0.0 && y < h {
                    nodes.push((x, y));
                }
            }
        }
        nodes.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)));
        nodes
    }
}

/// Configuration for [`LatticeFitter`].
#[derive(Clone, Debug, PartialEq)]
pub struct FitConfig {
    /// Angle between the two basis vectors in radians, in `(0, π)`.
    pub basis_angle: f64,
    /// Number of angle histogram bins over `[0, π)`.
    pub bin_count: usize,
    /// Half width of the secondary direction search window in radians.
    pub search_half_width: f64,
    /// Minimum secondary bin count relative to the primary bin.
    pub min_secondary_ratio: f64,
    /// Fraction of points kept as inliers (lowest residuals).
    pub inlier_fraction: f64,
    /// Maximum gradient descent iterations.
    pub max_iterations: usize,
    /// First step size of each backtracking line search.
    pub initial_step: f64,
    /// Maximum number of step halvings per line search.
    pub max_halvings: usize,
    /// Length clamp as a fraction of the initial length estimate.
    pub length_clamp_fraction: f64,
    /// Angle clamp in radians.
    pub angle_clamp: f64,
    /// Translation clamp in pixels.
    pub translation_clamp: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            basis_angle: FRAC_PI_2,
            bin_count: 36,
            search_half_width: 15.0f64.to_radians(),
            min_secondary_ratio: 0.2,
            inlier_fraction: 0.95,
            max_iterations: 50,
            initial_step: 4.0,
            max_halvings: 15,
            length_clamp_fraction: 0.1,
            angle_clamp: 5.0f64.to_radians(),
            translation_clamp: 10.0,
        }
    }
}

impl FitConfig {
    /// Checks ranges of every field.
    pub fn validate(&self) -> GridFitResult<()> {
        let fail = |reason| Err(GridFitError::InvalidConfig { reason });
        if !(self.basis_angle.is_finite()
            && self.basis_angle > 0.0
            && self.basis_angle < std::f64::consts::PI)
        {
            return fail("basis_angle must lie in (0, pi)");
        }
        if self.bin_count == 0 {
            return fail("bin_count must be positive");
        }
        if !self.search_half_width.is_finite() || self.search_half_width < 0.0 {
            return fail("search_half_width must be finite and non-negative");
        }
        if !(0.0..=1.0).contains(&self.min_secondary_ratio) {
            return fail("min_secondary_ratio must lie in [0, 1]");
        }
        if !(self.inlier_fraction > 0.0 && self.inlier_fraction <= 1.0) {
            return fail("inlier_fraction must lie in (0, 1]");
        }
        if !self.initial_step.is_finite() || self.initial_step <= 0.0 {
            return fail("initial_step must be finite and positive");
        }
        let clamps = [
            self.length_clamp_fraction,
            self.angle_clamp,
            self.translation_clamp,
        ];
        if clamps.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return fail("clamps must be finite and non-negative");
        }
        Ok(())
    }
}

/// Fits an equal-length lattice to a point set.
#[derive(Clone, Debug)]
pub struct LatticeFitter {
    cfg: FitConfig,
}

impl LatticeFitter {
    /// Creates a fitter after validating `cfg`.
    pub fn new(cfg: FitConfig) -> GridFitResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &FitConfig {
        &self.cfg
    }

    /// Fits the lattice; `None` for fewer than 3 points, a missing secondary
    /// direction or a singular basis.
    pub fn fit(&self, points: &[Point2D], width: usize, height: usize) -> Option<FitResult> {
        let _span = trace_span!("fit_grid", points = points.len()).entered();
        let cfg = &self.cfg;
        if points.len() < 3 {
            trace_event!("fit_rejected", reason = "fewer than 3 points");
            return None;
        }

        let votes = nearest_neighbor_votes(points);
        let hist = AngleHistogram::new(&votes, cfg.bin_count);
        let primary = hist.primary()?;
        let (alpha_a, mag_a) = hist.medians(primary)?;

        let target = fold_pi(alpha_a + cfg.basis_angle);
        let Some(secondary) = hist.best_near(target, cfg.search_half_width, primary) else {
            trace_event!("fit_rejected", reason = "no secondary direction");
            return None;
        };
        let (primary_count, secondary_count) = (hist.count(primary), hist.count(secondary));
        trace_event!(
            "basis_votes",
            primary = primary_count,
            secondary = secondary_count,
            bin_width = hist.bin_width()
        );
        if (secondary_count as f64) < cfg.min_secondary_ratio * primary_count as f64 {
            trace_event!("fit_rejected", reason = "secondary direction too weak");
            return None;
        }
        let (_, mag_b) = hist.medians(secondary)?;

        let center = [0.5 * width as f64, 0.5 * height as f64];
        let a0 = 0.5 * (mag_a + mag_b);
        let unshifted = LatticeParams {
            a: a0,
            alpha: alpha_a,
            tx: 0.0,
            ty: 0.0,
        };
        let Some(geom) = LatticeGeometry::from_params(&unshifted, cfg.basis_angle, center) else {
            trace_event!("fit_rejected", reason = "singular basis");
            return None;
        };

        let pixels: Vec<[f64; 2]> = points.iter().map(|p| [p.x as f64, p.y as f64]).collect();
        let (fi, fj): (Vec<f64>, Vec<f64>) = pixels
            .iter()
            .map(|&p| {
                let [i, j] = geom.lattice_coords(p);
                (i, j)
            })
            .unzip();
        let shift = geom.node(circular_median_unit(&fi)?, circular_median_unit(&fj)?);
        let start = LatticeParams {
            tx: shift[0] - center[0],
            ty: shift[1] - center[1],
            ..unshifted
        };

        let inliers = select_inliers(&pixels, &start, cfg, center)?;
        let initial_loss = mean_loss(&inliers, &start, cfg.basis_angle, center);

        let input = LossInput {
            points: &inliers,
            basis_angle: cfg.basis_angle,
            center,
        };
        let settings = DescentSettings {
            max_iterations: cfg.max_iterations,
            initial_step: cfg.initial_step,
            max_halvings: cfg.max_halvings,
            // Angle steps act as arc lengths at one lattice spacing.
            weights: [1.0, 1.0 / (a0 * a0), 1.0, 1.0],
            clamp: [
                cfg.length_clamp_fraction * a0,
                cfg.angle_clamp,
                cfg.translation_clamp,
                cfg.translation_clamp,
            ],
        };
        let descent = refine_params(&input, start, &settings);
        trace_event!(
            "fit_refined",
            initial_loss = initial_loss,
            final_loss = descent.loss,
            iterations = descent.iterations
        );

        let p = descent.params;
        Some(FitResult {
            lattice: Lattice {
                a: p.a,
                alpha: fold_pi(p.alpha),
                b: p.a,
                beta: fold_pi(p.alpha + cfg.basis_angle),
            },
            tx: p.tx,
            ty: p.ty,
            inliers: inliers.len(),
            initial_loss,
            final_loss: descent.loss,
            iterations: descent.iterations,
        })
    }
}

/// Keeps the points with the lowest residuals under `start`.
fn select_inliers(
    pixels: &[[f64; 2]],
    start: &LatticeParams,
    cfg: &FitConfig,
    center: [f64; 2],
) -> Option<Vec<[f64; 2]>> {
    let geom = LatticeGeometry::from_params(start, cfg.basis_angle, center)?;
    let mut ranked: Vec<(f64, [f64; 2])> = pixels.iter().map(|&p| (geom.residual2(p), p)).collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let drop = (ranked.len() as f64 * (1.0 - cfg.inlier_fraction)).floor() as usize;
    let keep = ranked.len().saturating_sub(drop).max(1);
    Some(ranked.into_iter().take(keep).map(|(_, p)| p).collect())
}

/// Fits a lattice with the default configuration and the given basis angle.
///
/// Returns `None` for degenerate input, including a basis angle outside
/// `(0, π)`.
pub fn fit_grid(
    points: &[Point2D],
    width: usize,
    height: usize,
    basis_angle: f64,
) -> Option<FitResult> {
    let cfg = FitConfig {
        basis_angle,
        ..FitConfig::default()
    };
    LatticeFitter::new(cfg).ok()?.fit(points, width, height)
}
