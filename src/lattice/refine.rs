//! Clamped finite-difference gradient descent over `(a, alpha, tx, ty)`.

use crate::lattice::residual::{mean_loss, LatticeParams};

/// Central-difference step per parameter (length, angle, tx, ty).
const DIFF_STEP: [f64; 4] = [1e-3, 1e-5, 1e-3, 1e-3];

/// Search settings for [`refine_params`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct DescentSettings {
    pub max_iterations: usize,
    pub initial_step: f64,
    pub max_halvings: usize,
    /// Per-parameter gradient weights; puts angle and lengths on one scale.
    pub weights: [f64; 4],
    /// Largest allowed absolute deviation from the start, per parameter.
    pub clamp: [f64; 4],
}

/// Result of the descent.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Descent {
    pub params: LatticeParams,
    pub loss: f64,
    pub iterations: usize,
}

/// Shared fixed inputs of the loss.
pub(crate) struct LossInput<'a> {
    pub points: &'a [[f64; 2]],
    pub basis_angle: f64,
    pub center: [f64; 2],
}

impl LossInput<'_> {
    fn eval(&self, p: [f64; 4]) -> f64 {
        mean_loss(
            self.points,
            &LatticeParams::from_array(p),
            self.basis_angle,
            self.center,
        )
    }

    fn gradient(&self, p: [f64; 4]) -> [f64; 4] {
        let mut grad = [0.0f64; 4];
        for (k, g) in grad.iter_mut().enumerate() {
            let mut plus = p;
            let mut minus = p;
            plus[k] += DIFF_STEP[k];
            minus[k] -= DIFF_STEP[k];
            let d = (self.eval(plus) - self.eval(minus)) / (2.0 * DIFF_STEP[k]);
            *g = if d.is_finite() { d } else { 0.0 };
        }
        grad
    }
}

fn within_clamp(candidate: &[f64; 4], start: &[f64; 4], clamp: &[f64; 4]) -> bool {
    candidate
        .iter()
        .zip(start.iter())
        .zip(clamp.iter())
        .all(|((c, s), limit)| (c - s).abs() <= *limit)
}

/// Minimizes the mean squared residual starting from `start`.
///
/// Each iteration takes a central-difference gradient, scales it by the
/// per-parameter weights and backtracks from `initial_step`, halving up to
/// `max_halvings` times. A step is accepted
/// only if it strictly lowers the loss and keeps every parameter inside its
/// clamp around `start`. The search ends at the first iteration without an
/// accepted step.
pub(crate) fn refine_params(
    input: &LossInput<'_>,
    start: LatticeParams,
    settings: &DescentSettings,
) -> Descent {
    let origin = start.to_array();
    let mut current = origin;
    let mut loss = input.eval(current);
    let mut iterations = 0usize;

    for _ in 0..settings.max_iterations {
        let grad = input.gradient(current);
        if grad.iter().all(|&g| g == 0.0) {
            break;
        }

        let mut step = settings.initial_step;
        let mut accepted = None;
        for _ in 0..=settings.max_halvings {
            let mut candidate = current;
            for (k, c) in candidate.iter_mut().enumerate() {
                *c -= step * settings.weights[k] * grad[k];
            }
            if within_clamp(&candidate, &origin, &settings.clamp) {
                let candidate_loss = input.eval(candidate);
                if candidate_loss < loss {
                    accepted = Some((candidate, candidate_loss));
                    break;
                }
            }
            step *= 0.5;
        }

        match accepted {
            Some((params, new_loss)) => {
                current = params;
                loss = new_loss;
                iterations += 1;
            }
            None => break,
        }
    }

    Descent {
        params: LatticeParams::from_array(current),
        loss,
        iterations,
    }
}
