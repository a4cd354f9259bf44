//! Exact Euclidean distance transform (Felzenszwalb & Huttenlocher).
//!
//! Foreground pixels (1) are the sites; every pixel receives the Euclidean
//! distance to the nearest foreground pixel, so foreground maps to 0 and the
//! interiors of background blobs form ridges and peaks. The squared transform
//! is separable: a 1D lower-envelope-of-parabolas pass runs over every column
//! and then over every row of the same working buffer.

use crate::image::{BinaryMask, ScalarField};
use crate::trace::{trace_field, trace_span};

/// Stand-in for "no site yet"; finite so envelope intersections stay defined.
const FAR: f64 = 1e20;

/// Reusable buffers for one 1D pass of length `n`.
struct Envelope {
    src: Vec<f64>,
    out: Vec<f64>,
    v: Vec<usize>,
    z: Vec<f64>,
}

impl Envelope {
    fn new(n: usize) -> Self {
        Self {
            src: vec![0.0; n],
            out: vec![0.0; n],
            v: vec![0; n],
            z: vec![0.0; n + 1],
        }
    }

    /// Squared distance transform of the sampled function in `src[..n]`.
    fn transform(&mut self, n: usize) {
        let f = &self.src[..n];
        let v = &mut self.v;
        let z = &mut self.z;

        let mut k = 0usize;
        v[0] = 0;
        z[0] = f64::NEG_INFINITY;
        z[1] = f64::INFINITY;
        for q in 1..n {
            let qf = q as f64;
            let mut s;
            loop {
                let p = v[k];
                let pf = p as f64;
                s = ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf);
                if s <= z[k] && k > 0 {
                    k -= 1;
                } else {
                    break;
                }
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = f64::INFINITY;
        }

        k = 0;
        for q in 0..n {
            let qf = q as f64;
            while z[k + 1] < qf {
                k += 1;
            }
            let p = v[k];
            let dq = qf - p as f64;
            self.out[q] = dq * dq + f[p];
        }
    }
}

/// Squared distances, transformed in place over a `width x height` buffer that
/// holds 0 at sites and [`FAR`] elsewhere.
fn squared_edt_in_place(grid: &mut [f64], width: usize, height: usize) {
    let mut env = Envelope::new(width.max(height));

    for x in 0..width {
        for y in 0..height {
            env.src[y] = grid[y * width + x];
        }
        env.transform(height);
        for y in 0..height {
            grid[y * width + x] = env.out[y];
        }
    }

    for row in grid.chunks_exact_mut(width) {
        env.src[..width].copy_from_slice(row);
        env.transform(width);
        row.copy_from_slice(&env.out[..width]);
    }
}

/// Distance from every pixel to the nearest foreground pixel.
///
/// Foreground pixels get 0. When the mask has no foreground at all, every
/// distance is clamped to the image diagonal.
pub fn distance_transform(mask: &BinaryMask) -> ScalarField {
    let width = mask.width();
    let height = mask.height();
    let _span = trace_span!("distance_transform", width = width, height = height).entered();

    let mut grid: Vec<f64> = mask
        .data()
        .iter()
        .map(|&v| if v == 1 { 0.0 } else { FAR })
        .collect();
    squared_edt_in_place(&mut grid, width, height);

    let diagonal = ((width * width + height * height) as f64).sqrt();
    let data: Vec<f32> = grid
        .iter()
        .map(|&d2| d2.sqrt().min(diagonal) as f32)
        .collect();
    let out = ScalarField::from_parts(data, width, height);

    trace_field!("distance_range", &out);
    out
}
