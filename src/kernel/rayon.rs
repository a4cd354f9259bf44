//! Row-parallel kernel runner (feature-gated).
//!
//! Rows are disjoint output slices, so each worker writes its own rows and
//! the result is identical to the sequential runner.

use crate::kernel::RowKernel;
use rayon::prelude::*;

/// Evaluates every row of `kernel` on the rayon thread pool.
pub(crate) fn eval_rows_par<K: RowKernel>(kernel: &K) -> Vec<K::Output> {
    let width = kernel.width();
    let mut out = vec![K::Output::default(); width * kernel.height()];
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| kernel.eval_row(y, row));
    out
}
