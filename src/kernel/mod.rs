//! Row-oriented window kernels.
//!
//! The variance and morphology stages evaluate every output pixel from a
//! small window of the input. Each of them is expressed as a `RowKernel` that
//! fills one output row at a time, so the same kernel can be driven row by row
//! on the calling thread or, with the `rayon` feature, by a row-parallel
//! runner. Both runners produce bit-identical buffers.

/// Fills output rows from a fixed input.
pub(crate) trait RowKernel: Sync {
    type Output: Copy + Default + Send + Sync;

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Writes row `y`; `out.len() == self.width()`.
    fn eval_row(&self, y: usize, out: &mut [Self::Output]);
}

/// Evaluates every row on the calling thread.
pub(crate) fn eval_rows<K: RowKernel>(kernel: &K) -> Vec<K::Output> {
    let width = kernel.width();
    let mut out = vec![K::Output::default(); width * kernel.height()];
    for (y, row) in out.chunks_mut(width).enumerate() {
        kernel.eval_row(y, row);
    }
    out
}

/// Evaluates all rows, in parallel when requested and available.
#[cfg(feature = "rayon")]
pub(crate) fn run<K: RowKernel>(kernel: &K, parallel: bool) -> Vec<K::Output> {
    if parallel {
        self::rayon::eval_rows_par(kernel)
    } else {
        eval_rows(kernel)
    }
}

/// Evaluates all rows on the calling thread (`rayon` feature disabled).
#[cfg(not(feature = "rayon"))]
pub(crate) fn run<K: RowKernel>(kernel: &K, _parallel: bool) -> Vec<K::Output> {
    eval_rows(kernel)
}

#[cfg(feature = "rayon")]
pub(crate) mod rayon;
