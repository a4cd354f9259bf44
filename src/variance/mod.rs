//! Local variance field built from summed-area tables.
//!
//! High local variance marks textured, edge-rich structure (pattern islands
//! and their borders); smooth background stays near zero. Windows are
//! `(2r+1) x (2r+1)` and shrink at the image border instead of padding.

mod integral;

pub use integral::{IntegralImage, WindowStats};

use crate::image::ScalarField;
use crate::kernel::{self, RowKernel};
use crate::trace::{trace_field, trace_span};

struct VarianceKernel<'a> {
    integral: &'a IntegralImage,
    radius: usize,
}

impl RowKernel for VarianceKernel<'_> {
    type Output = f32;

    fn width(&self) -> usize {
        self.integral.width()
    }

    fn height(&self) -> usize {
        self.integral.height()
    }

    fn eval_row(&self, y: usize, out: &mut [f32]) {
        for (x, dst) in out.iter_mut().enumerate() {
            *dst = self.integral.clipped_window(x, y, self.radius).variance() as f32;
        }
    }
}

/// Computes the clipped-window variance at every pixel.
pub fn variance_field(field: &ScalarField, radius: usize) -> ScalarField {
    variance_field_with(field, radius, false)
}

/// Like [`variance_field`], optionally row-parallel (feature `rayon`).
pub fn variance_field_with(field: &ScalarField, radius: usize, parallel: bool) -> ScalarField {
    let _span = trace_span!(
        "variance_field",
        width = field.width(),
        height = field.height(),
        radius = radius
    )
    .entered();

    let integral = IntegralImage::from_field(field);
    let row_kernel = VarianceKernel {
        integral: &integral,
        radius,
    };
    let data = kernel::run(&row_kernel, parallel);
    let out = ScalarField::from_parts(data, field.width(), field.height());

    trace_field!("variance_range", &out);
    out
}

/// Applies `ln(1 + v)` per sample to compress heavy-tailed variance values.
///
/// Negative inputs are treated as zero.
pub fn log1p_field(field: &ScalarField) -> ScalarField {
    field.map(|v| v.max(0.0).ln_1p())
}
