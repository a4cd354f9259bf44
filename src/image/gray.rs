//! Conversion of decoded pixel buffers into single-channel intensity fields.
//!
//! Colour input uses Rec.601 luma weights; alpha is ignored. Intensities keep
//! the 0..255 scale of the source bytes.

use crate::image::{required_len, ImageView, ScalarField};
use crate::util::{GridFitError, GridFitResult};

const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * f32::from(r) + LUMA_G * f32::from(g) + LUMA_B * f32::from(b)
}

/// Copies an 8-bit grayscale view into a contiguous intensity field.
pub fn from_luma8(view: ImageView<'_, u8>) -> ScalarField {
    let mut data = Vec::with_capacity(view.width() * view.height());
    for row in view.rows() {
        data.extend(row.iter().map(|&v| f32::from(v)));
    }
    ScalarField::from_parts(data, view.width(), view.height())
}

/// Copies a float view into a contiguous intensity field.
pub fn from_f32(view: ImageView<'_, f32>) -> ScalarField {
    let mut data = Vec::with_capacity(view.width() * view.height());
    for row in view.rows() {
        data.extend_from_slice(row);
    }
    ScalarField::from_parts(data, view.width(), view.height())
}

/// Converts a tightly packed RGBA8 buffer (as delivered by canvas APIs).
pub fn from_rgba8(data: &[u8], width: usize, height: usize) -> GridFitResult<ScalarField> {
    from_interleaved(data, width, height, 4)
}

/// Converts a tightly packed interleaved buffer with 1, 3 or 4 channels.
pub fn from_interleaved(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
) -> GridFitResult<ScalarField> {
    if !matches!(channels, 1 | 3 | 4) {
        return Err(GridFitError::UnsupportedChannels { channels });
    }
    let pixels = required_len(width, height, width)?;
    let needed = pixels
        .checked_mul(channels)
        .ok_or(GridFitError::InvalidDimensions { width, height })?;
    if data.len() != needed {
        return Err(GridFitError::LengthMismatch {
            expected: needed,
            got: data.len(),
        });
    }

    let out: Vec<f32> = if channels == 1 {
        data.iter().map(|&v| f32::from(v)).collect()
    } else {
        data.chunks_exact(channels)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect()
    };
    Ok(ScalarField::from_parts(out, width, height))
}
