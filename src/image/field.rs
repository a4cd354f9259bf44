//! Owned row-major buffers passed between pipeline stages.

use crate::image::ImageView;
use crate::util::{GridFitError, GridFitResult};

fn checked_area(width: usize, height: usize) -> GridFitResult<usize> {
    if width == 0 || height == 0 {
        return Err(GridFitError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(GridFitError::InvalidDimensions { width, height })
}

/// Owned `width x height` field of `f32` samples in row-major order.
///
/// Holds grayscale intensity, variance, log-variance or distance values.
/// The buffer length always equals `width * height`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl ScalarField {
    /// Wraps an existing buffer; the length must equal `width * height`.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> GridFitResult<Self> {
        let expected = checked_area(width, height)?;
        if data.len() != expected {
            return Err(GridFitError::LengthMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a field with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> GridFitResult<Self> {
        let len = checked_area(width, height)?;
        Ok(Self {
            data: vec![value; len],
            width,
            height,
        })
    }

    /// Builds a field by evaluating `f(x, y)` at every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> GridFitResult<Self>
    where
        F: FnMut(usize, usize) -> f32,
    {
        let len = checked_area(width, height)?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Same-shape field; the caller guarantees `data.len() == width * height`.
    pub(crate) fn from_parts(data: Vec<f32>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major samples.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable row-major samples.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the field and returns its buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Returns the sample at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    /// Returns a borrowed contiguous view.
    pub fn view(&self) -> ImageView<'_, f32> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Minimum and maximum over finite samples, `None` if there are none.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.data.iter().copied().filter(|v| v.is_finite());
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Applies `f` to every sample, keeping the shape.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        Self::from_parts(
            self.data.iter().map(|&v| f(v)).collect(),
            self.width,
            self.height,
        )
    }
}

/// Owned binary mask; every sample is 0 (background) or 1 (foreground).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl BinaryMask {
    /// Wraps an existing 0/1 buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> GridFitResult<Self> {
        let expected = checked_area(width, height)?;
        if data.len() != expected {
            return Err(GridFitError::LengthMismatch {
                expected,
                got: data.len(),
            });
        }
        if let Some((index, &value)) = data.iter().enumerate().find(|(_, v)| **v > 1) {
            return Err(GridFitError::InvalidMaskValue { index, value });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// All-background mask.
    pub fn zeros(width: usize, height: usize) -> GridFitResult<Self> {
        let len = checked_area(width, height)?;
        Ok(Self {
            data: vec![0; len],
            width,
            height,
        })
    }

    /// Builds a mask from a predicate evaluated at every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> GridFitResult<Self>
    where
        F: FnMut(usize, usize) -> bool,
    {
        let len = checked_area(width, height)?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                data.push(u8::from(f(x, y)));
            }
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub(crate) fn from_parts(data: Vec<u8>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        debug_assert!(data.iter().all(|&v| v <= 1));
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major 0/1 samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns true when `(x, y)` is inside the mask and set.
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x] == 1
    }

    /// Sets or clears the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = u8::from(on);
        }
    }

    /// Number of foreground pixels.
    pub fn count_ones(&self) -> usize {
        self.data.iter().filter(|&&v| v == 1).count()
    }

    /// Returns a borrowed contiguous view.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BinaryMask, ScalarField};
    use crate::util::GridFitError;

    #[test]
    fn scalar_field_rejects_length_mismatch() {
        let err = ScalarField::new(vec![0.0; 5], 2, 3).unwrap_err();
        assert_eq!(
            err,
            GridFitError::LengthMismatch {
                expected: 6,
                got: 5
            }
        );
    }

    #[test]
    fn min_max_skips_non_finite() {
        let field = ScalarField::new(vec![f32::NAN, 2.0, -1.0, f32::INFINITY], 2, 2).unwrap();
        assert_eq!(field.min_max(), Some((-1.0, 2.0)));
    }

    #[test]
    fn mask_rejects_non_binary_values() {
        let err = BinaryMask::new(vec![0, 1, 2, 0], 2, 2).unwrap_err();
        assert_eq!(err, GridFitError::InvalidMaskValue { index: 2, value: 2 });
    }

    #[test]
    fn mask_set_ignores_out_of_bounds() {
        let mut mask = BinaryMask::zeros(3, 2).unwrap();
        mask.set(2, 1, true);
        mask.set(3, 0, true);
        assert_eq!(mask.count_ones(), 1);
        assert!(mask.is_set(2, 1));
    }
}
