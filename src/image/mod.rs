//! Image views, owned scalar fields and binary masks.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride
//! (elements between row starts). It is the input adapter for caller-owned
//! pixel buffers. `ScalarField` and `BinaryMask` are the owned, contiguous
//! row-major buffers that flow between pipeline stages.

use crate::util::{GridFitError, GridFitResult};

mod field;
pub mod gray;
#[cfg(feature = "image-io")]
pub mod io;

pub use field::{BinaryMask, ScalarField};

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> GridFitResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> GridFitResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(GridFitError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x)
    }

    /// Returns row `y` without padding.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.data.get(start..start + self.width)
    }

    /// Iterates over rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        let data = self.data;
        let (width, stride) = (self.width, self.stride);
        (0..self.height).map(move |y| &data[y * stride..y * stride + width])
    }
}

pub(crate) fn required_len(width: usize, height: usize, stride: usize) -> GridFitResult<usize> {
    if width == 0 || height == 0 {
        return Err(GridFitError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(GridFitError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(GridFitError::InvalidDimensions { width, height })
}
