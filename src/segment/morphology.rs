//! Binary morphology with a square structuring element.
//!
//! The element is the `(2r+1) x (2r+1)` square centred on the pixel. Pixels
//! outside the mask count as background for both operations, so erosion
//! clears everything within `r` of the border.

use crate::image::BinaryMask;
use crate::kernel::{self, RowKernel};
use crate::trace::{trace_mask, trace_span};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MorphOp {
    Erode,
    Dilate,
}

struct MorphKernel<'a> {
    mask: &'a BinaryMask,
    radius: usize,
    op: MorphOp,
}

impl MorphKernel<'_> {
    fn erode_at(&self, x: usize, y: usize) -> u8 {
        let (w, h, r) = (self.mask.width(), self.mask.height(), self.radius);
        if x < r || y < r || x + r >= w || y + r >= h {
            return 0;
        }
        let data = self.mask.data();
        for yy in y - r..=y + r {
            let row = &data[yy * w..yy * w + w];
            if row[x - r..=x + r].iter().any(|&v| v == 0) {
                return 0;
            }
        }
        1
    }

    fn dilate_at(&self, x: usize, y: usize) -> u8 {
        let (w, h, r) = (self.mask.width(), self.mask.height(), self.radius);
        let x0 = x.saturating_sub(r);
        let x1 = (x + r).min(w - 1);
        let y0 = y.saturating_sub(r);
        let y1 = (y + r).min(h - 1);
        let data = self.mask.data();
        for yy in y0..=y1 {
            let row = &data[yy * w..yy * w + w];
            if row[x0..=x1].iter().any(|&v| v == 1) {
                return 1;
            }
        }
        0
    }
}

impl RowKernel for MorphKernel<'_> {
    type Output = u8;

    fn width(&self) -> usize {
        self.mask.width()
    }

    fn height(&self) -> usize {
        self.mask.height()
    }

    fn eval_row(&self, y: usize, out: &mut [u8]) {
        for (x, dst) in out.iter_mut().enumerate() {
            *dst = match self.op {
                MorphOp::Erode => self.erode_at(x, y),
                MorphOp::Dilate => self.dilate_at(x, y),
            };
        }
    }
}

fn apply(mask: &BinaryMask, radius: usize, op: MorphOp, parallel: bool) -> BinaryMask {
    let row_kernel = MorphKernel { mask, radius, op };
    let data = kernel::run(&row_kernel, parallel);
    BinaryMask::from_parts(data, mask.width(), mask.height())
}

/// Keeps a pixel only if its whole window is foreground and inside the mask.
pub fn erode(mask: &BinaryMask, radius: usize) -> BinaryMask {
    apply(mask, radius, MorphOp::Erode, false)
}

/// Sets a pixel if any pixel of its (clipped) window is foreground.
pub fn dilate(mask: &BinaryMask, radius: usize) -> BinaryMask {
    apply(mask, radius, MorphOp::Dilate, false)
}

/// Erosion followed by dilation; removes specks smaller than the window.
pub fn open(mask: &BinaryMask, radius: usize) -> BinaryMask {
    open_with(mask, radius, false)
}

/// Dilation followed by erosion; bridges gaps narrower than the window.
pub fn close(mask: &BinaryMask, radius: usize) -> BinaryMask {
    close_with(mask, radius, false)
}

pub(crate) fn open_with(mask: &BinaryMask, radius: usize, parallel: bool) -> BinaryMask {
    let eroded = apply(mask, radius, MorphOp::Erode, parallel);
    apply(&eroded, radius, MorphOp::Dilate, parallel)
}

pub(crate) fn close_with(mask: &BinaryMask, radius: usize, parallel: bool) -> BinaryMask {
    let dilated = apply(mask, radius, MorphOp::Dilate, parallel);
    apply(&dilated, radius, MorphOp::Erode, parallel)
}

/// Fills background regions that are not 4-connected to the image border.
///
/// Border background pixels seed an explicit index stack; everything the
/// flood reaches stays background and every unreached background pixel is
/// an enclosed hole and becomes foreground. Returns the number of filled
/// pixels.
pub fn fill_holes(mask: &mut BinaryMask) -> usize {
    let w = mask.width();
    let h = mask.height();
    let data = mask.data_mut();
    let mut reached = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::new();

    for x in 0..w {
        push_open(data, &mut reached, &mut stack, x);
        push_open(data, &mut reached, &mut stack, (h - 1) * w + x);
    }
    for y in 0..h {
        push_open(data, &mut reached, &mut stack, y * w);
        push_open(data, &mut reached, &mut stack, y * w + w - 1);
    }

    while let Some(idx) = stack.pop() {
        let x = idx % w;
        let y = idx / w;
        if x > 0 {
            push_open(data, &mut reached, &mut stack, idx - 1);
        }
        if x + 1 < w {
            push_open(data, &mut reached, &mut stack, idx + 1);
        }
        if y > 0 {
            push_open(data, &mut reached, &mut stack, idx - w);
        }
        if y + 1 < h {
            push_open(data, &mut reached, &mut stack, idx + w);
        }
    }

    let mut filled = 0usize;
    for (value, &was_reached) in data.iter_mut().zip(reached.iter()) {
        if *value == 0 && !was_reached {
            *value = 1;
            filled += 1;
        }
    }
    filled
}

#[inline]
fn push_open(data: &[u8], reached: &mut [bool], stack: &mut Vec<usize>, idx: usize) {
    if data[idx] == 0 && !reached[idx] {
        reached[idx] = true;
        stack.push(idx);
    }
}

/// Opening, then closing, then hole filling, as one in-place cleanup pass.
pub fn clean_mask(mask: &mut BinaryMask, radius: usize, parallel: bool) {
    let _span = trace_span!("morphology", radius = radius).entered();
    let opened = open_with(mask, radius, parallel);
    *mask = close_with(&opened, radius, parallel);
    let filled = fill_holes(mask);
    trace_mask!("mask_cleaned", mask, filled = filled);
}
