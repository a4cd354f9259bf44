//! Loading intensity fields from disk via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::gray::from_luma8;
use crate::image::{ImageView, ScalarField};
use crate::util::{GridFitError, GridFitResult};
use std::path::Path;

/// Converts an 8-bit grayscale buffer into an intensity field.
pub fn field_from_gray_image(img: &image::GrayImage) -> GridFitResult<ScalarField> {
    let view = ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)?;
    Ok(from_luma8(view))
}

/// Converts any decoded image into an intensity field (luma, alpha dropped).
pub fn field_from_dynamic_image(img: &image::DynamicImage) -> GridFitResult<ScalarField> {
    field_from_gray_image(&img.to_luma8())
}

/// Loads an image from disk as a grayscale intensity field.
pub fn load_intensity_field<P: AsRef<Path>>(path: P) -> GridFitResult<ScalarField> {
    let img = image::open(path).map_err(|err| GridFitError::ImageIo {
        reason: err.to_string(),
    })?;
    field_from_dynamic_image(&img)
}
