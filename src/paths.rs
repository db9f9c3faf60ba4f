//! Dendrite-path detection by brightness thresholding of the raw raster.

use image::{GrayImage, Luma, RgbImage};

/// Intensity below which the inspected channel counts as path-absent.
const PATH_THRESHOLD: u8 = 60;

/// Produces the binary dendrite-path mask from the raw (unprocessed) raster.
///
/// Only the red channel is inspected: a pixel whose red value is strictly
/// below 60 becomes path-absent (0), everything else path-present (255).
/// This single-channel proxy is deliberate output-compatible behavior; do not
/// replace it with a luminance formula.
///
/// Independent of the segmentation stages; only needs the raw raster.
pub fn classify_paths(raster: &RgbImage) -> GrayImage {
    let (width, height) = raster.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if raster.get_pixel(x, y)[0] < PATH_THRESHOLD {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}
