//! Reduces the segmented raster to a binary soma-outline mask.

use image::{GrayImage, Luma, RgbImage};

use crate::color;

/// Keeps only watershed boundary pixels, as a strictly binary mask.
///
/// A pixel is outline (255) iff it equals [`color::BOUNDARY`] exactly; every
/// other pixel is driven to 0, discarding its original color. The outermost
/// row and column on all four edges are forced to 0 unconditionally, so
/// watershed artifacts along the raster border are never mistaken for real
/// cell outlines.
pub fn clean_outlines(segmented: &RgbImage) -> GrayImage {
    let (width, height) = segmented.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let on_border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
        if !on_border && *segmented.get_pixel(x, y) == color::BOUNDARY {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
