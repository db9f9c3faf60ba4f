//! Grayscale conversion and Gaussian smoothing of the raw raster.

use image::{GrayImage, RgbImage};
use imageproc::filter::gaussian_blur_f32;

use crate::error::{Error, Result};

/// Converts the raw raster to grayscale and applies a Gaussian blur with the
/// given odd kernel radius.
///
/// The blur sigma is derived from the kernel size as
/// `0.3 * ((radius - 1) * 0.5 - 1) + 0.8`, so a radius of 3 gives the mild
/// smoothing the segmentation thresholds are tuned for.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if either dimension of the input is zero.
///
/// # Panics
///
/// Panics if `radius` is even or zero.
pub fn grayscale_blur(raster: &RgbImage, radius: u32) -> Result<GrayImage> {
    assert!(radius % 2 == 1, "blur radius must be odd, got {radius}");

    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidImage(format!(
            "zero-dimension raster ({width}x{height})"
        )));
    }

    let gray = image::imageops::grayscale(raster);
    let sigma = 0.3 * ((radius as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    Ok(gaussian_blur_f32(&gray, sigma))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dimensions_match_input() {
        let raster = RgbImage::from_pixel(17, 11, image::Rgb([90, 90, 90]));
        let smoothed = grayscale_blur(&raster, 3).unwrap();
        assert_eq!(smoothed.dimensions(), (17, 11));
    }

    #[test]
    fn flat_image_stays_flat_after_smoothing() {
        let raster = RgbImage::from_pixel(9, 9, image::Rgb([120, 120, 120]));
        let smoothed = grayscale_blur(&raster, 3).unwrap();
        for p in smoothed.pixels() {
            // Kernel weights sum to one, so a constant field is preserved
            // up to rounding.
            assert!(p[0] >= 119 && p[0] <= 121, "got {}", p[0]);
        }
    }

    #[test]
    fn blur_spreads_a_bright_spike() {
        let mut raster = RgbImage::from_pixel(9, 9, image::Rgb([0, 0, 0]));
        raster.put_pixel(4, 4, image::Rgb([255, 255, 255]));
        let smoothed = grayscale_blur(&raster, 3).unwrap();
        assert!(smoothed.get_pixel(4, 4)[0] < 255);
        assert!(smoothed.get_pixel(3, 4)[0] > 0);
    }

    #[test]
    fn zero_dimension_input_is_rejected() {
        let raster = RgbImage::new(0, 5);
        assert!(matches!(
            grayscale_blur(&raster, 3),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    #[should_panic(expected = "blur radius must be odd")]
    fn even_radius_panics() {
        let raster = RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));
        let _ = grayscale_blur(&raster, 4);
    }
}
